use console::style;

/// Echo a resolved run parameter for the operator's reference.
pub fn flag(key: &str, value: &str) {
    println!("{}: {value}", style(key).cyan());
    tracing::debug!("{key}: {value}");
}

pub fn warning(message: &str) {
    eprintln!("{}", style(format!("[WARNING] {message}")).yellow());
}
