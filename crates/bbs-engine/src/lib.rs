pub mod engine;
mod enrich;
