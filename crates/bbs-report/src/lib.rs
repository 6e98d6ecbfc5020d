use std::io::{self, Write};

use bbs_core::models::registry::RepoRegistry;

/// Header row of the results file.
pub const CSV_HEADER: &str = "project,repository,size,pull_requests,comments,archived,public";

/// Write the registry as delimited text, one row per repository in
/// registry order. Repositories whose enrichment failed render zeros.
pub fn write_csv<W: Write>(mut out: W, registry: &RepoRegistry) -> io::Result<()> {
    writeln!(out, "{CSV_HEADER}")?;
    for repo in registry.repos() {
        let (size, pull_requests, comments) = match &repo.stats {
            Some(stats) => (
                stats.size.repository,
                stats.pull_requests.len() as u64,
                stats.comment_count,
            ),
            None => (0, 0, 0),
        };
        writeln!(
            out,
            "{},{},{size},{pull_requests},{comments},{},{}",
            repo.project.key, repo.slug, repo.archived, repo.public
        )?;
    }
    Ok(())
}

/// Render a byte count for the operator summary: B, KB, MB or GB with
/// integer precision.
pub fn display_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{} GB", bytes / GB)
    } else if bytes >= MB {
        format!("{} MB", bytes / MB)
    } else if bytes >= KB {
        format!("{} KB", bytes / KB)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbs_core::models::project::Project;
    use bbs_core::models::repo::{RepoSize, RepoStats, Repository};

    fn repo(id: u64, slug: &str, archived: bool, public: bool) -> Repository {
        Repository {
            slug: slug.to_string(),
            id,
            name: slug.to_string(),
            state: "AVAILABLE".to_string(),
            forkable: true,
            public,
            archived,
            project: Project {
                key: "PRJ".to_string(),
                id: 1,
                name: "Project".to_string(),
                public,
                kind: "NORMAL".to_string(),
            },
            stats: None,
        }
    }

    #[test]
    fn test_csv_rows_follow_registry_order() {
        let mut enriched = repo(1, "webapp", false, true);
        enriched.stats = Some(RepoStats {
            size: RepoSize {
                repository: 2048,
                attachments: 0,
            },
            pull_requests: vec![Default::default(), Default::default()],
            comment_count: 9,
        });
        let unenriched = repo(2, "legacy", true, false);

        let registry = RepoRegistry::from_listing(vec![enriched, unenriched]);
        let mut buf = Vec::new();
        write_csv(&mut buf, &registry).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "PRJ,webapp,2048,2,9,false,true");
        // Failed enrichment leaves zeroed statistics, not a missing row.
        assert_eq!(lines[2], "PRJ,legacy,0,0,0,true,false");
    }

    #[test]
    fn test_display_size_units() {
        assert_eq!(display_size(0), "0 B");
        assert_eq!(display_size(1023), "1023 B");
        assert_eq!(display_size(1024), "1 KB");
        assert_eq!(display_size(10 * 1024 * 1024), "10 MB");
        assert_eq!(display_size(3 * 1024 * 1024 * 1024), "3 GB");
        // Integer division truncates, matching the operator-facing report.
        assert_eq!(display_size(1536), "1 KB");
    }
}
