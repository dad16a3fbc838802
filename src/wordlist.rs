//! Wordlist loading for the HTTP enumeration scanners. File-backed lists are
//! UTF-8, one candidate per line, blank lines ignored, no comment syntax.
//! An absent or unreadable file falls back to a small built-in list.

const DEFAULT_DIRECTORIES: &[&str] = &[
    "admin", "administrator", "login", "uploads", "upload",
    "images", "js", "css", "includes", "inc", "config",
    "backup", "backups", "db", "database", "sql", "test",
    "temp", "tmp", "logs", "log", "api", "assets", "files",
];

const DEFAULT_VHOSTS: &[&str] = &[
    "www", "mail", "ftp", "admin", "test", "dev", "staging",
    "api", "blog", "shop", "store", "forum", "support",
    "help", "docs", "cdn", "static", "media", "images",
    "secure", "vpn", "remote", "portal", "intranet",
];

/// Which built-in list to use when the file cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultList {
    Directories,
    VirtualHosts,
}

impl DefaultList {
    fn entries(self) -> &'static [&'static str] {
        match self {
            DefaultList::Directories => DEFAULT_DIRECTORIES,
            DefaultList::VirtualHosts => DEFAULT_VHOSTS,
        }
    }
}

/// Load a wordlist from `path`, falling back to the built-in default when the
/// file is absent or unreadable. A readable but empty file yields an empty
/// list; the scanners treat that as a caller error.
pub async fn load(path: &str, fallback: DefaultList) -> Vec<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => {
            let words: Vec<String> = contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect();
            log::debug!("[wordlist] loaded: path={} entries={}", path, words.len());
            words
        }
        Err(e) => {
            log::warn!("[wordlist] read_failed: path={} error={} - using built-in default", path, e);
            fallback.entries().iter().map(|s| s.to_string()).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("netrecon-{}-{}", std::process::id(), name))
    }

    #[tokio::test]
    async fn test_load_trims_and_skips_blanks() {
        let path = temp_path("wordlist.txt");
        tokio::fs::write(&path, "admin\n\n  login  \n\nbackup\n")
            .await
            .unwrap();

        let words = load(path.to_str().unwrap(), DefaultList::Directories).await;
        assert_eq!(words, vec!["admin", "login", "backup"]);

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_falls_back_to_default() {
        let words = load("/nonexistent/wordlist.txt", DefaultList::Directories).await;
        assert_eq!(words.len(), DEFAULT_DIRECTORIES.len());
        assert!(words.iter().any(|w| w == "admin"));

        let vhosts = load("/nonexistent/vhosts.txt", DefaultList::VirtualHosts).await;
        assert!(vhosts.iter().any(|w| w == "www"));
    }

    #[tokio::test]
    async fn test_empty_file_yields_empty_list() {
        let path = temp_path("empty.txt");
        tokio::fs::write(&path, "\n\n  \n").await.unwrap();

        let words = load(path.to_str().unwrap(), DefaultList::Directories).await;
        assert!(words.is_empty());

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
