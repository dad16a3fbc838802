use crate::config::Config;
use crate::pool::ProbePool;
use crate::probe::{HttpOutcome, HttpProbe};
use crate::wordlist::{self, DefaultList};
use eyre::Result;
use std::time::Instant;
use url::Url;

/// Web directory and file discovery. Probes every wordlist candidate, then
/// every candidate joined with each extension, classifying by HTTP status.
/// 404s are deliberately dropped here; the vhost scanner is the one place a
/// 404 carries signal.
pub struct DirectoryBuster {
    config: Config,
    http: HttpProbe,
}

impl DirectoryBuster {
    pub fn new(config: Config) -> Result<Self> {
        let http = HttpProbe::new(&config)?;
        Ok(Self { config, http })
    }

    pub async fn scan(
        &self,
        base_url: &str,
        wordlist_path: &str,
        extensions: Option<Vec<String>>,
    ) -> Vec<String> {
        log::debug!("[scan::dirbust] scan: base_url={} wordlist={}", base_url, wordlist_path);
        let scan_start = Instant::now();
        let mut results = Vec::new();

        let base = match normalize_base_url(base_url) {
            Ok(base) => base,
            Err(e) => {
                results.push(format!("ERROR: Invalid target URL '{}' - {}", base_url, e));
                results.push("Directory scan complete".to_string());
                return results;
            }
        };

        let words = wordlist::load(wordlist_path, DefaultList::Directories).await;
        if words.is_empty() {
            results.push("ERROR: Could not load wordlist".to_string());
            results.push("Directory scan complete".to_string());
            return results;
        }

        let extensions = extensions.unwrap_or_else(|| self.config.default_extensions.clone());

        results.push(format!("Starting directory scan on {}", base));
        results.push(format!("Loaded {} words from wordlist", words.len()));

        let mut candidates = Vec::with_capacity(words.len() * (extensions.len() + 1));
        for word in &words {
            if let Ok(url) = base.join(word) {
                candidates.push(url.to_string());
            }
            for ext in &extensions {
                if let Ok(url) = base.join(&format!("{}.{}", word, ext)) {
                    candidates.push(url.to_string());
                }
            }
        }
        log::debug!("[scan::dirbust] candidates_built: count={}", candidates.len());

        let pool = ProbePool::new(self.config.dir_concurrency);
        let probes: Vec<_> = candidates
            .into_iter()
            .map(|url| {
                let http = self.http.clone();
                async move {
                    let outcome = http.get(&url).await;
                    classify_candidate(&url, &outcome)
                }
            })
            .collect();

        results.extend(pool.run(probes).await.into_iter().flatten());
        results.push("Directory scan complete".to_string());

        log::debug!("[scan::dirbust] scan_completed: base_url={} duration={}ms lines={}",
            base_url, scan_start.elapsed().as_millis(), results.len());
        results
    }
}

/// Require a scheme (default `http://`) and a trailing slash so joins
/// produce sibling paths instead of replacing the last segment.
fn normalize_base_url(input: &str) -> Result<Url> {
    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("http://{}", input)
    };
    let mut url = Url::parse(&with_scheme)?;
    if !url.path().ends_with('/') {
        url.set_path(&format!("{}/", url.path()));
    }
    Ok(url)
}

/// Map a probe outcome to its result line, or None when the status is not
/// worth reporting. Network failures become per-candidate error lines.
fn classify_candidate(url: &str, outcome: &HttpOutcome) -> Option<String> {
    match outcome {
        HttpOutcome::Response { status, body_len } => {
            if !is_reportable(*status) {
                return None;
            }
            let label = status_label(*status);
            if *status == 200 {
                Some(format!(
                    "Found: {} (Status: {} - {}, Size: {} bytes)",
                    url, status, label, body_len
                ))
            } else {
                Some(format!("Found: {} (Status: {} - {})", url, status, label))
            }
        }
        HttpOutcome::Error(reason) => Some(format!("ERROR: {} - {}", url, reason)),
    }
}

/// Statuses that produce `Found:` lines. 404 is excluded on purpose.
fn is_reportable(status: u16) -> bool {
    matches!(status, 200 | 301 | 302 | 401 | 403 | 500)
}

fn status_label(status: u16) -> String {
    match status {
        200 => "OK - Accessible".to_string(),
        301 => "Moved Permanently".to_string(),
        302 => "Found - Redirect".to_string(),
        401 => "Unauthorized".to_string(),
        403 => "Forbidden - Access Denied".to_string(),
        404 => "Not Found".to_string(),
        500 => "Internal Server Error".to_string(),
        502 => "Bad Gateway".to_string(),
        503 => "Service Unavailable".to_string(),
        _ => format!("Status {}", status),
    }
}
