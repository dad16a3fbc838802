use crate::config::Config;
use crate::pool::ProbePool;
use crate::probe::{HttpOutcome, HttpProbe};
use crate::wordlist::{self, DefaultList};
use eyre::Result;
use std::time::Instant;

/// Virtual-host discovery via differential Host-header probing: each
/// candidate response is compared against a baseline response for the bare
/// domain on the same server. Unlike the directory scanner, a 404 that
/// differs from the baseline is reported; a custom error page is evidence
/// the vhost is configured.
pub struct VirtualHostScanner {
    config: Config,
    http: HttpProbe,
}

/// Verdict for one candidate label against the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VhostVerdict {
    Alive,
    CustomNotFound,
    Possible,
}

impl VirtualHostScanner {
    pub fn new(config: Config) -> Result<Self> {
        let http = HttpProbe::new(&config)?;
        Ok(Self { config, http })
    }

    pub async fn scan(&self, target_ip: &str, domain: &str, wordlist_path: &str) -> Vec<String> {
        log::debug!("[scan::vhost] scan: target_ip={} domain={} wordlist={}",
            target_ip, domain, wordlist_path);
        let scan_start = Instant::now();
        let mut results = Vec::new();

        let labels = wordlist::load(wordlist_path, DefaultList::VirtualHosts).await;
        if labels.is_empty() {
            results.push("ERROR: Could not load wordlist".to_string());
            results.push("Virtual host scan complete".to_string());
            return results;
        }

        results.push(format!("Starting virtual host scan on {} for {}", target_ip, domain));
        results.push(format!("Loaded {} subdomains from wordlist", labels.len()));

        let url = format!("http://{}/", target_ip);
        let pool = ProbePool::new(self.config.vhost_concurrency);

        let probes: Vec<_> = labels
            .into_iter()
            .map(|label| {
                let http = self.http.clone();
                let url = url.clone();
                let domain = domain.to_string();
                async move {
                    let vhost = format!("{}.{}", label, domain);
                    let candidate = http.get_with_host(&url, &vhost).await;
                    let (status, body_len) = match candidate {
                        HttpOutcome::Response { status, body_len } => (status, body_len),
                        HttpOutcome::Error(reason) => {
                            return Some(format!("ERROR: {} - {}", vhost, reason));
                        }
                    };

                    let baseline = match http.get_with_host(&url, &domain).await {
                        HttpOutcome::Response { status, body_len } => Some((status, body_len)),
                        HttpOutcome::Error(_) => None,
                    };

                    classify_vhost((status, body_len), baseline).map(|verdict| match verdict {
                        VhostVerdict::Alive => {
                            format!("Found virtual host: {} (Status: {}) - ALIVE", vhost, status)
                        }
                        VhostVerdict::CustomNotFound => format!(
                            "Found virtual host: {} (Status: 404) - Custom Not Found / ALIVE",
                            vhost
                        ),
                        VhostVerdict::Possible => {
                            format!("Found virtual host: {} (Status: {}) - POSSIBLE", vhost, status)
                        }
                    })
                }
            })
            .collect();

        results.extend(pool.run(probes).await.into_iter().flatten());
        results.push("Virtual host scan complete".to_string());

        log::debug!("[scan::vhost] scan_completed: target_ip={} duration={}ms lines={}",
            target_ip, scan_start.elapsed().as_millis(), results.len());
        results
    }
}

/// Differential comparison. A missing baseline means any response at all is
/// a difference; otherwise a status or byte-length mismatch marks the vhost
/// alive (404 mismatches get their own verdict), and a match in the
/// reportable status set is merely possible.
fn classify_vhost(candidate: (u16, usize), baseline: Option<(u16, usize)>) -> Option<VhostVerdict> {
    let (status, body_len) = candidate;
    let Some((base_status, base_len)) = baseline else {
        return Some(VhostVerdict::Alive);
    };

    if status != base_status || body_len != base_len {
        if status == 404 {
            Some(VhostVerdict::CustomNotFound)
        } else {
            Some(VhostVerdict::Alive)
        }
    } else if matches!(status, 200 | 301 | 302 | 401 | 403) {
        Some(VhostVerdict::Possible)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_reportable_response_is_possible() {
        let verdict = classify_vhost((200, 5120), Some((200, 5120)));
        assert_eq!(verdict, Some(VhostVerdict::Possible));
    }

    #[test]
    fn test_status_difference_is_alive() {
        let verdict = classify_vhost((302, 0), Some((200, 5120)));
        assert_eq!(verdict, Some(VhostVerdict::Alive));
    }

    #[test]
    fn test_length_difference_alone_is_alive() {
        let verdict = classify_vhost((200, 4096), Some((200, 5120)));
        assert_eq!(verdict, Some(VhostVerdict::Alive));
    }

    #[test]
    fn test_differential_404_is_custom_not_found() {
        let verdict = classify_vhost((404, 900), Some((200, 5120)));
        assert_eq!(verdict, Some(VhostVerdict::CustomNotFound));
    }

    #[test]
    fn test_matching_404_is_dropped() {
        assert_eq!(classify_vhost((404, 900), Some((404, 900))), None);
    }

    #[test]
    fn test_matching_unreportable_status_is_dropped() {
        assert_eq!(classify_vhost((500, 100), Some((500, 100))), None);
    }

    #[test]
    fn test_missing_baseline_means_alive() {
        assert_eq!(classify_vhost((200, 100), None), Some(VhostVerdict::Alive));
        assert_eq!(classify_vhost((404, 0), None), Some(VhostVerdict::Alive));
    }

    #[tokio::test]
    async fn test_unreachable_server_yields_error_lines_and_summary() {
        let scanner = VirtualHostScanner::new(Config {
            http_timeout: std::time::Duration::from_millis(300),
            ..Config::default()
        })
        .unwrap();

        let path = std::env::temp_dir().join(format!("netrecon-vh-{}.txt", std::process::id()));
        tokio::fs::write(&path, "www\nmail\n").await.unwrap();

        let results = scanner
            .scan("127.0.0.1:1", "example.com", path.to_str().unwrap())
            .await;

        tokio::fs::remove_file(&path).await.unwrap();

        assert!(results[0].contains("Starting virtual host scan"));
        assert_eq!(results.iter().filter(|l| l.contains("ERROR")).count(), 2);
        assert_eq!(results.last().unwrap(), "Virtual host scan complete");
    }
}
