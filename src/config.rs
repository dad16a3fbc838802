use std::time::Duration;

const DEFAULT_THREADS: usize = 50;
const MIN_THREADS: usize = 1;
const MAX_THREADS: usize = 100;
const DEFAULT_TCP_TIMEOUT_SECS: u64 = 3;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 5;
const DEFAULT_PING_TIMEOUT_SECS: u64 = 1;
const DIR_SCAN_CONCURRENCY: usize = 10;
const VHOST_SCAN_CONCURRENCY: usize = 10;
const HOST_SCAN_CONCURRENCY: usize = 50;
const TCP_FALLBACK_CONCURRENCY: usize = 20;
const BANNER_BUDGET_BYTES: usize = 1024;
const BANNER_TIMEOUT_SECS: u64 = 2;
const MAX_HOSTS_SCAN: usize = 254;
const TCP_FALLBACK_CAP: usize = 50;

const USER_AGENT: &str = "Mozilla/5.0 (Linux; Security Scanner) NetworkTools/1.0";

/// Engine configuration shared by all scanners. Callers tune a copy per
/// invocation; nothing here is global state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default worker count for port scans when the caller does not supply one.
    pub threads: usize,
    /// Deadline for a single TCP connect probe.
    pub tcp_timeout: Duration,
    /// Deadline for a single HTTP GET probe.
    pub http_timeout: Duration,
    /// Deadline handed to the external ping utility.
    pub ping_timeout: Duration,
    pub dir_concurrency: usize,
    pub vhost_concurrency: usize,
    pub host_concurrency: usize,
    pub tcp_fallback_concurrency: usize,
    /// Maximum banner bytes read from a freshly opened connection.
    pub banner_budget: usize,
    pub banner_timeout: Duration,
    /// Hard cap on enumerated addresses per host-discovery scan.
    pub max_hosts: usize,
    /// Cap on addresses given to the TCP-connect fallback phase.
    pub tcp_fallback_cap: usize,
    /// Ports tried when the ping-based liveness pre-check is unavailable.
    pub liveness_ports: Vec<u16>,
    pub default_extensions: Vec<String>,
    pub user_agent: String,
    /// Attempt banner grabbing and service classification on open ports.
    pub service_detection: bool,
    /// Run a liveness pre-check before a port scan.
    pub host_discovery: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            tcp_timeout: Duration::from_secs(DEFAULT_TCP_TIMEOUT_SECS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            ping_timeout: Duration::from_secs(DEFAULT_PING_TIMEOUT_SECS),
            dir_concurrency: DIR_SCAN_CONCURRENCY,
            vhost_concurrency: VHOST_SCAN_CONCURRENCY,
            host_concurrency: HOST_SCAN_CONCURRENCY,
            tcp_fallback_concurrency: TCP_FALLBACK_CONCURRENCY,
            banner_budget: BANNER_BUDGET_BYTES,
            banner_timeout: Duration::from_secs(BANNER_TIMEOUT_SECS),
            max_hosts: MAX_HOSTS_SCAN,
            tcp_fallback_cap: TCP_FALLBACK_CAP,
            liveness_ports: vec![80, 443, 22, 23, 21],
            default_extensions: ["php", "html", "txt", "js", "asp", "aspx", "jsp", "json", "xml"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            user_agent: USER_AGENT.to_string(),
            service_detection: true,
            host_discovery: true,
        }
    }
}

impl Config {
    /// Defaults with environment overrides applied (`NETRECON_THREADS`,
    /// `NETRECON_TIMEOUT` in seconds). Invalid values fall back to defaults;
    /// thread counts are clamped into the supported range.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(threads) = std::env::var("NETRECON_THREADS") {
            if let Ok(threads) = threads.parse::<usize>() {
                config.threads = threads.clamp(MIN_THREADS, MAX_THREADS);
            } else {
                log::warn!("[config] invalid_threads_override: value={}", threads);
            }
        }

        if let Ok(timeout) = std::env::var("NETRECON_TIMEOUT") {
            if let Ok(secs) = timeout.parse::<u64>() {
                config.tcp_timeout = Duration::from_secs(secs.max(1));
            } else {
                log::warn!("[config] invalid_timeout_override: value={}", timeout);
            }
        }

        log::debug!("[config] from_env: threads={} tcp_timeout={}ms",
            config.threads, config.tcp_timeout.as_millis());
        config
    }

    /// Clamp a caller-requested worker count into [MIN_THREADS, MAX_THREADS].
    /// The pool itself never clamps; bounds live here.
    pub fn clamp_threads(&self, requested: usize) -> usize {
        requested.clamp(MIN_THREADS, MAX_THREADS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.threads, 50);
        assert_eq!(config.tcp_timeout, Duration::from_secs(3));
        assert_eq!(config.max_hosts, 254);
        assert_eq!(config.liveness_ports, vec![80, 443, 22, 23, 21]);
        assert!(config.service_detection);
        assert!(config.host_discovery);
    }

    #[test]
    fn test_clamp_threads() {
        let config = Config::default();
        assert_eq!(config.clamp_threads(0), 1);
        assert_eq!(config.clamp_threads(50), 50);
        assert_eq!(config.clamp_threads(5000), 100);
    }
}
