use crate::config::Config;
use crate::pool::ProbePool;
use crate::probe::{LivenessProbe, SystemProbe, TcpOutcome, TcpProbe, identify_service};
use crate::types::{AliveSet, PortSpec};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::lookup_host;

/// TCP port scanner with optional service identification and a liveness
/// pre-check. Per-probe failures become result lines; nothing aborts the
/// batch, and the summary line always closes the scan.
pub struct PortScanner {
    config: Config,
    liveness: Arc<dyn LivenessProbe>,
}

impl PortScanner {
    pub fn new(config: Config) -> Self {
        let liveness = Arc::new(SystemProbe::new(&config));
        Self { config, liveness }
    }

    /// Substitute the liveness capability, used by tests to avoid spawning
    /// real subprocesses.
    pub fn with_liveness(mut self, liveness: Arc<dyn LivenessProbe>) -> Self {
        self.liveness = liveness;
        self
    }

    pub async fn scan(&self, target: &str, port_spec: &str, threads: usize) -> Vec<String> {
        log::debug!("[scan::port] scan: target={} spec={} threads={}", target, port_spec, threads);
        let scan_start = Instant::now();
        let mut results = Vec::new();

        // Liveness verdict is informational; a down host still gets scanned
        if self.config.host_discovery {
            results.push(self.check_liveness(target).await);
        }

        let spec = match PortSpec::parse(port_spec) {
            Ok(spec) => spec,
            Err(e) => {
                log::warn!("[scan::port] bad_port_spec: spec={} error={}", port_spec, e);
                results.push(format!("ERROR: Invalid port specification '{}' - {}", port_spec, e));
                results.push("Scan complete. Found 0 open ports".to_string());
                return results;
            }
        };

        let ip = match self.resolve(target).await {
            Some(ip) => ip,
            None => {
                for port in spec.ports() {
                    results.push(format!("{}:{} - DNS resolution failed", target, port));
                }
                results.push("Scan complete. Found 0 open ports".to_string());
                return results;
            }
        };

        let open_ports = AliveSet::new();
        let pool = ProbePool::new(self.config.clamp_threads(threads));
        let tcp = TcpProbe::new(&self.config);
        let service_detection = self.config.service_detection;

        let probes: Vec<_> = spec
            .ports()
            .iter()
            .map(|&port| {
                let tcp = tcp.clone();
                let open_ports = open_ports.clone();
                let target = target.to_string();
                async move {
                    let addr = SocketAddr::new(ip, port);
                    let outcome = if service_detection {
                        tcp.connect_with_banner(addr).await
                    } else {
                        tcp.connect(addr).await
                    };
                    match outcome {
                        TcpOutcome::Open { banner } => {
                            open_ports.insert(port.to_string());
                            if service_detection {
                                let service = identify_service(banner.as_deref(), port);
                                Some(format!("{}:{} - OPEN ({})", target, port, service))
                            } else {
                                Some(format!("{}:{} - OPEN", target, port))
                            }
                        }
                        TcpOutcome::Closed => None,
                        TcpOutcome::Error(reason) => {
                            Some(format!("{}:{} - ERROR: {}", target, port, reason))
                        }
                    }
                }
            })
            .collect();

        results.extend(pool.run(probes).await.into_iter().flatten());
        results.push(format!("Scan complete. Found {} open ports", open_ports.len()));

        log::debug!("[scan::port] scan_completed: target={} duration={}ms ports={} open={}",
            target, scan_start.elapsed().as_millis(), spec.len(), open_ports.len());
        results
    }

    /// Ping first, then TCP connects on common ports when ping is
    /// unavailable or fails. A down verdict is a warning, never an abort.
    async fn check_liveness(&self, target: &str) -> String {
        if self.liveness.ping(target).await {
            return format!("Host {} is alive (ping)", target);
        }
        for &port in &self.config.liveness_ports {
            if self.liveness.tcp_connect(target, port).await {
                return format!("Host {} is alive (TCP:{})", target, port);
            }
        }
        format!("Warning: Host {} appears down - continuing scan anyway", target)
    }

    async fn resolve(&self, target: &str) -> Option<IpAddr> {
        match lookup_host(format!("{}:80", target)).await {
            Ok(mut addrs) => addrs.next().map(|addr| addr.ip()),
            Err(e) => {
                log::warn!("[scan::port] resolution_failed: target={} error={}", target, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::net::TcpListener;

    struct FakeLiveness {
        ping_alive: bool,
        tcp_alive: bool,
    }

    #[async_trait]
    impl LivenessProbe for FakeLiveness {
        async fn ping(&self, _addr: &str) -> bool {
            self.ping_alive
        }

        async fn tcp_connect(&self, _addr: &str, _port: u16) -> bool {
            self.tcp_alive
        }
    }

    fn quiet_config() -> Config {
        Config {
            host_discovery: false,
            service_detection: false,
            tcp_timeout: std::time::Duration::from_millis(500),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_open_port_reported_with_marker() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let scanner = PortScanner::new(quiet_config());
        let results = scanner.scan("127.0.0.1", &port.to_string(), 10).await;

        assert!(results.iter().any(|line| line.contains(&format!(":{}", port)) && line.contains("OPEN")));
        assert_eq!(results.last().unwrap(), "Scan complete. Found 1 open ports");
    }

    #[tokio::test]
    async fn test_no_listeners_yields_zero_summary() {
        // Reserve then release a port so its small neighborhood is quiet
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let scanner = PortScanner::new(quiet_config());
        let results = scanner.scan("127.0.0.1", &port.to_string(), 10).await;

        assert!(!results.iter().any(|line| line.contains("OPEN")));
        assert_eq!(results.last().unwrap(), "Scan complete. Found 0 open ports");
    }

    #[tokio::test]
    async fn test_bad_port_spec_emits_error_after_liveness_line() {
        let mut config = quiet_config();
        config.host_discovery = true;
        let scanner = PortScanner::new(config).with_liveness(Arc::new(FakeLiveness {
            ping_alive: true,
            tcp_alive: false,
        }));

        let results = scanner.scan("127.0.0.1", "not-a-port", 10).await;
        assert!(results[0].contains("alive"));
        assert!(results[1].contains("ERROR"));
        assert_eq!(results.last().unwrap(), "Scan complete. Found 0 open ports");
    }

    #[tokio::test]
    async fn test_liveness_tcp_fallback_line() {
        let mut config = quiet_config();
        config.host_discovery = true;
        let scanner = PortScanner::new(config).with_liveness(Arc::new(FakeLiveness {
            ping_alive: false,
            tcp_alive: true,
        }));

        let results = scanner.scan("127.0.0.1", "1", 1).await;
        // First fallback port in the configured order
        assert!(results[0].contains("alive (TCP:80)"));
    }

    #[tokio::test]
    async fn test_down_host_still_scanned() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut config = quiet_config();
        config.host_discovery = true;
        let scanner = PortScanner::new(config).with_liveness(Arc::new(FakeLiveness {
            ping_alive: false,
            tcp_alive: false,
        }));

        let results = scanner.scan("127.0.0.1", &port.to_string(), 5).await;
        assert!(results[0].contains("appears down"));
        assert!(results.iter().any(|line| line.contains("OPEN")));
    }

    #[tokio::test]
    async fn test_dns_failure_is_one_line_per_port() {
        let scanner = PortScanner::new(quiet_config());
        let results = scanner.scan("definitely-not-a-real-host.invalid", "20-22", 5).await;

        let dns_lines = results
            .iter()
            .filter(|line| line.contains("DNS resolution failed"))
            .count();
        assert_eq!(dns_lines, 3);
        assert_eq!(results.last().unwrap(), "Scan complete. Found 0 open ports");
    }

    #[tokio::test]
    async fn test_service_detection_appends_service_name() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            loop {
                if let Ok((mut stream, _)) = listener.accept().await {
                    use tokio::io::AsyncWriteExt;
                    let _ = stream.write_all(b"SSH-2.0-OpenSSH_9.6\r\n").await;
                }
            }
        });

        let mut config = quiet_config();
        config.service_detection = true;
        let scanner = PortScanner::new(config);
        let results = scanner.scan("127.0.0.1", &port.to_string(), 5).await;

        assert!(results.iter().any(|line| line.contains("OPEN (SSH)")));
    }
}
