use crate::config::Config;
use crate::pool::ProbePool;
use crate::probe::{self, LivenessProbe, SystemProbe};
use crate::types::AliveSet;
use ipnetwork::IpNetwork;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

const TCP_FALLBACK_PORT: u16 = 80;

/// Subnet host discovery: a ping sweep over the enumerated addresses,
/// then a TCP-connect fallback on port 80 for the ones ping missed. The
/// alive set deduplicates across phases, so a host discovered twice is
/// counted once.
pub struct HostScanner {
    config: Config,
    liveness: Arc<dyn LivenessProbe>,
}

impl HostScanner {
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

    pub async fn scan(&self, network_range: &str) -> Vec<String> {
        log::debug!("[scan::host] scan: network={}", network_range);
        let scan_start = Instant::now();
        let mut results = Vec::new();

        // Malformed input is fatal here: there is no target to fall back to
        let network: IpNetwork = match network_range.parse() {
            Ok(network) => network,
            Err(e) => {
                log::warn!("[scan::host] bad_network_range: input={} error={}", network_range, e);
                results.push(format!("ERROR: Invalid network range - {}", e));
                return results;
            }
        };

        let mut hosts = enumerate_hosts(&network, self.config.max_hosts + 1);
        if hosts.len() > self.config.max_hosts {
            hosts.truncate(self.config.max_hosts);
            results.push(format!("Limiting scan to first {} hosts", self.config.max_hosts));
        }

        results.push(format!("Starting host discovery on {}", network_range));
        results.push(format!("Scanning {} hosts", hosts.len()));

        let alive = AliveSet::new();

        // Phase 1: ping sweep
        let pool = ProbePool::new(self.config.host_concurrency);
        let probes: Vec<_> = hosts
            .iter()
            .map(|&ip| {
                let liveness = Arc::clone(&self.liveness);
                let alive = alive.clone();
                async move {
                    if liveness.ping(&ip.to_string()).await {
                        alive.insert(ip.to_string());
                        Some(format!("Host {} is alive (ping)", ip))
                    } else {
                        None
                    }
                }
            })
            .collect();
        results.extend(pool.run(probes).await.into_iter().flatten());
        log::debug!("[scan::host] ping_phase_completed: alive={}", alive.len());

        // Phase 2: TCP-connect fallback for hosts ping missed, capped
        let remaining: Vec<IpAddr> = hosts
            .iter()
            .filter(|ip| !alive.contains(&ip.to_string()))
            .take(self.config.tcp_fallback_cap)
            .copied()
            .collect();

        if !remaining.is_empty() {
            let pool = ProbePool::new(self.config.tcp_fallback_concurrency);
            let probes: Vec<_> = remaining
                .into_iter()
                .map(|ip| {
                    let liveness = Arc::clone(&self.liveness);
                    let alive = alive.clone();
                    async move {
                        if liveness.tcp_connect(&ip.to_string(), TCP_FALLBACK_PORT).await
                            && alive.insert(ip.to_string())
                        {
                            Some(format!("Host {} is alive (TCP:{})", ip, TCP_FALLBACK_PORT))
                        } else {
                            None
                        }
                    }
                })
                .collect();
            results.extend(pool.run(probes).await.into_iter().flatten());
        }

        results.push(format!("Host discovery complete. Found {} alive hosts", alive.len()));

        log::debug!("[scan::host] scan_completed: network={} duration={}ms alive={}",
            network_range, scan_start.elapsed().as_millis(), alive.len());
        results
    }

    /// ARP-table sweep on a named interface. Independent of `scan`; failure
    /// modes come back as lines, never errors.
    pub async fn arp_sweep(&self, interface: &str) -> Vec<String> {
        probe::arp_sweep(interface).await
    }
}

/// Enumerate addresses in the network, bounded by `cap` so giant prefixes
/// never materialize. A /24 enumerates 256 addresses and therefore trips
/// the truncation notice upstream.
fn enumerate_hosts(network: &IpNetwork, cap: usize) -> Vec<IpAddr> {
    match network {
        IpNetwork::V4(net) => net.iter().take(cap).map(IpAddr::V4).collect(),
        IpNetwork::V6(net) => net.iter().take(cap).map(IpAddr::V6).collect(),
    }
}
