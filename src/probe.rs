use crate::config::Config;
use async_trait::async_trait;
use eyre::{Result, WrapErr};
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::process::Command;
use tokio::time::timeout;

const ARP_SCAN_TIMEOUT_SECS: u64 = 30;
const BANNER_READ_TIMEOUT_MS: u64 = 500;
const HTTP_BANNER_TIMEOUT_MS: u64 = 1000;

/// Outcome of a single TCP connect probe. Timeouts and refused connections
/// both read as `Closed`; only unexpected socket failures carry a reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TcpOutcome {
    Open { banner: Option<String> },
    Closed,
    Error(String),
}

/// One bounded-time TCP connect against a single address, with optional
/// banner grabbing for service identification.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    connect_timeout: Duration,
    banner_timeout: Duration,
    banner_budget: usize,
}

impl TcpProbe {
    pub fn new(config: &Config) -> Self {
        Self {
            connect_timeout: config.tcp_timeout,
            banner_timeout: config.banner_timeout,
            banner_budget: config.banner_budget,
        }
    }

    pub async fn connect(&self, addr: SocketAddr) -> TcpOutcome {
        match timeout(self.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => TcpOutcome::Open { banner: None },
            Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => TcpOutcome::Closed,
            Ok(Err(e)) => TcpOutcome::Error(e.to_string()),
            Err(_) => TcpOutcome::Closed,
        }
    }

    pub async fn connect_with_banner(&self, addr: SocketAddr) -> TcpOutcome {
        match timeout(self.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(mut stream)) => {
                let banner = timeout(self.banner_timeout, self.grab_banner(&mut stream, addr.port()))
                    .await
                    .ok()
                    .flatten();
                if let Some(ref banner) = banner {
                    log::trace!("[probe] banner_grabbed: addr={} len={}", addr, banner.len());
                }
                TcpOutcome::Open { banner }
            }
            Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => TcpOutcome::Closed,
            Ok(Err(e)) => TcpOutcome::Error(e.to_string()),
            Err(_) => TcpOutcome::Closed,
        }
    }

    /// Banner strategy varies by port: chatty protocols speak first,
    /// HTTP-ish ports need a request, everything else gets a read then a
    /// CRLF nudge. Failure to read anything is a silent fallback.
    async fn grab_banner(&self, stream: &mut TcpStream, port: u16) -> Option<String> {
        match port {
            21 | 22 | 25 | 110 | 143 | 220 | 993 | 995 => self.read_banner(stream).await,
            80 | 443 | 8080 | 8443 => self.grab_http_banner(stream).await,
            _ => {
                if let Some(banner) = self.read_banner(stream).await {
                    Some(banner)
                } else {
                    self.nudge_service(stream).await
                }
            }
        }
    }

    async fn read_banner(&self, stream: &mut TcpStream) -> Option<String> {
        let mut buffer = vec![0u8; self.banner_budget];
        match timeout(Duration::from_millis(BANNER_READ_TIMEOUT_MS), stream.read(&mut buffer)).await {
            Ok(Ok(n)) if n > 0 => {
                let banner = String::from_utf8_lossy(&buffer[..n]).trim().to_string();
                if banner.is_empty() { None } else { Some(banner) }
            }
            _ => None,
        }
    }

    async fn grab_http_banner(&self, stream: &mut TcpStream) -> Option<String> {
        if stream.write_all(b"GET / HTTP/1.0\r\n\r\n").await.is_err() {
            return None;
        }
        let mut buffer = vec![0u8; self.banner_budget];
        if let Ok(Ok(n)) = timeout(Duration::from_millis(HTTP_BANNER_TIMEOUT_MS), stream.read(&mut buffer)).await {
            if n > 0 {
                let response = String::from_utf8_lossy(&buffer[..n]);
                // Prefer the Server header, else the status line
                for line in response.lines() {
                    if line.to_lowercase().starts_with("server:") {
                        return Some(line.trim().to_string());
                    }
                }
                return response.lines().next().map(|s| s.trim().to_string());
            }
        }
        None
    }

    async fn nudge_service(&self, stream: &mut TcpStream) -> Option<String> {
        if stream.write_all(b"\r\n").await.is_err() {
            return None;
        }
        self.read_banner(stream).await
    }
}

/// Classify an open port by banner content, falling back to a static
/// port-to-service table, then to "Unknown Service". Matching is
/// case-insensitive substring search against known protocol markers.
pub fn identify_service(banner: Option<&str>, port: u16) -> String {
    if let Some(banner) = banner {
        let lower = banner.to_lowercase();
        if lower.contains("ssh") {
            return "SSH".to_string();
        }
        if lower.contains("ftp") {
            return "FTP".to_string();
        }
        if lower.contains("smtp") {
            return "SMTP".to_string();
        }
        if lower.contains("pop3") {
            return "POP3".to_string();
        }
        if lower.contains("imap") {
            return "IMAP".to_string();
        }
        if lower.contains("mysql") {
            return "MySQL".to_string();
        }
        if lower.contains("http") || lower.contains("server:") {
            return "HTTP".to_string();
        }
    }
    service_name_for_port(port)
        .map(String::from)
        .unwrap_or_else(|| "Unknown Service".to_string())
}

fn service_name_for_port(port: u16) -> Option<&'static str> {
    match port {
        21 => Some("FTP"),
        22 => Some("SSH"),
        23 => Some("Telnet"),
        25 => Some("SMTP"),
        53 => Some("DNS"),
        80 => Some("HTTP"),
        110 => Some("POP3"),
        143 => Some("IMAP"),
        443 => Some("HTTPS"),
        993 => Some("IMAPS"),
        995 => Some("POP3S"),
        3306 => Some("MySQL"),
        3389 => Some("RDP"),
        5432 => Some("PostgreSQL"),
        6379 => Some("Redis"),
        8080 => Some("HTTP-Proxy"),
        27017 => Some("MongoDB"),
        _ => None,
    }
}

/// Outcome of a single HTTP GET probe: status and body length, or the
/// network-level failure reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpOutcome {
    Response { status: u16, body_len: usize },
    Error(String),
}

/// One HTTP GET with a fixed deadline, scanner User-Agent, and redirects
/// suppressed. Shared by the directory and virtual-host scanners.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .wrap_err("failed to build HTTP client")?;
        Ok(Self { client })
    }

    pub async fn get(&self, url: &str) -> HttpOutcome {
        self.send(self.client.get(url)).await
    }

    /// GET with an overridden Host header, for differential vhost probing.
    pub async fn get_with_host(&self, url: &str, host: &str) -> HttpOutcome {
        self.send(self.client.get(url).header(reqwest::header::HOST, host)).await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> HttpOutcome {
        match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let body_len = match response.bytes().await {
                    Ok(body) => body.len(),
                    Err(_) => 0,
                };
                HttpOutcome::Response { status, body_len }
            }
            Err(e) => HttpOutcome::Error(e.to_string()),
        }
    }
}

/// Narrow capability interface for host liveness so scanner tests can
/// substitute fakes instead of spawning subprocesses or opening sockets.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    /// Single ping-equivalent echo; false on unavailable utility as well as
    /// on an unreachable host.
    async fn ping(&self, addr: &str) -> bool;

    /// Bounded TCP connect attempt.
    async fn tcp_connect(&self, addr: &str, port: u16) -> bool;
}

/// Production liveness probe: external `ping` single echo plus direct TCP
/// connect attempts.
#[derive(Debug, Clone)]
pub struct SystemProbe {
    ping_timeout: Duration,
    tcp_timeout: Duration,
}

impl SystemProbe {
    pub fn new(config: &Config) -> Self {
        Self {
            ping_timeout: config.ping_timeout,
            tcp_timeout: config.tcp_timeout,
        }
    }
}

#[async_trait]
impl LivenessProbe for SystemProbe {
    async fn ping(&self, addr: &str) -> bool {
        let wait_secs = self.ping_timeout.as_secs().max(1).to_string();
        let output = Command::new("ping")
            .args(["-c", "1", "-W", &wait_secs, addr])
            .kill_on_drop(true)
            .output()
            .await;

        match output {
            Ok(out) => {
                log::trace!("[probe] ping_completed: addr={} status={}", addr, out.status);
                out.status.success()
            }
            Err(e) => {
                log::debug!("[probe] ping_unavailable: addr={} error={}", addr, e);
                false
            }
        }
    }

    async fn tcp_connect(&self, addr: &str, port: u16) -> bool {
        matches!(
            timeout(self.tcp_timeout, TcpStream::connect((addr, port))).await,
            Ok(Ok(_))
        )
    }
}

/// ARP-table sweep via the external `arp-scan` utility on a named interface.
/// Requires elevated privileges on most platforms; every failure mode is
/// surfaced as a result line, never an error.
pub async fn arp_sweep(interface: &str) -> Vec<String> {
    log::debug!("[probe] arp_sweep: interface={}", interface);

    let iface_arg = format!("-I{}", interface);
    let command = Command::new("arp-scan")
        .args(["-l", &iface_arg])
        .kill_on_drop(true)
        .output();

    match timeout(Duration::from_secs(ARP_SCAN_TIMEOUT_SECS), command).await {
        Err(_) => vec!["ARP scan timed out".to_string()],
        Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
            vec!["arp-scan not found - install arp-scan package".to_string()]
        }
        Ok(Err(e)) => vec![format!("ARP scan error: {}", e)],
        Ok(Ok(out)) if out.status.success() => String::from_utf8_lossy(&out.stdout)
            .lines()
            .map(String::from)
            .collect(),
        Ok(Ok(_)) => vec!["ARP scan failed - may require root privileges".to_string()],
    }
}
