use eyre::{Result, WrapErr};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// A parsed port specification: a single port (`"80"`), a comma-separated
/// set (`"22,80,443"`), or an inclusive range (`"1-1000"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSpec {
    ports: Vec<u16>,
}

impl PortSpec {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            eyre::bail!("empty port specification");
        }

        let mut ports = Vec::new();
        for part in input.split(',') {
            let part = part.trim();
            if let Some((start, end)) = part.split_once('-') {
                let start = parse_port(start)?;
                let end = parse_port(end)?;
                if start > end {
                    eyre::bail!("invalid port range '{}': start exceeds end", part);
                }
                ports.extend(start..=end);
            } else {
                ports.push(parse_port(part)?);
            }
        }

        log::debug!("[types] port_spec_parsed: input={} count={}", input, ports.len());
        Ok(Self { ports })
    }

    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

fn parse_port(s: &str) -> Result<u16> {
    let value: u32 = s
        .trim()
        .parse()
        .wrap_err_with(|| format!("invalid port '{}'", s.trim()))?;
    if !(1..=65535).contains(&value) {
        eyre::bail!("port {} out of range [1,65535]", value);
    }
    Ok(value as u16)
}

/// Concurrency-safe set of discovered hosts or ports. Insert is atomic and
/// idempotent; membership only grows within one scan. Worker tasks share
/// clones, the owning scan reads the count after its pool drains.
#[derive(Debug, Clone, Default)]
pub struct AliveSet {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl AliveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the entry was not already present.
    pub fn insert(&self, entry: impl Into<String>) -> bool {
        self.inner.lock().unwrap().insert(entry.into())
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.inner.lock().unwrap().contains(entry)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}
