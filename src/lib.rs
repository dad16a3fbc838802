pub mod config;
pub mod logging;
pub mod pool;
pub mod probe;
pub mod scan;
pub mod types;
pub mod wordlist;

// Re-export key types and functions at the crate root
pub use config::Config;
pub use logging::init_logging;
pub use pool::ProbePool;
pub use probe::{HttpProbe, LivenessProbe, SystemProbe, TcpProbe};
pub use scan::{DirectoryBuster, HostScanner, PortScanner, VirtualHostScanner};
pub use types::{AliveSet, PortSpec};
