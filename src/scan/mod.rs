pub mod dirbust;
pub mod host;
pub mod port;
pub mod vhost;

pub use dirbust::DirectoryBuster;
pub use host::HostScanner;
pub use port::PortScanner;
pub use vhost::VirtualHostScanner;
