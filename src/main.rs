use clap::{Parser, Subcommand};
use eyre::Result;
use netrecon::{Config, DirectoryBuster, HostScanner, PortScanner, VirtualHostScanner};

#[derive(Parser)]
#[command(name = "netrecon")]
#[command(about = "Network reconnaissance toolkit")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// TCP port scan with optional service identification
    Ports {
        /// Target host or IP address
        target: String,

        /// Port specification: single, comma set, or range (e.g. 1-1000)
        #[arg(short, long, default_value = "1-1000")]
        ports: String,

        /// Worker count (clamped to the configured range)
        #[arg(short, long, default_value_t = 50)]
        threads: usize,

        /// Skip banner grabbing and service classification
        #[arg(long)]
        no_service_detection: bool,

        /// Skip the liveness pre-check
        #[arg(long)]
        no_liveness_check: bool,
    },

    /// Enumerate directories and files on a web server
    Dirs {
        /// Base URL (scheme defaults to http://)
        url: String,

        /// Wordlist file, one candidate path per line
        #[arg(short, long, default_value = "wordlists/common_dirs.txt")]
        wordlist: String,

        /// Extensions to append to each candidate (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        extensions: Option<Vec<String>>,
    },

    /// Discover virtual hosts via differential Host-header probing
    Vhosts {
        /// Target IP address
        target_ip: String,

        /// Base domain for candidate subdomains
        domain: String,

        /// Wordlist file, one subdomain label per line
        #[arg(short, long, default_value = "wordlists/common_vhosts.txt")]
        wordlist: String,
    },

    /// Discover alive hosts on a network range
    Hosts {
        /// CIDR network range (e.g. 192.168.1.0/24)
        cidr: String,
    },

    /// ARP-table sweep on a network interface (requires privileges)
    Arp {
        /// Network interface name
        #[arg(short, long, default_value = "eth0")]
        interface: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    netrecon::init_logging();

    let args = Args::parse();
    let config = Config::from_env();

    let lines = match args.command {
        Command::Ports { target, ports, threads, no_service_detection, no_liveness_check } => {
            let mut config = config;
            config.service_detection = !no_service_detection;
            config.host_discovery = !no_liveness_check;
            PortScanner::new(config).scan(&target, &ports, threads).await
        }
        Command::Dirs { url, wordlist, extensions } => {
            DirectoryBuster::new(config)?.scan(&url, &wordlist, extensions).await
        }
        Command::Vhosts { target_ip, domain, wordlist } => {
            VirtualHostScanner::new(config)?.scan(&target_ip, &domain, &wordlist).await
        }
        Command::Hosts { cidr } => HostScanner::new(config).scan(&cidr).await,
        Command::Arp { interface } => HostScanner::new(config).arp_sweep(&interface).await,
    };

    for line in lines {
        println!("{}", line);
    }

    Ok(())
}
