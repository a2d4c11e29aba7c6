use color_eyre::eyre::{Result, WrapErr};
use duosrv::{App, AppConfig};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn usage(program: &str) {
    eprintln!("Usage: {program} [address] [port] [root]");
    eprintln!("  address: IP address both listeners bind to (default: 127.0.0.1)");
    eprintln!("  port:    TCP and UDP port (default: 8080)");
    eprintln!("  root:    Directory served over HTTP (default: current directory)");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {program}                              # HTTP and UDP on 127.0.0.1:8080, serving .");
    eprintln!("  {program} 0.0.0.0 9000                 # Listen on all interfaces, port 9000");
    eprintln!("  {program} 192.168.2.1 80 /srv/www      # Serve /srv/www on port 80");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Initialize logging; RUST_LOG overrides the default filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("duosrv=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("duosrv");

    if args.iter().skip(1).any(|a| a == "-h" || a == "--help") {
        usage(program);
        return Ok(());
    }
    if args.len() > 4 {
        usage(program);
        std::process::exit(1);
    }

    let ip = match args.get(1).map(|a| a.parse::<IpAddr>()) {
        None => IpAddr::from([127, 0, 0, 1]),
        Some(Ok(ip)) => ip,
        Some(Err(_)) => {
            eprintln!("Invalid address: {}", args[1]);
            usage(program);
            std::process::exit(1);
        }
    };
    let port = match args.get(2).map(|a| a.parse::<u16>()) {
        None => 8080,
        Some(Ok(port)) => port,
        Some(Err(_)) => {
            eprintln!("Invalid port: {}", args[2]);
            usage(program);
            std::process::exit(1);
        }
    };
    let root = args
        .get(3)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let config = AppConfig::new(SocketAddr::new(ip, port), root);
    info!(
        address = %config.http.bind_addr,
        root = %config.http.root.display(),
        max_connections = config.http.max_connections,
        "Starting HTTP file server and UDP greeting server"
    );

    let app = App::bind(config).await.wrap_err("Failed to start listeners")?;
    info!(http = %app.http_addr(), udp = %app.udp_addr(), "Listeners bound");

    app.run().await.wrap_err("Server stopped with an error")?;

    info!("Shut down cleanly");
    Ok(())
}
