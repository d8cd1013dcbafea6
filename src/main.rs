//! Binary entrypoint for the meshlink CLI.
//!
//! Commands:
//! - `start [--port <path>] [-b <baud>]` - connect to a device and maintain
//!   the live node model, logging decoded traffic
//! - `init` - create a starter `config.toml`
//! - `nodes` - print the cached node list without touching a device
//!
//! See the library crate docs for module-level details: `meshlink::`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use meshlink::config::Config;

#[derive(Parser)]
#[command(name = "meshlink")]
#[command(about = "Live mesh-network model over a Meshtastic-style serial link")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to a device and run the client loop
    Start {
        /// Device serial port (e.g., /dev/ttyUSB0); overrides the config file
        #[arg(short, long)]
        port: Option<String>,
        /// Baud rate
        #[arg(short = 'b', long)]
        baud: Option<u32>,
    },
    /// Write a default config.toml
    Init,
    /// List nodes from the local cache
    Nodes,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&config, cli.verbose);

    match cli.command {
        Commands::Start { port, baud } => {
            let config = config.unwrap_or_default();
            let port_name = port
                .or_else(|| {
                    let p = config.device.port.clone();
                    if p.is_empty() {
                        None
                    } else {
                        Some(p)
                    }
                })
                .ok_or_else(|| anyhow::anyhow!("no serial port given (use --port or config)"))?;
            let baud = baud.unwrap_or(config.device.baud_rate);
            run_client(config, &port_name, baud).await
        }
        Commands::Init => {
            Config::create_default(&cli.config).await?;
            println!("Wrote default configuration to {}", cli.config);
            Ok(())
        }
        Commands::Nodes => {
            let config = config.unwrap_or_default();
            list_nodes(&config)
        }
    }
}

fn init_logging(config: &Option<Config>, verbose: u8) {
    let default_level = match verbose {
        0 => config
            .as_ref()
            .map(|c| c.logging.level.clone())
            .unwrap_or_else(|| "info".to_string()),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn list_nodes(config: &Config) -> Result<()> {
    use meshlink::nodes::persist::{JsonNodeCache, NodePersistence};

    let cache = JsonNodeCache::open(&config.node_cache.path);
    let nodes = cache.load_all()?;
    if nodes.is_empty() {
        println!("No cached nodes at {}", config.node_cache.path);
        return Ok(());
    }
    for n in nodes {
        println!(
            "!{:08x}  {:<6} {:<24} last heard {}",
            n.num,
            n.short_name,
            n.long_name,
            n.last_heard.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}

#[cfg(feature = "serial")]
async fn run_client(config: Config, port_name: &str, baud: u32) -> Result<()> {
    use std::io::{Read, Write};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use anyhow::anyhow;
    use log::{debug, warn};
    use meshlink::link::{
        CorrelationEvent, FrameDecoder, PacketBody, PacketCodec, RequestCorrelator,
    };
    use meshlink::logutil::{escape_log, hex_snippet};
    use meshlink::nodes::{persist::JsonNodeCache, NodeStore};
    use tokio::time::{interval, sleep};

    info!("Opening serial port {} at {} baud", port_name, baud);
    let mut port = serialport::new(port_name, baud)
        .timeout(Duration::from_millis(100))
        .open()
        .map_err(|e| anyhow!("failed to open serial port {}: {}", port_name, e))?;

    // Toggle DTR/RTS so the device wakes, then drop any buffered startup text.
    let _ = port.write_data_terminal_ready(true);
    let _ = port.write_request_to_send(true);
    sleep(Duration::from_millis(150)).await;
    let mut purge = [0u8; 512];
    if matches!(port.bytes_to_read(), Ok(n) if n > 0) {
        let _ = port.read(&mut purge);
    }

    let mut framer = FrameDecoder::new();
    let mut codec = PacketCodec::new();
    let mut correlator = RequestCorrelator::new();
    let store = NodeStore::new(Arc::new(JsonNodeCache::open(&config.node_cache.path)));
    match store.load_from_persistence() {
        Ok(n) if n > 0 => info!("Loaded {} cached nodes", n),
        Ok(_) => {}
        Err(e) => warn!("Node cache load failed: {}", e),
    }

    let config_id = correlator.begin_config();
    info!("Requesting device config (id=0x{:08x})", config_id);
    port.write_all(&codec.want_config(config_id))?;
    port.flush()?;
    let mut last_want_config = Instant::now();

    let mut read_tick = interval(Duration::from_millis(10));
    // Fast heartbeat keeps the link warm while the config burst streams in;
    // the slow keep-alive runs for the life of the connection.
    let mut fast_heartbeat = interval(Duration::from_secs(2));
    let mut keepalive = interval(Duration::from_secs(30));
    let mut buffer = [0u8; 1024];

    loop {
        tokio::select! {
            _ = read_tick.tick() => {
                let read = match port.read(&mut buffer) {
                    Ok(n) => n,
                    Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => 0,
                    Err(e) => {
                        warn!("serial read error (continuing): {}", e);
                        sleep(Duration::from_millis(50)).await;
                        0
                    }
                };
                if read == 0 {
                    continue;
                }
                for frame in framer.push(&buffer[..read]) {
                    let pkt = match codec.decode(&frame) {
                        Ok(pkt) => pkt,
                        Err(e) => {
                            debug!("dropping frame ({}): {}", e, hex_snippet(&frame, 32));
                            continue;
                        }
                    };
                    if let PacketBody::MyNodeInfo { node_num } = pkt.body {
                        if codec.local_node().is_none() {
                            info!("Device node id is !{:08x}", node_num);
                            codec.set_local_node(node_num);
                        }
                    }
                    if let PacketBody::Text(t) = &pkt.body {
                        info!("Message from !{:08x}: {}", pkt.from, escape_log(&t.text));
                    }
                    store.apply_packet(&pkt);
                    if let Some(CorrelationEvent::ConfigComplete { config_id }) =
                        correlator.observe(&pkt)
                    {
                        info!(
                            "Config sync complete (id=0x{:08x}), {} nodes known",
                            config_id,
                            store.len()
                        );
                    }
                }
            }
            _ = fast_heartbeat.tick(), if correlator.config_pending().is_some() => {
                port.write_all(&codec.heartbeat())?;
                port.flush()?;
                if last_want_config.elapsed() > Duration::from_secs(7) {
                    if let Some(id) = correlator.config_pending() {
                        debug!("resending want_config (id=0x{:08x})", id);
                        port.write_all(&codec.want_config(id))?;
                        port.flush()?;
                        last_want_config = Instant::now();
                    }
                }
            }
            _ = keepalive.tick() => {
                port.write_all(&codec.heartbeat())?;
                port.flush()?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }
    Ok(())
}

#[cfg(not(feature = "serial"))]
async fn run_client(_config: Config, _port_name: &str, _baud: u32) -> Result<()> {
    Err(anyhow::anyhow!(
        "this build has no serial support; rebuild with --features serial"
    ))
}
