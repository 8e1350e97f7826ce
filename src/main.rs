mod cli;

use camview::{config, server};
use camview_av::ToolRegistry;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::time::Duration;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    // Load config
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting camview server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    server::start_server(config).await
}

/// Filter used when `RUST_LOG` is unset. camview_av stays at debug so
/// transcoder stderr is always visible.
fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "camview=trace,camview_av=trace,camview_probe=trace,camview_common=debug,tower_http=debug"
    } else {
        "camview=info,camview_av=debug,camview_probe=info,tower_http=info"
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| default_log_filter(cli.verbose).to_string());

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            // Create tokio runtime
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Probe {
            url,
            json,
            timeout_ms,
        } => probe_url(&url, json, timeout_ms, cli.config.as_deref()),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("camview {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn probe_url(
    url: &str,
    json: bool,
    timeout_ms: Option<u64>,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let timeout = timeout_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.probe.timeout());

    let endpoint = camview_common::resolve(url).context("Invalid stream URL")?;

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(camview_probe::probe(&endpoint, timeout));

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let status = if result.ok { "✓" } else { "✗" };
        println!("{} {}", status, endpoint);
        println!("  {}", result.message);
        if let Some(ms) = result.round_trip_ms {
            println!("  Round trip: {} ms", ms);
        }
    }

    if !result.ok {
        anyhow::bail!("{} is not reachable", endpoint);
    }
    Ok(())
}

fn check_tools(config_path: Option<&std::path::Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let registry = ToolRegistry::discover(config.tools.ffmpeg_path.as_deref());
    let tools = registry.check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Live streaming needs ffmpeg.");
    }

    Ok(())
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Probe timeout: {} ms", config.probe.timeout_ms);
            match config.tools.ffmpeg_path {
                Some(ref path) => println!("  ffmpeg: {}", path.display()),
                None => println!("  ffmpeg: from PATH"),
            }
            if let Some(ref dir) = config.server.static_dir {
                println!("  Static files: {}", dir.display());
            }
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Probe timeout: {} ms", config.probe.timeout_ms);
        }
    }

    Ok(())
}
