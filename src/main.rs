use clap::Parser;
use tickerwatch::cli::{Cli, Commands, Context};
use tickerwatch::config::Config;
use tickerwatch::paths::DataPaths;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    let paths = DataPaths::resolve(config.paths.data_dir.as_deref())?;
    paths.ensure()?;

    // Initialize telemetry
    let _telemetry = tickerwatch::telemetry::init_telemetry(&config.telemetry, paths.root())?;

    if let Some(key) = &cli.key {
        paths.write_api_key(key)?;
    }

    let ctx = Context::new(config, paths);

    match cli.command {
        Commands::Watch(args) => {
            tracing::info!("Starting watch");
            args.execute(&ctx).await?;
        }
        Commands::Search(args) => args.execute(&ctx).await?,
        Commands::Stats(args) => args.execute(&ctx).await?,
        Commands::Symbols(args) => args.execute(&ctx).await?,
        Commands::Config => {
            let config = &ctx.config;
            println!("Current configuration:");
            println!("  Data dir: {}", ctx.paths.root().display());
            println!("  Finnhub: {} / {}", config.finnhub.rest_url, config.finnhub.ws_url);
            println!("  Coinbase: {}", config.coinbase.ws_url);
            println!(
                "  Stream: read_timeout={:?}s reconnects={}",
                config.stream.read_timeout_secs, config.stream.max_reconnect_attempts
            );
            println!(
                "  Loops: market_idle={}ms worker_idle={}ms stats_refresh={}s",
                config.markets.market_idle_ms,
                config.markets.worker_idle_ms,
                config.markets.stats_refresh_secs
            );
            println!(
                "  Telemetry: level={} format={:?} log_file={} metrics_port={:?}",
                config.telemetry.log_level,
                config.telemetry.log_format,
                config.telemetry.log_file,
                config.telemetry.metrics_port
            );
        }
    }

    Ok(())
}
