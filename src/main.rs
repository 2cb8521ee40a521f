use clap::Parser;
use std::path::Path;
use swing_bot::cli::{Cli, Commands};
use swing_bot::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Load configuration
    let config = if Path::new(&cli.config).exists() {
        Config::load(&cli.config)?
    } else {
        eprintln!("Warning: {} not found, using default configuration", cli.config);
        Config::default()
    };

    // Initialize telemetry
    let _telemetry = swing_bot::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            args.execute(&config).await?;
        }
        Commands::Market(args) => {
            args.execute(&config).await?;
        }
        Commands::Config => {
            config.validate()?;
            println!("Current configuration:");
            println!(
                "  Feed: {} ({})",
                config.feed.product_id, config.feed.ws_url
            );
            println!(
                "  Market: {}-<month>-<day>, refresh every {}s",
                config.market.slug_prefix, config.market.refresh_interval_secs
            );
            println!(
                "  Signal: >{}% within {}s",
                config.signal.threshold_percent, config.signal.window_seconds
            );
            println!(
                "  Trading: size={}, cooldown={}s, monitor={}s",
                config.trading.order_size,
                config.trading.cooldown_secs,
                config.trading.monitor_interval_secs
            );
            println!(
                "  Exit: target={}%, stop={}%/{}%, dust={}",
                config.exit.profit_target_percent,
                config.exit.stop_loss_tight_percent,
                config.exit.stop_loss_loose_percent,
                config.exit.dust_threshold
            );
            println!(
                "  Risk: floor={}, max entry={}, deep loss={}%/{}%",
                config.risk.risk_price_floor,
                config.risk.max_entry_price,
                config.risk.deep_loss_bound_risky,
                config.risk.deep_loss_bound
            );
            println!("  Execution: {:?}", config.execution.mode);
            println!(
                "  Shutdown: drain={}",
                config.shutdown.drain_on_shutdown
            );
        }
    }

    Ok(())
}
