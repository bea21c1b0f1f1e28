//! rabbitmq-watcher - RabbitMQ statistics to Graphite
//!
//! Polls the RabbitMQ management API at a fixed interval and forwards the
//! statistics to a carbon plaintext listener.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use rabbitmq_watcher::{
    cli::{Cli, OutputFormat},
    config::Config,
    poller::{shutdown_signal, Poller},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    rabbitmq_watcher::init_logging(&cli.log_level.to_string(), cli.log_format)?;

    // Load configuration, then let CLI and environment win
    let mut config = Config::load_or_default(&cli.config)?;
    cli.apply_to(&mut config);
    config.validate()?;

    if cli.validate {
        print_config(&config, cli.output_format)?;
        return Ok(());
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        prefix = %config.prefix,
        broker = %format!("{}:{}", config.broker.host, config.broker.port),
        carbon = %config.carbon_addr(),
        "Starting rabbitmq-watcher"
    );

    let mut poller = Poller::from_config(&config)?;

    if cli.once {
        poller.run_round().await.log();
        return Ok(());
    }

    poller.run(shutdown_signal()).await;

    Ok(())
}

/// Print the effective configuration; structured formats keep stdout
/// machine-readable
fn print_config(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("Configuration is valid");
            println!("  prefix:              {}", config.prefix);
            println!("  interval:            {}s", config.interval_secs);
            println!(
                "  broker:              {}:{} (user {}, timeout {}ms)",
                config.broker.host,
                config.broker.port,
                config.broker.username,
                config.broker.timeout_ms
            );
            println!(
                "  carbon:              {} (timeout {}ms)",
                config.carbon_addr(),
                config.carbon.timeout_ms
            );
            println!("  queues:              {}", config.report.queues);
            println!(
                "  include_auto_delete: {}",
                config.report.include_auto_delete
            );
        }
        OutputFormat::Json => {
            eprintln!("Configuration is valid");
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        OutputFormat::Yaml => {
            eprintln!("Configuration is valid");
            print!("{}", serde_yaml::to_string(config)?);
        }
    }
    Ok(())
}
