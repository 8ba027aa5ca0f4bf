//! # Watchface Application Entry Point
//!
//! This binary wires the watchface to its services: the tokio event loop, the
//! in-process AppMessage link and the phone-side weather companion.
//! It supports both watch mode (runs until Ctrl-C) and development mode
//! (`--stdout`: one frame printed as text).

use std::env;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use tracing::{info, warn};
use watchface_lib::{
    companion::{Companion, OpenMeteo, WeatherCache},
    config::{Config, CONFIG_FILE},
    runtime::{LogVibes, Runtime, SysfsBattery},
    transport::AppMessage,
    FontVariant,
};

/// Command line options
struct Args {
    /// Print one frame and exit
    stdout: bool,
    /// Force the Pirulen font variant
    pirulen: bool,
    config_path: String,
}

impl Args {
    fn parse() -> anyhow::Result<Self> {
        let mut args = Args {
            stdout: false,
            pirulen: false,
            config_path: CONFIG_FILE.to_string(),
        };

        let mut iter = env::args().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--stdout" => args.stdout = true,
                "--pirulen" => args.pirulen = true,
                "--config" => {
                    args.config_path = iter.next().context("--config needs a path")?;
                }
                other => anyhow::bail!("unknown argument: {other}"),
            }
        }
        Ok(args)
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse()?;
    let mut config = Config::load_from_path(&args.config_path);
    if args.pirulen {
        config.face.font = FontVariant::Pirulen;
    }

    // Create Tokio runtime for the event loop and the companion
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config, args.stdout))
}

async fn run(config: Config, development_mode: bool) -> anyhow::Result<()> {
    let (link, phone) = AppMessage::open(config.message.inbox_size, config.message.outbox_size);

    // Phone side: answers weather requests until the link closes
    let source = OpenMeteo::new(&config.weather).context("building weather client")?;
    let companion = Companion::new(source, WeatherCache::from_config(&config.weather));
    let phone_task = tokio::spawn(companion.run(phone));

    let mut watch = Runtime::new(&config, SysfsBattery::new(), LogVibes, link);

    // Development mode: one frame as text for testing without a watch
    if development_mode {
        watch.start(Local::now().naive_local());
        let wait = Duration::from_secs(config.weather.timeout_secs + 1);
        if !watch.settle(wait).await {
            warn!("no weather reply within {:?}", wait);
        }
        print!("{}", watch.render().to_ascii());
        return Ok(());
    }

    watch
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await;

    // Dropping the watch closes the link, which ends the companion
    drop(watch);
    phone_task.await.context("companion task panicked")?;
    info!("bye");
    Ok(())
}
