use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use vanith_feed::views::CounterAnimation;
use vanith_feed::{hero_line, render_page, DataClient, FeedConfig, Poller, Published, RenderOptions};

/// Live console view of the Vanith community server
#[derive(Debug, Parser)]
#[command(name = "vanith-feed", version, about)]
struct Cli {
    /// Config file (defaults to $VANITH_FEED_CONFIG or the OS config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fetch one snapshot, print it and exit
    #[arg(long)]
    once: bool,

    /// Only list members whose username or display name contains this
    #[arg(long)]
    search: Option<String>,

    /// Poll interval in seconds
    #[arg(long)]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vanith_feed=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = FeedConfig::load(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;
    if let Some(search) = cli.search {
        config.display.search = Some(search);
    }
    if let Some(secs) = cli.interval {
        config.polling.interval_secs = secs;
        config.validate().context("Invalid --interval")?;
    }

    let client = DataClient::new(&config.api).context("Failed to create data client")?;
    let options = RenderOptions::from(&config.display);
    info!("Vanith feed starting against {}", client.url());

    if cli.once {
        let published = Published::new(1, client.fetch().await);
        count_up_members(&published).await;
        println!("{}", render_page(Some(&published), &options, Utc::now()));
        return Ok(());
    }

    run(client, &config, &options).await
}

async fn run(client: DataClient, config: &FeedConfig, options: &RenderOptions) -> Result<()> {
    let mut poller = Poller::new(client, config.poll_interval());
    let mut updates = poller.store().subscribe();

    println!("{}", render_page(None, options, Utc::now()));

    poller.start(
        |published| {
            if let Some(kind) = published.failure() {
                warn!(cycle = published.cycle, %kind, "Showing fallback snapshot");
            } else {
                info!(cycle = published.cycle, "Snapshot updated");
            }
        },
        || error!("Fetch task stopped unexpectedly"),
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut counted = false;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = updates.borrow_and_update().clone();
                if let Some(published) = latest {
                    if !counted {
                        count_up_members(&published).await;
                        counted = true;
                    }
                    println!("\n{}", render_page(Some(&published), options, Utc::now()));
                }
            }
            signal = &mut shutdown => {
                if let Err(e) = signal {
                    error!("Failed to listen for Ctrl-C: {}", e);
                }
                info!("Shutting down");
                break;
            }
        }
    }

    poller.stop().await;
    Ok(())
}

/// Count the member total up on the title line once stats first arrive
async fn count_up_members(published: &Published) {
    let mut out = std::io::stdout();
    if !out.is_terminal() {
        return;
    }
    let Some(counter) = CounterAnimation::for_value(Some(published.snapshot.stats.total_members)) else {
        return;
    };

    counter
        .play(|value| {
            let _ = write!(out, "\r{}", hero_line(Some(value)));
            let _ = out.flush();
        })
        .await;
    let _ = writeln!(out);
}
