use anyhow::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use courtwatch::booking::BookingClient;
use courtwatch::cli::{parse_args, print_help};
use courtwatch::config::Config;
use courtwatch::notify::Notifier;
use courtwatch::orchestrator::{run_check, CheckOptions};
use courtwatch::publish::Publisher;
use courtwatch::redact;
use courtwatch::scheduler::run_scheduler;

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args();

    if args.help {
        print_help();
        return Ok(());
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("courtwatch=info".parse()?))
        .init();

    info!("CourtWatch v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("  Booking site: {} (grid {})", config.booking_base_url, config.booking_grid_id);
    info!("  Session: {}", redact::secret(&config.booking_session_id));
    info!("  Days ahead: {}, minimum slot: {}m", config.days_ahead, config.min_duration_minutes);
    info!("  Timezone: {}", config.timezone);
    info!("  State file: {}", config.state_path.display());

    // Handle --validate mode
    if args.validate {
        info!("Validating configuration...");
        match config.validate() {
            Ok(()) => {
                info!("Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        }
    }

    config.validate()?;

    let client = Arc::new(BookingClient::new(config.booking())?);
    let notifier = Arc::new(Notifier::new(&config));
    let publisher = Arc::new(if args.dry_run {
        Publisher::disabled()
    } else {
        Publisher::new(&config)
    });
    if publisher.is_enabled() {
        info!("Git publishing enabled (push: {})", config.git_push);
    }

    let options = CheckOptions {
        dry_run: args.dry_run,
    };

    // Run a single scan or start the scheduler
    if args.once || args.dry_run {
        info!("Running single scan");
        let summary = run_check(&config, &client, &notifier, &publisher, options).await?;
        info!(
            "Scan finished: {} days, {} failed, {} slots, {} new",
            summary.days_scanned, summary.days_failed, summary.slots_found, summary.new_slots
        );
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            shutdown.cancel();
        }
    });

    let schedule = config.poll_schedule();
    let timezone = config.timezone;
    let config = Arc::new(config);

    run_scheduler(schedule, timezone, cancel, || {
        let config = config.clone();
        let client = client.clone();
        let notifier = notifier.clone();
        let publisher = publisher.clone();
        async move {
            if let Err(e) = run_check(&config, &client, &notifier, &publisher, options).await {
                error!("Scan failed: {:#}", e);
            }
        }
    })
    .await;

    Ok(())
}
