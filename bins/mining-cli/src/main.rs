//! Mining CLI
//!
//! Talks to the mining API directly for one-off calls, or drives a full
//! client session (`session`) that replays interactions until a deadline or
//! Ctrl+C.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mining_client::{
    ActivitySubmission, ActivityType, DailyLimits, HttpMiningBackend, MiningBackend, MiningConfig,
    MiningError, MiningHealthWatchdog, MiningSessionController, SyncEvent,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "mining-cli")]
#[command(about = "Social mining client")]
struct Args {
    /// Mining API base URL
    #[arg(long, env = "MINING_API_URL", default_value = "http://localhost:8000")]
    api_url: String,

    /// User to act as
    #[arg(short, long, env = "MINING_USER_ID")]
    user_id: String,

    /// Bearer token for the API
    #[arg(long, env = "MINING_API_TOKEN")]
    token: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "15")]
    timeout_secs: u64,

    /// JSON file overriding the per-type daily limits
    #[arg(long)]
    limits: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print mining stats
    Status,
    /// Start a mining session
    Start,
    /// Stop the current mining session
    Stop,
    /// Send one heartbeat
    Heartbeat,
    /// Record a single activity
    Record {
        activity: ActivityType,
        /// Defaults to the activity's standard reward
        #[arg(long)]
        points: Option<u64>,
        #[arg(long)]
        tokens: Option<f64>,
    },
    /// Run a client session, cycling through `activities`
    Session {
        #[arg(long, default_value = "60")]
        duration_secs: u64,
        /// Seconds between interactions
        #[arg(long, default_value = "2")]
        every_secs: u64,
        #[arg(value_delimiter = ',', default_value = "like,comment,post")]
        activities: Vec<ActivityType>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mining_cli=debug,mining_client=debug".into()),
        )
        .init();

    let args = Args::parse();
    let timeout = Duration::from_secs(args.timeout_secs);
    let mut backend = HttpMiningBackend::new(&args.api_url, timeout)?;
    if let Some(token) = &args.token {
        backend = backend.with_auth_token(token.clone());
    }
    info!(api_url = %backend.base_url(), user_id = %args.user_id, "Mining client ready");

    match &args.command {
        Command::Status => {
            let stats = backend.get_mining_stats(&args.user_id).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Start => {
            let ok = backend.start_mining(&args.user_id).await?;
            println!("{}", if ok { "Mining started" } else { "Start refused" });
        }
        Command::Stop => {
            let ok = backend.stop_mining(&args.user_id).await?;
            println!("{}", if ok { "Mining stopped" } else { "Stop refused" });
        }
        Command::Heartbeat => {
            let ok = backend.send_heartbeat(&args.user_id).await?;
            println!("heartbeat: {ok}");
        }
        Command::Record {
            activity,
            points,
            tokens,
        } => {
            let (default_points, default_tokens) = activity.default_reward();
            let submission = ActivitySubmission {
                activity: *activity,
                points: points.unwrap_or(default_points),
                tokens: tokens.unwrap_or(default_tokens),
            };
            let outcome = backend.record_activity(&args.user_id, &submission).await?;
            println!("{outcome:?}");
        }
        Command::Session {
            duration_secs,
            every_secs,
            activities,
        } => {
            let mut config = MiningConfig::default().with_request_timeout(timeout);
            if let Some(path) = &args.limits {
                let limits = DailyLimits::from_json_file(path)
                    .with_context(|| format!("Failed to load limits from {}", path.display()))?;
                config = config.with_daily_limits(limits);
            }
            run_session(
                Arc::new(backend),
                config,
                args.user_id.clone(),
                Duration::from_secs(*duration_secs),
                Duration::from_secs((*every_secs).max(1)),
                activities,
            )
            .await?;
        }
    }

    Ok(())
}

async fn run_session(
    backend: Arc<dyn MiningBackend>,
    config: MiningConfig,
    user_id: String,
    duration: Duration,
    every: Duration,
    activities: &[ActivityType],
) -> Result<()> {
    let controller = MiningSessionController::new(backend, config);
    controller.set_user(Some(user_id));

    let stats = controller.refresh_stats().await?;
    let _ = MiningHealthWatchdog::new(controller.clone())
        .observe(&stats)
        .await;
    controller.mount();

    if !controller.is_mining() {
        controller.toggle_mining().await?;
    }

    let mut notices = controller.notices();
    let mut sync_events = controller.sync_events();
    let mut interactions = tokio::time::interval(every);
    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);
    let mut next = activities.iter().cycle();

    info!(duration_secs = duration.as_secs(), "Session running. Ctrl+C to stop.");

    loop {
        tokio::select! {
            _ = interactions.tick() => {
                let Some(activity) = next.next().copied() else { continue };
                let (points, tokens) = activity.default_reward();
                match controller.on_interaction(activity, points, tokens) {
                    Ok(()) => debug!(%activity, "Interaction queued"),
                    Err(MiningError::DailyLimitReached { .. }) => {
                        debug!(%activity, "Daily limit reached, skipping")
                    }
                    Err(e) => warn!(%activity, error = %e, "Interaction refused"),
                }
            }

            Ok(notice) = notices.recv() => {
                println!("[{:?}] {}", notice.level, notice.message);
            }

            Ok(event) = sync_events.recv() => {
                if let SyncEvent::ChangedExternally { .. } = event {
                    adopt_server_state(&controller).await;
                }
            }

            _ = &mut deadline => {
                info!("Session duration elapsed");
                break;
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down...");
                break;
            }
        }
    }

    // Give the last batch a chance to flush before stopping
    tokio::time::sleep(controller.config().flush_after + controller.config().toggle_throttle).await;
    if controller.is_mining() {
        if let Err(e) = controller.toggle_mining().await {
            warn!(error = %e, "Failed to stop mining");
        }
    }

    let snapshot = controller.snapshot();
    controller.shutdown();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

/// Refetch stats so the controller takes the server's view. A failure is
/// logged and left for the next reconciliation tick.
async fn adopt_server_state(controller: &MiningSessionController) -> bool {
    match controller.refresh_stats().await {
        Ok(stats) => {
            info!(is_mining = stats.is_mining, "Adopted server mining state");
            true
        }
        Err(e) => {
            warn!(error = %e, "Failed to refresh stats");
            false
        }
    }
}
