use anyhow::Context;
use chrono::{DateTime, FixedOffset, Local};
use clap::{Parser, Subcommand};
use court_sync::app::{AvailabilityUseCase, BookingStore, SyncUseCase};
use court_sync::config::Config;
use court_sync::db::SqliteBookingStore;
use court_sync::infra::FairplayHttp;
use court_sync::logging;
use court_sync::metrics::init_metrics;
use court_sync::server::{self, AppState};
use court_sync::types::Sport;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "court_sync")]
#[command(about = "Court availability and booking sync for the Centre FairPlay portal")]
#[command(version = "0.1.0")]
struct Cli {
    /// Config file (defaults to $COURT_SYNC_CONFIG or config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Expose Prometheus metrics on this port
    #[arg(long, global = true)]
    metrics_port: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the availability grid for one sport and day as JSON
    Availability {
        /// tennis_int, tennis_ext, squash, badminton or padel
        #[arg(long, default_value = "tennis_int")]
        sport: String,
        /// Opaque day token taken from the date bar
        #[arg(long)]
        day: Option<String>,
        #[arg(long)]
        display_name: Option<String>,
        /// Parse a saved page instead of fetching
        #[arg(long)]
        html_file: Option<PathBuf>,
    },
    /// Store your bookings for one sport and day
    Sync {
        #[arg(long, default_value = "tennis_int")]
        sport: String,
        #[arg(long)]
        day: Option<String>,
        #[arg(long)]
        display_name: Option<String>,
        /// Sync every sport for the selected day
        #[arg(long, conflicts_with = "html_file")]
        all_sports: bool,
        #[arg(long)]
        html_file: Option<PathBuf>,
    },
    /// List stored bookings, newest first
    Bookings,
    /// Run the HTTP API
    Serve {
        #[arg(long, default_value = "3000")]
        port: u16,
    },
}

fn read_page(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

async fn run_sync(
    sync: &SyncUseCase,
    availability: &AvailabilityUseCase,
    sports: &[Sport],
    day: Option<&str>,
    display_name: Option<&str>,
    html_file: Option<&Path>,
    now: DateTime<FixedOffset>,
) -> anyhow::Result<()> {
    let mut failures = 0;
    for &sport in sports {
        let result = match html_file {
            Some(path) => {
                let model = availability.parse_page(sport, &read_page(path)?, display_name);
                sync.reconcile(sport, &model, display_name, now).await
            }
            None => sync.sync(availability, sport, day, display_name, now).await,
        };
        match result {
            Ok(outcome) => {
                println!(
                    "✅ {} {}: {} booking(s), {} new, {} updated",
                    sport.label(),
                    outcome.date,
                    outcome.total,
                    outcome.inserted,
                    outcome.updated
                );
            }
            Err(e) => {
                error!("Sync failed for {}: {}", sport, e);
                println!("❌ {} sync failed: {}", sport.label(), e);
                failures += 1;
            }
        }
    }
    if failures > 0 {
        anyhow::bail!("{} of {} sport(s) failed to sync", failures, sports.len());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _log_guard = logging::init_logging();

    let cli = Cli::parse();
    let config = Arc::new(Config::load_from(cli.config.as_deref())?);
    if let Some(port) = cli.metrics_port {
        init_metrics(port);
    }

    let source = Arc::new(FairplayHttp::new(config.clone())?);
    let availability = AvailabilityUseCase::new(source, config.clone());

    match cli.command {
        Commands::Availability {
            sport,
            day,
            display_name,
            html_file,
        } => {
            let sport: Sport = sport.parse()?;
            let display_name = display_name.or_else(|| config.display_name.clone());
            let model = match html_file {
                Some(path) => {
                    availability.parse_page(sport, &read_page(&path)?, display_name.as_deref())
                }
                None => {
                    availability
                        .availability(sport, day.as_deref(), display_name.as_deref())
                        .await?
                }
            };
            println!("{}", serde_json::to_string_pretty(&model)?);
        }
        Commands::Sync {
            sport,
            day,
            display_name,
            all_sports,
            html_file,
        } => {
            let sports = if all_sports {
                Sport::ALL.to_vec()
            } else {
                vec![sport.parse::<Sport>()?]
            };
            let display_name = display_name.or_else(|| config.display_name.clone());
            let store = SqliteBookingStore::open(&config.database.path)?;
            let sync = SyncUseCase::new(Arc::new(store));
            info!("Syncing {} sport(s)", sports.len());
            run_sync(
                &sync,
                &availability,
                &sports,
                day.as_deref(),
                display_name.as_deref(),
                html_file.as_deref(),
                Local::now().fixed_offset(),
            )
            .await?;
        }
        Commands::Bookings => {
            let store = SqliteBookingStore::open(&config.database.path)?;
            let bookings = store.list().await?;
            println!("{}", serde_json::to_string_pretty(&bookings)?);
        }
        Commands::Serve { port } => {
            let store: Arc<dyn BookingStore> =
                Arc::new(SqliteBookingStore::open(&config.database.path)?);
            let state = AppState {
                availability,
                sync: SyncUseCase::new(store.clone()),
                store,
            };
            server::serve(Arc::new(state), port).await?;
        }
    }
    Ok(())
}
