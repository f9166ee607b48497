//! `precinct-review` -- command-line review panel for device trust.
//!
//! Loads both views, optionally performs one operator action, and prints
//! the resulting state and notices.
//!
//! ```text
//! precinct-review                           # list users, devices, attempts
//! precinct-review approve <attempt_id>
//! precinct-review blacklist <attempt_id>
//! precinct-review set-max <user_id> <max_devices>
//! precinct-review delete-device <device_id> [--yes]
//! precinct-review reset <user_id> [--yes]
//! ```
//!
//! # Environment variables
//!
//! | Variable             | Required | Default                 | Description                 |
//! |----------------------|----------|-------------------------|-----------------------------|
//! | `PRECINCT_API_URL`   | no       | `http://localhost:3000` | Service base URL            |
//! | `PRECINCT_API_TOKEN` | yes      | --                      | Admin bearer token          |

use std::sync::Arc;

use clap::{Parser, Subcommand};
use precinct_core::fingerprint::abbreviate;
use precinct_core::types::DbId;
use precinct_review::backend::HttpBackend;
use precinct_review::config::ReviewConfig;
use precinct_review::error::ReviewError;
use precinct_review::panel::{Confirmation, NoticeLevel, ReviewPanel};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "precinct-review")]
#[command(about = "Review registered devices and blocked login attempts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Confirm destructive actions (delete-device, reset)
    #[arg(long, global = true)]
    yes: bool,
}

#[derive(Debug, PartialEq, Subcommand)]
enum Command {
    /// Approve a blocked attempt and register its device
    Approve { attempt_id: DbId },

    /// Blacklist a blocked attempt's fingerprint for every user
    Blacklist { attempt_id: DbId },

    /// Set a user's device cap
    SetMax { user_id: DbId, max_devices: i32 },

    /// Delete one registered device
    DeleteDevice { device_id: DbId },

    /// Delete every device registered to a user
    Reset { user_id: DbId },
}

impl Cli {
    fn confirmation(&self) -> Confirmation {
        if self.yes {
            Confirmation::Confirmed
        } else {
            Confirmation::Declined
        }
    }
}

async fn run(panel: &mut ReviewPanel, cli: &Cli) -> Result<(), ReviewError> {
    let Some(command) = &cli.command else {
        return Ok(());
    };
    match *command {
        Command::Approve { attempt_id } => panel.approve(attempt_id).await,
        Command::Blacklist { attempt_id } => panel.blacklist(attempt_id).await,
        Command::SetMax { user_id, max_devices } => {
            panel.set_max_devices(user_id, max_devices).await
        }
        Command::DeleteDevice { device_id } => {
            panel.delete_device(device_id, cli.confirmation()).await
        }
        Command::Reset { user_id } => panel.reset_all_devices(user_id, cli.confirmation()).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "precinct_review=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ReviewConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });
    tracing::info!(api_url = %config.api_url, "Starting precinct-review");

    let mut panel = ReviewPanel::new(Arc::new(HttpBackend::new(config)));
    if let Err(e) = panel.refresh().await {
        tracing::debug!(error = %e, "Initial refresh incomplete");
    }

    let outcome = run(&mut panel, &cli).await;

    print_state(&panel);
    for notice in panel.take_notices() {
        let tag = match notice.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Error => "error",
        };
        println!("[{tag}] {}", notice.message);
    }

    if outcome.is_err() {
        std::process::exit(1);
    }
}

fn print_state(panel: &ReviewPanel) {
    let store = panel.store();
    let stats = store.stats();
    println!(
        "users={} devices={} active={} at_limit={} pending={}",
        stats.total_users,
        stats.total_devices,
        stats.active_devices,
        stats.users_at_limit,
        stats.pending_attempts
    );

    for user in store.users() {
        println!(
            "{} ({}) {}/{} devices",
            user.username,
            user.user_id,
            user.devices.len(),
            user.max_devices
        );
        for device in &user.devices {
            println!(
                "  #{} {} {}{} logins={}",
                device.id,
                abbreviate(&device.fingerprint),
                device.label.as_deref().unwrap_or("-"),
                if device.is_primary { " [primary]" } else { "" },
                device.login_count
            );
        }
    }

    for attempt in store.attempts() {
        println!(
            "attempt #{} user={} {} {} ({})",
            attempt.id,
            attempt.user_id,
            abbreviate(&attempt.fingerprint),
            attempt.geo_location.as_deref().unwrap_or("unknown location"),
            attempt.reason
        );
    }
}
