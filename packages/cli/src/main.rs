#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal front-end for the `BritMetrics` campaign planner.
//!
//! ```text
//! britmetrics login --email you@example.com
//! britmetrics plan --campaign tech-startup --city manchester --area piccadilly
//! britmetrics analytics [--watch] [--clear]
//! britmetrics logout
//! ```
//!
//! Running `britmetrics` with no subcommand enters interactive mode.
//!
//! The backend location comes from `BRITMETRICS_API_URL` and the session
//! file from `BRITMETRICS_SESSION_FILE`.

mod app;
mod interactive;
mod pages;

use britmetrics_analytics::AnalyticsPoller;
use britmetrics_cli_utils::{Banner, waiting_indicator};
use britmetrics_planner::PredictionOrchestrator;
use britmetrics_session::{GuardView, Redirect};
use clap::{Parser, Subcommand};

use crate::app::App;

#[derive(Parser)]
#[command(name = "britmetrics", about = "Plan UK marketing campaigns from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a free trial and sign in
    Login {
        /// Email address for the new account
        #[arg(long)]
        email: String,
    },
    /// Start a paid checkout and print the payment URL
    Subscribe {
        /// Email address for the subscription
        #[arg(long)]
        email: String,
    },
    /// Confirm a completed checkout and sign in
    VerifyPayment {
        /// Checkout session id from the payment return page
        session_id: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the current session
    Status,
    /// Pick a campaign and location, then run the forecast
    Plan {
        /// Campaign id (empty for a generic campaign)
        #[arg(long)]
        campaign: Option<String>,
        /// City id
        #[arg(long)]
        city: Option<String>,
        /// Area id within the city
        #[arg(long)]
        area: Option<String>,
        /// Print the raw prediction as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the analytics dashboard
    Analytics {
        /// Keep polling and redraw on every update until Ctrl-C
        #[arg(long)]
        watch: bool,
        /// Delete all recorded analyses first
        #[arg(long)]
        clear: bool,
    },
    /// Check that the backend is reachable
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = britmetrics_cli_utils::init_logger();
    let cli = Cli::parse();
    let app = App::from_env(multi)?;

    let Some(command) = cli.command else {
        return interactive::run(&app).await;
    };

    match command {
        Commands::Login { email } => {
            let session = app.auth().start_trial(&email).await?;
            println!(
                "Trial started for {} (redirect to {}).",
                session.email.as_deref().unwrap_or(email.trim()),
                Redirect::home().route
            );
        }
        Commands::Subscribe { email } => {
            let url = app.auth().start_checkout(&email).await?;
            println!("Complete your subscription at:\n  {url}");
            println!("Then run `britmetrics verify-payment <session-id>`.");
        }
        Commands::VerifyPayment { session_id } => {
            match app.auth().verify_payment(session_id.trim()).await {
                Some(_) => println!("Payment confirmed. Welcome to BritMetrics."),
                None => {
                    eprintln!("Payment could not be confirmed.");
                    std::process::exit(1);
                }
            }
        }
        Commands::Logout => {
            let redirect = app.session.logout()?;
            println!("Signed out (redirect to {}).", redirect.route);
        }
        Commands::Status => match app.guard().await? {
            GuardView::Render => {
                if let Some(session) = app.session.load()? {
                    println!("Signed in as {}", session.email.as_deref().unwrap_or("(unknown)"));
                    println!("Plan: {}", if session.trial { "trial" } else { "paid" });
                }
            }
            GuardView::Redirect(route) => println!("Not signed in (redirect to {route})."),
            GuardView::Waiting => {}
        },
        Commands::Plan {
            campaign,
            city,
            area,
            json,
        } => {
            if !app.require_session().await? {
                std::process::exit(1);
            }
            if !plan(&app, campaign, city, area, json).await? {
                std::process::exit(1);
            }
        }
        Commands::Analytics { watch, clear } => {
            if !app.require_session().await? {
                std::process::exit(1);
            }
            analytics(&app, watch, clear).await?;
        }
        Commands::Health => {
            let health = app.api.health().await?;
            println!(
                "Backend status: {} ({})",
                health.status,
                health.timestamp.as_deref().unwrap_or("no timestamp")
            );
        }
    }

    Ok(())
}

/// Runs the planner once and prints the result. Returns `false` when the
/// catalogs or the requested forecast could not be loaded.
async fn plan(
    app: &App,
    campaign: Option<String>,
    city: Option<String>,
    area: Option<String>,
    json: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let planner = PredictionOrchestrator::new(app.api.clone(), app.fallbacks.clone());

    let spinner = waiting_indicator(&app.multi, "Loading campaign configuration...");
    planner.bootstrap().await;
    spinner.finish_and_clear();

    if let Some(error) = planner.snapshot().error {
        eprintln!("{}", Banner::error(error).render());
        return Ok(false);
    }

    let requested = campaign.is_some() || city.is_some() || area.is_some();
    if let Some(id) = campaign {
        planner.select_campaign(&id)?;
    }
    if let Some(id) = city {
        planner.select_city(&id)?;
    }
    if let Some(id) = area {
        planner.select_area(&id)?;
    }

    if requested {
        let spinner = waiting_indicator(&app.multi, "Running analysis...");
        let outcome = planner.run_analysis().await;
        spinner.finish_and_clear();
        log::debug!("Analysis outcome: {outcome}");
    }

    let state = planner.snapshot();
    if json {
        match pages::prediction_json(&state) {
            Ok(json) => println!("{json}"),
            Err(message) => {
                eprintln!("{message}");
                return Ok(false);
            }
        }
    } else {
        println!("{}", pages::planner(&state, &app.fallbacks));
    }

    Ok(state.error.is_none())
}

async fn analytics(app: &App, watch: bool, clear: bool) -> Result<(), Box<dyn std::error::Error>> {
    let handle = AnalyticsPoller::new(app.api.clone()).mount();
    let mut rx = handle.subscribe();

    let spinner = waiting_indicator(&app.multi, "Loading analytics...");
    let _ = rx
        .wait_for(|view| !view.is_loading && (view.summary.is_some() || view.error.is_some()))
        .await;
    spinner.finish_and_clear();

    if clear {
        if let Err(e) = handle.clear().await {
            println!("{}", Banner::error(e.to_string()).render());
        }
    }

    println!("{}", pages::analytics(&handle.view()));

    if watch {
        rx.mark_unchanged();
        loop {
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let view = rx.borrow_and_update().clone();
                    if !view.is_loading {
                        println!("\n{}", pages::analytics(&view));
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }
    }

    handle.unmount();
    Ok(())
}
