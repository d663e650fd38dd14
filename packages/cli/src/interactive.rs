//! Menu-driven mode used when no subcommand is given.
//!
//! Mirrors the web router: the guard runs first, unauthenticated users land
//! on the login menu, and signed-in users pick a tool.

use britmetrics_analytics::{AnalyticsHandle, AnalyticsPoller};
use britmetrics_cli_utils::{Banner, waiting_indicator};
use britmetrics_planner::{AnalysisOutcome, PredictionOrchestrator};
use britmetrics_session::{GuardView, Redirect};
use dialoguer::{Confirm, Input, Select};

use crate::app::App;
use crate::pages;

/// Actions on the login page.
enum LoginAction {
    StartTrial,
    Subscribe,
    VerifyPayment,
    Quit,
}

impl LoginAction {
    const ALL: &[Self] = &[
        Self::StartTrial,
        Self::Subscribe,
        Self::VerifyPayment,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::StartTrial => "Start a free trial",
            Self::Subscribe => "Subscribe (paid checkout)",
            Self::VerifyPayment => "I've paid: verify my checkout session",
            Self::Quit => "Quit",
        }
    }
}

/// Top-level tools for a signed-in user.
enum Tool {
    Planner,
    Analytics,
    Logout,
    Quit,
}

impl Tool {
    const ALL: &[Self] = &[Self::Planner, Self::Analytics, Self::Logout, Self::Quit];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Planner => "Campaign planner",
            Self::Analytics => "Analytics dashboard",
            Self::Logout => "Logout",
            Self::Quit => "Quit",
        }
    }
}

/// Actions on the planner page.
enum PlannerAction {
    Campaign,
    City,
    Area,
    Run,
    Back,
}

impl PlannerAction {
    const ALL: &[Self] = &[
        Self::Campaign,
        Self::City,
        Self::Area,
        Self::Run,
        Self::Back,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Campaign => "Change campaign",
            Self::City => "Change city",
            Self::Area => "Change area",
            Self::Run => "Run analysis",
            Self::Back => "Back",
        }
    }
}

/// Actions on the analytics page.
enum AnalyticsAction {
    Refresh,
    Clear,
    Back,
}

impl AnalyticsAction {
    const ALL: &[Self] = &[Self::Refresh, Self::Clear, Self::Back];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Refresh => "Refresh now",
            Self::Clear => "Clear all analytics",
            Self::Back => "Back",
        }
    }
}

fn choose<T>(
    prompt: &str,
    all: &[T],
    label: fn(&T) -> &'static str,
) -> Result<usize, dialoguer::Error> {
    let labels: Vec<&str> = all.iter().map(label).collect();
    Select::new()
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact()
}

/// Runs the interactive session until the user quits.
///
/// # Errors
///
/// Returns an error if a prompt fails or session storage cannot be used.
pub async fn run(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    println!("BritMetrics Campaign Planner");
    println!();

    loop {
        match app.guard().await? {
            GuardView::Render => {}
            GuardView::Redirect(route) => {
                log::debug!("Guard redirected to {route}");
                if login(app).await? {
                    continue;
                }
                return Ok(());
            }
            GuardView::Waiting => continue,
        }

        let idx = choose("What would you like to do?", Tool::ALL, Tool::label)?;
        match Tool::ALL[idx] {
            Tool::Planner => planner(app).await?,
            Tool::Analytics => analytics(app).await?,
            Tool::Logout => {
                let redirect = app.session.logout()?;
                println!("Signed out (redirect to {}).", redirect.route);
            }
            Tool::Quit => return Ok(()),
        }
    }
}

/// Login page. Returns `false` when the user quits.
async fn login(app: &App) -> Result<bool, Box<dyn std::error::Error>> {
    let auth = app.auth();

    loop {
        let idx = choose("Sign in to BritMetrics", LoginAction::ALL, LoginAction::label)?;
        match LoginAction::ALL[idx] {
            LoginAction::StartTrial => {
                let email: String = Input::new().with_prompt("Email").interact_text()?;
                let spinner = waiting_indicator(&app.multi, "Creating your trial account...");
                let result = auth.start_trial(&email).await;
                spinner.finish_and_clear();
                match result {
                    Ok(session) => {
                        println!(
                            "Trial started for {} (redirect to {}).",
                            session.email.as_deref().unwrap_or(&email),
                            Redirect::home().route
                        );
                        return Ok(true);
                    }
                    Err(e) => println!("{}", Banner::error(e.to_string()).render()),
                }
            }
            LoginAction::Subscribe => {
                let email: String = Input::new().with_prompt("Email").interact_text()?;
                let spinner = waiting_indicator(&app.multi, "Opening checkout...");
                let result = auth.start_checkout(&email).await;
                spinner.finish_and_clear();
                match result {
                    Ok(url) => {
                        println!("Complete your subscription at:\n  {url}");
                        println!(
                            "Then choose \"I've paid\" with the session id from the return page."
                        );
                    }
                    Err(e) => println!("{}", Banner::error(e.to_string()).render()),
                }
            }
            LoginAction::VerifyPayment => {
                let session_id: String = Input::new()
                    .with_prompt("Checkout session id")
                    .interact_text()?;
                let spinner = waiting_indicator(&app.multi, "Verifying payment...");
                let verified = auth.verify_payment(session_id.trim()).await;
                spinner.finish_and_clear();
                if verified.is_some() {
                    println!(
                        "Payment confirmed. Welcome to BritMetrics (redirect to {}).",
                        Redirect::home().route
                    );
                    return Ok(true);
                }
            }
            LoginAction::Quit => return Ok(false),
        }
    }
}

async fn planner(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    let planner = PredictionOrchestrator::new(app.api.clone(), app.fallbacks.clone());

    let spinner = waiting_indicator(&app.multi, "Loading campaign configuration...");
    planner.bootstrap().await;
    spinner.finish_and_clear();

    loop {
        let state = planner.snapshot();
        println!("\n{}\n", pages::planner(&state, &app.fallbacks));

        let idx = choose("Planner", PlannerAction::ALL, PlannerAction::label)?;
        let change = match PlannerAction::ALL[idx] {
            PlannerAction::Campaign => pages::campaign_field(&state.selection)
                .prompt()?
                .map(|id| planner.select_campaign(&id)),
            PlannerAction::City => pages::city_field(&state.selection)
                .prompt()?
                .map(|id| planner.select_city(&id)),
            PlannerAction::Area => pages::area_field(&state.selection)
                .prompt()?
                .map(|id| planner.select_area(&id)),
            PlannerAction::Run => {
                let spinner = waiting_indicator(&app.multi, "Running analysis...");
                let outcome = planner.run_analysis().await;
                spinner.finish_and_clear();
                log::debug!("Analysis outcome: {outcome}");
                if outcome == AnalysisOutcome::Applied {
                    log::info!("Prediction updated");
                }
                None
            }
            PlannerAction::Back => return Ok(()),
        };

        if let Some(Err(e)) = change {
            println!("{}", Banner::error(e.to_string()).render());
        }
    }
}

async fn wait_for_first_fetch(handle: &AnalyticsHandle) {
    let mut rx = handle.subscribe();
    let _ = rx
        .wait_for(|view| !view.is_loading && (view.summary.is_some() || view.error.is_some()))
        .await;
}

async fn analytics(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    let handle = AnalyticsPoller::new(app.api.clone()).mount();

    let spinner = waiting_indicator(&app.multi, "Loading analytics...");
    wait_for_first_fetch(&handle).await;
    spinner.finish_and_clear();

    loop {
        println!("\n{}\n", pages::analytics(&handle.view()));

        let idx = choose("Analytics", AnalyticsAction::ALL, AnalyticsAction::label)?;
        match AnalyticsAction::ALL[idx] {
            AnalyticsAction::Refresh => handle.refresh().await,
            AnalyticsAction::Clear => {
                let confirmed = Confirm::new()
                    .with_prompt("Delete all recorded analyses?")
                    .default(false)
                    .interact()?;
                if confirmed {
                    if let Err(e) = handle.clear().await {
                        println!("{}", Banner::error(e.to_string()).render());
                    }
                }
            }
            AnalyticsAction::Back => break,
        }
    }

    handle.unmount();
    Ok(())
}
