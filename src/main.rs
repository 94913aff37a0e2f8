mod command;
mod terminal;

use command::{Command, HELP};
use neurodesk_client::{ClientConfig, FileSessionStore, ReviewApi};
use neurodesk_core::config::poll_interval_from_env_value;
use neurodesk_core::{
    Collaborators, DashboardConfig, DashboardController, DashboardView, LoadOutcome,
    LogoutOutcome,
};
use std::sync::Arc;
use terminal::{Lines, TerminalNavigator, TerminalPrompter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_SESSION_FILE: &str = "neurodesk-session.json";

/// Interactive terminal dashboard.
///
/// # Environment Variables
/// - `NEURODESK_API_URL`: backend base URL (default: "http://127.0.0.1:8080")
/// - `NEURODESK_SESSION_FILE`: session store file (default: "neurodesk-session.json")
/// - `NEURODESK_UNREAD_POLL_SECS`: unread count poll interval (default: 30)
/// - `NEURODESK_HTTP_TIMEOUT_SECS`: per-request timeout (default: 15)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("neurodesk=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cfg = Arc::new(DashboardConfig::with_poll_interval(
        poll_interval_from_env_value(std::env::var("NEURODESK_UNREAD_POLL_SECS").ok())?,
    )?);
    let client_cfg = ClientConfig::from_env_values(
        std::env::var("NEURODESK_API_URL").ok(),
        std::env::var("NEURODESK_HTTP_TIMEOUT_SECS").ok(),
    )?;
    let session_path = std::env::var("NEURODESK_SESSION_FILE")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SESSION_FILE.into());

    let store = Arc::new(FileSessionStore::new(session_path));
    let api = Arc::new(ReviewApi::new(&client_cfg, store.clone())?);
    let lines = terminal::spawn_stdin_reader();

    tracing::info!(
        api = client_cfg.base_url(),
        session = %store.path().display(),
        poll_secs = cfg.unread_poll_interval().as_secs(),
        "starting dashboard"
    );

    let controller = DashboardController::new(
        cfg,
        Collaborators {
            forms: api.clone(),
            messaging: api,
            store,
            navigator: Arc::new(TerminalNavigator),
            prompter: Arc::new(TerminalPrompter::new(lines.clone())),
        },
    );

    println!("{HELP}");
    run(&controller, &lines).await;
    controller.unmount();
    Ok(())
}

async fn run(controller: &DashboardController, lines: &Lines) {
    let mut changes = controller.changes();
    let mut last_view: Option<DashboardView> = None;

    report_load(controller.mount().await);
    render_if_changed(controller, &mut last_view);

    while !controller.is_closed() {
        tokio::select! {
            alive = changes.changed() => {
                if !alive {
                    break;
                }
                render_if_changed(controller, &mut last_view);
            }
            line = terminal::next_line(lines) => {
                let Some(line) = line else { break };
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => execute(controller, command).await,
                    Err(message) => println!("{message}"),
                }
                render_if_changed(controller, &mut last_view);
            }
        }
    }
}

async fn execute(controller: &DashboardController, command: Command) {
    match command {
        Command::Filter(filter) => report_load(controller.select_filter(filter).await),
        Command::Refresh => report_load(controller.refresh().await),
        Command::Open(form_id) => {
            if let Err(e) = controller.select_form(form_id) {
                println!("{e}");
            }
        }
        Command::Chat(form_id) => {
            if let Err(e) = controller.open_chat(form_id) {
                println!("{e}");
            }
        }
        Command::Logout => {
            if controller.request_logout().await == LogoutOutcome::Cancelled {
                println!("Déconnexion annulée.");
            }
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}

fn report_load(outcome: LoadOutcome) {
    if let LoadOutcome::Failed(err) = outcome {
        eprintln!("Erreur lors du chargement des formulaires : {err}");
    }
}

fn render_if_changed(controller: &DashboardController, last_view: &mut Option<DashboardView>) {
    if controller.is_closed() {
        return;
    }
    let view = controller.view();
    if last_view.as_ref() != Some(&view) {
        terminal::render(&view);
        *last_view = Some(view);
    }
}
