use clap::{Parser, Subcommand};
use neurodesk_client::{ClientConfig, FileSessionStore, ReviewApi};
use neurodesk_core::constants::{TOKEN_KEY, USER_ID_KEY, USER_NAME_KEY};
use neurodesk_core::{
    FilterState, FormId, FormsDirectory, MessagingDirectory, SessionStore, UnreadBadge,
};
use std::sync::Arc;

const DEFAULT_SESSION_FILE: &str = "neurodesk-session.json";

#[derive(Parser)]
#[command(name = "neurodesk")]
#[command(about = "NeuroDesk specialist dashboard CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List forms for a filter
    Forms {
        /// pending, completed or all (p, c, a)
        #[arg(long, default_value = "pending")]
        filter: FilterState,
    },
    /// Show the unread message count of one form
    Unread {
        /// Form id, with or without a leading '#'
        form_id: FormId,
    },
    /// Show the signed-in specialist
    Whoami,
    /// Write session values, as the login screen would
    SessionSet {
        /// Display name
        #[arg(long)]
        user_name: Option<String>,
        /// Authenticated user id
        #[arg(long)]
        user_id: Option<String>,
        /// Bearer token
        #[arg(long)]
        token: Option<String>,
    },
    /// Clear the session
    Logout,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let session_path = std::env::var("NEURODESK_SESSION_FILE")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SESSION_FILE.to_string());
    let store = Arc::new(FileSessionStore::new(session_path));

    match cli.command {
        Commands::Forms { filter } => {
            let api = review_api(store)?;
            let result = match filter {
                FilterState::Pending => api.fetch_pending().await,
                FilterState::Completed => api.fetch_completed().await,
                FilterState::All => api.fetch_all().await,
            };
            match result {
                Ok(forms) if forms.is_empty() => println!("{}", filter.empty_message()),
                Ok(forms) => {
                    println!("{}", filter.header_title());
                    for form in forms {
                        println!("{}  {}", form.title(), form.subtitle());
                    }
                }
                Err(e) => eprintln!("Error fetching forms: {}", e),
            }
        }
        Commands::Unread { form_id } => {
            let api = review_api(store)?;
            match api.count_unread(form_id).await {
                Ok(count) => match UnreadBadge::from_count(count).label() {
                    Some(badge) => println!("Formulaire #{}: {} ({})", form_id, count, badge),
                    None => println!("Formulaire #{}: 0", form_id),
                },
                Err(e) => eprintln!("Error fetching unread count: {}", e),
            }
        }
        Commands::Whoami => match store.get(USER_NAME_KEY).await {
            Ok(Some(name)) if !name.trim().is_empty() => println!("Dr. {}", name.trim()),
            Ok(_) => println!("No user signed in."),
            Err(e) => eprintln!("Error reading session: {}", e),
        },
        Commands::SessionSet {
            user_name,
            user_id,
            token,
        } => {
            let entries = [
                (USER_NAME_KEY, user_name),
                (USER_ID_KEY, user_id),
                (TOKEN_KEY, token),
            ];
            for (key, value) in entries {
                if let Some(value) = value {
                    store.set(key, &value).await?;
                    println!("Set {}", key);
                }
            }
        }
        Commands::Logout => match store.clear().await {
            Ok(()) => println!("Session cleared."),
            Err(e) => eprintln!("Error clearing session: {}", e),
        },
    }

    Ok(())
}

fn review_api(store: Arc<FileSessionStore>) -> anyhow::Result<ReviewApi> {
    let cfg = ClientConfig::from_env_values(
        std::env::var("NEURODESK_API_URL").ok(),
        std::env::var("NEURODESK_HTTP_TIMEOUT_SECS").ok(),
    )?;
    Ok(ReviewApi::new(&cfg, store)?)
}
