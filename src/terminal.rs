//! Terminal stand-ins for the host application's screen stack and modal prompts.

use async_trait::async_trait;
use neurodesk_core::{
    ActionStyle, DashboardView, Navigator, Prompt, PromptChoice, Prompter, Route,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};

/// Stdin lines, shared by the command loop and the prompter.
pub type Lines = Arc<Mutex<mpsc::Receiver<String>>>;

/// Spawns the single reader of stdin.
pub fn spawn_stdin_reader() -> Lines {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    tracing::error!(error = %err, "failed to read stdin");
                    break;
                }
            }
        }
    });
    Arc::new(Mutex::new(rx))
}

/// Next line typed by the user, `None` once stdin is closed.
pub async fn next_line(lines: &Lines) -> Option<String> {
    lines.lock().await.recv().await
}

pub struct TerminalNavigator;

impl TerminalNavigator {
    fn describe(route: &Route) -> String {
        if route.params.is_null() {
            route.screen.clone()
        } else {
            format!("{} {}", route.screen, route.params)
        }
    }
}

impl Navigator for TerminalNavigator {
    fn replace_screen(&self, route: Route) {
        tracing::info!(screen = %route.screen, "screen replaced");
        println!("⇒ {}", Self::describe(&route));
    }

    fn navigate_to(&self, route: Route) {
        tracing::info!(screen = %route.screen, "screen pushed");
        println!("→ {}", Self::describe(&route));
    }
}

pub struct TerminalPrompter {
    lines: Lines,
}

impl TerminalPrompter {
    pub fn new(lines: Lines) -> Self {
        Self { lines }
    }
}

/// Maps a typed answer onto a choice. Only an explicit confirmation confirms.
fn classify_answer(prompt: &Prompt, answer: &str) -> PromptChoice {
    let answer = answer.trim();
    let confirmed = prompt.actions.iter().enumerate().any(|(i, action)| {
        action.style != ActionStyle::Cancel
            && (answer.eq_ignore_ascii_case(&action.label) || answer == (i + 1).to_string())
    });
    if confirmed || matches!(answer.to_ascii_lowercase().as_str(), "o" | "oui" | "y" | "yes") {
        PromptChoice::Confirm
    } else {
        PromptChoice::Cancel
    }
}

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn confirm(&self, prompt: &Prompt) -> PromptChoice {
        println!();
        println!("== {} ==", prompt.title);
        println!("{}", prompt.message);

        let single = prompt.actions.len() <= 1;
        for (i, action) in prompt.actions.iter().enumerate() {
            println!("  [{}] {}", i + 1, action.label);
        }

        match next_line(&self.lines).await {
            _ if single => PromptChoice::Confirm,
            Some(answer) => classify_answer(prompt, &answer),
            None => PromptChoice::Cancel,
        }
    }
}

pub fn render(view: &DashboardView) {
    println!();
    println!("{}", view.header_title);
    if let Some(greeting) = &view.greeting {
        println!("{greeting}");
    }

    let buttons = view
        .filters
        .iter()
        .map(|b| if b.active { format!("[{}]", b.label) } else { format!(" {} ", b.label) })
        .collect::<Vec<_>>()
        .join(" ");
    println!("{buttons}");

    if view.loading {
        println!("  chargement…");
    }
    for card in &view.cards {
        match card.badge.label() {
            Some(badge) => println!("  {}  ({})  {}", card.title, badge, card.subtitle),
            None => println!("  {}  {}", card.title, card.subtitle),
        }
    }
    if let Some(message) = view.empty_message {
        println!("  {message}");
    }
}
