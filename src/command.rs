//! Commands typed at the dashboard prompt.

use neurodesk_core::{FilterState, FormId};
use std::str::FromStr;

pub const HELP: &str = "\
Commandes :
  p | c | a        en attente, complétés, tous
  r                rafraîchir
  open <id>        détails du formulaire
  chat <id>        discussion avec le médecin référent
  logout           se déconnecter
  quit             quitter";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Filter(FilterState),
    Refresh,
    Open(FormId),
    Chat(FormId),
    Logout,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or("").to_ascii_lowercase();
        let arg = words.next();

        let form_id = |arg: Option<&str>| -> Result<FormId, String> {
            arg.ok_or_else(|| format!("usage: {verb} <id>"))?
                .parse::<FormId>()
                .map_err(|e| e.to_string())
        };

        match verb.as_str() {
            "p" | "c" | "a" | "pending" | "completed" | "all" => verb
                .parse::<FilterState>()
                .map(Self::Filter)
                .map_err(|e| e.to_string()),
            "r" | "refresh" => Ok(Self::Refresh),
            "open" => form_id(arg).map(Self::Open),
            "chat" => form_id(arg).map(Self::Chat),
            "logout" => Ok(Self::Logout),
            "" | "h" | "help" | "?" => Ok(Self::Help),
            "q" | "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("commande inconnue : {other}")),
        }
    }
}
