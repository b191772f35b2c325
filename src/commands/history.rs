//! History command handlers
//!
//! Lists a user's persisted turns and reconstructs full threads around a
//! selected message.

use crate::chat::history::reconstruct;
use crate::chat::message::{ChatMessage, Role};
use crate::cli::HistoryCommand;
use crate::error::Result;
use crate::storage::SqliteStorage;
use colored::Colorize;
use prettytable::{format, Table};

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

/// Print one reconstructed message with its role tag and citations
pub fn print_message(message: &ChatMessage) {
    let tag = match message.role {
        Role::User => "you".cyan().bold(),
        Role::Model => "talvi".green().bold(),
    };
    println!("{}: {}", tag, message.text());

    let sources = message.sources();
    if !sources.is_empty() {
        println!("{}", "Sources:".bold());
        for (i, source) in sources.iter().enumerate() {
            println!("  {}. {} <{}>", i + 1, source.title, source.uri.cyan());
        }
    }
    println!();
}

/// Handle history commands for a signed-in user
pub fn handle_history(
    storage: &SqliteStorage,
    user_id: &str,
    command: HistoryCommand,
    default_limit: usize,
) -> Result<()> {
    match command {
        HistoryCommand::List { limit } => {
            let items = storage.history_for_user(user_id, limit.unwrap_or(default_limit))?;

            if items.is_empty() {
                println!("{}", "No conversation history found.".yellow());
                return Ok(());
            }

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

            table.add_row(prettytable::row![
                "ID".bold(),
                "Prompt".bold(),
                "Mode".bold(),
                "When".bold()
            ]);

            for item in items {
                let id_short = item.id.chars().take(8).collect::<String>();
                table.add_row(prettytable::row![
                    id_short.cyan(),
                    truncate(&item.text, 40),
                    item.mode,
                    item.created_at
                ]);
            }

            println!("\nConversation History:");
            table.printstd();
            println!();
            println!(
                "Use {} to replay a thread.",
                "talvi history show <ID>".cyan()
            );
            println!();
        }
        HistoryCommand::Show { id } => {
            let log = storage.list_for_user(user_id)?;

            // Support the 8-char prefixes shown by the list view.
            let anchor_id = log
                .iter()
                .find(|row| row.id == id || row.id.starts_with(&id))
                .map(|row| row.id.clone())
                .unwrap_or(id);

            let thread = reconstruct(&log, &anchor_id)?;
            println!();
            for message in &thread {
                print_message(message);
            }
        }
    }

    Ok(())
}
