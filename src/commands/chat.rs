//! Interactive chat session handler
//!
//! Runs a readline loop over a `ChatSession`: submits turns, renders the
//! resolved reply with its citations, and handles the slash commands for
//! mode switching, attachments, speech playback, theme, and history
//! replay. For anonymous users a background task ticks once a second and
//! forces sign-out when the 10-minute session expires.

use crate::attachment::{encode_file, Attachment};
use crate::audio::{decode_pcm, AudioSink, NullSink};
use crate::auth::{SessionController, SessionState, TokenStore};
use crate::chat::history::reconstruct;
use crate::chat::ChatSession;
use crate::chat_mode::ChatMode;
use crate::commands::history::print_message;
use crate::config::Config;
use crate::error::Result;
use crate::providers::create_provider;
use crate::storage::SqliteStorage;
use crate::theme::{Theme, ThemeStore};
use chrono::Utc;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;

/// Slash commands understood by the REPL
#[derive(Debug, Clone, PartialEq, Eq)]
enum SlashCommand {
    Help,
    Exit,
    NewChat,
    SwitchMode(ChatMode),
    Attach(String),
    Speak,
    History,
    Load(String),
    Theme(Option<String>),
    Unknown(String),
    None,
}

fn parse_command(input: &str) -> SlashCommand {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return SlashCommand::None;
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let head = parts.next().unwrap_or_default();
    let rest = parts.next().map(str::trim).unwrap_or_default();

    match head {
        "/help" => SlashCommand::Help,
        "/exit" | "/quit" => SlashCommand::Exit,
        "/new" => SlashCommand::NewChat,
        "/mode" => match ChatMode::parse_str(rest) {
            Ok(mode) => SlashCommand::SwitchMode(mode),
            Err(_) => SlashCommand::Unknown(trimmed.to_string()),
        },
        "/attach" if !rest.is_empty() => SlashCommand::Attach(rest.to_string()),
        "/tts" => SlashCommand::Speak,
        "/history" => SlashCommand::History,
        "/load" if !rest.is_empty() => SlashCommand::Load(rest.to_string()),
        "/theme" => SlashCommand::Theme((!rest.is_empty()).then(|| rest.to_string())),
        _ => SlashCommand::Unknown(trimmed.to_string()),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  {}             show this help", "/help".cyan());
    println!("  {}  switch response mode", "/mode <normal|pro|deep>".cyan());
    println!("  {}            start a new chat", "/new".cyan());
    println!("  {}    attach a file to the next prompt", "/attach <path>".cyan());
    println!("  {}             speak the last reply", "/tts".cyan());
    println!("  {}         list recent turns", "/history".cyan());
    println!("  {}       load a thread by message id", "/load <id>".cyan());
    println!("  {}  show or set the theme", "/theme [light|dark|system]".cyan());
    println!("  {}             leave the session", "/exit".cyan());
    println!();
}

fn print_welcome(mode: ChatMode, state: &SessionState) {
    println!();
    println!("{} {}", "Talvi".bold(), env!("CARGO_PKG_VERSION"));
    if let Some(user) = state.user() {
        match &user.email {
            Some(email) => println!("Signed in as {}", email.green()),
            None => println!("{}", "Anonymous session (expires in 10 minutes)".yellow()),
        }
    }
    println!("Mode: {} ({})", mode.colored_tag(), mode.description());
    println!("Type {} for commands.", "/help".cyan());
    println!();
}

async fn speak_last_reply(
    session: &ChatSession,
    provider: &Arc<dyn crate::providers::Provider>,
    sink: &dyn AudioSink,
) {
    let Some(text) = session.last_reply_text() else {
        println!("{}", "Nothing to speak yet.".yellow());
        return;
    };

    // Speech failures are transient UI noise, never fatal.
    match provider.synthesize_speech(text).await {
        Ok(payload) => match decode_pcm(&payload).and_then(|clip| sink.play(&clip)) {
            Ok(()) => {}
            Err(e) => println!("{}", format!("Speech playback failed: {}", e).yellow()),
        },
        Err(e) => println!("{}", format!("Speech unavailable: {}", e).yellow()),
    }
}

/// Start an interactive chat session
///
/// # Arguments
///
/// * `config` - Global configuration
/// * `storage` - History store shared with the session
/// * `mode_override` - Optional response mode from the command line
/// * `speak` - Speak every reply aloud
pub async fn run_chat(
    config: Config,
    storage: Arc<SqliteStorage>,
    mode_override: Option<String>,
    speak: bool,
) -> Result<()> {
    tracing::info!("Starting interactive chat session");

    let Some(auth_session) = TokenStore::new().load()? else {
        println!(
            "{}",
            format!("Not signed in. Run {} first.", "talvi login".cyan()).yellow()
        );
        return Ok(());
    };

    let controller = Arc::new(SessionController::new());
    if let Err(e) = controller.sign_in(auth_session.user.clone(), Utc::now()) {
        println!("{}", format!("Session rejected: {}", e).red());
        return Ok(());
    }

    // Countdown for anonymous sessions: one tick per second, forcing the
    // signed-out state the moment the deadline passes. The loop below
    // refuses further submissions once that happens.
    if auth_session.user.is_anonymous {
        let countdown = controller.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
            loop {
                interval.tick().await;
                if countdown.enforce_expiry(Utc::now()) {
                    println!(
                        "\n{}",
                        "Anonymous session expired; you have been signed out.".yellow()
                    );
                    break;
                }
                if countdown.current().user().is_none() {
                    break;
                }
            }
        });
    }

    let provider: Arc<dyn crate::providers::Provider> =
        Arc::from(create_provider(&config.provider)?);
    let mut session = ChatSession::new(provider.clone(), storage.clone());
    session.set_user(Some(auth_session.user.id.clone()));

    let mut mode = mode_override
        .as_deref()
        .and_then(|m| ChatMode::parse_str(m).ok())
        .unwrap_or_else(|| config.default_chat_mode());
    let speak_replies = speak || config.chat.speak_replies;
    let sink = NullSink;
    let theme_store = ThemeStore::new()?;
    let mut pending_attachment: Option<Attachment> = None;

    let mut rl = DefaultEditor::new()?;
    print_welcome(mode, &controller.current());

    loop {
        // The countdown task may have signed us out while idle; accept no
        // further actions in that case.
        if controller.current().user().is_none() {
            println!("{}", "Session ended.".yellow());
            break;
        }

        let prompt = format!("{} > ", mode.colored_tag());
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        rl.add_history_entry(trimmed)?;

        match parse_command(trimmed) {
            SlashCommand::Help => {
                print_help();
                continue;
            }
            SlashCommand::Exit => break,
            SlashCommand::NewChat => {
                session.reset();
                pending_attachment = None;
                println!("{}", "Started a new chat.".green());
                continue;
            }
            SlashCommand::SwitchMode(new_mode) => {
                mode = new_mode;
                println!("Switched to {} ({})", mode.colored_tag(), mode.description());
                continue;
            }
            SlashCommand::Attach(path) => {
                match encode_file(&path).await {
                    Ok(Some(attachment)) => {
                        println!(
                            "{}",
                            format!("Attached {} to your next prompt.", attachment.file_name)
                                .green()
                        );
                        pending_attachment = Some(attachment);
                    }
                    // Unsupported types are refused without an error.
                    Ok(None) => {
                        println!("{}", format!("Cannot attach {}: unsupported type", path).yellow())
                    }
                    Err(e) => println!("{}", format!("Cannot attach {}: {}", path, e).red()),
                }
                continue;
            }
            SlashCommand::Speak => {
                speak_last_reply(&session, &provider, &sink).await;
                continue;
            }
            SlashCommand::History => {
                crate::commands::history::handle_history(
                    &storage,
                    &auth_session.user.id,
                    crate::cli::HistoryCommand::List { limit: None },
                    config.chat.history_limit,
                )?;
                continue;
            }
            SlashCommand::Load(id) => {
                let log = storage.list_for_user(&auth_session.user.id)?;
                let anchor_id = log
                    .iter()
                    .find(|row| row.id == id || row.id.starts_with(&id))
                    .map(|row| row.id.clone())
                    .unwrap_or(id);
                match reconstruct(&log, &anchor_id) {
                    Ok(thread) => {
                        println!();
                        for message in &thread {
                            print_message(message);
                        }
                        session.load(thread);
                        pending_attachment = None;
                    }
                    Err(e) => println!("{}", format!("Cannot load thread: {}", e).red()),
                }
                continue;
            }
            SlashCommand::Theme(value) => {
                match value {
                    Some(value) => match Theme::parse_str(&value) {
                        Ok(theme) => {
                            theme_store.save(theme)?;
                            println!("Theme set to {}", theme);
                        }
                        Err(e) => println!("{}", e.red()),
                    },
                    None => println!("Theme: {}", theme_store.load()),
                }
                continue;
            }
            SlashCommand::Unknown(cmd) => {
                println!(
                    "{}",
                    format!("Unknown command: {} (try /help)", cmd).yellow()
                );
                continue;
            }
            SlashCommand::None => {}
        }

        session
            .submit_turn(trimmed, mode, pending_attachment.take())
            .await?;

        if let Some(reply) = session.messages().last() {
            print_message(reply);
            if speak_replies {
                speak_last_reply(&session, &provider, &sink).await;
            }
        }
    }

    println!("Goodbye.");
    Ok(())
}
