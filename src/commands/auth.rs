//! Sign-in and sign-out command handlers
//!
//! Auth failures are surfaced inline as colored text rather than propagated
//! as errors; a failed sign-in leaves the process usable and exits cleanly.

use crate::auth::{pkce, AuthClient, HttpAuthClient, TokenStore, User};
use crate::config::Config;
use crate::error::Result;
use chrono::Utc;
use colored::Colorize;
use rustyline::DefaultEditor;

fn describe(user: &User) -> String {
    match &user.email {
        Some(email) => email.clone(),
        None => format!("anonymous ({})", user.id),
    }
}

/// Handle the `login` command
pub async fn handle_login(
    config: &Config,
    email: Option<String>,
    signup: bool,
    anonymous: bool,
    provider: Option<String>,
) -> Result<()> {
    let client = HttpAuthClient::new(&config.auth);

    let session = if let Some(provider) = provider {
        // Authorization-code flow with PKCE: the user opens the printed
        // URL in a browser, approves, and pastes the code back here.
        let pkce = pkce::generate();
        let url = client.authorize_url(&provider, &pkce, &config.auth.redirect_url)?;
        println!("Open this URL in your browser to sign in with {}:", provider);
        println!("{}", url.cyan());

        let mut rl = DefaultEditor::new()?;
        let code = rl.readline("Paste the authorization code: ")?;
        client.exchange_code(code.trim(), &pkce.verifier).await
    } else if anonymous {
        client.sign_in_anonymous().await
    } else {
        let mut rl = DefaultEditor::new()?;
        let email = match email {
            Some(email) => email,
            None => rl.readline("Email: ")?.trim().to_string(),
        };
        let password = rl.readline("Password: ")?;

        if signup {
            client.sign_up(&email, &password).await
        } else {
            client.sign_in_password(&email, &password).await
        }
    };

    let session = match session {
        Ok(session) => session,
        Err(e) => {
            println!("{}", format!("Sign-in failed: {}", e).red());
            return Ok(());
        }
    };

    if let Some(remaining) = session.user.remaining_secs(Utc::now()) {
        if remaining == 0 {
            println!("{}", "Sign-in failed: session already expired".red());
            return Ok(());
        }
        println!(
            "{}",
            format!(
                "Anonymous session active; it expires in {} minutes.",
                remaining / 60
            )
            .yellow()
        );
    }

    TokenStore::new().save(&session)?;
    println!(
        "{}",
        format!("Signed in as {}", describe(&session.user)).green()
    );

    Ok(())
}

/// Handle the `logout` command
pub async fn handle_logout(config: &Config) -> Result<()> {
    let store = TokenStore::new();

    match store.load()? {
        Some(session) => {
            let client = HttpAuthClient::new(&config.auth);
            // Best effort: a stale token must not block clearing the cache.
            if let Err(e) = client.sign_out(&session.access_token).await {
                tracing::warn!("Remote sign-out failed: {}", e);
            }
            store.clear()?;
            println!("{}", "Signed out.".green());
        }
        None => {
            println!("{}", "No active session.".yellow());
        }
    }

    Ok(())
}
