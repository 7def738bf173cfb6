//! Session lifecycle: login, logout, refresh, status.

use std::io::BufRead;

use classdesk_core::Dashboard;
use secrecy::SecretString;
use serde_json::json;
use tracing::{debug, warn};

use super::Ctx;
use crate::cli::LoginArgs;
use crate::error::CliError;

pub async fn login(args: LoginArgs, dashboard: &Dashboard, ctx: &Ctx<'_>) -> Result<(), CliError> {
    let email = ctx.active.email(args.email.as_deref())?;
    let password = if args.password_stdin {
        read_password_line()?
    } else {
        ctx.active.password()?
    };

    dashboard
        .login(&email, &password)
        .await
        .map_err(|e| CliError::from_core(&e, ctx.profile()))?;

    if args.save {
        if let Err(e) = save_profile(ctx, &email) {
            warn!(error = %e, "could not save profile");
        }
    }

    if args.remember {
        use secrecy::ExposeSecret;
        if let Err(e) = classdesk_config::store_password(ctx.profile(), password.expose_secret()) {
            warn!(error = %e, "could not store password in keyring");
        }
    }

    status(dashboard, ctx);
    Ok(())
}

pub fn logout(dashboard: &Dashboard, ctx: &Ctx<'_>) {
    dashboard.logout();
    status(dashboard, ctx);
}

/// Refresh the access token. On failure the session is left as it was.
pub async fn refresh(dashboard: &Dashboard, ctx: &Ctx<'_>) -> Result<(), CliError> {
    dashboard.refresh().await?;
    debug!(profile = ctx.profile(), "session refreshed");
    status(dashboard, ctx);
    Ok(())
}

pub fn status(dashboard: &Dashboard, ctx: &Ctx<'_>) {
    let session = dashboard.session().snapshot();
    ctx.print(&json!({
        "profile": ctx.profile(),
        "authenticated": session.is_authenticated(),
        "user_id": session.user_id,
    }));
}

/// Record the active base URL and `email` under the profile's name.
fn save_profile(ctx: &Ctx<'_>, email: &str) -> Result<(), CliError> {
    let mut cfg = classdesk_config::load_config()?;
    let saved = cfg.profiles.entry(ctx.profile().to_owned()).or_default();
    saved.base_url.clone_from(&ctx.active.profile.base_url);
    saved.email = Some(email.to_owned());
    classdesk_config::save_config(&cfg)?;
    debug!(profile = ctx.profile(), "profile saved");
    Ok(())
}

fn read_password_line() -> Result<SecretString, CliError> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "empty password on stdin".into(),
        });
    }
    Ok(SecretString::from(password.to_owned()))
}
