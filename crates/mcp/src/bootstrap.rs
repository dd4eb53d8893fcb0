//! Startup authentication: resume a saved session or log in fresh.

use crate::config::Settings;
use anyhow::{bail, Context, Result};
use monarch_client::{MonarchClient, MonarchError, SessionStore};
use std::io::IsTerminal;
use tracing::{info, warn};

/// Source of a one-time code when Monarch asks for MFA and no seed is set.
pub trait MfaPrompt: Send + Sync {
    /// `Ok(None)` when no code can be obtained.
    fn one_time_code(&self) -> Result<Option<String>>;
}

/// Prompts on stderr, but only when stdin is an interactive terminal.
pub struct TerminalPrompt;

impl MfaPrompt for TerminalPrompt {
    fn one_time_code(&self) -> Result<Option<String>> {
        if !std::io::stdin().is_terminal() {
            return Ok(None);
        }

        let code: String = dialoguer::Input::new()
            .with_prompt("Monarch MFA code")
            .interact_text()
            .context("reading MFA code")?;
        let code = code.trim().to_string();
        Ok((!code.is_empty()).then_some(code))
    }
}

/// Never supplies a code.
pub struct NoPrompt;

impl MfaPrompt for NoPrompt {
    fn one_time_code(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Produce an authenticated client for `settings`.
pub async fn bootstrap(settings: &Settings, prompt: &dyn MfaPrompt) -> Result<MonarchClient> {
    let base = MonarchClient::builder()
        .base_url(settings.api_base_url.as_str())
        .build()
        .context("building Monarch client")?;
    let store = SessionStore::new(&settings.session_dir);

    if !settings.force_login {
        if let Some(client) = resume(&base, &store).await {
            return Ok(client);
        }
    } else {
        info!("Forced login requested, ignoring saved session");
    }

    let client = login(&base, settings, prompt).await?;
    if let Some(token) = client.token() {
        store
            .save(token)
            .with_context(|| format!("saving session to {}", store.path().display()))?;
        info!(path = %store.path().display(), "Saved Monarch session");
    }

    Ok(client)
}

/// Reuse the saved token when it still works.
async fn resume(base: &MonarchClient, store: &SessionStore) -> Option<MonarchClient> {
    let token = match store.load() {
        Ok(Some(token)) => token,
        Ok(None) => return None,
        Err(e) => {
            warn!(error = %e, "Could not read saved session");
            return None;
        }
    };

    let client = match base.with_token(token) {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "Saved session unusable");
            return None;
        }
    };

    match client.accounts().list().await {
        Ok(_) => {
            info!("Resumed saved Monarch session");
            Some(client)
        }
        Err(e) if e.is_auth_error() => {
            warn!(error = %e, "Existing session invalid, logging in again");
            if let Err(e) = store.clear() {
                warn!(error = %e, "Could not remove stale session");
            }
            None
        }
        Err(e) => {
            warn!(error = %e, "Could not validate saved session, logging in again");
            None
        }
    }
}

async fn login(
    base: &MonarchClient,
    settings: &Settings,
    prompt: &dyn MfaPrompt,
) -> Result<MonarchClient> {
    let attempt = match base.login(&settings.credentials).await {
        Err(MonarchError::Totp(reason)) => {
            warn!(%reason, "Could not derive a one-time code, logging in without it");
            base.login_with_code(&settings.credentials, None).await
        }
        other => other,
    };

    match attempt {
        Ok(client) => Ok(client),
        Err(MonarchError::MfaRequired) => {
            let Some(code) = prompt.one_time_code()? else {
                bail!("Monarch requires MFA: set MONARCH_MFA_SECRET or run interactively");
            };
            base.login_with_code(&settings.credentials, Some(code))
                .await
                .context("Monarch login with MFA code failed")
        }
        Err(e) => Err(e).context("Monarch login failed"),
    }
}
