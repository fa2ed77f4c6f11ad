//! Entry and settings screens: sign in, sign up, sign out.

use crate::context::AppContext;
use crate::output;
use anyhow::{Context, Result};
use taskflow_core::{SignUpOutcome, ValidationFailure};

pub async fn login(
    ctx: &AppContext,
    email: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let email = field(email, "Email: ")?;
    let password = field(password, "Password: ")?;
    if email.is_empty() || password.is_empty() {
        return Err(ValidationFailure::MissingCredentials.into());
    }

    let session = ctx.session.sign_in(&email, &password).await?;
    let shown = session.identity.email.unwrap_or(email);
    output::notice(&format!("Signed in as {shown}."));
    Ok(())
}

pub async fn signup(
    ctx: &AppContext,
    email: Option<String>,
    password: Option<String>,
    confirm: Option<String>,
) -> Result<()> {
    let email = field(email, "Email: ")?;
    let password = field(password, "Password: ")?;
    let confirm = field(confirm, "Confirm password: ")?;
    if email.is_empty() || password.is_empty() {
        return Err(ValidationFailure::MissingCredentials.into());
    }
    if password != confirm {
        return Err(ValidationFailure::PasswordMismatch.into());
    }

    match ctx.session.sign_up(&email, &password).await? {
        SignUpOutcome::SignedIn(session) => {
            let shown = session.identity.email.unwrap_or(email);
            output::notice(&format!("Account created. Signed in as {shown}."));
        }
        SignUpOutcome::ConfirmationRequired { email } => {
            output::notice(&format!(
                "Account created. Check {email} for a confirmation link, then run `taskflow login`."
            ));
        }
    }
    Ok(())
}

pub async fn logout(ctx: &AppContext) -> Result<()> {
    ctx.session.logout().await?;
    output::notice("Signed out.");
    Ok(())
}

pub fn settings(ctx: &AppContext) -> Result<()> {
    let identity = ctx
        .session
        .identity()
        .context("session ended while reading settings")?;
    output::notice(&format!(
        "Email:   {}",
        identity.email.as_deref().unwrap_or("(none)")
    ));
    output::notice(&format!("User id: {}", identity.user_id));
    output::notice(&format!("Backend: {}", ctx.config.api_base_url));
    Ok(())
}

fn field(value: Option<String>, label: &str) -> Result<String> {
    match value {
        Some(value) => Ok(value.trim().to_string()),
        None => Ok(output::prompt(label)?.unwrap_or_default()),
    }
}
