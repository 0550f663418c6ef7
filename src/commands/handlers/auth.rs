//! `auth` subcommands.

use serde_json::json;

use super::short_date;
use crate::auth::{AuthService, Credentials, SignUp, User};
use crate::cli::AuthCommand;
use crate::commands::{CommandContext, CommandOutput};
use crate::error::Result;

pub async fn handle(ctx: &CommandContext<'_>, command: AuthCommand) -> Result<CommandOutput> {
    let auth = AuthService::new(ctx.pool, ctx.tokens, ctx.config.auth.session_ttl_days);

    match command {
        AuthCommand::Signup {
            email,
            name,
            password,
        } => {
            let user = auth
                .sign_up(SignUp {
                    email,
                    password,
                    name,
                })
                .await?;
            Ok(CommandOutput::new(&json!({
                "id": user.id,
                "email": user.email,
                "name": user.name(),
            }))?
            .info(format!("Signed up and signed in as {}", user.email)))
        }
        AuthCommand::Signin { email, password } => {
            let user = auth.sign_in(Credentials { email, password }).await?;
            Ok(CommandOutput::new(&json!({ "user": user }))?
                .info(format!("Signed in as {}", user.email)))
        }
        AuthCommand::Signout => {
            let had_session = auth.sign_out().await?;
            let message = if had_session {
                "Signed out"
            } else {
                "No active session"
            };
            Ok(CommandOutput::new(&json!({ "success": true }))?.info(message))
        }
        AuthCommand::Whoami => match auth.current_user().await? {
            Some(user) => user_output(&user),
            None => Ok(CommandOutput::new(&json!({ "user": null }))?.info("Not signed in")),
        },
        AuthCommand::Profile(args) => {
            let current = auth.require_user().await?;
            if !args.is_update() {
                return user_output(&current);
            }
            let user = auth.update_profile(args.merge(&current)).await?;
            Ok(user_output(&user)?.info("Profile updated"))
        }
    }
}

fn user_output(user: &User) -> Result<CommandOutput> {
    Ok(CommandOutput::new(&json!({ "user": user }))?.fields([
        ("Name", user.name()),
        ("Email", user.email.clone()),
        ("Image", user.image_url.clone().unwrap_or_else(|| "-".to_string())),
        ("Member since", short_date(user.created_at)),
    ]))
}
