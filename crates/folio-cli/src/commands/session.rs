use crate::context::AppContext;
use anyhow::{Result, bail};
use clap::{Args, Subcommand, ValueEnum};
use folio_core::identity::{AuthProvider, Credentials, SignInOutcome};
use folio_core::profile::ProfileUpdate;

#[derive(Args)]
pub struct Login {
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    password: Option<String>,
}

impl Login {
    fn credentials(&self) -> Result<Option<Credentials>> {
        match (&self.email, &self.password) {
            (Some(email), Some(password)) => Ok(Some(Credentials::Password {
                email: email.clone(),
                password: password.clone(),
            })),
            (None, None) => Ok(None),
            _ => bail!("--email and --password must be given together"),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Provider {
    Google,
    Github,
}

impl From<Provider> for AuthProvider {
    fn from(provider: Provider) -> Self {
        match provider {
            Provider::Google => AuthProvider::Google,
            Provider::Github => AuthProvider::Github,
        }
    }
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// Bootstrap the session (optionally signing in) and print it
    Whoami {
        #[command(flatten)]
        login: Login,
    },
    /// Start an OAuth sign-in and print the authorize URL
    Oauth {
        #[arg(value_enum)]
        provider: Provider,
        #[arg(long)]
        redirect_to: Option<String>,
    },
    /// Sign in, update the profile and print the result
    UpdateProfile {
        #[command(flatten)]
        login: Login,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        avatar_url: Option<String>,
    },
    /// Sign in, then sign out and print the cleared session
    SignOut {
        #[command(flatten)]
        login: Login,
    },
}

pub async fn run(ctx: &AppContext, action: SessionAction) -> Result<()> {
    let session = &ctx.session;
    session.initialize().await;

    match action {
        SessionAction::Whoami { login } => {
            sign_in_if_requested(ctx, &login).await?;
        }
        SessionAction::Oauth {
            provider,
            redirect_to,
        } => {
            let outcome = session
                .sign_in(Credentials::OAuth {
                    provider: provider.into(),
                    redirect_to,
                })
                .await?;
            if let SignInOutcome::Redirect { url } = outcome {
                println!("🔗 Continue at: {}", url);
            }
        }
        SessionAction::UpdateProfile {
            login,
            full_name,
            avatar_url,
        } => {
            sign_in_if_requested(ctx, &login).await?;
            let update = ProfileUpdate {
                full_name,
                avatar_url,
            };
            if update.is_empty() {
                bail!("nothing to update (use --full-name or --avatar-url)");
            }
            let profile = session.update_profile(update).await?;
            println!("✅ Profile {} updated", profile.id);
        }
        SessionAction::SignOut { login } => {
            sign_in_if_requested(ctx, &login).await?;
            if let Err(err) = session.sign_out().await {
                println!("⚠️  Remote sign-out failed: {}", err);
            }
        }
    }

    let snapshot = session.snapshot();
    println!("status: {}", snapshot.status());
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    session.shutdown().await;
    Ok(())
}

async fn sign_in_if_requested(ctx: &AppContext, login: &Login) -> Result<()> {
    if let Some(credentials) = login.credentials()? {
        ctx.session.sign_in(credentials).await?;
    }
    Ok(())
}
