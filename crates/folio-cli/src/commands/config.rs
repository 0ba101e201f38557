use anyhow::{Context, Result, bail};
use clap::Subcommand;
use folio_infrastructure::{ConfigService, FolioConfig};
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration (file + environment)
    Show,
    /// Validate the effective configuration
    Check,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(path: Option<&Path>, action: &ConfigAction) -> Result<()> {
    let service = match path {
        Some(path) => ConfigService::new(path),
        None => ConfigService::at_default_path()?,
    };

    match action {
        ConfigAction::Show => {
            let config = service.get_config()?;
            print!("{}", config.to_toml_string()?);
        }
        ConfigAction::Check => {
            let config = service.get_config()?;
            config
                .validate()
                .with_context(|| format!("{} is not usable", service.path().display()))?;
            println!("✅ {} is valid", service.path().display());
        }
        ConfigAction::Init { force } => {
            if service.path().exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    service.path().display()
                );
            }
            service.save(&FolioConfig::default())?;
            println!("📝 Wrote {}", service.path().display());
            println!("   Set backend.url and backend.anon_key before use.");
        }
    }
    Ok(())
}
