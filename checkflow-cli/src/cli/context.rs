//! Shared CLI plumbing: configuration, store access and login

use anyhow::{anyhow, Context, Result};
use checkflow_core::identity::ActorContext;
use checkflow_core::models::Configuration;
use checkflow_core::Checkflow;
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Credentials of the user a command runs as
#[derive(Args, Debug, Clone, Default)]
pub struct ActorArgs {
    /// Employee id to act as
    #[arg(
        id = "acting_as",
        long = "as",
        value_name = "EMPLOYEE_ID",
        env = "CHECKFLOW_USER"
    )]
    pub employee_id: Option<String>,

    /// Credential of the acting user
    #[arg(id = "acting_credential", long = "credential", env = "CHECKFLOW_CREDENTIAL", hide_env_values = true)]
    pub credential: Option<String>,
}

impl ActorArgs {
    /// Authenticate against the directory
    pub fn login(&self, app: &Checkflow) -> Result<ActorContext> {
        let employee_id = self
            .employee_id
            .as_deref()
            .ok_or_else(|| anyhow!("--as <EMPLOYEE_ID> (or CHECKFLOW_USER) is required"))?;
        let credential = self
            .credential
            .as_deref()
            .ok_or_else(|| anyhow!("--credential (or CHECKFLOW_CREDENTIAL) is required"))?;

        app.directory
            .authenticate(employee_id, credential)
            .context("Login failed")
    }
}

/// Resolve the configuration file path, falling back to the XDG default
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Configuration::default_config_path()
            .map_err(|e| anyhow!("Failed to get default config path: {}", e)),
    }
}

/// Load and validate the configuration, applying a store override
pub fn load_configuration(config: Option<&Path>, store: Option<PathBuf>) -> Result<Configuration> {
    let path = config_path(config)?;
    let mut configuration = if path.exists() {
        Configuration::load_from_file(&path)
            .map_err(|e| anyhow!("Failed to load config {}: {}", path.display(), e))?
    } else {
        Configuration::default()
    };

    if let Some(store) = store {
        configuration.store_path = store;
    }

    configuration
        .validate()
        .map_err(|errors| anyhow!("Invalid configuration:\n  {}", errors.join("\n  ")))?;
    Ok(configuration)
}

/// Open the store named by the configuration
pub fn open(configuration: &Configuration) -> Result<Checkflow> {
    Checkflow::open(configuration).with_context(|| {
        format!(
            "Failed to open workflow store at {}",
            configuration.store_path.display()
        )
    })
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
