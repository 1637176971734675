//! Server and configuration command handlers

use super::context::config_path;
use anyhow::{anyhow, Result};
use checkflow_core::models::{Configuration, LogLevel};
use checkflow_core::server::CheckflowServer;
use std::path::{Path, PathBuf};

/// Handle the 'serve' command
pub async fn handle_serve(
    mut config: Configuration,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    if let Some(host) = host {
        config.server_host = host;
    }
    if let Some(port) = port {
        config.server_port = port;
    }

    let server = CheckflowServer::from_config(&config)?;
    println!("📦 Store: {}", config.store_path.display());
    if server.state().app.store.list_users()?.is_empty() {
        println!("⚠️  The directory is empty. Run `checkflow admin bootstrap` first.");
    }

    server.start().await
}

/// Options accepted by `config init`
#[derive(Debug, Default)]
pub struct ConfigInit {
    pub store: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<LogLevel>,
    pub allow_self_review: Option<bool>,
    pub force: bool,
}

/// Handle `config init`: write a configuration file from defaults and flags
pub fn handle_config_init(config_file: Option<&Path>, options: ConfigInit) -> Result<()> {
    let path = config_path(config_file)?;

    println!("⚙️  Initializing checkflow configuration");
    println!("📄 Config file: {}", path.display());

    let mut config = if path.exists() {
        if !options.force {
            return Err(anyhow!(
                "Configuration file {} already exists (use --force to update it)",
                path.display()
            ));
        }
        println!("⚠️  Configuration file already exists. Updating existing values...");
        Configuration::load_from_file(&path)
            .map_err(|e| anyhow!("Failed to load existing config: {}", e))?
    } else {
        println!("✨ Creating new configuration with defaults...");
        Configuration::default()
    };

    if let Some(store) = options.store {
        config.store_path = store;
    }
    if let Some(host) = options.host {
        config.server_host = host;
    }
    if let Some(port) = options.port {
        config.server_port = port;
    }
    if let Some(level) = options.log_level {
        config.log_level = level;
    }
    if let Some(allow) = options.allow_self_review {
        config.engine.allow_self_review = allow;
    }

    if let Err(errors) = config.validate() {
        println!("❌ Configuration validation failed:");
        for error in &errors {
            println!("   - {}", error);
        }
        return Err(anyhow!("Configuration validation failed"));
    }

    config
        .save_to_file(&path)
        .map_err(|e| anyhow!("Failed to save configuration: {}", e))?;

    println!("✅ Configuration saved successfully!");
    print_summary(&config);
    Ok(())
}

/// Handle `config show`
pub fn handle_config_show(config: &Configuration, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        print_summary(config);
    }
    Ok(())
}

fn print_summary(config: &Configuration) {
    println!("\n📋 Configuration summary:");
    println!("   Store: {}", config.store_path.display());
    println!("   Log level: {}", config.log_level.as_str());
    println!("   Server: {}:{}", config.server_host, config.server_port);
    println!(
        "   Self review: {}",
        if config.engine.allow_self_review {
            "allowed"
        } else {
            "forbidden"
        }
    );
    println!(
        "   Limits: title {} / description {} / remarks {} characters",
        config.engine.max_title_length,
        config.engine.max_description_length,
        config.engine.max_remarks_length
    );
    println!(
        "   Max hierarchy depth: {}",
        config.engine.max_hierarchy_depth
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_init_writes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        handle_config_init(
            Some(&path),
            ConfigInit {
                store: Some(dir.path().join("store.json")),
                port: Some(9191),
                allow_self_review: Some(false),
                ..ConfigInit::default()
            },
        )
        .unwrap();

        let loaded = Configuration::load_from_file(&path).unwrap();
        assert_eq!(loaded.server_port, 9191);
        assert_eq!(loaded.store_path, dir.path().join("store.json"));
        assert!(!loaded.engine.allow_self_review);
    }

    #[test]
    fn test_config_init_refuses_overwrite_without_force() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Configuration::default().save_to_file(&path).unwrap();

        assert!(handle_config_init(Some(&path), ConfigInit::default()).is_err());

        let forced = ConfigInit {
            port: Some(9292),
            force: true,
            ..ConfigInit::default()
        };
        handle_config_init(Some(&path), forced).unwrap();
        assert_eq!(
            Configuration::load_from_file(&path).unwrap().server_port,
            9292
        );
    }

    #[test]
    fn test_config_init_rejects_invalid_port() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let result = handle_config_init(
            Some(&path),
            ConfigInit {
                port: Some(80),
                ..ConfigInit::default()
            },
        );
        assert!(result.is_err());
        assert!(!path.exists());
    }
}
