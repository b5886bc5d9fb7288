use anyhow::{Context, Result};
use crm_auth::config::loader::load_config;
use crm_auth::EncryptionKey;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::output::{print_success, print_value};

pub fn check(path: Option<&str>, format: OutputFormat) -> Result<()> {
    let config = load_config(path).context("Configuration is invalid")?;

    let key_status = match EncryptionKey::from_env(&config.secret.key_env)? {
        Some(_) => "configured",
        None if config.secret.require_key => {
            anyhow::bail!(
                "{} is not set and secret.require_key is enabled",
                config.secret.key_env
            )
        }
        None => "missing (ephemeral key will be generated)",
    };

    let mut value = serde_json::to_value(&config)?;
    value["secret"]["key_status"] = json!(key_status);
    print_value(&value, format);

    if matches!(format, OutputFormat::Text) {
        print_success("Configuration is valid");
    }
    Ok(())
}
