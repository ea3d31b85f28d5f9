//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Siphon configuration file.

use crate::config::{redact_uri, SiphonConfig};
use crate::core::transfer::WritePolicy;
use crate::domain::Result;
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command against the outcome of loading `config_path`
    pub async fn execute(
        &self,
        config_path: &str,
        loaded: Result<SiphonConfig>,
    ) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match loaded {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                println!();
                return Ok(e.exit_code());
            }
        };

        let policy = WritePolicy::from_config(&config.target, config.application.dry_run);

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);
        println!(
            "  Source: {} ({}.{}, field '{}')",
            redact_uri(config.source.uri.expose_secret().as_ref()),
            config.source.db,
            config.source.collection,
            config.source.field
        );
        println!(
            "  Target: {} ({}, field '{}')",
            redact_uri(config.target.uri.expose_secret().as_ref()),
            policy.namespace(),
            config.target.field
        );
        println!("  Write Action: {}", policy.action());
        println!("  Clears Target First: {}", policy.clears_first());
        println!("  Batch Size: {}", config.aggregation.batch_size);
        println!("  Allow Disk Use: {}", config.aggregation.allow_disk_use);
        println!();
        Ok(0)
    }
}
