//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "siphon.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Siphon configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        match fs::write(&self.output, sample_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your source and target", self.output);
                println!("  2. Put credentials in a .env file, e.g. SIPHON_SOURCE_URI");
                println!("  3. Validate configuration: siphon validate-config");
                println!("  4. Rehearse without writing: siphon run --dry-run");
                println!("  5. Run: siphon run");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }
}

/// Commented sample configuration
pub fn sample_config() -> &'static str {
    r#"# Siphon Configuration File
# Collects one field from a MongoDB collection into array documents

[application]
log_level = "info"  # trace | debug | info | warn | error
dry_run = false     # true: read and count, never clear or write the target

[source]
uri = "mongodb://127.0.0.1:27017"
db = "crystal"
collection = "users"
field = "_id"       # dotted paths reach into embedded documents

# Match filter in MongoDB extended JSON; empty takes every document
filter = {}
# filter = { createdAt = { "$gte" = { "$date" = "2025-08-20T01:26:11.327Z" } } }

[target]
uri = "mongodb://127.0.0.1:27017"
db = "pool"
collection = "usersIdFromCrystal"
field = "usersId"

# false or omitted: every batch becomes a new document
# "<id>": merge into that document, creating it if needed
#         (a 24-character hex string is stored as an ObjectId)
# 42:     an integer is used as the _id verbatim
document_id = false

rewrite_documents = true     # delete every document in the target collection first
rewrite_array = false        # merge only: replace the array on each batch instead of appending
duplicates_in_array = false  # merge only: false appends values not already present
unwrap_object_id = true      # ObjectId('68a8...') becomes '68a8...'

[aggregation]
allow_disk_use = true  # let the server spill the aggregation to disk
# Cursor batch size and array length per written document. Large values with
# large inputs can exceed the 16MB document limit.
batch_size = 1000

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"  # daily | hourly | never
"#
}
