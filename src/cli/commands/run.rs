//! Run command implementation
//!
//! Loads configuration, prints what is about to happen, runs the transfer
//! pipeline and renders its progress events as a spinner line.

use crate::adapters::store::create_connector;
use crate::config::{redact_uri, DocumentIdSetting, SiphonConfig};
use crate::core::transfer::{
    format_elapsed, EventReceiver, EventSink, PipelineState, RunSummary, TransferEvent,
    TransferPipeline,
};
use crate::domain::Result;
use clap::Args;
use secrecy::ExposeSecret;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Skip the confirmation prompt before clearing the target collection
    #[arg(short, long)]
    pub yes: bool,

    /// Read and count without clearing or writing the target
    #[arg(long)]
    pub dry_run: bool,

    /// Override aggregation.batch_size
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,
}

impl RunArgs {
    /// Execute the run command against the outcome of loading `config_path`
    pub async fn execute(
        &self,
        config_path: &str,
        loaded: Result<SiphonConfig>,
    ) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Starting run command");

        let mut config = match loaded {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("❌ {e}");
                return Ok(e.exit_code());
            }
        };

        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }

        if let Some(batch_size) = self.batch_size {
            tracing::info!(batch_size, "Overriding batch size from CLI");
            config.aggregation.batch_size = batch_size;
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("❌ Configuration validation failed: {e}");
            return Ok(2);
        }

        print_banner(&config);

        if config.application.dry_run {
            println!("🔍 DRY RUN MODE - the target will not be cleared or written");
            println!();
        } else if config.target.rewrite_documents && !self.yes {
            print!(
                "Every document in '{}.{}' will be deleted. Proceed? [y/N]: ",
                config.target.db, config.target.collection
            );
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Run cancelled.");
                return Ok(0);
            }
        }

        let connector = match create_connector(config.source.uri.expose_secret().as_ref()) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(e.exit_code());
            }
        };

        let label = format!(
            "Collecting values from '{}.{}' field '{}'",
            config.source.db, config.source.collection, config.source.field
        );
        let (events, receiver) = EventSink::channel();
        let reporter = tokio::spawn(report_progress(receiver, label));

        let result = TransferPipeline::new(config, connector)
            .with_events(events)
            .run()
            .await;

        if let Err(e) = reporter.await {
            tracing::warn!(error = %e, "Progress reporter stopped unexpectedly");
        }

        match result {
            Ok(summary) => {
                print_summary(&summary);
                Ok(0)
            }
            Err(e) => {
                eprintln!("❌ Transfer failed: {e}");
                Ok(e.exit_code())
            }
        }
    }
}

fn print_banner(config: &SiphonConfig) {
    let source = &config.source;
    let target = &config.target;

    println!("🚀 Start");
    println!();
    println!("📥 Source");
    println!("   URI:        {}", redact_uri(source.uri.expose_secret().as_ref()));
    println!("   Database:   {}", source.db);
    println!("   Collection: {}", source.collection);
    println!("   Field:      {}", source.field);
    println!(
        "   Filter:     {}",
        serde_json::Value::Object(source.filter.clone())
    );
    println!();
    println!("📤 Target");
    println!("   URI:        {}", redact_uri(target.uri.expose_secret().as_ref()));
    println!("   Database:   {}", target.db);
    println!("   Collection: {}", target.collection);
    println!("   Field:      {}", target.field);
    println!("   Document:   {}", document_id_label(target.document_id.as_ref()));
    println!();
    println!("⚙️  Options");
    println!("   rewrite_documents:   {}", target.rewrite_documents);
    println!("   rewrite_array:       {}", target.rewrite_array);
    println!("   duplicates_in_array: {}", target.duplicates_in_array);
    println!("   unwrap_object_id:    {}", target.unwrap_object_id);
    println!("   allow_disk_use:      {}", config.aggregation.allow_disk_use);
    println!("   batch_size:          {}", config.aggregation.batch_size);
    println!();
}

fn document_id_label(setting: Option<&DocumentIdSetting>) -> String {
    match setting {
        Some(DocumentIdSetting::Id(id)) => id.clone(),
        Some(DocumentIdSetting::Number(n)) => n.to_string(),
        Some(DocumentIdSetting::Flag(_)) => "false (always a new document)".to_string(),
        None => "(not set, always a new document)".to_string(),
    }
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("✅ Operation completed");
    println!();
    if let Some(removed) = summary.removed {
        println!("🧹 Documents removed:      {removed}");
    }
    println!("📊 Total values collected: {}", summary.total_collected);
    println!("🧩 Documents written:      {}", summary.docs_written);
    println!();
    println!("⏱️  Lead time: {}", format_elapsed(summary.elapsed));
}

/// Text shown next to the spinner after an event, if the event changes it
fn progress_line(label: &str, event: &TransferEvent) -> Option<String> {
    match event {
        TransferEvent::StateChanged(PipelineState::Clearing) => {
            Some("Clearing target collection ...".to_string())
        }
        TransferEvent::StateChanged(PipelineState::Streaming) => Some(format!("{label} ...")),
        TransferEvent::BatchWritten {
            total_collected,
            docs_written,
            elapsed,
            ..
        } => Some(format!(
            "{label} ... {total_collected} values, {docs_written} documents ({})",
            format_elapsed(*elapsed)
        )),
        _ => None,
    }
}

async fn report_progress(mut events: EventReceiver, label: String) {
    let interactive = io::stderr().is_terminal();
    let mut ticker = tokio::time::interval(Duration::from_millis(100));
    let mut frame = 0usize;
    let mut line = "Connecting ...".to_string();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                if let Some(next) = progress_line(&label, &event) {
                    line = next;
                }
                if let TransferEvent::Cleared { removed } = event {
                    clear_line(interactive);
                    println!("🧹 Target cleared: deleted {removed} docs");
                }
            }
            _ = ticker.tick(), if interactive => {
                eprint!("\r{} {line}", SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]);
                let _ = io::stderr().flush();
                frame += 1;
            }
        }
    }

    clear_line(interactive);
}

fn clear_line(interactive: bool) {
    if interactive {
        eprint!("\r\x1b[2K");
        let _ = io::stderr().flush();
    }
}
