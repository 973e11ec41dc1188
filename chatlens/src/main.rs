//! chatlens - chat export statistics and charts
//!
//! Reads one named conversation from an extracted export, computes the
//! configured metrics and writes one SVG chart per metric.

use anyhow::{Context, Result};
use chatlens_core::format::format_run_timestamp;
use chatlens_core::{
    Analysis, ArchiveSource, ChartRenderer, Config, ConversationMode, ExportDirectory, Pipeline,
};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chatlens")]
#[command(about = "Per-participant statistics and charts for a chat export")]
#[command(version)]
struct Args {
    /// Conversation name from the [conversations] table
    #[arg(required_unless_present = "list")]
    conversation: Option<String>,

    /// Config file (default: $XDG_CONFIG_HOME/chatlens/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root of the extracted export (overrides archive_dir)
    #[arg(long)]
    archive: Option<PathBuf>,

    /// Output directory (overrides output_dir)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Participant name to analyse from (overrides self_name)
    #[arg(long)]
    self_name: Option<String>,

    /// Chart layout: individual or group (overrides the conversation's mode)
    #[arg(long)]
    mode: Option<ConversationMode>,

    /// Export format instead of charts (json)
    #[arg(long)]
    export: Option<String>,

    /// List conversation folders in the export and exit
    #[arg(long)]
    list: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;
    apply_overrides(&mut config, &args);

    let _log_guard = chatlens_core::logging::init(&config.logging).ok();

    let archive = config
        .archive_root()
        .context("no export to read; set archive_dir or pass --archive")?
        .to_path_buf();
    let source = ExportDirectory::new(&archive, &config.inbox_prefix);

    if args.list {
        return list_conversations(&source);
    }

    // clap enforces this unless --list was given
    let name = args.conversation.clone().unwrap_or_default();
    config.validate().context("invalid configuration")?;

    println!("{}: Started", format_run_timestamp(Utc::now()));

    let output_dir = config.output_dir.join(&name);
    let pipeline = Pipeline::new(config, source);
    let analysis = pipeline
        .analyze(&name, args.mode)
        .with_context(|| format!("failed to analyse conversation '{}'", name))?;

    match args.export.as_deref() {
        Some("json") => print_json(&analysis)?,
        Some(other) => anyhow::bail!("Unknown export format: {}. Use 'json'", other),
        None => {
            let renderer = ChartRenderer::new(&output_dir, format!("Analysis of {}", name));
            let written = renderer
                .render(&analysis)
                .with_context(|| format!("failed to render charts into {}", output_dir.display()))?;
            tracing::info!(
                files = written.len(),
                dir = %output_dir.display(),
                "Charts written"
            );
        }
    }

    println!("{}: Finished", format_run_timestamp(Utc::now()));
    Ok(())
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(archive) = &args.archive {
        config.archive_dir = Some(archive.clone());
    }
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    if let Some(name) = &args.self_name {
        config.self_name = name.clone();
    }
}

fn list_conversations(source: &ExportDirectory) -> Result<()> {
    let summaries = source
        .list_conversations()
        .with_context(|| format!("failed to list {}", source.inbox().display()))?;

    if summaries.is_empty() {
        println!("No conversations found in {}", source.inbox().display());
        return Ok(());
    }

    for summary in summaries {
        println!(
            "{}\t{}\t{}",
            summary.folder,
            summary.title.as_deref().unwrap_or("-"),
            summary.participants.join(", ")
        );
    }
    Ok(())
}

fn print_json(analysis: &Analysis) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(analysis)?);
    Ok(())
}
