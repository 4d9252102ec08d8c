//! Play a tab file through the logging emitter.
//!
//! ```sh
//! RUST_LOG=debug cargo run -p fretplay --example play_tab -- song.tab 96
//! ```
//!
//! Without a file argument a short built-in riff is played.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use fretconf::FretConfig;
use fretplay::{telemetry, LoggingEmitter, PlaybackSession, VoicePool};

const RIFF: &str = "\
e|-----------------|
B|-----------------|
G|-----------------|
D|-----------5-7---|
A|-----5-7-8-------|
E|-5-8-------------|
";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = FretConfig::load().context("Failed to load configuration")?;
    telemetry::init(&config.telemetry)?;

    let mut args = std::env::args().skip(1);
    let tab = match args.next() {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read tab file {}", path))?,
        None => RIFF.to_string(),
    };
    let tempo = args
        .next()
        .map(|bpm| bpm.parse::<f64>())
        .transpose()
        .context("Tempo must be a number")?;

    let feedback = asciitab::parse_with_feedback(&tab);
    for item in &feedback.feedback {
        info!("{:?} line {}: {}", item.level, item.line, item.message);
    }

    let session = PlaybackSession::new(VoicePool::new(Arc::new(LoggingEmitter)), &config);
    let outcome = session
        .play_tab(&feedback.value, tempo, None, |p| {
            info!(index = p.index, total = p.total, "progress");
        })
        .await?;

    info!(?outcome, "done");
    Ok(())
}
