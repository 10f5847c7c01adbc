//! CLI command implementations

use crate::output::{to_json, to_table, OutputFormat};
use crate::script::{Replay, Script};
use anyhow::{anyhow, Context};
use serde::Serialize;
use slidecast_core::{ProviderKind, VideoConfig};
use std::path::Path;
use tabled::Tabled;

/// Result of a video-ID extraction
#[derive(Debug, Serialize, Tabled)]
pub struct Extraction {
    pub source: String,
    pub provider: ProviderKind,
    #[tabled(display_with = "display_id")]
    pub video_id: Option<String>,
    pub attribute: &'static str,
}

fn display_id(id: &Option<String>) -> String {
    id.clone().unwrap_or_else(|| "-".to_string())
}

/// Extract the provider and video ID from a source
pub fn extract(source: &str, provider: Option<&str>, format: &str) -> anyhow::Result<()> {
    let provider = match provider {
        Some(name) => name.parse::<ProviderKind>()?,
        None => ProviderKind::detect(source)
            .ok_or_else(|| anyhow!("cannot detect a provider for '{}', pass --provider", source))?,
    };

    let extraction = Extraction {
        source: source.to_string(),
        provider,
        video_id: provider.extract_video_id(source),
        attribute: provider.attribute(),
    };

    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", to_json(&extraction)),
        OutputFormat::Table => println!("{}", to_table([extraction])),
        OutputFormat::Text => {
            println!("Source:    {}", extraction.source);
            println!("Provider:  {}", extraction.provider);
            println!("Attribute: {}", extraction.attribute);
            match &extraction.video_id {
                Some(id) => println!("Video ID:  {}", id),
                None => println!("Video ID:  none (video disabled on this slide)"),
            }
        }
    }

    Ok(())
}

#[derive(Debug, Serialize, Tabled)]
struct ProviderRow {
    provider: ProviderKind,
    attribute: &'static str,
    example: &'static str,
}

/// List supported providers
pub fn providers(format: &str) -> anyhow::Result<()> {
    let rows: Vec<ProviderRow> = ProviderKind::ALL
        .into_iter()
        .map(|provider| ProviderRow {
            provider,
            attribute: provider.attribute(),
            example: match provider {
                ProviderKind::YouTube => "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                ProviderKind::Vimeo => "https://vimeo.com/76979871",
                ProviderKind::Html => "/media/intro.mp4",
            },
        })
        .collect();

    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", to_json(&rows)),
        OutputFormat::Table => println!("{}", to_table(rows)),
        OutputFormat::Text => {
            for row in rows {
                println!("{:<8} {:<28} {}", row.provider, row.attribute, row.example);
            }
        }
    }

    Ok(())
}

/// One trace line for table output
#[derive(Tabled)]
struct TraceRow {
    step: usize,
    action: String,
    states: String,
    commands: String,
    events: String,
}

/// Replay a script and print the transition trace
pub async fn simulate(script: &Path, config: Option<&Path>, format: &str) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(script)
        .with_context(|| format!("reading script {}", script.display()))?;
    let script = Script::from_json(&text)
        .with_context(|| format!("parsing script {}", script.display()))?;

    let config = match config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            Some(VideoConfig::from_json(&json)?)
        }
        None => None,
    };

    let replay = script.replay(config).await;

    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", to_json(&replay)),
        OutputFormat::Table => {
            println!("{}", to_table(trace_rows(&replay)));
            print_summary(&replay);
        }
        OutputFormat::Text => {
            println!(
                "Replaying {} steps (policy: {}, autoplay: {})",
                replay.trace.len(),
                replay.config.deactivation_policy,
                replay.config.autoplay
            );
            for row in trace_rows(&replay) {
                println!("\n{:>3}. {}", row.step, row.action);
                println!("     states:   {}", row.states);
                if !row.commands.is_empty() {
                    println!("     adapter:  {}", row.commands);
                }
                if !row.events.is_empty() {
                    println!("     events:   {}", row.events);
                }
            }
            println!();
            print_summary(&replay);
        }
    }

    if replay.max_live_per_slide > 1 {
        anyhow::bail!("more than one adapter was alive for a slide");
    }

    Ok(())
}

fn trace_rows(replay: &Replay) -> Vec<TraceRow> {
    replay
        .trace
        .iter()
        .map(|step| TraceRow {
            step: step.step,
            action: step.action.to_string(),
            states: step
                .states
                .iter()
                .map(|(slide, state)| format!("{} {}", slide, state))
                .collect::<Vec<_>>()
                .join(", "),
            commands: step
                .commands
                .iter()
                .map(|record| format!("{} {:?}#{}", record.slide, record.command, record.generation))
                .collect::<Vec<_>>()
                .join(", "),
            events: step
                .events
                .iter()
                .map(|event| format!("{} {}", event.name(), event.slide()))
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect()
}

fn print_summary(replay: &Replay) {
    println!("Live players:          {}", replay.live_players);
    println!("Max players per slide: {}", replay.max_live_per_slide);
}
