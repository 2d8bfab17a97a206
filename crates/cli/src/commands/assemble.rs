//! `roundtable assemble` — build the prompt(s) for the next turn(s).
//!
//! Replays a transcript file into a fresh conversation log, seats the
//! round table from configuration, and prints the assembled wire string
//! for each requested round, advancing the table between rounds.
//!
//! Transcript format: a JSON array of `{"speaker": "...", "content": "..."}`
//! entries. The speaker `User` records a user utterance; any other speaker
//! must name a roster persona and records a model reply attributed to it.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use roundtable_config::AppConfig;
use roundtable_core::{ConversationLog, Error, builtin};
use roundtable_context::{
    CharRatioEstimator, ContextWindowAssembler, RecordingObserver, TokenEstimator,
};

#[derive(Debug, Deserialize)]
struct TranscriptEntry {
    speaker: String,
    content: String,
}

pub fn run(
    config_path: &Path,
    transcript_path: &Path,
    rag_paths: &[std::path::PathBuf],
    persona: Option<&str>,
    rounds: usize,
    stats: bool,
) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let log = replay_transcript(&config, transcript_path)?;
    let chunks = read_rag_chunks(rag_paths)?;

    let mut table = config.round_table()?;
    if let Some(name) = persona {
        let persona = config
            .find_persona(name)
            .ok_or_else(|| Error::UnknownPersona(name.to_string()))?;
        table.switch_to(persona);
    }

    let ctx = &config.context;
    let assembler =
        ContextWindowAssembler::with_estimator(Box::new(CharRatioEstimator::new(ctx.chars_per_token)))
            .words_per_token(ctx.words_per_token)
            .minimum_turn_size(ctx.minimum_turn_size);

    for round in 0..rounds {
        if round > 0 {
            table.advance();
            println!();
        }
        let speaker = table.current().clone();
        if rounds > 1 {
            println!("── round {} · {} ──", round + 1, speaker.name);
        }

        let mut observer = RecordingObserver::default();
        let window = assembler.assemble_observed(
            &speaker,
            &log,
            &chunks,
            ctx.max_tokens,
            ctx.max_response_tokens,
            Some(&mut observer),
        )?;
        print!("{window}");

        if stats {
            let estimator = CharRatioEstimator::new(ctx.chars_per_token);
            let total: usize = observer.sections.iter().map(|s| s.tokens).sum();
            eprintln!("\n# sections");
            for section in &observer.sections {
                eprintln!("#   {:<18} {:>6} tokens", section.name, section.tokens);
            }
            eprintln!(
                "#   {:<18} {:>6} tokens (of {} working, {} ceiling)",
                "total",
                total,
                ctx.max_tokens
                    .saturating_sub(ctx.max_response_tokens)
                    .saturating_sub(estimator.estimate(roundtable_context::ASSISTANT_CUE)),
                ctx.max_tokens
            );
        }
    }

    Ok(())
}

fn replay_transcript(config: &AppConfig, path: &Path) -> Result<ConversationLog> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading transcript {}", path.display()))?;
    let entries: Vec<TranscriptEntry> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;

    let mut log = ConversationLog::new();
    for entry in entries {
        if entry.speaker.eq_ignore_ascii_case(builtin::USER_NAME) {
            log.record_user(entry.content);
        } else {
            let persona = config
                .find_persona(&entry.speaker)
                .ok_or_else(|| Error::UnknownPersona(entry.speaker.clone()))?;
            log.record_reply(&persona, entry.content);
        }
    }
    debug!(turns = log.len(), "transcript replayed");
    Ok(log)
}

fn read_rag_chunks(paths: &[std::path::PathBuf]) -> Result<Vec<String>> {
    paths
        .iter()
        .map(|p| {
            std::fs::read_to_string(p).with_context(|| format!("reading rag chunk {}", p.display()))
        })
        .collect()
}
