//! Context window assembly — the core of the runtime.
//!
//! Builds one bounded prompt string per model turn from four inputs: the
//! current persona's instruction text, the conversation log, any retrieved
//! background chunks, and the token limits. Sections are budgeted in strict
//! order:
//!
//! 1. **System** (persona instructions + response cap) — mandatory
//! 2. **RAG** (retrieved chunks, presented as user turns) — mandatory as a
//!    whole: chunks are never silently dropped
//! 3. **Most-recent turn** (re-attributed to the user) — mandatory
//! 4. **Older history** (newest → oldest) — best-effort, truncates silently
//!
//! The final concatenation is system + RAG + history (oldest → newest) +
//! most-recent turn + assistant cue. Assembly is deterministic: identical
//! inputs yield byte-identical output.

use std::collections::VecDeque;

use roundtable_core::{BudgetExceeded, ConversationLog, Persona, Section};
use tracing::debug;

use crate::budget::TokenBudget;
use crate::format::{ASSISTANT_CUE, BEGIN_OF_TEXT, SectionFormatter};
use crate::observer::SectionObserver;
use crate::token::{CharRatioEstimator, LLAMA3_WORDS_PER_TOKEN, TokenEstimator};

/// Default early-stop threshold for the older-history walk, in tokens.
pub const DEFAULT_MINIMUM_TURN_SIZE: usize = 16;

/// Assembles the context window for the next model turn.
pub struct ContextWindowAssembler {
    estimator: Box<dyn TokenEstimator + Send + Sync>,
    formatter: SectionFormatter,
    words_per_token: f64,
    minimum_turn_size: usize,
}

impl ContextWindowAssembler {
    /// Assembler with the default character-ratio estimator.
    pub fn new() -> Self {
        Self::with_estimator(Box::new(CharRatioEstimator::default()))
    }

    /// Assembler with a caller-supplied estimation strategy.
    pub fn with_estimator(estimator: Box<dyn TokenEstimator + Send + Sync>) -> Self {
        Self {
            estimator,
            formatter: SectionFormatter,
            words_per_token: LLAMA3_WORDS_PER_TOKEN,
            minimum_turn_size: DEFAULT_MINIMUM_TURN_SIZE,
        }
    }

    /// Override the words-per-token ratio used to phrase the response cap.
    pub fn words_per_token(mut self, ratio: f64) -> Self {
        self.words_per_token = ratio;
        self
    }

    /// Override the early-stop threshold for the history walk.
    pub fn minimum_turn_size(mut self, tokens: usize) -> Self {
        self.minimum_turn_size = tokens;
        self
    }

    /// Assemble the prompt for the next turn.
    ///
    /// `max_tokens` is the hard ceiling on the full window including the
    /// reserved `max_response_tokens`, which the assembler leaves unfilled.
    pub fn assemble(
        &self,
        persona: &Persona,
        log: &ConversationLog,
        rag_chunks: &[String],
        max_tokens: usize,
        max_response_tokens: usize,
    ) -> Result<String, BudgetExceeded> {
        self.assemble_observed(persona, log, rag_chunks, max_tokens, max_response_tokens, None)
    }

    /// `assemble`, reporting each formatted section to `observer`.
    pub fn assemble_observed(
        &self,
        persona: &Persona,
        log: &ConversationLog,
        rag_chunks: &[String],
        max_tokens: usize,
        max_response_tokens: usize,
        mut observer: Option<&mut dyn SectionObserver>,
    ) -> Result<String, BudgetExceeded> {
        // Reserve the response allowance and the trailing assistant cue up
        // front; everything else is costed against what remains. An
        // impossible reservation leaves a zero budget and surfaces as a
        // system-section failure.
        let cue_tokens = self.estimator.estimate(ASSISTANT_CUE);
        let working = max_tokens
            .saturating_sub(max_response_tokens)
            .saturating_sub(cue_tokens);
        let mut budget = TokenBudget::new(working);

        // ── System section (mandatory) ─────────────────────────────────
        let word_cap = (self.words_per_token * max_response_tokens as f64) as usize;
        let system_text = format!(
            "{} Limit your response to {} words or less.",
            persona.system_prompt.trim_end(),
            word_cap
        );
        let system_section = format!(
            "{BEGIN_OF_TEXT}{}",
            self.formatter.render("system", &system_text)
        );
        let system_tokens = self.estimator.estimate(&system_section);
        budget.consume(Section::System, system_tokens)?;
        notify(&mut observer, "system", &system_section, system_tokens);
        debug!(
            persona = %persona,
            tokens = system_tokens,
            remaining = budget.remaining(),
            "system section consumed"
        );

        // ── RAG section (mandatory as a whole) ─────────────────────────
        let mut rag_section = String::new();
        for chunk in rag_chunks {
            let rendered = self.formatter.render("user", chunk);
            let tokens = self.estimator.estimate(&rendered);
            budget.consume(Section::Rag, tokens)?;
            notify(&mut observer, "rag", &rendered, tokens);
            rag_section.push_str(&rendered);
        }
        if !rag_chunks.is_empty() {
            debug!(
                chunks = rag_chunks.len(),
                remaining = budget.remaining(),
                "rag section consumed"
            );
        }

        // ── Most-recent turn (mandatory) ───────────────────────────────
        // The turn that immediately precedes generation is always presented
        // as the user's prompt, whoever actually spoke it.
        let mut latest_section = String::new();
        if let Some(last) = log.last() {
            let rendered = self.formatter.render("user", &last.as_user_line());
            let tokens = self.estimator.estimate(&rendered);
            budget.consume(Section::MostRecentTurn, tokens)?;
            notify(&mut observer, "most_recent_turn", &rendered, tokens);
            latest_section = rendered;
        }

        // ── Older history (best-effort, newest → oldest) ───────────────
        let mut history: VecDeque<String> = VecDeque::new();
        let older = log.turns().split_last().map_or(&[][..], |(_, rest)| rest);
        let mut dropped = 0usize;
        for turn in older.iter().rev() {
            if budget.remaining() < self.minimum_turn_size {
                dropped = older.len() - history.len();
                break;
            }
            let rendered = self
                .formatter
                .render(&turn.persona.identifier(), &turn.attributed_line());
            let tokens = self.estimator.estimate(&rendered);
            if !budget.try_consume(tokens) {
                dropped = older.len() - history.len();
                break;
            }
            notify(&mut observer, "history", &rendered, tokens);
            history.push_front(rendered);
        }
        if dropped > 0 {
            debug!(
                kept = history.len(),
                dropped,
                remaining = budget.remaining(),
                "older history truncated"
            );
        }

        // ── Concatenate ────────────────────────────────────────────────
        let mut window = String::with_capacity(
            system_section.len()
                + rag_section.len()
                + history.iter().map(String::len).sum::<usize>()
                + latest_section.len()
                + ASSISTANT_CUE.len(),
        );
        window.push_str(&system_section);
        window.push_str(&rag_section);
        for section in &history {
            window.push_str(section);
        }
        window.push_str(&latest_section);
        window.push_str(ASSISTANT_CUE);
        notify(&mut observer, "assistant_cue", ASSISTANT_CUE, cue_tokens);

        Ok(window)
    }
}

impl Default for ContextWindowAssembler {
    fn default() -> Self {
        Self::new()
    }
}

fn notify(
    observer: &mut Option<&mut dyn SectionObserver>,
    name: &str,
    text: &str,
    tokens: usize,
) {
    if let Some(obs) = observer {
        obs.on_section(name, text, tokens);
    }
}
