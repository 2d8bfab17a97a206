//! The Llama-3 header wire format.
//!
//! Every prompt section is a headered turn:
//!
//! ```text
//! <|start_header_id|>ROLE<|end_header_id|>\nCONTENT<|eot_id|>\n
//! ```
//!
//! with the whole prompt opened by `<|begin_of_text|>` and closed by the
//! assistant cue — which carries no `<|eot_id|>`, leaving the prompt open
//! for the model to continue.

use std::sync::LazyLock;

use regex::Regex;

pub const BEGIN_OF_TEXT: &str = "<|begin_of_text|>";
pub const START_HEADER: &str = "<|start_header_id|>";
pub const END_HEADER: &str = "<|end_header_id|>";
pub const END_OF_TURN: &str = "<|eot_id|>";

/// Trailing cue that hands the prompt to the model for generation.
pub const ASSISTANT_CUE: &str = "<|start_header_id|>assistant<|end_header_id|>\n";

static HEADER_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\|end_header_id\|>\s*").expect("static pattern"));

/// Wraps (role, content) pairs into wire-level turn syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionFormatter;

impl SectionFormatter {
    /// Render one turn. The header-newline normalization is applied to the
    /// result whether the content is system text, retrieved text, or a
    /// turn body.
    pub fn render(&self, role: &str, content: &str) -> String {
        let raw = format!("{START_HEADER}{role}{END_HEADER}\n{content}{END_OF_TURN}\n");
        normalize_header_newlines(&raw)
    }
}

/// Exactly one newline after every end-header marker: runs of whitespace
/// collapse to one newline, a missing newline is inserted. Idempotent.
pub fn normalize_header_newlines(text: &str) -> String {
    HEADER_WHITESPACE
        .replace_all(text, "<|end_header_id|>\n")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_produces_headered_turn() {
        let fmt = SectionFormatter;
        assert_eq!(
            fmt.render("user", "Hi"),
            "<|start_header_id|>user<|end_header_id|>\nHi<|eot_id|>\n"
        );
    }

    #[test]
    fn missing_newline_is_inserted() {
        let input = "<|start_header_id|>system<|end_header_id|>text";
        assert_eq!(
            normalize_header_newlines(input),
            "<|start_header_id|>system<|end_header_id|>\ntext"
        );
    }

    #[test]
    fn newline_runs_collapse_to_one() {
        let input = "<|start_header_id|>system<|end_header_id|>\n\n\n  \ntext";
        assert_eq!(
            normalize_header_newlines(input),
            "<|start_header_id|>system<|end_header_id|>\ntext"
        );
    }

    #[test]
    fn single_newline_is_untouched() {
        let input = "<|start_header_id|>user<|end_header_id|>\ntext";
        assert_eq!(normalize_header_newlines(input), input);
    }

    #[test]
    fn normalization_is_idempotent() {
        for input in [
            "<|start_header_id|>a<|end_header_id|>x",
            "<|start_header_id|>a<|end_header_id|>\nx",
            "<|start_header_id|>a<|end_header_id|>\n\n\nx",
        ] {
            let once = normalize_header_newlines(input);
            let twice = normalize_header_newlines(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn normalization_applies_to_every_header_in_a_prompt() {
        let input = "<|start_header_id|>system<|end_header_id|>\n\na<|eot_id|>\n\
                     <|start_header_id|>user<|end_header_id|>b<|eot_id|>\n";
        let out = normalize_header_newlines(input);
        assert_eq!(
            out,
            "<|start_header_id|>system<|end_header_id|>\na<|eot_id|>\n\
             <|start_header_id|>user<|end_header_id|>\nb<|eot_id|>\n"
        );
    }

    #[test]
    fn render_normalizes_leading_content_whitespace() {
        let fmt = SectionFormatter;
        let out = fmt.render("user", "\n\nchunk");
        assert_eq!(
            out,
            "<|start_header_id|>user<|end_header_id|>\nchunk<|eot_id|>\n"
        );
    }

    #[test]
    fn assistant_cue_is_already_normalized() {
        assert_eq!(normalize_header_newlines(ASSISTANT_CUE), ASSISTANT_CUE);
        assert!(!ASSISTANT_CUE.contains(END_OF_TURN));
    }
}
