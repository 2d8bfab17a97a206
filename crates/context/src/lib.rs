//! # Roundtable Context
//!
//! The context-window assembly pipeline: token estimation, the
//! per-assembly token budget, the Llama-3 wire formatter, and the
//! assembler that orders and budgets prompt sections. Everything here is
//! synchronous and free of I/O — one `assemble` call is a pure
//! computation invoked once per model turn boundary.

pub mod assembler;
pub mod budget;
pub mod format;
pub mod observer;
pub mod token;

pub use assembler::{ContextWindowAssembler, DEFAULT_MINIMUM_TURN_SIZE};
pub use budget::TokenBudget;
pub use format::{
    ASSISTANT_CUE, BEGIN_OF_TEXT, END_HEADER, END_OF_TURN, START_HEADER, SectionFormatter,
    normalize_header_newlines,
};
pub use observer::{ObservedSection, RecordingObserver, SectionObserver};
pub use token::{
    CharRatioEstimator, LLAMA3_CHARS_PER_TOKEN, LLAMA3_WORDS_PER_TOKEN, TokenEstimator,
};
