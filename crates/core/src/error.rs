//! Error types for the roundtable domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Assembly has a single
//! failure kind — a mandatory prompt section that cannot fit its token
//! budget — tagged with the section that overran.

use thiserror::Error;

/// Mandatory prompt sections that can overrun the working budget.
///
/// Older conversation history is absent here: it truncates silently and is
/// never reported as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Persona instruction text plus the generated response-length cap.
    System,
    /// Retrieved background chunks, admitted all-or-nothing.
    Rag,
    /// The turn immediately preceding generation.
    MostRecentTurn,
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::System => "system",
            Self::Rag => "rag",
            Self::MostRecentTurn => "most_recent_turn",
        };
        write!(f, "{name}")
    }
}

/// A mandatory section did not fit inside the working token budget.
///
/// The budget it was charged against is left unchanged; the assembly call
/// aborts with no partial result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{section} section exceeds token budget: required {required}, available {available}")]
pub struct BudgetExceeded {
    /// Which section overran.
    pub section: Section,
    /// Tokens still available when the section was costed.
    pub available: usize,
    /// Tokens the section would have consumed.
    pub required: usize,
}

/// The top-level error type for all roundtable operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Assembly errors ---
    #[error("Budget error: {0}")]
    Budget(#[from] BudgetExceeded),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Round table errors ---
    #[error("Round table must seat at least one persona")]
    EmptyRoundTable,

    #[error("Unknown persona: {0}")]
    UnknownPersona(String),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- I/O ---
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;
