//! Persona — a named character profile with a fixed instruction text.
//!
//! Personas are immutable value types: two strings and nothing else. No
//! behavior varies per persona, so there is no trait or dynamic dispatch —
//! the registry hands out values and the assembler reads them.
//!
//! The built-in roster ships the personas the round-table application was
//! launched with, each prompt embedded at compile time from `prompts/`.
//! Configuration may define a replacement roster; the built-ins are the
//! fallback.

use serde::{Deserialize, Serialize};

/// A named character profile steering model behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Display name, also used to attribute turn bodies ("Name: content").
    pub name: String,

    /// Fixed instruction text for the system section. Empty for the user.
    pub system_prompt: String,
}

impl Persona {
    /// Create a persona value.
    pub fn new(name: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
        }
    }

    /// Role label for wire headers: lowercased, word-joined with `_`.
    ///
    /// "Wise Friend" → `wise_friend`, "Edmond Otis" → `edmond_otis`.
    pub fn identifier(&self) -> String {
        let mut id = String::with_capacity(self.name.len());
        for c in self.name.chars() {
            if c.is_alphanumeric() {
                id.extend(c.to_lowercase());
            } else if !id.is_empty() && !id.ends_with('_') {
                id.push('_');
            }
        }
        while id.ends_with('_') {
            id.pop();
        }
        id
    }

    /// Whether this is the distinguished user persona.
    pub fn is_user(&self) -> bool {
        self.name == builtin::USER_NAME
    }
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The read-only built-in persona roster.
pub mod builtin {
    use super::Persona;

    /// Name of the distinguished user persona.
    pub const USER_NAME: &str = "User";

    /// The user persona. Needed to attribute user turns; carries no
    /// instruction text.
    pub fn user() -> Persona {
        Persona::new(USER_NAME, "")
    }

    /// Supportive friend making ancient wisdom relevant to modern life.
    pub fn wise_friend() -> Persona {
        Persona::new("Wise Friend", include_str!("../prompts/wise_friend.md").trim_end())
    }

    /// Pragmatic interpreter focused on real-world application.
    pub fn practical_guide() -> Persona {
        Persona::new(
            "Practical Guide",
            include_str!("../prompts/practical_guide.md").trim_end(),
        )
    }

    /// Storyteller connecting past and present.
    pub fn cultural_bridge() -> Persona {
        Persona::new(
            "Cultural Bridge",
            include_str!("../prompts/cultural_bridge.md").trim_end(),
        )
    }

    /// Performance coach.
    pub fn edmond_otis() -> Persona {
        Persona::new("Edmond Otis", include_str!("../prompts/edmond_otis.md").trim_end())
    }

    /// The Danish existentialist.
    pub fn kierkegaard() -> Persona {
        Persona::new("Kierkegaard", include_str!("../prompts/kierkegaard.md").trim_end())
    }

    /// The German philologist-philosopher.
    pub fn nietzsche() -> Persona {
        Persona::new("Nietzsche", include_str!("../prompts/nietzsche.md").trim_end())
    }

    /// Every built-in persona that can seat at the table (the user persona
    /// is excluded — it never responds).
    pub fn all() -> Vec<Persona> {
        vec![
            wise_friend(),
            cultural_bridge(),
            practical_guide(),
            edmond_otis(),
            kierkegaard(),
            nietzsche(),
        ]
    }

    /// The default seating order for the round table.
    pub fn default_round_table() -> Vec<Persona> {
        vec![wise_friend(), cultural_bridge(), practical_guide()]
    }
}
