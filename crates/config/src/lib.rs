//! Configuration loading and validation for the roundtable runtime.
//!
//! Loads a TOML file with `ROUNDTABLE_*` environment-variable overrides
//! applied on top, then validates everything before it reaches the
//! assembler. A missing file falls back to defaults: the built-in persona
//! roster and the Llama-3 window calibration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use roundtable_core::{Error, Persona, Result, RoundTable, builtin};

/// The root configuration structure. Maps directly to `roundtable.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Context-window sizing and calibration.
    #[serde(default)]
    pub context: ContextConfig,

    /// Persona roster. Empty means "use the built-ins".
    #[serde(default)]
    pub personas: Vec<PersonaConfig>,

    /// Seating order by persona name. Empty means "seat the whole roster".
    #[serde(default)]
    pub round_table: Vec<String>,
}

/// Context-window sizing and estimator calibration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Hard ceiling on the full window, reserved response included.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Response allowance subtracted from `max_tokens`, left unfilled.
    #[serde(default = "default_max_response_tokens")]
    pub max_response_tokens: usize,

    /// Estimator calibration.
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: f64,

    /// Phrases the response-length cap inside the system instruction.
    #[serde(default = "default_words_per_token")]
    pub words_per_token: f64,

    /// Early-stop threshold for the older-history walk, in tokens.
    #[serde(default = "default_minimum_turn_size")]
    pub minimum_turn_size: usize,
}

fn default_max_tokens() -> usize {
    2048
}
fn default_max_response_tokens() -> usize {
    250
}
fn default_chars_per_token() -> f64 {
    3.5
}
fn default_words_per_token() -> f64 {
    0.7
}
fn default_minimum_turn_size() -> usize {
    16
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            max_response_tokens: default_max_response_tokens(),
            chars_per_token: default_chars_per_token(),
            words_per_token: default_words_per_token(),
            minimum_turn_size: default_minimum_turn_size(),
        }
    }
}

/// A configured persona.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    pub name: String,
    pub system_prompt: String,
}

impl AppConfig {
    /// Load configuration from `path`, apply environment overrides, and
    /// validate. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            let parsed: Self = toml::from_str(&raw).map_err(|e| Error::Config {
                message: format!("{}: {e}", path.display()),
            })?;
            debug!(path = %path.display(), "configuration loaded");
            parsed
        } else {
            debug!(path = %path.display(), "no configuration file, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// `ROUNDTABLE_MAX_TOKENS`, `ROUNDTABLE_MAX_RESPONSE_TOKENS`,
    /// `ROUNDTABLE_CHARS_PER_TOKEN`, `ROUNDTABLE_WORDS_PER_TOKEN`,
    /// `ROUNDTABLE_MINIMUM_TURN_SIZE`. Unparseable values are ignored
    /// with a warning.
    fn apply_env_overrides(&mut self) {
        override_from_env(&mut self.context.max_tokens, "ROUNDTABLE_MAX_TOKENS");
        override_from_env(
            &mut self.context.max_response_tokens,
            "ROUNDTABLE_MAX_RESPONSE_TOKENS",
        );
        override_from_env(&mut self.context.chars_per_token, "ROUNDTABLE_CHARS_PER_TOKEN");
        override_from_env(&mut self.context.words_per_token, "ROUNDTABLE_WORDS_PER_TOKEN");
        override_from_env(
            &mut self.context.minimum_turn_size,
            "ROUNDTABLE_MINIMUM_TURN_SIZE",
        );
    }

    /// Reject settings the assembler cannot work with.
    pub fn validate(&self) -> Result<()> {
        let ctx = &self.context;
        if ctx.max_tokens == 0 {
            return Err(Error::Config {
                message: "max_tokens must be positive".into(),
            });
        }
        if ctx.max_response_tokens >= ctx.max_tokens {
            return Err(Error::Config {
                message: format!(
                    "max_response_tokens ({}) leaves no working budget inside max_tokens ({})",
                    ctx.max_response_tokens, ctx.max_tokens
                ),
            });
        }
        for (name, value) in [
            ("chars_per_token", ctx.chars_per_token),
            ("words_per_token", ctx.words_per_token),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::Config {
                    message: format!("{name} must be positive and finite, got {value}"),
                });
            }
        }
        for name in &self.round_table {
            if self.find_persona(name).is_none() {
                return Err(Error::UnknownPersona(name.clone()));
            }
        }
        Ok(())
    }

    /// The persona roster: configured personas, or the built-ins when
    /// none are configured.
    pub fn personas(&self) -> Vec<Persona> {
        if self.personas.is_empty() {
            builtin::all()
        } else {
            self.personas
                .iter()
                .map(|p| Persona::new(&p.name, &p.system_prompt))
                .collect()
        }
    }

    /// Look up a roster persona by name, case-insensitively.
    pub fn find_persona(&self, name: &str) -> Option<Persona> {
        self.personas()
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// The seating order resolved against the roster. With no explicit
    /// order and no configured personas, this is the built-in table.
    pub fn round_table(&self) -> Result<RoundTable> {
        if self.round_table.is_empty() {
            if self.personas.is_empty() {
                return RoundTable::new(builtin::default_round_table());
            }
            return RoundTable::new(self.personas());
        }
        let seats: Vec<Persona> = self
            .round_table
            .iter()
            .map(|name| {
                self.find_persona(name)
                    .ok_or_else(|| Error::UnknownPersona(name.clone()))
            })
            .collect::<Result<_>>()?;
        RoundTable::new(seats)
    }
}

fn override_from_env<T: std::str::FromStr>(field: &mut T, var: &str) {
    if let Ok(raw) = std::env::var(var) {
        match raw.parse() {
            Ok(value) => *field = value,
            Err(_) => warn!(var, raw, "ignoring unparseable environment override"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Mutex, MutexGuard};

    // Environment variables are process-global; tests that read or write
    // them serialize on this lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_guard() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_file_yields_defaults() {
        let _guard = env_guard();
        let config = AppConfig::load(Path::new("/nonexistent/roundtable.toml")).unwrap();
        assert_eq!(config.context.max_tokens, 2048);
        assert_eq!(config.context.max_response_tokens, 250);
        assert_eq!(config.context.chars_per_token, 3.5);
        assert_eq!(config.context.words_per_token, 0.7);
        assert_eq!(config.context.minimum_turn_size, 16);
        assert_eq!(config.personas().len(), builtin::all().len());
    }

    #[test]
    fn toml_file_is_loaded() {
        let _guard = env_guard();
        let file = write_config(
            r#"
            round_table = ["Archivist"]

            [context]
            max_tokens = 4096
            max_response_tokens = 500

            [[personas]]
            name = "Archivist"
            system_prompt = "You are a meticulous archivist."
            "#,
        );
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.context.max_tokens, 4096);
        // Unset keys keep their defaults.
        assert_eq!(config.context.chars_per_token, 3.5);

        let table = config.round_table().unwrap();
        assert_eq!(table.current().name, "Archivist");
    }

    #[test]
    fn env_override_wins_over_file() {
        let _guard = env_guard();
        let file = write_config("[context]\nmax_tokens = 4096\n");
        unsafe { std::env::set_var("ROUNDTABLE_MAX_TOKENS", "8192") };
        let config = AppConfig::load(file.path());
        unsafe { std::env::remove_var("ROUNDTABLE_MAX_TOKENS") };
        assert_eq!(config.unwrap().context.max_tokens, 8192);
    }

    #[test]
    fn unparseable_env_override_is_ignored() {
        let _guard = env_guard();
        unsafe { std::env::set_var("ROUNDTABLE_CHARS_PER_TOKEN", "not-a-number") };
        let config = AppConfig::load(Path::new("/nonexistent/roundtable.toml"));
        unsafe { std::env::remove_var("ROUNDTABLE_CHARS_PER_TOKEN") };
        assert_eq!(config.unwrap().context.chars_per_token, 3.5);
    }

    #[test]
    fn response_reservation_must_leave_working_budget() {
        let config = AppConfig {
            context: ContextConfig {
                max_tokens: 100,
                max_response_tokens: 100,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("working budget"));
    }

    #[test]
    fn ratios_must_be_positive_and_finite() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = AppConfig {
                context: ContextConfig {
                    chars_per_token: bad,
                    ..Default::default()
                },
                ..Default::default()
            };
            assert!(config.validate().is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn unknown_round_table_name_is_rejected() {
        let config = AppConfig {
            round_table: vec!["Nobody".into()],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::UnknownPersona(name)) if name == "Nobody"
        ));
    }

    #[test]
    fn default_round_table_seats_the_builtins() {
        let config = AppConfig::default();
        let table = config.round_table().unwrap();
        assert_eq!(table.current().name, "Wise Friend");
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn configured_personas_replace_the_builtins() {
        let config = AppConfig {
            personas: vec![PersonaConfig {
                name: "Archivist".into(),
                system_prompt: "You are a meticulous archivist.".into(),
            }],
            ..Default::default()
        };
        assert_eq!(config.personas().len(), 1);
        assert!(config.find_persona("archivist").is_some());
        assert!(config.find_persona("Wise Friend").is_none());

        let table = config.round_table().unwrap();
        assert_eq!(table.members().len(), 1);
    }
}
