//! The persona round table — an ordered rotation with a current seat.
//!
//! The table only mechanizes rotation. *When* to rotate (after every
//! assistant turn, on user command, never) is the caller's policy; nothing
//! here is coupled to prompt construction, and switching seats leaves the
//! conversation log and any retrieved content untouched.

use tracing::debug;

use crate::error::{Error, Result};
use crate::persona::{Persona, builtin};

/// Ordered rotation of personas with a current seat.
#[derive(Debug, Clone)]
pub struct RoundTable {
    members: Vec<Persona>,
    index: usize,
}

impl RoundTable {
    /// Seat the given personas in order. At least one is required.
    pub fn new(members: Vec<Persona>) -> Result<Self> {
        if members.is_empty() {
            return Err(Error::EmptyRoundTable);
        }
        Ok(Self { members, index: 0 })
    }

    /// The persona whose instruction text steers the next turn.
    pub fn current(&self) -> &Persona {
        &self.members[self.index]
    }

    /// Rotate to the next seat, wrapping after the last.
    pub fn advance(&mut self) -> &Persona {
        self.index = (self.index + 1) % self.members.len();
        debug!(persona = %self.members[self.index], "round table advanced");
        self.current()
    }

    /// Make `persona` the current seat, seating it at the end of the table
    /// if it was not already a member.
    pub fn switch_to(&mut self, persona: Persona) {
        match self.members.iter().position(|p| p.name == persona.name) {
            Some(i) => self.index = i,
            None => {
                self.members.push(persona);
                self.index = self.members.len() - 1;
            }
        }
        debug!(persona = %self.current(), "round table switched");
    }

    /// The seating order.
    pub fn members(&self) -> &[Persona] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Default for RoundTable {
    /// The built-in seating order.
    fn default() -> Self {
        Self {
            members: builtin::default_round_table(),
            index: 0,
        }
    }
}
