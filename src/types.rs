//! Core identifier types for the stepgraph workflow builder.
//!
//! This module defines the fundamental types used throughout the crate for
//! naming states in a workflow graph. These are the core domain concepts
//! that define what a workflow *is made of*.
//!
//! # Key Types
//!
//! - [`StateId`]: the unique string identifier of a state within one
//!   workflow document (including every nested branch and iterator)
//! - [`StateToken`]: an opaque per-construction identity, used to tell
//!   "the same state value" apart from "a different state with the same name"
//!
//! # Examples
//!
//! ```rust
//! use stepgraph::types::StateId;
//!
//! let id = StateId::new("CheckInventory");
//! assert_eq!(id.as_str(), "CheckInventory");
//!
//! // String literals convert where a StateId is expected
//! let other: StateId = "ShipOrder".into();
//! assert_ne!(id, other);
//! ```

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

/// Unique identifier of a state within one workflow document.
///
/// Uniqueness is scoped to the whole workflow tree: two states in different
/// Parallel branches of the same top-level graph still may not share an id.
/// Violations surface as
/// [`StateGraphError::DuplicateStateId`](crate::errors::StateGraphError::DuplicateStateId)
/// at registration or validation time, never at construction time.
///
/// # Examples
///
/// ```rust
/// use stepgraph::types::StateId;
///
/// let id = StateId::new("Validate");
/// let prefixed = id.with_prefix("Retry1_");
/// assert_eq!(prefixed.as_str(), "Retry1_Validate");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(String);

impl StateId {
    /// Creates a new state id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        StateId(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a copy of this id with `prefix` prepended.
    ///
    /// Used when the same workflow fragment is instantiated more than once
    /// in a single document; see
    /// [`StateGraph::prefix_states`](crate::graph::StateGraph::prefix_states).
    #[must_use]
    pub fn with_prefix(&self, prefix: &str) -> Self {
        StateId(format!("{prefix}{}", self.0))
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StateId {
    fn from(s: &str) -> Self {
        StateId(s.to_string())
    }
}

impl From<String> for StateId {
    fn from(s: String) -> Self {
        StateId(s)
    }
}

impl From<&StateId> for StateId {
    fn from(s: &StateId) -> Self {
        s.clone()
    }
}

impl AsRef<str> for StateId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for StateId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Opaque identity minted when a state value is constructed.
///
/// Cloning a [`State`](crate::state::State) preserves its token, so two
/// clones are "the same state" even though they are distinct Rust values.
/// Whole-tree validation uses this to detect a state claimed by more than
/// one graph
/// ([`CrossGraphReuse`](crate::errors::StateGraphError::CrossGraphReuse)),
/// while two independently constructed states that merely share a name are a
/// [`DuplicateStateId`](crate::errors::StateGraphError::DuplicateStateId).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StateToken(Uuid);

impl StateToken {
    /// Mints a fresh, globally unique token.
    #[must_use]
    pub fn fresh() -> Self {
        StateToken(Uuid::new_v4())
    }
}
