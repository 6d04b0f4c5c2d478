//! Ordering tokens for events and membership transitions.

use serde::{Deserialize, Serialize};

/// Globally monotonic position of an event in the server's stream.
///
/// Totally ordered and never reused, so two positions from anywhere in the
/// system can be compared directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamPosition(pub i64);

/// Position of an event within its room's causal graph.
///
/// Independent of arrival order; used to break ties between events that
/// arrived out of causal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopologicalPosition(pub i64);

impl std::fmt::Display for StreamPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for TopologicalPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
