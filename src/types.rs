use std::fmt;

use serde::Deserialize;

// ============================================================================
// ListenerId
// ============================================================================

/// A listener handle returned by [`EventRegistry::register`] and friends.
///
/// Handles are allocated from a per-registry counter starting at 1 and are
/// never reused, so a stale handle can never address a newer listener.
///
/// [`EventRegistry::register`]: crate::registry::EventRegistry::register
pub type ListenerId = u64;

// ============================================================================
// EmitLimit
// ============================================================================

/// Maximum number of times a listener may run before it goes dormant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmitLimit {
    /// No cap.
    #[default]
    Unbounded,
    /// At most `n` invocations.
    Times(u32),
}

impl EmitLimit {
    /// Whether a listener that already ran `times` times may run again.
    pub fn allows(&self, times: u32) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Times(n) => times < *n,
        }
    }

    /// The numeric cap, or `None` when unbounded.
    pub fn get(&self) -> Option<u32> {
        match self {
            Self::Unbounded => None,
            Self::Times(n) => Some(*n),
        }
    }
}

impl From<u32> for EmitLimit {
    fn from(n: u32) -> Self {
        Self::Times(n)
    }
}

impl From<Option<u32>> for EmitLimit {
    fn from(n: Option<u32>) -> Self {
        n.map_or(Self::Unbounded, Self::Times)
    }
}

impl fmt::Display for EmitLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => f.write_str("unbounded"),
            Self::Times(n) => write!(f, "{n}"),
        }
    }
}

// ============================================================================
// ListenerInfo
// ============================================================================

/// Point-in-time copy of one listener entry's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerInfo {
    /// Handle of the entry.
    pub id: ListenerId,
    /// The event this entry is registered under.
    pub event: String,
    /// Maximum number of invocations.
    pub emit_limit: EmitLimit,
    /// Completed invocations so far.
    pub emit_times: u32,
    /// True once at least one invocation has completed.
    pub emitted: bool,
}

impl ListenerInfo {
    /// A dormant entry has used up its emit limit and is skipped by `emit`.
    pub fn is_dormant(&self) -> bool {
        !self.emit_limit.allows(self.emit_times)
    }
}

// ============================================================================
// Decoration
// ============================================================================

/// A set of metadata overwrites for [`EventRegistry::decorate`].
///
/// Each `Some` field replaces the entry's current value; `None` leaves it
/// untouched.
///
/// [`EventRegistry::decorate`]: crate::registry::EventRegistry::decorate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Decoration {
    /// Replacement for the `emitted` flag.
    pub emitted: Option<bool>,
    /// Replacement emit limit.
    pub emit_limit: Option<EmitLimit>,
    /// Replacement completed-invocation count.
    pub emit_times: Option<u32>,
}

impl Decoration {
    /// An empty decoration that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the `emitted` flag.
    pub fn emitted(mut self, emitted: bool) -> Self {
        self.emitted = Some(emitted);
        self
    }

    /// Overwrite the emit limit.
    pub fn emit_limit(mut self, limit: impl Into<EmitLimit>) -> Self {
        self.emit_limit = Some(limit.into());
        self
    }

    /// Overwrite the completed-invocation count.
    pub fn emit_times(mut self, times: u32) -> Self {
        self.emit_times = Some(times);
        self
    }

    /// Clears the call history so a dormant entry becomes active again.
    pub fn reset() -> Self {
        Self::new().emitted(false).emit_times(0)
    }

    /// Whether no field would be overwritten.
    pub fn is_empty(&self) -> bool {
        self.emitted.is_none() && self.emit_limit.is_none() && self.emit_times.is_none()
    }
}
