//! Registry configuration.

use serde::Deserialize;

use crate::types::EmitLimit;

/// Default per-event listener count above which a leak warning is logged.
pub const DEFAULT_MAX_LISTENERS: usize = 10;

/// Options controlling an [`EventRegistry`](crate::registry::EventRegistry).
///
/// Deserializable so it can sit inside a host application's config file;
/// missing fields fall back to [`Default`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EmitterOptions {
    /// Log a warning when a single event gains more listeners than this.
    /// `None` disables the check. Registration is never refused.
    pub max_listeners: Option<usize>,
    /// Limit applied by [`EventRegistry::on`](crate::registry::EventRegistry::on).
    pub default_emit_limit: EmitLimit,
}

impl Default for EmitterOptions {
    fn default() -> Self {
        Self {
            max_listeners: Some(DEFAULT_MAX_LISTENERS),
            default_emit_limit: EmitLimit::Unbounded,
        }
    }
}

impl EmitterOptions {
    /// Whether `count` listeners on one event exceeds the warning threshold.
    pub(crate) fn exceeds_max_listeners(&self, count: usize) -> bool {
        self.max_listeners.is_some_and(|max| count > max)
    }
}
