//! Named-event emitter with per-listener emit limits.
//!
//! [`EventRegistry`] maps event names to listener entries. Each entry has a
//! call budget ([`EmitLimit`]); once the budget is spent the entry goes
//! dormant and is skipped by [`EventRegistry::emit`] until it is removed or
//! reset with [`EventRegistry::decorate`].
//!
//! ```
//! use less_emitter::{EmitLimit, EventRegistry};
//!
//! let registry: EventRegistry<u32> = EventRegistry::new();
//! let id = registry
//!     .register("ping", |n| println!("ping {n}"), EmitLimit::Times(2))
//!     .unwrap();
//!
//! assert!(registry.emit("ping", &1));
//! assert!(registry.emit("ping", &2));
//! assert!(registry.emit("ping", &3)); // dormant, but the name is still known
//! assert_eq!(registry.emit_times(id), Some(2));
//! assert!(!registry.emit("unknown", &0));
//! ```

pub mod error;
pub mod options;
pub mod registry;
pub mod types;

pub use error::{ArgumentPosition, EmitterError, Result};
pub use options::EmitterOptions;
pub use registry::EventRegistry;
pub use types::{Decoration, EmitLimit, ListenerId, ListenerInfo};
