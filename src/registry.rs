//! EventRegistry<A> — named-event pub/sub with per-listener emit limits.
//!
//! Each registration becomes a listener entry owned by the registry and is
//! addressed by the [`ListenerId`] returned from `register`. The entry carries
//! its own call budget, so one closure registered under several events (or
//! twice under the same event) keeps independent metadata per registration.
//!
//! Snapshot-on-emit semantics, as for any reentrant emitter:
//!   - A listener removed *during* emission is still called in that round.
//!   - A listener added *during* emission is NOT called until the next emit.
//!
//! Panics inside a listener propagate to the caller and abort the rest of the
//! round. The panicking call does not count toward the listener's limit.
//!
//! All methods take `&self`. The table lock is never held while a listener
//! runs, so listeners may register, unregister or emit from inside a callback.
//! Lock order is always table, then entry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{ArgumentPosition, EmitterError, Result};
use crate::options::EmitterOptions;
use crate::types::{Decoration, EmitLimit, ListenerId, ListenerInfo};

// ============================================================================
// Listener entries
// ============================================================================

struct EntryState {
    emit_limit: EmitLimit,
    /// Completed invocations.
    emit_times: u32,
    /// Invocations that have started but not returned yet. Counted against
    /// the limit so a reentrant emit cannot overrun it.
    in_flight: u32,
    emitted: bool,
}

struct ListenerEntry<A: ?Sized> {
    id: ListenerId,
    event: String,
    callback: Arc<dyn Fn(&A) + Send + Sync>,
    state: Mutex<EntryState>,
}

impl<A: ?Sized> ListenerEntry<A> {
    fn info(&self) -> ListenerInfo {
        let state = self.state.lock();
        ListenerInfo {
            id: self.id,
            event: self.event.clone(),
            emit_limit: state.emit_limit,
            emit_times: state.emit_times,
            emitted: state.emitted,
        }
    }

    /// Reserve an invocation slot, or `None` if the entry is dormant.
    fn begin(&self) -> Option<Invocation<'_, A>> {
        let mut state = self.state.lock();
        if !state.emit_limit.allows(state.emit_times.saturating_add(state.in_flight)) {
            return None;
        }
        state.in_flight += 1;
        Some(Invocation {
            entry: self,
            completed: false,
        })
    }
}

/// A reserved invocation slot. Dropping it without [`Invocation::complete`]
/// (i.e. while unwinding from a listener panic) releases the slot uncounted.
struct Invocation<'a, A: ?Sized> {
    entry: &'a ListenerEntry<A>,
    completed: bool,
}

impl<A: ?Sized> Invocation<'_, A> {
    fn complete(mut self) {
        self.completed = true;
    }
}

impl<A: ?Sized> Drop for Invocation<'_, A> {
    fn drop(&mut self) {
        let mut state = self.entry.state.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        if self.completed {
            state.emitted = true;
            state.emit_times = state.emit_times.saturating_add(1);
            // A concurrent decorate may have lowered the limit mid-call.
            if let Some(n) = state.emit_limit.get() {
                state.emit_times = state.emit_times.min(n);
            }
        }
    }
}

// ============================================================================
// Event table
// ============================================================================

struct EventTable<A: ?Sized> {
    events: HashMap<String, Vec<Arc<ListenerEntry<A>>>>,
    /// Event names in first-registration order.
    order: Vec<String>,
    /// Every live entry by handle.
    by_id: HashMap<ListenerId, Arc<ListenerEntry<A>>>,
}

impl<A: ?Sized> EventTable<A> {
    fn new() -> Self {
        Self {
            events: HashMap::new(),
            order: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    /// Append `entry` and return the new listener count for its event.
    fn insert(&mut self, entry: Arc<ListenerEntry<A>>) -> usize {
        self.by_id.insert(entry.id, Arc::clone(&entry));
        let event = entry.event.clone();
        match self.events.get_mut(&event) {
            Some(list) => {
                list.push(entry);
                list.len()
            }
            None => {
                self.order.push(event.clone());
                self.events.insert(event, vec![entry]);
                1
            }
        }
    }

    /// Remove `id` from `name`'s list. Returns whether anything was removed.
    fn remove(&mut self, name: &str, id: ListenerId) -> bool {
        let Some(list) = self.events.get_mut(name) else {
            return false;
        };
        let before = list.len();
        list.retain(|entry| entry.id != id);
        let removed = list.len() != before;
        if removed {
            self.by_id.remove(&id);
        }
        if list.is_empty() {
            self.remove_event(name);
        }
        removed
    }

    /// Drop `name` and all of its entries. Returns the number of entries removed.
    fn remove_event(&mut self, name: &str) -> usize {
        let Some(list) = self.events.remove(name) else {
            return 0;
        };
        self.order.retain(|n| n != name);
        for entry in &list {
            self.by_id.remove(&entry.id);
        }
        list.len()
    }

    fn clear(&mut self) -> usize {
        let removed = self.by_id.len();
        self.events.clear();
        self.order.clear();
        self.by_id.clear();
        removed
    }
}

// ============================================================================
// EventRegistry
// ============================================================================

/// Synchronous named-event emitter.
///
/// `A` is the argument payload passed to every listener by shared reference.
/// Use a tuple for several arguments, `()` for none, or an enum when one
/// registry carries events with different payload shapes.
pub struct EventRegistry<A: ?Sized = ()> {
    table: Mutex<EventTable<A>>,
    next_id: AtomicU64,
    options: EmitterOptions,
}

impl<A: ?Sized> EventRegistry<A> {
    /// Create a new, empty registry with default options.
    pub fn new() -> Self {
        Self::with_options(EmitterOptions::default())
    }

    /// Create a new, empty registry with the given options.
    pub fn with_options(options: EmitterOptions) -> Self {
        Self {
            table: Mutex::new(EventTable::new()),
            next_id: AtomicU64::new(1),
            options,
        }
    }

    /// The options this registry was created with.
    pub fn options(&self) -> &EmitterOptions {
        &self.options
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Register `callback` for `name`, allowed to run at most `limit` times.
    ///
    /// Registering the same closure twice creates two independent entries.
    /// A limit of `Times(0)` registers a listener that is dormant from the
    /// start. Fails if `name` is empty.
    pub fn register(
        &self,
        name: impl Into<String>,
        callback: impl Fn(&A) + Send + Sync + 'static,
        limit: impl Into<EmitLimit>,
    ) -> Result<ListenerId> {
        let name = name.into();
        let limit = limit.into();
        validate_name(&name)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let entry: Arc<ListenerEntry<A>> = Arc::new(ListenerEntry {
            id,
            event: name.clone(),
            callback: Arc::new(callback),
            state: Mutex::new(EntryState {
                emit_limit: limit,
                emit_times: 0,
                in_flight: 0,
                emitted: false,
            }),
        });
        let count = self.table.lock().insert(entry);

        tracing::debug!(event = %name, id, limit = %limit, "listener registered");
        if self.options.exceeds_max_listeners(count)
            && !self.options.exceeds_max_listeners(count - 1)
        {
            tracing::warn!(
                event = %name,
                count,
                max = ?self.options.max_listeners,
                "possible listener leak: listener count exceeds max_listeners"
            );
        }
        Ok(id)
    }

    /// Register with the configured default limit (unbounded unless
    /// [`EmitterOptions::default_emit_limit`] says otherwise).
    pub fn on(
        &self,
        name: impl Into<String>,
        callback: impl Fn(&A) + Send + Sync + 'static,
    ) -> Result<ListenerId> {
        self.register(name, callback, self.options.default_emit_limit)
    }

    /// Register a listener that runs at most once.
    pub fn register_once(
        &self,
        name: impl Into<String>,
        callback: impl Fn(&A) + Send + Sync + 'static,
    ) -> Result<ListenerId> {
        self.register(name, callback, EmitLimit::Times(1))
    }

    // ------------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------------

    /// Remove listener `id` from `name`.
    ///
    /// Does nothing if `id` is not registered under `name` (safe to call
    /// multiple times). Removing the last listener drops the event name.
    pub fn unregister(&self, name: &str, id: ListenerId) -> Result<&Self> {
        validate_name(name)?;
        if self.table.lock().remove(name, id) {
            tracing::debug!(event = %name, id, "listener unregistered");
        }
        Ok(self)
    }

    /// Remove listener `id` from whichever event it is registered under.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut table = self.table.lock();
        let Some(event) = table.by_id.get(&id).map(|entry| entry.event.clone()) else {
            return false;
        };
        let removed = table.remove(&event, id);
        drop(table);
        if removed {
            tracing::debug!(event = %event, id, "listener unregistered");
        }
        removed
    }

    /// Remove every listener for `name`, or for all events when `None`.
    pub fn remove_all_listeners(&self, name: Option<&str>) -> &Self {
        let removed = {
            let mut table = self.table.lock();
            match name {
                Some(name) => table.remove_event(name),
                None => table.clear(),
            }
        };
        tracing::debug!(event = ?name, removed, "listeners removed");
        self
    }

    // ------------------------------------------------------------------------
    // Emission
    // ------------------------------------------------------------------------

    /// Call every active listener for `name` with `args`, in registration order.
    ///
    /// Returns `false` when no listener is registered for `name`. Returns
    /// `true` otherwise, even if every listener was dormant and nothing ran.
    pub fn emit(&self, name: &str, args: &A) -> bool {
        // Snapshot under the lock (cheap: just ref-count bumps).
        let snapshot: Vec<Arc<ListenerEntry<A>>> = {
            let table = self.table.lock();
            match table.events.get(name) {
                Some(list) => list.clone(),
                None => return false,
            }
        };
        // Lock is released — callbacks can safely re-enter the registry.
        for entry in snapshot {
            let Some(invocation) = entry.begin() else {
                tracing::trace!(event = %name, id = entry.id, "skipping dormant listener");
                continue;
            };
            (entry.callback)(args);
            invocation.complete();
        }
        true
    }

    // ------------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------------

    /// Overwrite metadata on listener `id` and return the same handle.
    ///
    /// This is the only way to revive a dormant listener (see
    /// [`Decoration::reset`]). The result must keep `emit_times` within
    /// `emit_limit`.
    pub fn decorate(&self, id: ListenerId, decoration: Decoration) -> Result<ListenerId> {
        let entry = self
            .table
            .lock()
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| EmitterError::unknown_listener(id))?;

        let mut state = entry.state.lock();
        let emit_limit = decoration.emit_limit.unwrap_or(state.emit_limit);
        let emit_times = decoration.emit_times.unwrap_or(state.emit_times);
        if let Some(n) = emit_limit.get() {
            if emit_times > n {
                return Err(EmitterError::invalid(
                    ArgumentPosition::Value,
                    format!("emit_times of at most {n}"),
                    emit_times.to_string(),
                ));
            }
        }
        state.emit_limit = emit_limit;
        state.emit_times = emit_times;
        if let Some(emitted) = decoration.emitted {
            state.emitted = emitted;
        }
        drop(state);

        tracing::debug!(id, limit = %emit_limit, emit_times, "listener decorated");
        Ok(id)
    }

    /// Whether listener `id` has completed at least one invocation.
    /// `false` for unknown handles.
    pub fn is_emitted(&self, id: ListenerId) -> bool {
        self.listener_info(id).is_some_and(|info| info.emitted)
    }

    /// Whether listener `id` has used up its limit.
    pub fn is_dormant(&self, id: ListenerId) -> bool {
        self.listener_info(id).is_some_and(|info| info.is_dormant())
    }

    /// Current limit of listener `id`, or `None` for unknown handles.
    pub fn emit_limit(&self, id: ListenerId) -> Option<EmitLimit> {
        self.listener_info(id).map(|info| info.emit_limit)
    }

    /// Completed invocations of listener `id`, or `None` for unknown handles.
    pub fn emit_times(&self, id: ListenerId) -> Option<u32> {
        self.listener_info(id).map(|info| info.emit_times)
    }

    /// Metadata snapshot of listener `id`.
    pub fn listener_info(&self, id: ListenerId) -> Option<ListenerInfo> {
        self.table.lock().by_id.get(&id).map(|entry| entry.info())
    }

    // ------------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------------

    /// Number of listeners registered for `name`, dormant ones included.
    pub fn listener_count(&self, name: &str) -> usize {
        self.table.lock().events.get(name).map_or(0, Vec::len)
    }

    /// Number of listeners for `name` that would run on the next emit.
    pub fn active_listener_count(&self, name: &str) -> usize {
        self.listeners(name)
            .iter()
            .filter(|info| !info.is_dormant())
            .count()
    }

    /// Whether `name` has at least one listener, dormant or not.
    pub fn has_listeners(&self, name: &str) -> bool {
        self.table.lock().events.contains_key(name)
    }

    /// Metadata snapshot of every listener for `name`, in registration order.
    pub fn listeners(&self, name: &str) -> Vec<ListenerInfo> {
        let table = self.table.lock();
        table
            .events
            .get(name)
            .map(|list| list.iter().map(|entry| entry.info()).collect())
            .unwrap_or_default()
    }

    /// Snapshot of all event names with at least one listener, in the order
    /// they were first registered.
    pub fn event_names(&self) -> Vec<String> {
        self.table.lock().order.clone()
    }
}

impl<A: ?Sized> Default for EventRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Validation
// ============================================================================

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(EmitterError::empty_name());
    }
    Ok(())
}
