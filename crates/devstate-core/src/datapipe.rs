//! Typed, cached broadcast channel with filter and trigger chains.
//!
//! A [`Datapipe`] is the only channel through which subsystems observe and
//! mutate a piece of shared device state. One `execute` call runs, strictly in
//! this order and on the calling thread:
//!
//! ```text
//! candidate ──> filters ──> input triggers ──> commit ──> output triggers
//!               (may veto)  (filtered value)   (cache)    (committed value)
//! ```
//!
//! Each chain runs in registration order. Triggers may execute other pipes
//! synchronously; executing a pipe from inside its own chain is a no-op that
//! returns the cached value.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

/// Subsystem on whose behalf a pipe is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    /// Sensors, telephony, method callers and everything outside the core.
    External,
    /// Device mode transitions.
    ModeTransition,
    /// Device (PIN) lock.
    Devlock,
    /// Touchscreen/keypad lock.
    Tklock,
}

/// Who may push new values into a pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPolicy {
    /// Any subsystem may execute the pipe.
    ReadWrite,
    /// Only the owning subsystem may execute the pipe.
    ReadOnly(Subsystem),
}

/// Where the candidate value of an execution comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source<T> {
    /// Run the chains on this value.
    UseInput(T),
    /// Re-announce the cached value through the chains.
    UseCache,
}

/// What happens to the filtered value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// Replace the cached value.
    CacheResult,
    /// Leave the cache alone; output triggers still see the value.
    DiscardResult,
}

/// Handle to a registered filter or trigger, used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(u64);

type Filter<T> = Rc<dyn Fn(T) -> Option<T>>;
type Trigger<T> = Rc<dyn Fn(&T)>;

/// Ordered list of callbacks.
struct Chain<F> {
    entries: RefCell<Vec<(CallbackId, F)>>,
}

impl<F: Clone> Chain<F> {
    fn new() -> Self {
        Self { entries: RefCell::new(Vec::new()) }
    }

    fn push(&self, id: CallbackId, callback: F) {
        self.entries.borrow_mut().push((id, callback));
    }

    fn remove(&self, id: CallbackId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(entry, _)| *entry != id);
        entries.len() != before
    }

    /// Copy of the chain, so callbacks may (un)register while it runs.
    fn snapshot(&self) -> Vec<F> {
        self.entries.borrow().iter().map(|(_, callback)| callback.clone()).collect()
    }

    fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

/// Marks a pipe as executing for the lifetime of the guard.
struct ExecutionGuard<'a>(&'a Cell<bool>);

impl<'a> ExecutionGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) { None } else { Some(Self(flag)) }
    }
}

impl Drop for ExecutionGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Named, cached value with filter and trigger chains.
///
/// The cached value is owned by the pipe; a replaced value is dropped at
/// commit time. Pipes live for the whole process and are shared by `Rc`
/// between the bus and any callback that needs to read them.
pub struct Datapipe<T> {
    name: &'static str,
    policy: ReadPolicy,
    cache: RefCell<T>,
    filters: Chain<Filter<T>>,
    input_triggers: Chain<Trigger<T>>,
    output_triggers: Chain<Trigger<T>>,
    next_id: Cell<u64>,
    executing: Cell<bool>,
}

impl<T> Datapipe<T>
where
    T: Clone + fmt::Debug + 'static,
{
    /// Create a pipe holding `initial`.
    pub fn new(name: &'static str, policy: ReadPolicy, initial: T) -> Self {
        Self {
            name,
            policy,
            cache: RefCell::new(initial),
            filters: Chain::new(),
            input_triggers: Chain::new(),
            output_triggers: Chain::new(),
            next_id: Cell::new(0),
            executing: Cell::new(false),
        }
    }

    /// Pipe name, for logging.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Read policy fixed at creation.
    pub fn policy(&self) -> ReadPolicy {
        self.policy
    }

    /// Cached value.
    pub fn get(&self) -> T {
        self.cache.borrow().clone()
    }

    /// Whether an `execute` on this pipe is in progress.
    pub fn is_executing(&self) -> bool {
        self.executing.get()
    }

    /// Run `source` through the chains and return the resulting value.
    ///
    /// Returns the cached value without running anything when the caller
    /// may not write this pipe, when the pipe is already executing, or when a
    /// filter vetoes the candidate.
    pub fn execute(&self, origin: Subsystem, source: Source<T>, commit: Commit) -> T {
        if let ReadPolicy::ReadOnly(owner) = self.policy
            && owner != origin
        {
            tracing::warn!(pipe = self.name, ?origin, ?owner, "write to read-only datapipe dropped");
            return self.get();
        }

        let Some(_guard) = ExecutionGuard::enter(&self.executing) else {
            tracing::debug!(pipe = self.name, "re-entrant execute ignored");
            return self.get();
        };

        let mut value = match source {
            Source::UseInput(value) => value,
            Source::UseCache => self.get(),
        };

        for filter in self.filters.snapshot() {
            match filter(value) {
                Some(filtered) => value = filtered,
                None => {
                    tracing::trace!(pipe = self.name, "candidate vetoed by filter");
                    return self.get();
                },
            }
        }

        for trigger in self.input_triggers.snapshot() {
            trigger(&value);
        }

        if commit == Commit::CacheResult {
            self.cache.replace(value.clone());
        }

        for trigger in self.output_triggers.snapshot() {
            trigger(&value);
        }

        value
    }

    /// Execute with `UseInput` and `CacheResult`.
    pub fn set(&self, origin: Subsystem, value: T) -> T {
        self.execute(origin, Source::UseInput(value), Commit::CacheResult)
    }

    /// Push the cached value through the chains again.
    pub fn reannounce(&self, origin: Subsystem) -> T {
        self.execute(origin, Source::UseCache, Commit::CacheResult)
    }

    /// Fire-and-forget: run the chains on `value` without caching it.
    pub fn signal(&self, origin: Subsystem, value: T) -> T {
        self.execute(origin, Source::UseInput(value), Commit::DiscardResult)
    }

    /// Append a filter. `None` from the filter vetoes the execution.
    pub fn append_filter(&self, filter: impl Fn(T) -> Option<T> + 'static) -> CallbackId {
        let id = self.allocate_id();
        self.filters.push(id, Rc::new(filter));
        id
    }

    /// Append an observer of the filtered, not yet committed value.
    pub fn append_input_trigger(&self, trigger: impl Fn(&T) + 'static) -> CallbackId {
        let id = self.allocate_id();
        self.input_triggers.push(id, Rc::new(trigger));
        id
    }

    /// Append an observer of the committed value.
    pub fn append_output_trigger(&self, trigger: impl Fn(&T) + 'static) -> CallbackId {
        let id = self.allocate_id();
        self.output_triggers.push(id, Rc::new(trigger));
        id
    }

    /// Remove a filter. Unknown ids are ignored.
    pub fn remove_filter(&self, id: CallbackId) -> bool {
        self.filters.remove(id)
    }

    /// Remove an input trigger. Unknown ids are ignored.
    pub fn remove_input_trigger(&self, id: CallbackId) -> bool {
        self.input_triggers.remove(id)
    }

    /// Remove an output trigger. Unknown ids are ignored.
    pub fn remove_output_trigger(&self, id: CallbackId) -> bool {
        self.output_triggers.remove(id)
    }

    /// Number of registered filters and triggers.
    pub fn callback_count(&self) -> usize {
        self.filters.len() + self.input_triggers.len() + self.output_triggers.len()
    }

    fn allocate_id(&self) -> CallbackId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        CallbackId(id)
    }
}

impl<T: fmt::Debug> fmt::Debug for Datapipe<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Datapipe")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("cache", &self.cache)
            .field("executing", &self.executing.get())
            .finish_non_exhaustive()
    }
}
