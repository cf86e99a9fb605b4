//! Submode consistency checks.
//!
//! A [`SystemSnapshot`] copies the flags, UI states and input enables out of
//! a context; each [`Invariant`] compares one pair of them. `SimWorld` runs
//! the standard set after every step.
//!
//! ```ignore
//! let snapshot = SystemSnapshot::from_context(&context);
//! InvariantRegistry::standard().assert_all(&snapshot, "after boot");
//! ```

mod checks;
mod snapshot;

pub use checks::{
    AutorelockMatchesTriggers, KeypadFollowsLock, ModeChangeFlagMatchesPending,
    PinUiMatchesSubmode, TklockUiMatchesSubmode, VerifyRequiresDevlock,
};
pub use snapshot::SystemSnapshot;

/// Outcome of one check.
pub type InvariantResult = Result<(), Violation>;

/// A check that failed.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Which check.
    pub invariant: &'static str,
    /// The disagreeing values.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// Relation between snapshot fields that every reachable state keeps.
pub trait Invariant {
    /// Short name used in failure output.
    fn name(&self) -> &'static str;

    /// `Ok(())` if the relation holds for `state`.
    fn check(&self, state: &SystemSnapshot) -> InvariantResult;
}

/// Ordered set of checks run together.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InvariantRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.invariants.iter().map(|i| i.name()).collect();
        f.debug_struct("InvariantRegistry").field("invariants", &names).finish()
    }
}

impl InvariantRegistry {
    /// No checks.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// All six submode checks:
    ///
    /// - [`VerifyRequiresDevlock`]
    /// - [`PinUiMatchesSubmode`]
    /// - [`TklockUiMatchesSubmode`]
    /// - [`ModeChangeFlagMatchesPending`]
    /// - [`AutorelockMatchesTriggers`]
    /// - [`KeypadFollowsLock`]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(VerifyRequiresDevlock);
        registry.add(PinUiMatchesSubmode);
        registry.add(TklockUiMatchesSubmode);
        registry.add(ModeChangeFlagMatchesPending);
        registry.add(AutorelockMatchesTriggers);
        registry.add(KeypadFollowsLock);
        registry
    }

    /// Append `invariant`.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Run every check. Fails with all violations, not just the first.
    pub fn check_all(&self, state: &SystemSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Run every check and panic listing the violations, tagged with
    /// `context`.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, state: &SystemSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of checks.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Whether no check is registered.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
