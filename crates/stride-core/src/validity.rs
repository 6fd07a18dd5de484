//! Current-step validity flag.

/// Single source of truth for "can the user move forward right now".
///
/// The flag belongs to whichever step is active. A step overwrites it on
/// every change to its data; the controller [`reset`](Self::reset)s it on
/// every step switch, so a judgment never outlives the step that made it.
///
/// # Examples
///
/// ```
/// use stride_core::StepValidityStore;
///
/// let mut store = StepValidityStore::new();
/// assert!(!store.is_valid());
///
/// store.set_valid(true);
/// assert!(store.is_valid());
///
/// store.reset();
/// assert!(!store.is_valid());
/// assert!(!store.is_judged());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepValidityStore {
    judgment: Option<bool>,
}

impl StepValidityStore {
    /// Creates a store with no judgment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the flag.
    pub fn set_valid(&mut self, is_valid: bool) {
        self.judgment = Some(is_valid);
    }

    /// Returns the latest judgment; `false` until the active step reports.
    pub fn is_valid(&self) -> bool {
        self.judgment.unwrap_or(false)
    }

    /// Returns `true` once the active step has reported at least once.
    pub fn is_judged(&self) -> bool {
        self.judgment.is_some()
    }

    /// Forgets the current judgment.
    pub fn reset(&mut self) {
        self.judgment = None;
    }
}
