//! Lazy calculation pattern.
//!
//! A `LazyObject` caches an expensive computation (e.g. a numeraire
//! tabulation) and redoes it only after [`update`](LazyObject::update) has
//! marked the cache stale.  The bookkeeping uses `Cell`s so calculation can
//! be triggered through `&self`.

use std::cell::Cell;

/// Trait for objects that lazily compute and cache their results.
pub trait LazyObject {
    /// Perform the actual (expensive) calculation.
    fn perform_calculations(&self) -> crate::errors::Result<()>;

    /// Flag that is `true` while the cached result is valid.
    fn calculated_flag(&self) -> &Cell<bool>;

    /// Number of outstanding [`freeze`](Self::freeze) calls.
    fn freeze_count(&self) -> &Cell<u32>;

    /// Ensure results are up-to-date.
    ///
    /// The flag is raised before calculating so that re-entrant calls made
    /// by `perform_calculations` itself do not recurse.  A failed
    /// calculation leaves the cache stale.
    fn calculate(&self) -> crate::errors::Result<()> {
        if !self.calculated_flag().get() && self.freeze_count().get() == 0 {
            self.calculated_flag().set(true);
            if let Err(e) = self.perform_calculations() {
                self.calculated_flag().set(false);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Mark the cached result as stale.
    fn update(&self) {
        self.calculated_flag().set(false);
    }

    /// Defer recalculation until [`unfreeze`](Self::unfreeze).
    fn freeze(&self) {
        self.freeze_count().set(self.freeze_count().get() + 1);
    }

    /// Undo one call to [`freeze`](Self::freeze).
    fn unfreeze(&self) {
        let count = self.freeze_count().get();
        if count > 0 {
            self.freeze_count().set(count - 1);
        }
    }

    /// `true` if the cache is currently valid.
    fn is_calculated(&self) -> bool {
        self.calculated_flag().get()
    }

    /// `true` if recalculation is currently deferred.
    fn is_frozen(&self) -> bool {
        self.freeze_count().get() > 0
    }
}

/// Bookkeeping fields required by [`LazyObject`].
///
/// # Example
/// ```
/// use std::cell::Cell;
/// use ql_core::patterns::lazy_object::{LazyObject, LazyState};
///
/// struct Tabulated {
///     state: LazyState,
///     value: Cell<f64>,
/// }
///
/// impl LazyObject for Tabulated {
///     fn perform_calculations(&self) -> ql_core::errors::Result<()> {
///         self.value.set(42.0);
///         Ok(())
///     }
///     fn calculated_flag(&self) -> &Cell<bool> { &self.state.calculated }
///     fn freeze_count(&self) -> &Cell<u32> { &self.state.freeze_count }
/// }
///
/// let obj = Tabulated { state: LazyState::new(), value: Cell::new(0.0) };
/// obj.calculate().unwrap();
/// assert_eq!(obj.value.get(), 42.0);
/// ```
#[derive(Debug)]
pub struct LazyState {
    /// `true` when the cached result is valid.
    pub calculated: Cell<bool>,
    /// Number of times the object has been frozen without a matching unfreeze.
    pub freeze_count: Cell<u32>,
}

impl LazyState {
    /// Create a new `LazyState` whose cache is initially stale.
    pub fn new() -> Self {
        Self {
            calculated: Cell::new(false),
            freeze_count: Cell::new(0),
        }
    }
}

impl Default for LazyState {
    fn default() -> Self {
        Self::new()
    }
}
