//! Lazily filled cache cells for derived geometric quantities.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;

/// A single memoized value.
///
/// The cell is either empty or holds the value computed from the current dofs.
/// Owners clear it whenever their coefficients change; a computation that fails
/// leaves the cell empty so that the next access recomputes from scratch.
#[derive(Debug)]
pub struct Cached<T> {
    slot: RefCell<Option<Rc<T>>>,
}

impl<T> Cached<T> {
    pub fn new() -> Self {
        Self {
            slot: RefCell::new(None),
        }
    }

    /// Return the cached value, computing it with `f` if the cell is empty.
    pub fn get_or_init(&self, f: impl FnOnce() -> T) -> Rc<T> {
        if let Some(value) = self.slot.borrow().as_ref() {
            return Rc::clone(value);
        }
        // `f` may read other cells of the same owner, so no borrow is held while it runs.
        let value = Rc::new(f());
        *self.slot.borrow_mut() = Some(Rc::clone(&value));
        value
    }

    /// Fallible variant of [`Cached::get_or_init`]; errors are not cached.
    pub fn get_or_try_init(&self, f: impl FnOnce() -> Result<T>) -> Result<Rc<T>> {
        if let Some(value) = self.slot.borrow().as_ref() {
            return Ok(Rc::clone(value));
        }
        let value = Rc::new(f()?);
        *self.slot.borrow_mut() = Some(Rc::clone(&value));
        Ok(value)
    }

    pub fn invalidate(&self) {
        self.slot.borrow_mut().take();
    }

    pub fn is_fresh(&self) -> bool {
        self.slot.borrow().is_some()
    }
}

impl<T> Default for Cached<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Cached<T> {
    /// Clones start empty: a copied object recomputes against its own dofs.
    fn clone(&self) -> Self {
        Self::new()
    }
}

/// Generates a cache struct with one [`Cached`] cell per field plus
/// `invalidate_all` and `fresh_count` helpers.
#[macro_export]
macro_rules! cache_struct {
    ($(#[$meta:meta])* $vis:vis struct $name:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Default, Clone)]
        $vis struct $name {
            $(pub $field: $crate::cache::Cached<$ty>,)*
        }

        impl $name {
            pub fn invalidate_all(&self) {
                $(self.$field.invalidate();)*
            }

            /// Number of cells currently holding a value.
            pub fn fresh_count(&self) -> usize {
                0 $(+ usize::from(self.$field.is_fresh()))*
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TsgError;
    use std::cell::Cell;

    #[test]
    fn test_computes_once() {
        let cell: Cached<f64> = Cached::new();
        let calls = Cell::new(0);
        let a = cell.get_or_init(|| {
            calls.set(calls.get() + 1);
            2.5
        });
        let b = cell.get_or_init(|| {
            calls.set(calls.get() + 1);
            7.0
        });
        assert_eq!(*a, 2.5);
        assert_eq!(*b, 2.5);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_invalidate_forces_recompute() {
        let cell: Cached<u32> = Cached::new();
        cell.get_or_init(|| 1);
        assert!(cell.is_fresh());
        cell.invalidate();
        assert!(!cell.is_fresh());
        assert_eq!(*cell.get_or_init(|| 2), 2);
    }

    #[test]
    fn test_failure_leaves_cell_empty() {
        let cell: Cached<u32> = Cached::new();
        let err = cell.get_or_try_init(|| Err(TsgError::DegenerateGeometry("axis".into())));
        assert!(err.is_err());
        assert!(!cell.is_fresh());
        assert_eq!(*cell.get_or_try_init(|| Ok(3)).unwrap(), 3);
    }

    cache_struct! {
        struct Pair {
            first: f64,
            second: Vec<f64>,
        }
    }

    #[test]
    fn test_cache_struct_invalidate_all() {
        let pair = Pair::default();
        pair.first.get_or_init(|| 1.0);
        pair.second.get_or_init(|| vec![1.0, 2.0]);
        assert_eq!(pair.fresh_count(), 2);
        pair.invalidate_all();
        assert_eq!(pair.fresh_count(), 0);
    }
}
