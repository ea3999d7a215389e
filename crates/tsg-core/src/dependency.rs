//! Registry of objects whose caches depend on another object's dofs.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle returned by [`DependencyRegistry::register`].
    pub struct DependentKey;
}

/// Invalidation stops after this many hops, which bounds walks around dependency cycles.
pub const MAX_INVALIDATION_DEPTH: usize = 32;

/// Something holding caches derived from another object's coefficients.
pub trait Dependent {
    /// Drop every cached quantity and forward the notification to own dependents.
    ///
    /// `depth` counts the hops from the object whose dofs changed.
    fn invalidate_cache(&self, depth: usize);
}

/// Non-owning subscriber list. Dependents are held weakly, so registering never
/// extends their lifetime; entries whose target was dropped are pruned on notify.
#[derive(Default)]
pub struct DependencyRegistry {
    dependents: SlotMap<DependentKey, Weak<dyn Dependent>>,
}

impl DependencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, dependent: &Rc<dyn Dependent>) -> DependentKey {
        self.dependents.insert(Rc::downgrade(dependent))
    }

    pub fn unregister(&mut self, key: DependentKey) -> bool {
        self.dependents.remove(key).is_some()
    }

    /// Number of registered dependents that are still alive.
    pub fn len(&self) -> usize {
        self.dependents
            .values()
            .filter(|d| d.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Prune dropped dependents and upgrade the rest.
    pub fn live(&mut self) -> Vec<Rc<dyn Dependent>> {
        self.dependents.retain(|_, d| d.strong_count() > 0);
        self.dependents.values().filter_map(Weak::upgrade).collect()
    }

    /// Invalidate every live dependent, `depth` hops from the mutated source.
    ///
    /// The registry is only borrowed while collecting the live set, so a dependent
    /// may reach this registry again through a cycle.
    pub fn notify(registry: &RefCell<Self>, depth: usize) {
        if depth >= MAX_INVALIDATION_DEPTH {
            log::warn!(
                "dependency chain exceeds {} levels, stopping invalidation",
                MAX_INVALIDATION_DEPTH
            );
            return;
        }
        let live = registry.borrow_mut().live();
        log::trace!("invalidating {} dependents at depth {}", live.len(), depth);
        for dependent in live {
            dependent.invalidate_cache(depth + 1);
        }
    }
}

impl std::fmt::Debug for DependencyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyRegistry")
            .field("dependents", &self.dependents.len())
            .finish()
    }
}

impl Clone for DependencyRegistry {
    /// A cloned object starts without subscribers; dependents stay registered on the
    /// object they subscribed to.
    fn clone(&self) -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    struct Counter {
        hits: Cell<usize>,
        downstream: RefCell<DependencyRegistry>,
    }

    impl Counter {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                hits: Cell::new(0),
                downstream: RefCell::new(DependencyRegistry::new()),
            })
        }
    }

    impl Dependent for Counter {
        fn invalidate_cache(&self, depth: usize) {
            self.hits.set(self.hits.get() + 1);
            DependencyRegistry::notify(&self.downstream, depth);
        }
    }

    #[test]
    fn test_notify_reaches_transitive_dependents() {
        let root = RefCell::new(DependencyRegistry::new());
        let a = Counter::new();
        let b = Counter::new();
        root.borrow_mut().register(&(a.clone() as Rc<dyn Dependent>));
        a.downstream
            .borrow_mut()
            .register(&(b.clone() as Rc<dyn Dependent>));

        DependencyRegistry::notify(&root, 0);
        assert_eq!(a.hits.get(), 1);
        assert_eq!(b.hits.get(), 1);
    }

    #[test]
    fn test_dropped_dependents_are_pruned() {
        let root = RefCell::new(DependencyRegistry::new());
        let a = Counter::new();
        root.borrow_mut().register(&(a.clone() as Rc<dyn Dependent>));
        assert_eq!(root.borrow().len(), 1);
        drop(a);
        assert!(root.borrow().is_empty());
        DependencyRegistry::notify(&root, 0);
    }

    #[test]
    fn test_unregister() {
        let root = RefCell::new(DependencyRegistry::new());
        let a = Counter::new();
        let key = root.borrow_mut().register(&(a.clone() as Rc<dyn Dependent>));
        assert!(root.borrow_mut().unregister(key));
        DependencyRegistry::notify(&root, 0);
        assert_eq!(a.hits.get(), 0);
    }

    #[test]
    fn test_depth_bound() {
        let root = RefCell::new(DependencyRegistry::new());
        let a = Counter::new();
        root.borrow_mut().register(&(a.clone() as Rc<dyn Dependent>));
        DependencyRegistry::notify(&root, MAX_INVALIDATION_DEPTH);
        assert_eq!(a.hits.get(), 0);
    }

    #[test]
    fn test_cycle_terminates() {
        let a = Counter::new();
        let b = Counter::new();
        a.downstream
            .borrow_mut()
            .register(&(b.clone() as Rc<dyn Dependent>));
        b.downstream
            .borrow_mut()
            .register(&(a.clone() as Rc<dyn Dependent>));

        a.invalidate_cache(0);
        assert_eq!(a.hits.get() + b.hits.get(), MAX_INVALIDATION_DEPTH + 1);
        assert_eq!(a.downstream.borrow().len(), 1);
    }

    #[test]
    fn test_live_prunes_dropped() {
        let mut root = DependencyRegistry::new();
        let a = Counter::new();
        let b = Counter::new();
        root.register(&(a.clone() as Rc<dyn Dependent>));
        root.register(&(b.clone() as Rc<dyn Dependent>));
        drop(b);
        assert_eq!(root.live().len(), 1);
        assert_eq!(root.dependents.len(), 1);
    }
}
