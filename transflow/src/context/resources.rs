//! Resource registry owned by one execution scope.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// An external resource with a single release operation.
///
/// `dispose` must tolerate being called on an already-released resource; the
/// registry itself calls it at most once per registration.
#[cfg_attr(test, mockall::automock)]
pub trait Disposable: Send + Sync {
    /// Releases the resource.
    fn dispose(&self);
}

/// Identity of a registered resource: the address of its shared handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceKey(usize);

impl ResourceKey {
    /// Returns the key for a shared resource handle.
    #[must_use]
    pub fn of<R: ?Sized>(resource: &Arc<R>) -> Self {
        Self(Arc::as_ptr(resource).cast::<()>() as usize)
    }
}

struct Entry {
    type_name: &'static str,
    release: Box<dyn FnOnce() + Send>,
}

impl Entry {
    fn dispose(self, key: ResourceKey) {
        let type_name = self.type_name;
        let release = self.release;
        if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(release)) {
            warn!(resource = type_name, key = key.0, "Resource release panicked: {:?}", e);
        }
    }
}

/// Registry of disposable resources keyed by value identity.
///
/// The lock only guards map insertion and removal. Release callbacks always
/// run after the lock is dropped, so a callback may itself register or release
/// resources without deadlocking.
#[derive(Default)]
pub struct Resources {
    entries: Mutex<HashMap<ResourceKey, Entry>>,
}

impl Resources {
    /// Creates a new, empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resource together with its release operation.
    ///
    /// Registering the same handle twice keeps the first registration.
    pub fn acquire<R, F>(&self, resource: &Arc<R>, release: F) -> ResourceKey
    where
        R: ?Sized + Send + Sync + 'static,
        F: FnOnce(&R) + Send + 'static,
    {
        let key = ResourceKey::of(resource);
        let held = Arc::clone(resource);
        let mut entries = self.entries.lock();
        if entries.contains_key(&key) {
            trace!(key = key.0, "Resource already registered");
            return key;
        }
        entries.insert(
            key,
            Entry {
                type_name: std::any::type_name::<R>(),
                release: Box::new(move || release(&held)),
            },
        );
        trace!(key = key.0, resource = std::any::type_name::<R>(), "Resource acquired");
        key
    }

    /// Registers a [`Disposable`] resource.
    pub fn acquire_disposable<R>(&self, resource: &Arc<R>) -> ResourceKey
    where
        R: ?Sized + Disposable + 'static,
    {
        self.acquire(resource, |r: &R| r.dispose())
    }

    /// Removes and disposes one resource before the scope ends.
    ///
    /// Returns false if the resource was not registered here.
    pub fn release<R: ?Sized>(&self, resource: &Arc<R>) -> bool {
        self.release_key(ResourceKey::of(resource))
    }

    /// Removes and disposes the resource registered under `key`.
    pub fn release_key(&self, key: ResourceKey) -> bool {
        let entry = self.entries.lock().remove(&key);
        match entry {
            Some(entry) => {
                trace!(key = key.0, resource = entry.type_name, "Resource released");
                entry.dispose(key);
                true
            }
            None => false,
        }
    }

    /// Returns true if the resource is registered here.
    #[must_use]
    pub fn contains<R: ?Sized>(&self, resource: &Arc<R>) -> bool {
        self.entries.lock().contains_key(&ResourceKey::of(resource))
    }

    /// Disposes every registered resource and clears the registry.
    ///
    /// Each entry is disposed exactly once; a panicking release is logged and
    /// does not stop the others. Returns the number of disposed resources.
    pub fn clean(&self) -> usize {
        let drained: Vec<(ResourceKey, Entry)> = self.entries.lock().drain().collect();
        let count = drained.len();
        for (key, entry) in drained {
            entry.dispose(key);
        }
        if count > 0 {
            debug!(count, "Resources cleaned");
        }
        count
    }

    /// Returns the number of registered resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Drop for Resources {
    fn drop(&mut self) {
        let leftover: Vec<(ResourceKey, Entry)> = self.entries.get_mut().drain().collect();
        if !leftover.is_empty() {
            debug!(count = leftover.len(), "Disposing resources left in dropped registry");
        }
        for (key, entry) in leftover {
            entry.dispose(key);
        }
    }
}

/// Cleans a registry when dropped, so cleanup also runs on panic or when the
/// owning future is dropped mid-run.
pub(crate) struct CleanupGuard {
    resources: Arc<Resources>,
}

impl CleanupGuard {
    pub(crate) fn new(resources: &Arc<Resources>) -> Self {
        Self {
            resources: Arc::clone(resources),
        }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        self.resources.clean();
    }
}

impl std::fmt::Debug for Resources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resources")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counted(Arc<AtomicUsize>);

    impl Disposable for Counted {
        fn dispose(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_acquire_and_clean() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let resources = Resources::new();

        let a = Arc::new(Counted(disposed.clone()));
        let b = Arc::new(Counted(disposed.clone()));
        resources.acquire_disposable(&a);
        resources.acquire_disposable(&b);
        assert_eq!(resources.len(), 2);

        assert_eq!(resources.clean(), 2);
        assert!(resources.is_empty());
        assert_eq!(disposed.load(Ordering::SeqCst), 2);

        assert_eq!(resources.clean(), 0);
        assert_eq!(disposed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_double_registration_disposes_once() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let resources = Resources::new();
        let a = Arc::new(Counted(disposed.clone()));

        resources.acquire_disposable(&a);
        resources.acquire_disposable(&a);
        assert_eq!(resources.len(), 1);

        resources.clean();
        assert_eq!(disposed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_single() {
        let resources = Resources::new();
        let mut mock = MockDisposable::new();
        mock.expect_dispose().times(1).return_const(());
        let handle = Arc::new(mock);

        resources.acquire_disposable(&handle);
        assert!(resources.contains(&handle));
        assert!(resources.release(&handle));
        assert!(!resources.release(&handle));
        assert!(resources.is_empty());
        resources.clean();
    }

    #[test]
    fn test_release_by_closure() {
        let resources = Resources::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let handle = Arc::new("file".to_string());

        let sink = log.clone();
        resources.acquire(&handle, move |name: &String| sink.lock().push(name.clone()));
        resources.clean();

        assert_eq!(*log.lock(), vec!["file".to_string()]);
    }

    #[test]
    fn test_panicking_release_does_not_stop_others() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let resources = Resources::new();

        let bad = Arc::new(1_u8);
        resources.acquire(&bad, |_| panic!("Intentional"));
        let good = Arc::new(Counted(disposed.clone()));
        resources.acquire_disposable(&good);

        assert_eq!(resources.clean(), 2);
        assert_eq!(disposed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_may_reenter_registry() {
        let resources = Arc::new(Resources::new());
        let inner = Arc::new(2_u32);
        let outer = Arc::new(1_u32);

        resources.acquire(&inner, |_| {});
        let registry = resources.clone();
        let inner_handle = inner.clone();
        resources.acquire(&outer, move |_| {
            registry.release(&inner_handle);
        });

        assert!(resources.release(&outer));
        assert!(resources.is_empty());
    }

    #[test]
    fn test_drop_disposes_leftovers() {
        let disposed = Arc::new(AtomicUsize::new(0));
        {
            let resources = Resources::new();
            resources.acquire_disposable(&Arc::new(Counted(disposed.clone())));
        }
        assert_eq!(disposed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_registration() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let resources = Arc::new(Resources::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let resources = resources.clone();
                let disposed = disposed.clone();
                std::thread::spawn(move || {
                    for _ in 0..16 {
                        let r = Arc::new(Counted(disposed.clone()));
                        resources.acquire_disposable(&r);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(resources.clean(), 128);
        assert_eq!(disposed.load(Ordering::SeqCst), 128);
    }
}
