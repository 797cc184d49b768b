use foundation::handles::{Handle, HandleAllocator};

/// Token returned by a listener registration; required to unregister it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerHandle(pub Handle);

/// Registry of active listener registrations keyed by kind.
///
/// Every `add` yields a handle, and teardown removes exactly the handles that
/// were handed out. `active()` going back to zero is the leak check.
#[derive(Debug)]
pub struct ListenerSet<K> {
    alloc: HandleAllocator,
    entries: Vec<Option<K>>,
}

impl<K> Default for ListenerSet<K> {
    fn default() -> Self {
        Self {
            alloc: HandleAllocator::new(),
            entries: Vec::new(),
        }
    }
}

impl<K: Copy + PartialEq> ListenerSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: K) -> ListenerHandle {
        let handle = self.alloc.allocate();
        let i = handle.index() as usize;
        if self.entries.len() <= i {
            self.entries.resize_with(i + 1, || None);
        }
        self.entries[i] = Some(kind);
        ListenerHandle(handle)
    }

    /// Returns the removed kind, or `None` for an unknown or stale handle.
    pub fn remove(&mut self, handle: ListenerHandle) -> Option<K> {
        if !self.alloc.release(handle.0) {
            return None;
        }
        self.entries[handle.0.index() as usize].take()
    }

    pub fn contains(&self, handle: ListenerHandle) -> bool {
        self.alloc.is_live(handle.0)
    }

    pub fn active(&self) -> usize {
        self.alloc.live_count()
    }

    pub fn active_of(&self, kind: K) -> usize {
        self.entries.iter().filter(|k| **k == Some(kind)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::ListenerSet;

    #[derive(Copy, Clone, Debug, PartialEq)]
    enum Kind {
        Down,
        Wheel,
    }

    #[test]
    fn add_remove_is_symmetric() {
        let mut set = ListenerSet::new();
        let a = set.add(Kind::Down);
        let b = set.add(Kind::Wheel);
        let c = set.add(Kind::Down);
        assert_eq!(set.active(), 3);
        assert_eq!(set.active_of(Kind::Down), 2);

        assert_eq!(set.remove(a), Some(Kind::Down));
        assert_eq!(set.remove(a), None);
        assert_eq!(set.remove(b), Some(Kind::Wheel));
        assert_eq!(set.remove(c), Some(Kind::Down));
        assert_eq!(set.active(), 0);
    }

    #[test]
    fn stale_handle_does_not_remove_reused_slot() {
        let mut set = ListenerSet::new();
        let a = set.add(Kind::Down);
        set.remove(a);
        let b = set.add(Kind::Wheel);
        assert_eq!(set.remove(a), None);
        assert!(set.contains(b));
    }
}
