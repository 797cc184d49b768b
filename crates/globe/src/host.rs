use std::cell::RefCell;
use std::rc::Rc;

use runtime::listeners::{ListenerHandle, ListenerSet};

/// Elements the engine places into the host container.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HostChild {
    Surface,
    LabelOverlay,
}

/// Callbacks the engine registers on the host.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    PointerDown,
    PointerMove,
    PointerUp,
    PointerLeave,
    Wheel,
    Click,
    ResizeObserver,
    AnimationFrame,
}

impl ListenerKind {
    pub const ALL: [ListenerKind; 8] = [
        ListenerKind::PointerDown,
        ListenerKind::PointerMove,
        ListenerKind::PointerUp,
        ListenerKind::PointerLeave,
        ListenerKind::Wheel,
        ListenerKind::Click,
        ListenerKind::ResizeObserver,
        ListenerKind::AnimationFrame,
    ];
}

/// The sizable element the globe draws into.
///
/// Every listener added through `add_listener` is removed again with the
/// returned handle when the engine is destroyed.
pub trait HostContainer {
    /// Measured size in CSS pixels. May be zero while the host is hidden.
    fn size(&self) -> (f64, f64);
    fn device_pixel_ratio(&self) -> f64;
    fn attach(&mut self, child: HostChild);
    fn detach(&mut self, child: HostChild);
    fn add_listener(&mut self, kind: ListenerKind) -> ListenerHandle;
    /// Returns `false` for handles that are not registered.
    fn remove_listener(&mut self, handle: ListenerHandle) -> bool;
}

#[derive(Debug)]
struct HeadlessState {
    size: (f64, f64),
    device_pixel_ratio: f64,
    children: Vec<HostChild>,
    listeners: ListenerSet<ListenerKind>,
    stale_removals: usize,
}

/// In-memory host for tests and the simulator. Clones share state, so a
/// caller can keep one to inspect the container after handing the other to
/// the engine.
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessHost {
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            state: Rc::new(RefCell::new(HeadlessState {
                size: (width, height),
                device_pixel_ratio,
                children: Vec::new(),
                listeners: ListenerSet::new(),
                stale_removals: 0,
            })),
        }
    }

    pub fn set_size(&self, width: f64, height: f64) {
        self.state.borrow_mut().size = (width, height);
    }

    pub fn set_device_pixel_ratio(&self, ratio: f64) {
        self.state.borrow_mut().device_pixel_ratio = ratio;
    }

    pub fn children(&self) -> Vec<HostChild> {
        self.state.borrow().children.clone()
    }

    pub fn active_listeners(&self) -> usize {
        self.state.borrow().listeners.active()
    }

    pub fn active_listeners_of(&self, kind: ListenerKind) -> usize {
        self.state.borrow().listeners.active_of(kind)
    }

    /// Removals of handles that were never (or no longer) registered.
    pub fn stale_removals(&self) -> usize {
        self.state.borrow().stale_removals
    }
}

impl HostContainer for HeadlessHost {
    fn size(&self) -> (f64, f64) {
        self.state.borrow().size
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.state.borrow().device_pixel_ratio
    }

    fn attach(&mut self, child: HostChild) {
        self.state.borrow_mut().children.push(child);
    }

    fn detach(&mut self, child: HostChild) {
        let mut state = self.state.borrow_mut();
        if let Some(i) = state.children.iter().position(|c| *c == child) {
            state.children.remove(i);
        }
    }

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerHandle {
        self.state.borrow_mut().listeners.add(kind)
    }

    fn remove_listener(&mut self, handle: ListenerHandle) -> bool {
        let mut state = self.state.borrow_mut();
        let removed = state.listeners.remove(handle).is_some();
        if !removed {
            state.stale_removals += 1;
        }
        removed
    }
}
