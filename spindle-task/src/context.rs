use std::cell::RefCell;

use crate::Frame;

thread_local! {
    static CURRENT: Context = Context::new();
}

/// Tracks the frame which is currently being resumed on this thread.
pub(crate) struct Context {
    frame: RefCell<Option<Frame>>,
}

impl Context {
    fn new() -> Self {
        Self {
            frame: Default::default(),
        }
    }

    /// Mark `frame` as the running frame until the guard is dropped.
    ///
    /// Frames resume each other only through a driver, never inline, so the
    /// slot must be empty on entry.
    pub(crate) fn enter(frame: Frame) -> ContextGuard {
        CURRENT.with(|current| {
            let mut old = current.frame.borrow_mut();
            assert!(old.is_none(), "a frame is already being resumed on this thread");
            *old = Some(frame);
        });
        ContextGuard { _priv: () }
    }

    /// Returns the frame currently being resumed.
    pub(crate) fn current() -> Option<Frame> {
        CURRENT.with(|c| c.frame.borrow().clone())
    }
}

#[derive(Debug)]
pub(crate) struct ContextGuard {
    _priv: (),
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        // Taken out first so the frame is not dropped while the slot is borrowed.
        let frame = CURRENT.with(|current| current.frame.borrow_mut().take());
        debug_assert!(frame.is_some(), "frame context not set");
        drop(frame);
    }
}
