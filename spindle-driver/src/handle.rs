use std::cell::RefCell;
use std::future::Future;
use std::rc::{Rc, Weak};

use spindle_task::{Frame, FrameId, Task};

use crate::{Error, LOG};

/// Frames submitted through a [`Handle`], waiting to join the driver.
#[derive(Default)]
pub(crate) struct Injected {
    frames: RefCell<Vec<Frame>>,
}

impl Injected {
    pub(crate) fn push(&self, frame: Frame) {
        self.frames.borrow_mut().push(frame);
    }

    pub(crate) fn take(&self) -> Vec<Frame> {
        self.frames.take()
    }

    pub(crate) fn len(&self) -> usize {
        self.frames.borrow().len()
    }
}

/// Submits tasks to a [`Driver`] from anywhere on its thread, including from
/// inside a running task.
///
/// Tasks submitted through a handle join the driver at the start of its next
/// tick.
///
/// [`Driver`]: crate::Driver
#[derive(Debug, Clone)]
pub struct Handle {
    injected: Weak<Injected>,
}

impl Handle {
    pub(crate) fn new(injected: &Rc<Injected>) -> Self {
        Self {
            injected: Rc::downgrade(injected),
        }
    }

    /// Submit `task` as a new root.
    ///
    /// If the driver has already been dropped the task is dropped, releasing
    /// its frame, and an error is returned.
    pub fn submit<T>(&self, task: Task<T>) -> Result<FrameId, Error> {
        let Some(injected) = self.injected.upgrade() else {
            log::debug!(target: LOG, "handle.submit.shutdown id={}", task.id());
            return Err(Error::shutdown());
        };
        let frame = task.into_frame();
        let id = frame.id();
        log::debug!(target: LOG, "handle.submit id={}", id);
        injected.push(frame);
        Ok(id)
    }

    /// Create a task from `future` and submit it as a new root.
    pub fn spawn<F>(&self, future: F) -> Result<FrameId, Error>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        self.submit(Task::new(future))
    }
}

impl std::fmt::Debug for Injected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injected").field("len", &self.len()).finish()
    }
}
