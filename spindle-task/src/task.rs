use std::fmt;
use std::future::{Future, IntoFuture};
use std::marker::PhantomData;

use crate::bridge::{Await, Completion};
use crate::{Frame, FrameId};

/// An owning handle to one suspendable computation.
///
/// Creating a task does not run any of its body. A task makes progress only
/// once it is either submitted to a driver, which takes ownership of its
/// [`Frame`], or awaited from inside another task.
///
/// ```rust
/// use spindle_task::Task;
///
/// let task = Task::new(async { 1 + 1 });
/// assert!(!task.is_started());
/// // Dropping the task releases the frame without running it.
/// drop(task);
/// ```
///
/// Dropping a task which still owns its frame releases the frame's execution
/// state, including any child frames it is waiting on.
pub struct Task<T> {
    frame: Option<Frame>,
    _output: PhantomData<fn() -> T>,
}

impl<T: 'static> Task<T> {
    /// Create a new, unstarted task from `future`.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = T> + 'static,
    {
        Self {
            frame: Some(Frame::new(future)),
            _output: PhantomData,
        }
    }
}

impl<T> Task<T> {
    /// Returns the id of the owned frame.
    pub fn id(&self) -> FrameId {
        self.frame().id()
    }

    /// Returns true once the frame has been resumed at least once.
    pub fn is_started(&self) -> bool {
        self.frame().is_started()
    }

    /// Give up ownership of the frame, for registration with a driver.
    ///
    /// Dropping the empty task afterwards does nothing.
    pub fn into_frame(mut self) -> Frame {
        self.take_frame()
    }

    /// Await the task without a typed read of its result.
    ///
    /// The returned future yields the child's [`CompletionCell`].
    ///
    /// [`CompletionCell`]: crate::CompletionCell
    pub fn completion(mut self) -> Completion {
        Completion::new(self.take_frame())
    }

    fn frame(&self) -> &Frame {
        self.frame.as_ref().expect("task no longer owns a frame")
    }

    fn take_frame(&mut self) -> Frame {
        self.frame.take().expect("task no longer owns a frame")
    }
}

impl<T: 'static> IntoFuture for Task<T> {
    type Output = T;
    type IntoFuture = Await<T>;

    fn into_future(self) -> Self::IntoFuture {
        Await::new(self.completion())
    }
}

impl<T> Drop for Task<T> {
    fn drop(&mut self) {
        if let Some(frame) = self.frame.take() {
            frame.finalize();
        }
    }
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("frame", &self.frame.as_ref().map(Frame::id))
            .finish()
    }
}
