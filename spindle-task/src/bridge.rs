//! Suspension points: awaiting a child [`Task`] and pausing.
//!
//! [`Task`]: crate::Task
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use crate::context::Context;
use crate::{CompletionCell, Frame, LOG};

/// Future returned by [`Task::completion`], yielding the child's [`CompletionCell`].
///
/// The first poll never completes: it links the child to the frame being
/// resumed and suspends that frame, so the child always starts running after
/// its parent has suspended. Once the child finishes the parent is resumed
/// again and this future yields the child's result.
///
/// [`Task::completion`]: crate::Task::completion
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Completion {
    child: Option<Frame>,
    linked: bool,
}

impl Completion {
    pub(crate) fn new(child: Frame) -> Self {
        Self {
            child: Some(child),
            linked: false,
        }
    }
}

impl Future for Completion {
    type Output = CompletionCell;

    fn poll(self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let child = this.child.as_ref().expect("`Completion` polled after completion");

        if child.is_complete() {
            log::trace!(target: LOG, "bridge.resume child={}", child.id());
            let cell = child.take_result().expect("completed frame has no result");
            this.child = None;
            return Poll::Ready(cell);
        }

        // Either the first poll, or the parent was resumed while the child is
        // still running. In both cases the parent must wait on the child.
        let parent = Context::current()
            .expect("tasks can only be awaited from a frame which is being resumed");
        if this.linked {
            log::debug!(target: LOG, "bridge.relink parent={} child={}", parent.id(), child.id());
        } else {
            debug_assert!(!child.is_started(), "frame {} awaited after it started", child.id());
        }
        parent.link_child(child);
        this.linked = true;
        Poll::Pending
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        // Never linked means the child was handed over but never ran.
        if let Some(child) = self.child.take() {
            if !self.linked {
                child.finalize();
            }
        }
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("child", &self.child.as_ref().map(Frame::id))
            .field("linked", &self.linked)
            .finish()
    }
}

/// Future returned by awaiting a [`Task<T>`], yielding the child's `T`.
///
/// [`Task<T>`]: crate::Task
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Await<T> {
    completion: Completion,
    _output: PhantomData<fn() -> T>,
}

impl<T> Await<T> {
    pub(crate) fn new(completion: Completion) -> Self {
        Self {
            completion,
            _output: PhantomData,
        }
    }
}

impl<T: 'static> Future for Await<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.completion).poll(cx).map(|cell| {
            // The cell was taken out of the child frame, so this is the only holder
            // unless a caller kept a clone obtained through `Frame::result`.
            match cell.try_unwrap::<T>() {
                Ok(value) => value,
                Err(cell) => panic!(
                    "task result of type `{}` is still shared and cannot be moved out",
                    cell.type_name()
                ),
            }
        })
    }
}

impl<T> std::fmt::Debug for Await<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Await")
            .field("completion", &self.completion)
            .finish()
    }
}

/// Suspend the current frame once without awaiting a child.
///
/// The frame's link stays [`Link::Idle`], so the driver resumes the same
/// frame on its next turn.
///
/// [`Link::Idle`]: crate::Link::Idle
pub fn pause() -> Pause {
    Pause { paused: false }
}

/// Future returned by [`pause`].
#[derive(Debug)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Pause {
    paused: bool,
}

impl Future for Pause {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        if self.paused {
            Poll::Ready(())
        } else {
            self.get_mut().paused = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}
