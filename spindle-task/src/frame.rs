use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context as TaskContext, Poll};

use futures::task::noop_waker_ref;

use crate::context::Context;
use crate::state::State;
use crate::{CompletionCell, Link, LOG};

type BoxFuture = Pin<Box<dyn Future<Output = CompletionCell>>>;

/// Unique identifier of a [`Frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u64);

impl FrameId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identifier.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The saved execution state of one suspendable computation.
///
/// A [`Frame`] is a reference counted handle. The [`Task`] which created it,
/// or a driver once the task has been submitted, is the owner responsible for
/// eventually calling [`Frame::finalize`]. Other handles exist only to follow
/// links: a parent holds its child while awaiting it and a child holds its
/// parent until it returns.
///
/// [`Task`]: crate::Task
#[derive(Clone)]
pub struct Frame {
    inner: Rc<Inner>,
}

struct Inner {
    id: FrameId,
    state: Cell<State>,
    /// `None` while the frame is being resumed, and after it completed or was released.
    future: RefCell<Option<BoxFuture>>,
    result: RefCell<Option<CompletionCell>>,
    next: RefCell<Link>,
    /// The frame awaiting this one, only set while that await is outstanding.
    parent: RefCell<Option<Frame>>,
}

pin_project_lite::pin_project! {
    /// Stores the output of the wrapped future in a [`CompletionCell`].
    struct Produce<F> {
        #[pin]
        future: F,
    }
}

impl<F> Future for Produce<F>
where
    F: Future,
    F::Output: 'static,
{
    type Output = CompletionCell;

    fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        self.project().future.poll(cx).map(CompletionCell::new)
    }
}

impl Frame {
    /// Wrap `future` in a new frame. The future is not polled.
    pub(crate) fn new<F>(future: F) -> Self
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let future: BoxFuture = Box::pin(Produce { future });
        let frame = Self {
            inner: Rc::new(Inner {
                id: FrameId::next(),
                state: Cell::new(State::empty()),
                future: RefCell::new(Some(future)),
                result: RefCell::new(None),
                next: RefCell::new(Link::Idle),
                parent: RefCell::new(None),
            }),
        };
        log::trace!(target: LOG, "frame.new id={}", frame.id());
        frame
    }

    /// Returns the frame's identifier.
    pub fn id(&self) -> FrameId {
        self.inner.id
    }

    /// Returns true once the frame has been resumed at least once.
    pub fn is_started(&self) -> bool {
        self.state().contains(State::STARTED)
    }

    /// Returns true once the frame's future returned.
    pub fn is_complete(&self) -> bool {
        self.state().contains(State::COMPLETE)
    }

    /// Returns true once [`Frame::finalize`] has run.
    pub fn is_released(&self) -> bool {
        self.state().contains(State::RELEASED)
    }

    /// Returns the frame that must run after this one.
    pub fn next(&self) -> Link {
        self.inner.next.borrow().clone()
    }

    /// Returns the frame awaiting this one, if any.
    pub fn parent(&self) -> Option<Frame> {
        self.inner.parent.borrow().clone()
    }

    /// Returns a handle to the result cell once the frame has completed.
    pub fn result(&self) -> Option<CompletionCell> {
        self.inner.result.borrow().clone()
    }

    /// Move the result cell out of the frame, handing it to the awaiting parent.
    pub(crate) fn take_result(&self) -> Option<CompletionCell> {
        self.inner.result.borrow_mut().take()
    }

    /// Returns true if both handles refer to the same frame.
    pub fn ptr_eq(&self, other: &Frame) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Resume the frame until it suspends or completes.
    ///
    /// On return [`Frame::next`] tells the caller which frame to resume next.
    /// Uncaught panics in the frame's future propagate to the caller. The
    /// future is dropped during unwinding, and the frame is left without any
    /// execution state until it is finalized.
    ///
    /// # Panics
    ///
    /// Panics if the frame already completed, was released, or is currently
    /// being resumed.
    pub fn resume(&self) {
        let state = self.state();
        assert!(
            !state.intersects(State::COMPLETE | State::RELEASED),
            "frame {} resumed after it finished",
            self.id()
        );
        let Some(mut future) = self.inner.future.borrow_mut().take() else {
            panic!("frame {} has no execution state to resume", self.id());
        };
        self.inner.state.set(state | State::STARTED);
        self.set_next(Link::Idle);

        let poll = {
            let _guard = Context::enter(self.clone());
            let mut cx = TaskContext::from_waker(noop_waker_ref());
            future.as_mut().poll(&mut cx)
        };

        match poll {
            Poll::Ready(cell) => {
                drop(future);
                self.complete(cell);
            }
            Poll::Pending if self.is_released() => {
                log::trace!(target: LOG, "frame.released_while_running id={}", self.id());
                drop(future);
            }
            Poll::Pending => {
                *self.inner.future.borrow_mut() = Some(future);
                log::trace!(target: LOG, "frame.suspend id={} next={:?}", self.id(), self.next());
            }
        }
    }

    /// Release the frame's execution state.
    ///
    /// Drops the suspended future, which releases everything the computation
    /// holds, and clears both links. If the frame is awaiting a child, the
    /// child is released as well. The result cell is kept so a parent can
    /// still collect it, it is released along with the last handle to the frame.
    ///
    /// Calling this more than once is a no-op.
    pub fn finalize(&self) {
        let state = self.state();
        if state.contains(State::RELEASED) {
            return;
        }
        self.inner.state.set(state | State::RELEASED);

        let future = self.inner.future.borrow_mut().take();
        let parent = self.inner.parent.borrow_mut().take();
        let next = self.inner.next.replace(Link::Finished);
        log::trace!(target: LOG, "frame.finalize id={}", self.id());

        drop(future);
        if let Link::WaitingOnChild(child) = next {
            child.finalize();
        }
        drop(parent);
    }

    /// Finalize this frame and every frame above it in the tree.
    ///
    /// `self` is expected to be the frontier frame of its tree.
    pub fn teardown(&self) {
        let mut frame = Some(self.clone());
        while let Some(current) = frame {
            frame = current.ancestor();
            current.finalize();
        }
    }

    /// Link `child` as the frame this one is waiting on.
    pub(crate) fn link_child(&self, child: &Frame) {
        assert!(
            self.inner.next.borrow().is_idle(),
            "frame {} already has an outstanding await",
            self.id()
        );
        *child.inner.parent.borrow_mut() = Some(self.clone());
        self.set_next(Link::WaitingOnChild(child.clone()));
        log::trace!(target: LOG, "frame.link parent={} child={}", self.id(), child.id());
    }

    fn complete(&self, cell: CompletionCell) {
        *self.inner.result.borrow_mut() = Some(cell);
        self.inner.state.set(self.state() | State::COMPLETE);
        let next = match self.inner.parent.borrow_mut().take() {
            Some(parent) => Link::ReturnTo(parent),
            None => Link::Finished,
        };
        log::trace!(target: LOG, "frame.complete id={} next={:?}", self.id(), next);
        self.set_next(next);
    }

    /// The frame awaiting this one, whether the await is outstanding or the
    /// frame already returned to it.
    fn ancestor(&self) -> Option<Frame> {
        if let Some(parent) = self.parent() {
            return Some(parent);
        }
        match &*self.inner.next.borrow() {
            Link::ReturnTo(parent) => Some(parent.clone()),
            _ => None,
        }
    }

    fn set_next(&self, next: Link) {
        // The old link may hold the last handle to another frame, drop it
        // after the borrow is released.
        let old = self.inner.next.replace(next);
        drop(old);
    }

    fn state(&self) -> State {
        self.inner.state.get()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("id", &self.id())
            .field("state", &self.state())
            .field("next", &*self.inner.next.borrow())
            .finish()
    }
}
