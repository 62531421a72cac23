use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::{Frame, Link};


/// Future recording its polls and drops into the thread local [`TestState`].
struct TestFuture;

impl Future for TestFuture {
    type Output = TestFutureOutput;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        TestState::with(|s| {
            s.num_polls += 1;
            assert!(!s.panic_on_run, "task panic on run");
            if s.return_pending {
                Poll::Pending
            } else {
                Poll::Ready(TestFutureOutput(s.output))
            }
        })
    }
}

impl Drop for TestFuture {
    fn drop(&mut self) {
        TestState::with(|s| {
            s.task_dropped = true;
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TestFutureOutput(usize);

impl Drop for TestFutureOutput {
    fn drop(&mut self) {
        TestState::with(|s| {
            s.outputs_dropped += 1;
        });
    }
}

pub(crate) struct TestState {
    pub(crate) panic_on_run: bool,
    pub(crate) return_pending: bool,
    pub(crate) output: usize,
    pub(crate) num_polls: usize,
    pub(crate) task_dropped: bool,
    pub(crate) outputs_dropped: usize,
}

impl TestState {
    fn new() -> Self {
        TestState {
            panic_on_run: false,
            return_pending: false,
            output: 0,
            num_polls: 0,
            task_dropped: false,
            outputs_dropped: 0,
        }
    }

    /// Set the TLS for the [`TestState`].
    ///
    /// When the return goes out of scope, the [`TestState`] will
    /// automatically be reset.
    pub(crate) fn enter() -> impl Drop {
        struct Reset;
        impl Drop for Reset {
            fn drop(&mut self) {
                STATE.with(|v| v.borrow_mut().take());
            }
        }
        STATE.with(|v| {
            v.borrow_mut().replace(TestState::new());
        });
        Reset
    }

    pub(crate) fn with<U>(f: impl FnOnce(&mut TestState) -> U) -> U {
        STATE.with(|v| {
            let inner = &mut *v.borrow_mut();
            let state = inner.as_mut().expect("must call TestState::enter first");
            f(state)
        })
    }
}

thread_local! {static STATE: RefCell<Option<TestState>> = RefCell::new(None)}

/// Resume `frame` once and follow its link the way a driver does,
/// returning the frame to resume next, if any.
fn step(frame: &Frame) -> Option<Frame> {
    frame.resume();
    match frame.next() {
        Link::Idle => Some(frame.clone()),
        Link::WaitingOnChild(child) => Some(child),
        Link::ReturnTo(parent) => {
            frame.finalize();
            Some(parent)
        }
        Link::Finished => {
            frame.finalize();
            None
        }
    }
}

/// Step the tree rooted at `frame` until it finishes, returning the number of resumptions.
fn run_to_completion(frame: Frame) -> usize {
    let mut resumes = 0;
    let mut next = Some(frame);
    while let Some(frame) = next {
        next = step(&frame);
        resumes += 1;
    }
    resumes
}
