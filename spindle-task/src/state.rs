use std::fmt;

use crate::frame::Frame;

bitflags::bitflags! {
    /// Lifecycle flags of a [`Frame`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct State: u8 {
        /// The frame has been resumed at least once.
        const STARTED = 1 << 0;
        /// The future returned and the result cell is populated.
        const COMPLETE = 1 << 1;
        /// The execution state has been released, the frame can never run again.
        const RELEASED = 1 << 2;
    }
}

/// Which frame must be resumed after a [`Frame`] suspends.
///
/// A driver follows this link after every resumption to find the frontier
/// frame of a task tree.
#[derive(Clone, Default)]
pub enum Link {
    /// Resume this same frame again: it has not started yet, or it paused.
    #[default]
    Idle,
    /// The frame is awaiting `child`, which must run next.
    WaitingOnChild(Frame),
    /// The frame finished and `parent` is waiting on its result.
    ReturnTo(Frame),
    /// The frame finished and nobody is waiting on it.
    Finished,
}

impl Link {
    /// Returns true for [`Link::Idle`].
    pub fn is_idle(&self) -> bool {
        matches!(self, Link::Idle)
    }

    /// Returns the frame that must run next, if it differs from the current one.
    pub fn frame(&self) -> Option<&Frame> {
        match self {
            Link::WaitingOnChild(frame) | Link::ReturnTo(frame) => Some(frame),
            Link::Idle | Link::Finished => None,
        }
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Link::Idle => f.write_str("Idle"),
            Link::WaitingOnChild(child) => f.debug_tuple("WaitingOnChild").field(&child.id()).finish(),
            Link::ReturnTo(parent) => f.debug_tuple("ReturnTo").field(&parent.id()).finish(),
            Link::Finished => f.write_str("Finished"),
        }
    }
}
