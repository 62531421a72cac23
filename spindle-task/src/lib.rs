//! Provides suspendable tasks which can await one another.
//!
//! A [`Task`] owns a single [`Frame`]: the boxed [Future] of an `async` block
//! together with the links a driver needs to find the frame which must run
//! next. Awaiting a task from inside another task does not poll the child
//! inline. Instead the parent suspends, the child is linked as the parent's
//! [`Link::WaitingOnChild`], and whoever drives the frames (normally
//! `spindle_driver::Driver`) descends into the child. When the child finishes
//! its link becomes [`Link::ReturnTo`] its parent and the parent picks up the
//! child's [`CompletionCell`].
//!
//! Frames cannot be moved, resumed, or released from other threads.
//!
//! [Future]: std::future::Future
#![deny(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    clippy::missing_safety_doc
)]
mod bridge;
mod cell;
mod context;
mod error;
mod frame;
mod state;
mod task;

#[cfg(test)]
mod tests;

pub use bridge::{pause, Await, Completion, Pause};
pub use cell::CompletionCell;
pub use error::{Error, ErrorKind};
pub use frame::{Frame, FrameId};
pub use state::Link;
pub use task::Task;

const LOG: &str = "spindle_task";
