//! A round-robin driver for [`spindle_task`] task trees.
//!
//! The [`Driver`] owns the root frame of every submitted task. Each call to
//! [`Driver::tick`] resumes every live tree exactly once, following the
//! frames' [`Link`]s so it always resumes the frontier of a tree: the child a
//! parent is waiting on, or the parent a finished child returned to. Trees
//! are retired as soon as their root finishes.
//!
//! ```rust
//! use spindle_driver::Driver;
//! use spindle_task::{pause, Task};
//!
//! let mut driver = Driver::new();
//! driver.submit(Task::new(async {
//!     let answer = Task::new(async { 42 }).await;
//!     pause().await;
//!     assert_eq!(answer, 42);
//! }));
//! while !driver.tick() {}
//! ```
//!
//! The driver never waits: making progress means calling [`Driver::tick`]
//! again.
//!
//! [`Link`]: spindle_task::Link
#![deny(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    clippy::missing_safety_doc
)]
use std::future::Future;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use spindle_task::{Frame, FrameId, Link, Task};

mod builder;
mod error;
mod handle;
mod util;

#[cfg(test)]
mod tests;

pub use builder::{Builder, PanicPolicy};
pub use error::{Error, ErrorKind};
pub use handle::Handle;

use handle::Injected;
use util::abort_on_panic;

const LOG: &str = "spindle_driver";

/// Drives task trees to completion, one step per tree per [`Driver::tick`].
pub struct Driver {
    /// Frontier frame of every live tree.
    roots: Vec<Frame>,
    injected: Rc<Injected>,
    panic_policy: PanicPolicy,
    ticks: u64,
}

impl Driver {
    /// Construct a [`Driver`] with the default configuration.
    pub fn new() -> Self {
        Builder::new().build()
    }

    /// Returns a [`Builder`] to configure a new driver.
    pub fn builder() -> Builder {
        Builder::new()
    }

    pub(crate) fn from_builder(builder: Builder) -> Self {
        Self {
            roots: Vec::with_capacity(builder.capacity),
            injected: Rc::default(),
            panic_policy: builder.panic_policy,
            ticks: 0,
        }
    }

    /// Returns a [`Handle`] which can submit tasks to this driver.
    pub fn handle(&self) -> Handle {
        Handle::new(&self.injected)
    }

    /// Take ownership of `task`'s frame and register it as a new root.
    ///
    /// The task is resumed for the first time on the next tick.
    pub fn submit<T>(&mut self, task: Task<T>) -> FrameId {
        let frame = task.into_frame();
        let id = frame.id();
        log::debug!(target: LOG, "driver.submit id={} live={}", id, self.roots.len() + 1);
        self.roots.push(frame);
        id
    }

    /// Create a task from `future` and submit it.
    pub fn spawn<F>(&mut self, future: F) -> FrameId
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        self.submit(Task::new(future))
    }

    /// Returns the number of live task trees, including ones submitted
    /// through a [`Handle`] which have not joined yet.
    pub fn live(&self) -> usize {
        self.roots.len() + self.injected.len()
    }

    /// Returns true when every submitted tree has finished.
    pub fn is_idle(&self) -> bool {
        self.live() == 0
    }

    /// Returns the number of ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Resume every live tree once.
    ///
    /// Trees are visited in collection order. Retiring a tree moves the last
    /// tree into its slot, so the order between ticks is not stable. Each
    /// tree is resumed at most once per tick, except that a child finishing
    /// hands control straight back to its parent. A chain of frames finishing
    /// one after another may therefore resume several frames of one tree in
    /// a single visit. Returns true once no live trees remain.
    ///
    /// # Panics
    ///
    /// With [`PanicPolicy::Unwind`], a panic from a task is resumed here after
    /// its tree has been removed. The tick is cut short: trees after the
    /// panicking one are not resumed until the next tick, but the tick still
    /// counts towards [`Driver::ticks`]. With [`PanicPolicy::Abort`] the
    /// process aborts instead.
    pub fn tick(&mut self) -> bool {
        let joined = self.injected.take();
        if !joined.is_empty() {
            log::trace!(target: LOG, "driver.join count={}", joined.len());
            self.roots.extend(joined);
        }

        let mut slot = 0;
        while slot < self.roots.len() {
            // A retired slot now holds a tree which has not been visited yet.
            if self.advance(slot) {
                slot += 1;
            }
        }
        self.ticks += 1;
        log::trace!(target: LOG, "driver.tick n={} live={}", self.ticks, self.live());
        self.is_idle()
    }

    /// Tick until every tree has finished, returning the number of ticks taken.
    ///
    /// Never returns if a task never finishes.
    pub fn run(&mut self) -> u64 {
        let start = self.ticks;
        while !self.is_idle() {
            self.tick();
        }
        self.ticks - start
    }

    /// Resume the tree in `slot`. Returns false if the tree finished and was removed.
    fn advance(&mut self, slot: usize) -> bool {
        let mut frame = self.roots[slot].clone();
        loop {
            self.resume(slot, &frame);
            match frame.next() {
                Link::Idle => return true,
                Link::WaitingOnChild(child) => {
                    self.roots[slot] = child;
                    return true;
                }
                Link::ReturnTo(parent) => {
                    frame.finalize();
                    self.roots[slot] = parent.clone();
                    frame = parent;
                }
                Link::Finished => {
                    frame.finalize();
                    let root = self.roots.swap_remove(slot);
                    log::debug!(target: LOG, "driver.retire id={} live={}", root.id(), self.live());
                    return false;
                }
            }
        }
    }

    fn resume(&mut self, slot: usize, frame: &Frame) {
        match self.panic_policy {
            PanicPolicy::Abort => abort_on_panic(|| frame.resume()),
            PanicPolicy::Unwind => {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| frame.resume())) {
                    log::error!(target: LOG, "driver.panic id={}", frame.id());
                    frame.teardown();
                    self.roots.swap_remove(slot);
                    self.ticks += 1;
                    panic::resume_unwind(payload);
                }
            }
        }
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("live", &self.live())
            .field("ticks", &self.ticks)
            .field("panic_policy", &self.panic_policy)
            .finish()
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        let roots = mem::take(&mut self.roots);
        if !roots.is_empty() {
            log::debug!(target: LOG, "driver.shutdown live={}", roots.len());
        }
        for frame in roots {
            frame.teardown();
        }
        for frame in self.injected.take() {
            frame.finalize();
        }
    }
}
