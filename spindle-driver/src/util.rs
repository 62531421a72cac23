use std::mem;

use crate::LOG;

/// Abort if the closure `f` panics.
///
/// Use this with care, this will cause the entire program to immediately
/// abort. A task panicking under [`PanicPolicy::Abort`] leaves no way to
/// recover its tree, so the whole process goes down.
///
/// [`PanicPolicy::Abort`]: crate::PanicPolicy::Abort
#[inline]
pub(crate) fn abort_on_panic<T>(f: impl FnOnce() -> T) -> T {
    struct Bomb;

    impl Drop for Bomb {
        fn drop(&mut self) {
            log::error!(target: LOG, "driver.panic aborting");
            std::process::abort();
        }
    }

    let bomb = Bomb;
    let t = f();
    mem::forget(bomb);
    t
}
