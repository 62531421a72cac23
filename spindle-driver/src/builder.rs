use crate::Driver;

/// What the driver does when a task panics while being resumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanicPolicy {
    /// Abort the process.
    #[default]
    Abort,
    /// Tear down the panicking task tree, remove it from the driver, and
    /// resume the panic in the caller of [`Driver::tick`].
    Unwind,
}

/// Configures and builds a [`Driver`].
///
/// ```rust
/// use spindle_driver::{Driver, PanicPolicy};
///
/// let driver = Driver::builder()
///     .capacity(16)
///     .panic_policy(PanicPolicy::Unwind)
///     .build();
/// assert!(driver.is_idle());
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    pub(crate) capacity: usize,
    pub(crate) panic_policy: PanicPolicy,
}

impl Builder {
    /// Returns a builder with the default configuration.
    pub fn new() -> Self {
        Self {
            capacity: 64,
            panic_policy: PanicPolicy::default(),
        }
    }

    /// Number of task trees the driver has room for before it reallocates.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the [`PanicPolicy`].
    pub fn panic_policy(mut self, policy: PanicPolicy) -> Self {
        self.panic_policy = policy;
        self
    }

    /// Build the [`Driver`].
    pub fn build(self) -> Driver {
        Driver::from_builder(self)
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
