use std::any::{self, Any, TypeId};
use std::fmt;
use std::rc::Rc;

use crate::Error;

/// Shared storage for the single value produced by a finished [`Frame`].
///
/// The value lives behind an [`Rc`], so handing a result from a child to its
/// parent is a reference count bump rather than a copy. The value is dropped
/// once the last clone of the cell is dropped.
///
/// The cell remembers the type it was constructed with. Reading it as any
/// other type is a contract violation which [`CompletionCell::read`] reports
/// with a panic and [`CompletionCell::try_read`] reports as an [`Error`].
///
/// ```rust
/// let cell = spindle_task::CompletionCell::new(42_u32);
/// assert_eq!(cell.read::<u32>(), 42);
/// assert!(cell.try_read::<i64>().is_err());
/// ```
///
/// [`Frame`]: crate::Frame
#[derive(Clone)]
pub struct CompletionCell {
    value: Rc<dyn Any>,
    type_name: &'static str,
}

impl CompletionCell {
    /// Store `value` in a new cell.
    pub fn new<T: 'static>(value: T) -> Self {
        Self {
            value: Rc::new(value),
            type_name: any::type_name::<T>(),
        }
    }

    /// Returns a clone of the stored value.
    ///
    /// # Panics
    ///
    /// Panics if the cell does not hold a `T`.
    #[track_caller]
    pub fn read<T: Clone + 'static>(&self) -> T {
        match self.try_read() {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Returns a clone of the stored value, or an error if the cell
    /// does not hold a `T`.
    pub fn try_read<T: Clone + 'static>(&self) -> Result<T, Error> {
        self.value
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| Error::type_mismatch(any::type_name::<T>(), self.type_name))
    }

    /// Attempt to move the value out of the cell.
    ///
    /// Succeeds without cloning when this is the last holder of the value,
    /// otherwise the cell is handed back unchanged.
    pub fn try_unwrap<T: 'static>(self) -> Result<T, Self> {
        if !self.is::<T>() {
            return Err(self);
        }
        let type_name = self.type_name;
        match Rc::downcast::<T>(self.value) {
            Ok(value) => Rc::try_unwrap(value).map_err(|value| Self { value, type_name }),
            Err(value) => Err(Self { value, type_name }),
        }
    }

    /// Returns true if the cell holds a `T`.
    pub fn is<T: 'static>(&self) -> bool {
        (*self.value).type_id() == TypeId::of::<T>()
    }

    /// Returns the name of the stored type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the number of holders sharing the stored value.
    pub fn holders(&self) -> usize {
        Rc::strong_count(&self.value)
    }
}

impl fmt::Debug for CompletionCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionCell")
            .field("type_name", &self.type_name)
            .finish()
    }
}
