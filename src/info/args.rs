use alloc::boxed::Box;
use alloc::collections::VecDeque;
use core::fmt;

use crate::Reflect;

// -----------------------------------------------------------------------------
// Invocation errors

/// An error produced while invoking a method member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
    /// The argument list length does not match the method's arity.
    ArgCount {
        expected: usize,
        got: usize,
    },
    /// An argument's runtime type does not match the parameter type.
    ArgType {
        index: usize,
        expected: &'static str,
        actual: &'static str,
    },
    /// The receiver is not of the method's declaring type.
    ReceiverMismatch {
        expected: &'static str,
    },
}

impl fmt::Display for InvokeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvokeError::ArgCount { expected, got } => {
                write!(f, "expected {expected} argument(s), got {got}")
            }
            InvokeError::ArgType {
                index,
                expected,
                actual,
            } => write!(
                f,
                "argument {index} has type `{actual}`, expected `{expected}`"
            ),
            InvokeError::ReceiverMismatch { expected } => {
                write!(f, "receiver is not a `{expected}`")
            }
        }
    }
}

impl core::error::Error for InvokeError {}

// -----------------------------------------------------------------------------
// ArgList

/// An ordered list of boxed arguments for a method invocation.
///
/// Arguments are taken back out front-to-back with [`take`], which performs
/// the same exact-type check as every other coercion point.
///
/// # Examples
///
/// ```
/// use memberpath::info::ArgList;
///
/// let mut args = ArgList::new().with(2_u32).with(true);
/// assert_eq!(args.len(), 2);
///
/// let first: u32 = args.take().unwrap();
/// let second: bool = args.take().unwrap();
/// assert_eq!((first, second), (2, true));
/// ```
///
/// [`take`]: ArgList::take
#[derive(Default)]
pub struct ArgList {
    args: VecDeque<Box<dyn Reflect>>,
    taken: usize,
}

impl ArgList {
    /// Creates an empty argument list.
    #[inline]
    pub fn new() -> Self {
        Self {
            args: VecDeque::new(),
            taken: 0,
        }
    }

    /// Appends an argument.
    #[inline]
    pub fn with<T: Reflect>(self, value: T) -> Self {
        self.with_boxed(Box::new(value))
    }

    /// Appends a boxed argument.
    #[inline]
    pub fn with_boxed(mut self, value: Box<dyn Reflect>) -> Self {
        self.args.push_back(value);
        self
    }

    /// Returns the number of remaining arguments.
    #[inline]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Returns `true` if no arguments remain.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Takes the next argument as a `T`.
    pub fn take<T: Reflect>(&mut self) -> Result<T, InvokeError> {
        let index = self.taken;
        let Some(arg) = self.args.pop_front() else {
            return Err(InvokeError::ArgCount {
                expected: index + 1,
                got: index,
            });
        };
        match arg.take::<T>() {
            Ok(value) => {
                self.taken += 1;
                Ok(value)
            }
            Err(rejected) => Err(InvokeError::ArgType {
                index,
                expected: core::any::type_name::<T>(),
                actual: rejected.type_path(),
            }),
        }
    }
}

impl fmt::Debug for ArgList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgList")
            .field("len", &self.args.len())
            .field("taken", &self.taken)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_is_front_to_back() {
        let mut args = ArgList::new().with(1_i32).with(2_i32);
        assert_eq!(args.take::<i32>().unwrap(), 1);
        assert_eq!(args.take::<i32>().unwrap(), 2);
        assert!(matches!(
            args.take::<i32>(),
            Err(InvokeError::ArgCount { .. })
        ));
    }

    #[test]
    fn take_reports_the_argument_index() {
        let mut args = ArgList::new().with(1_i32).with(false);
        args.take::<i32>().unwrap();
        let err = args.take::<i32>().unwrap_err();
        assert!(matches!(err, InvokeError::ArgType { index: 1, .. }));
    }
}
