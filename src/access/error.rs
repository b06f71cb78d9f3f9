use alloc::boxed::Box;
use core::fmt;

use crate::access::parse::{ParseError, ParseErrorKind};
use crate::info::{InvokeError, MemberKind};
use crate::lookup::LookupError;

/// Why a path failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveErrorKind {
    /// The path string itself is malformed.
    Parse(ParseErrorKind),
    /// The current value's type has no registered member table.
    UnknownType {
        /// The path of the unregistered type.
        ty_path: &'static str,
    },
    /// No eligible member with this name exists on the current type or its
    /// base chain.
    MemberNotFound {
        /// The path of the type the lookup started from.
        ty_path: &'static str,
        /// The member name the segment asked for.
        name: Box<str>,
    },
    /// An element segment was applied to a value that is not an ordered
    /// collection.
    NotEnumerable {
        /// The path of the non-enumerable type.
        ty_path: &'static str,
    },
    /// An element segment asked for a position past the end of the
    /// collection.
    IndexOutOfRange {
        /// The requested position.
        index: usize,
        /// The number of elements the collection produced.
        len: usize,
    },
    /// An intermediate slot was empty with path still left to walk.
    PathBroken,
    /// A member that produces a detached value (a method or a type-level
    /// field) appeared with path still left to walk; such members can only
    /// terminate a path.
    NotTraversable {
        /// The member name.
        member: &'static str,
        /// The member's kind.
        kind: MemberKind,
    },
}

impl fmt::Display for ResolveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveErrorKind::Parse(kind) => fmt::Display::fmt(kind, f),
            ResolveErrorKind::UnknownType { ty_path } => {
                write!(f, "type `{ty_path}` has no registered member table")
            }
            ResolveErrorKind::MemberNotFound { ty_path, name } => {
                write!(f, "type `{ty_path}` has no member named `{name}`")
            }
            ResolveErrorKind::NotEnumerable { ty_path } => {
                write!(f, "type `{ty_path}` is not an ordered collection")
            }
            ResolveErrorKind::IndexOutOfRange { index, len } => {
                write!(f, "element index {index} is out of range (length {len})")
            }
            ResolveErrorKind::PathBroken => f.write_str("an intermediate slot is empty"),
            ResolveErrorKind::NotTraversable { member, kind } => {
                write!(f, "{kind} `{member}` cannot be walked through, only read")
            }
        }
    }
}

/// An error produced while resolving a path against a value.
///
/// Carries the path and the byte offset of the segment that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveError<'p> {
    path: &'p str,
    offset: usize,
    kind: ResolveErrorKind,
}

impl<'p> ResolveError<'p> {
    pub(crate) fn new(path: &'p str, offset: usize, kind: ResolveErrorKind) -> Self {
        Self { path, offset, kind }
    }

    pub(crate) fn from_parse(error: ParseError<'p>) -> Self {
        Self {
            path: error.path(),
            offset: error.offset(),
            kind: ResolveErrorKind::Parse(error.kind()),
        }
    }

    pub(crate) fn from_lookup(path: &'p str, offset: usize, error: LookupError) -> Self {
        let kind = match error {
            LookupError::UnknownType { ty_path } => ResolveErrorKind::UnknownType { ty_path },
            LookupError::NotFound { ty_path, name } => {
                ResolveErrorKind::MemberNotFound { ty_path, name }
            }
        };
        Self { path, offset, kind }
    }

    /// Returns the path being resolved.
    #[inline]
    pub fn path(&self) -> &'p str {
        self.path
    }

    /// Returns the byte offset of the segment that failed.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the kind of failure.
    #[inline]
    pub fn kind(&self) -> &ResolveErrorKind {
        &self.kind
    }
}

impl fmt::Display for ResolveError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot resolve path `{}` at offset {}: {}",
            self.path, self.offset, self.kind,
        )
    }
}

impl core::error::Error for ResolveError<'_> {}

/// An error produced by an operation on a resolved handle.
#[derive(Debug)]
pub enum AccessError {
    /// The value's runtime type does not match the one the caller asked
    /// for, or a written value does not match the member's type.
    TypeMismatch {
        /// The path of the type the caller expected.
        expected: &'static str,
        /// The path of the type actually found.
        actual: &'static str,
    },
    /// The member cannot be written: a property without a setter, or a
    /// method.
    NoSetter {
        /// The member name.
        member: &'static str,
    },
    /// The handle does not denote a method.
    NotInvocable {
        /// The member name, or the type path for an element handle.
        target: &'static str,
    },
    /// The member needs a mutable receiver, but the handle only borrows its
    /// instance immutably.
    ImmutableReceiver {
        /// The member name.
        member: &'static str,
    },
    /// The handle's instance is not of the type the member was resolved
    /// against.
    ReceiverMismatch {
        /// The member name.
        member: &'static str,
    },
    /// The invocation itself failed.
    Invoke(InvokeError),
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessError::TypeMismatch { expected, actual } => {
                write!(f, "expected a value of type `{expected}`, found `{actual}`")
            }
            AccessError::NoSetter { member } => {
                write!(f, "member `{member}` cannot be written")
            }
            AccessError::NotInvocable { target } => {
                write!(f, "`{target}` is not a method")
            }
            AccessError::ImmutableReceiver { member } => {
                write!(f, "member `{member}` needs a mutable receiver")
            }
            AccessError::ReceiverMismatch { member } => {
                write!(f, "receiver is not of the type `{member}` was resolved against")
            }
            AccessError::Invoke(error) => fmt::Display::fmt(error, f),
        }
    }
}

impl core::error::Error for AccessError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            AccessError::Invoke(error) => Some(error),
            _ => None,
        }
    }
}

impl From<InvokeError> for AccessError {
    fn from(error: InvokeError) -> Self {
        AccessError::Invoke(error)
    }
}

/// Either half of a resolve-then-access operation failing, for the
/// one-call convenience accessors.
#[derive(Debug)]
pub enum MemberAccessError<'p> {
    /// The path did not resolve.
    Resolve(ResolveError<'p>),
    /// The resolved handle rejected the operation.
    Access(AccessError),
}

impl fmt::Display for MemberAccessError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberAccessError::Resolve(error) => fmt::Display::fmt(error, f),
            MemberAccessError::Access(error) => fmt::Display::fmt(error, f),
        }
    }
}

impl core::error::Error for MemberAccessError<'_> {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            // The resolve half borrows the path string, so it cannot be a
            // `'static` source; `Display` carries its detail instead.
            MemberAccessError::Resolve(_) => None,
            MemberAccessError::Access(error) => Some(error),
        }
    }
}

impl<'p> From<ResolveError<'p>> for MemberAccessError<'p> {
    fn from(error: ResolveError<'p>) -> Self {
        MemberAccessError::Resolve(error)
    }
}

impl From<AccessError> for MemberAccessError<'_> {
    fn from(error: AccessError) -> Self {
        MemberAccessError::Access(error)
    }
}
