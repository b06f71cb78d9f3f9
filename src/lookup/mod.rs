//! Member lookup: the walk that turns a `(type, name)` pair into a
//! [`MemberDescriptor`] by scanning a type's own declarations first and then
//! each linked base in turn.
//!
//! Lookup is name-first: within one type, members are considered in
//! declaration order and the first eligible one wins, whatever its kind.
//! Methods that take arguments are never eligible. When an expected produced
//! type is supplied, a name match with the wrong produced type is passed
//! over (with a warning) and the scan keeps going, into the base chain if
//! necessary.

mod descriptor;

pub use descriptor::{ExpectedType, MemberDescriptor};

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::TypeId;
use core::fmt;

use crate::info::BaseLink;
use crate::registry::TypeRegistry;

/// An error produced by member lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The starting type has no registered member table.
    UnknownType {
        /// The path of the unregistered type.
        ty_path: &'static str,
    },
    /// No eligible member with the given name exists on the type or any of
    /// its linked bases.
    NotFound {
        /// The path of the type the lookup started from.
        ty_path: &'static str,
        /// The member name that was looked up.
        name: alloc::boxed::Box<str>,
    },
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::UnknownType { ty_path } => {
                write!(f, "type `{ty_path}` has no registered member table")
            }
            LookupError::NotFound { ty_path, name } => {
                write!(f, "type `{ty_path}` has no member named `{name}`")
            }
        }
    }
}

impl core::error::Error for LookupError {}

/// Walks `ty` and its base chain for the first eligible member named `name`.
///
/// Uncached; [`TypeRegistry::find_member`] wraps this with a lookup cache.
pub(crate) fn walk_member(
    registry: &TypeRegistry,
    ty: TypeId,
    ty_path: &'static str,
    name: &str,
    expected: Option<&ExpectedType>,
) -> Result<MemberDescriptor, LookupError> {
    let Some(start) = registry.table_by_id(ty) else {
        return Err(LookupError::UnknownType { ty_path });
    };

    let mut table = start;
    let mut upcasts: Vec<Arc<BaseLink>> = Vec::new();
    loop {
        for member in table.iter() {
            if member.name() != name {
                continue;
            }
            if member.arity() > 0 {
                log::warn!(
                    "skipping `{}::{}`: methods with arguments do not take part in lookup",
                    table.type_path(),
                    name,
                );
                continue;
            }
            if let Some(expected) = expected
                && member.produces() != expected.id()
            {
                log::warn!(
                    "skipping `{}::{}`: produces `{}`, expected `{}`",
                    table.type_path(),
                    name,
                    member.produces_path(),
                    expected.path(),
                );
                continue;
            }
            return Ok(MemberDescriptor::new(
                ty,
                table.ty(),
                table.type_path(),
                upcasts,
                Arc::clone(member),
            ));
        }

        let Some(link) = table.base() else {
            break;
        };
        let Some(base) = registry.table_by_id(link.base()) else {
            // Base tables are registered alongside their derived type, so a
            // missing one means the link outlived its registration; stop the
            // walk rather than guess.
            log::warn!(
                "base type `{}` of `{}` is not registered",
                link.base_path(),
                table.type_path(),
            );
            break;
        };
        upcasts.push(Arc::clone(link));
        table = base;
    }

    Err(LookupError::NotFound {
        ty_path: start.type_path(),
        name: name.into(),
    })
}
