//! Type-level member metadata: what members a type declares, how they are
//! read, written and invoked, and how a type links to its base type.
//!
//! A type describes itself by building a [`MemberTable`], which holds its
//! declared members in declaration order plus an optional
//! [`base link`](BaseLink), and handing it to a [`TypeRegistry`] through
//! the [`GetMemberTable`] trait. Each member is a [`MemberInfo`]: a
//! tagged field / property / method variant carrying the erased
//! capabilities the accessor layer drives.
//!
//! [`TypeRegistry`]: crate::registry::TypeRegistry

mod args;
mod attributes;
mod member_info;
mod member_table;

pub use args::{ArgList, InvokeError};
pub use attributes::CustomAttributes;
pub use member_info::{MemberInfo, MemberKind};
pub use member_table::{BaseLink, GetMemberTable, MemberTable};

pub(crate) use member_info::{MemberNode, MethodCall};
