#![doc = include_str!("../README.md")]

pub extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod reflection;

pub mod access;
pub mod impls;
pub mod info;
pub mod lookup;
pub mod registry;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use access::MemberAccess;
pub use reflection::{Reflect, ReflectKind, ReflectMut, ReflectRef, Sequence};

// Macro support; not public API.
#[doc(hidden)]
pub mod __macro_exports {
    pub use ::alloc;
    #[cfg(feature = "auto_register")]
    pub use inventory;
}
