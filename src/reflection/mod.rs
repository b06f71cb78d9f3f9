//! The foundational object model: the [`Reflect`] trait and its
//! traversal classification.

mod reflect;
mod sequence;

pub use reflect::{Reflect, ReflectKind, ReflectMut, ReflectRef};
pub use sequence::Sequence;
