use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;

use crate::reflection::Sequence;

// -----------------------------------------------------------------------------
// Reflect

/// The foundational trait for values that path resolution can walk.
///
/// A `Reflect` value knows its own runtime type and classifies itself for
/// traversal through [`reflect_ref`] / [`reflect_mut`]:
///
/// - a plain **value** whose named members come from the registered
///   [`MemberTable`] of its type,
/// - a **sequence** whose elements are addressed by index segments, or
/// - a **slot** (an optional reference) that may be absent.
///
/// Most types implement this via the [`impl_reflect!`] macro; sequence and
/// slot implementations for the common standard containers live in
/// [`crate::impls`].
///
/// # Examples
///
/// ```
/// use memberpath::{Reflect, ReflectKind};
///
/// let value: &dyn Reflect = &10_i32;
/// assert_eq!(value.reflect_kind(), ReflectKind::Value);
/// assert_eq!(value.downcast_ref::<i32>(), Some(&10));
///
/// let list: &dyn Reflect = &vec![1, 2, 3];
/// assert_eq!(list.reflect_kind(), ReflectKind::Sequence);
/// ```
///
/// [`reflect_ref`]: Reflect::reflect_ref
/// [`reflect_mut`]: Reflect::reflect_mut
/// [`MemberTable`]: crate::info::MemberTable
/// [`impl_reflect!`]: crate::impl_reflect
pub trait Reflect: Any + Send + Sync {
    /// Returns the full path of the underlying type.
    #[inline]
    fn type_path(&self) -> &'static str {
        core::any::type_name::<Self>()
    }

    /// Returns the [`TypeId`] of the underlying type.
    ///
    /// Unlike [`Any::type_id`] called through a `Box<dyn Reflect>`, this
    /// always reports the concrete value's type, never the container's.
    #[inline]
    fn ty_id(&self) -> TypeId {
        TypeId::of::<Self>()
    }

    /// Classifies this value for immutable traversal.
    fn reflect_ref(&self) -> ReflectRef<'_>;

    /// Classifies this value for mutable traversal.
    fn reflect_mut(&mut self) -> ReflectMut<'_>;

    /// Returns the pure enumeration of this value's traversal kind.
    #[inline]
    fn reflect_kind(&self) -> ReflectKind {
        self.reflect_ref().kind()
    }

    /// Performs a type-checked assignment of `value` to this value.
    ///
    /// The incoming type must match exactly; on mismatch the rejected value
    /// is handed back unchanged. This is the single coercion point for all
    /// value writes: there is no silent truncation or widening.
    fn set(&mut self, value: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>>;
}

// -----------------------------------------------------------------------------
// Downcasting

impl dyn Reflect {
    /// Returns `true` if the underlying value is of type `T`.
    #[inline]
    pub fn is<T: Reflect>(&self) -> bool {
        self.ty_id() == TypeId::of::<T>()
    }

    /// Downcasts to a shared reference of type `T`.
    #[inline]
    pub fn downcast_ref<T: Reflect>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }

    /// Downcasts to a mutable reference of type `T`.
    #[inline]
    pub fn downcast_mut<T: Reflect>(&mut self) -> Option<&mut T> {
        (self as &mut dyn Any).downcast_mut::<T>()
    }

    /// Takes the underlying value out of the box as a `T`.
    ///
    /// On type mismatch the box is handed back unchanged.
    pub fn take<T: Reflect>(self: Box<Self>) -> Result<T, Box<dyn Reflect>> {
        if !self.is::<T>() {
            return Err(self);
        }
        match (self as Box<dyn Any>).downcast::<T>() {
            Ok(value) => Ok(*value),
            // `is` checked the type id above.
            Err(_) => unreachable!(),
        }
    }
}

impl fmt::Debug for dyn Reflect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dyn Reflect({})", self.type_path())
    }
}

// -----------------------------------------------------------------------------
// Traversal classification

/// A pure enumeration of traversal ["kinds"](Reflect::reflect_kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReflectKind {
    /// A plain value; its members come from its registered member table.
    Value,
    /// An ordered, iterate-only collection.
    Sequence,
    /// An optional reference that may be absent.
    Slot,
}

impl fmt::Display for ReflectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReflectKind::Value => f.write_str("value"),
            ReflectKind::Sequence => f.write_str("sequence"),
            ReflectKind::Slot => f.write_str("slot"),
        }
    }
}

/// An immutable traversal view of a [`Reflect`] value.
pub enum ReflectRef<'a> {
    /// A plain value.
    Value(&'a dyn Reflect),
    /// An ordered collection; elements are reached by iteration.
    Sequence(&'a dyn Sequence),
    /// An optional reference; `None` is an absent slot.
    Slot(Option<&'a dyn Reflect>),
}

impl ReflectRef<'_> {
    /// Returns the corresponding [`ReflectKind`].
    #[inline]
    pub fn kind(&self) -> ReflectKind {
        match self {
            ReflectRef::Value(_) => ReflectKind::Value,
            ReflectRef::Sequence(_) => ReflectKind::Sequence,
            ReflectRef::Slot(_) => ReflectKind::Slot,
        }
    }
}

/// A mutable traversal view of a [`Reflect`] value.
pub enum ReflectMut<'a> {
    /// A plain value.
    Value(&'a mut dyn Reflect),
    /// An ordered collection; elements are reached by iteration.
    Sequence(&'a mut dyn Sequence),
    /// An optional reference; `None` is an absent slot.
    Slot(Option<&'a mut dyn Reflect>),
}

impl ReflectMut<'_> {
    /// Returns the corresponding [`ReflectKind`].
    #[inline]
    pub fn kind(&self) -> ReflectKind {
        match self {
            ReflectMut::Value(_) => ReflectKind::Value,
            ReflectMut::Sequence(_) => ReflectKind::Sequence,
            ReflectMut::Slot(_) => ReflectKind::Slot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downcast_roundtrip() {
        let value: Box<dyn Reflect> = Box::new(7_u32);
        assert!(value.is::<u32>());
        assert_eq!(value.downcast_ref::<u32>(), Some(&7));
        assert_eq!(value.take::<u32>().ok(), Some(7));
    }

    #[test]
    fn take_rejects_wrong_type() {
        let value: Box<dyn Reflect> = Box::new(7_u32);
        let rejected = value.take::<i32>().unwrap_err();
        assert!(rejected.is::<u32>());
    }

    #[test]
    fn set_is_exact() {
        let mut value = 1_u32;
        assert!(value.set(Box::new(2_u32)).is_ok());
        assert_eq!(value, 2);

        let rejected = value.set(Box::new(3_i64)).unwrap_err();
        assert!(rejected.is::<i64>());
        assert_eq!(value, 2);
    }
}
