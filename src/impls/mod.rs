//! [`Reflect`] implementations for the standard types path resolution
//! meets in practice: primitives, `String`, sequences, and the optional
//! slot `Option<T>`.
//!
//! [`Reflect`]: crate::Reflect

mod option;
mod sequences;

use alloc::string::String;

use crate::info::{GetMemberTable, MemberTable};

// -----------------------------------------------------------------------------
// Plain value impl

/// Implements [`Reflect`] for plain value types.
///
/// A plain value classifies as [`ReflectRef::Value`]: it has no elements
/// and no slot semantics, and its named members (if any) come from its
/// registered [`MemberTable`].
///
/// # Examples
///
/// ```
/// use memberpath::{impl_reflect, Reflect};
///
/// #[derive(PartialEq, Debug)]
/// struct Meters(f32);
///
/// impl_reflect!(Meters);
///
/// let distance: &dyn Reflect = &Meters(1.5);
/// assert_eq!(distance.downcast_ref::<Meters>(), Some(&Meters(1.5)));
/// ```
///
/// [`Reflect`]: crate::Reflect
/// [`ReflectRef::Value`]: crate::ReflectRef::Value
/// [`MemberTable`]: crate::info::MemberTable
#[macro_export]
macro_rules! impl_reflect {
    ($($ty:ty),* $(,)?) => {$(
        impl $crate::Reflect for $ty {
            #[inline]
            fn reflect_ref(&self) -> $crate::ReflectRef<'_> {
                $crate::ReflectRef::Value(self)
            }

            #[inline]
            fn reflect_mut(&mut self) -> $crate::ReflectMut<'_> {
                $crate::ReflectMut::Value(self)
            }

            fn set(
                &mut self,
                value: $crate::__macro_exports::alloc::boxed::Box<dyn $crate::Reflect>,
            ) -> ::core::result::Result<(), $crate::__macro_exports::alloc::boxed::Box<dyn $crate::Reflect>> {
                *self = value.take::<Self>()?;
                Ok(())
            }
        }
    )*};
}

macro_rules! impl_empty_member_table {
    ($($ty:ty),* $(,)?) => {$(
        impl GetMemberTable for $ty {
            fn member_table() -> MemberTable {
                MemberTable::of::<$ty>()
            }
        }
    )*};
}

impl_reflect!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
    String,
);

impl_empty_member_table!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
    String,
);

macro_rules! register_all {
    ($registry:expr, $($ty:ty),* $(,)?) => {$(
        $registry.register::<$ty>();
    )*};
}

/// Registers the plain value types above into a fresh registry.
pub(crate) fn register_value_types(registry: &mut crate::registry::TypeRegistry) {
    register_all!(
        registry, (), bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize,
        f32, f64, String,
    );
}
