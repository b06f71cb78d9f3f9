use alloc::boxed::Box;
use core::any::TypeId;
use std::collections::HashMap;

use crate::Reflect;

// -----------------------------------------------------------------------------
// CustomAttributes

/// A collection of custom attributes attached to a member.
///
/// Attributes are opaque to the resolver: it stores and returns them
/// without interpreting them. A calling layer (for example a validation
/// pass deciding whether a reference slot must be populated) queries them
/// by type.
///
/// Attributes are stored by their [`TypeId`], so there can be at most one
/// attribute per attribute type.
///
/// # Examples
///
/// ```
/// use memberpath::info::CustomAttributes;
/// use memberpath::impl_reflect;
///
/// #[derive(Clone, Copy, PartialEq, Debug)]
/// struct Hidden;
/// impl_reflect!(Hidden);
///
/// let attrs = CustomAttributes::new().with_attribute(Hidden);
/// assert!(attrs.has::<Hidden>());
/// assert!(attrs.get::<u32>().is_none());
/// ```
#[derive(Default)]
pub struct CustomAttributes {
    attributes: HashMap<TypeId, Box<dyn Reflect>>,
}

impl CustomAttributes {
    /// A static reference to an empty [`CustomAttributes`].
    ///
    /// Members store attributes as `Option<Box<..>>` to avoid a heap
    /// allocation in the common attribute-less case; this instance backs
    /// the `None` side of that option.
    pub(crate) fn empty() -> &'static Self {
        static EMPTY: std::sync::OnceLock<CustomAttributes> = std::sync::OnceLock::new();
        EMPTY.get_or_init(CustomAttributes::new)
    }

    /// Creates an empty [`CustomAttributes`].
    #[inline]
    pub fn new() -> Self {
        Self {
            attributes: HashMap::new(),
        }
    }

    /// Adds an attribute.
    ///
    /// Attributes are keyed by their concrete type; later insertions for
    /// the same type overwrite earlier values.
    #[inline]
    pub fn with_attribute<T: Reflect>(mut self, value: T) -> Self {
        self.attributes.insert(TypeId::of::<T>(), Box::new(value));
        self
    }

    /// Returns `true` if an attribute of type `T` is present.
    #[inline]
    pub fn has<T: Reflect>(&self) -> bool {
        self.attributes.contains_key(&TypeId::of::<T>())
    }

    /// Returns the attribute of type `T`, if present.
    #[inline]
    pub fn get<T: Reflect>(&self) -> Option<&T> {
        self.attributes
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Returns `true` if no attributes are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Returns an iterator over the stored attributes.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&TypeId, &dyn Reflect)> {
        self.attributes.iter().map(|(key, value)| (key, &**value))
    }
}
