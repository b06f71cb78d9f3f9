//! The type registry: per-type member tables keyed by [`TypeId`], the cached
//! member lookup built on them, and the process-wide registry the
//! convenience accessors use.
//!
//! [`TypeId`]: core::any::TypeId

mod type_registry;

pub use type_registry::{AttributedField, TypeRegistry};

use std::sync::{OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

static GLOBAL: OnceLock<RwLock<TypeRegistry>> = OnceLock::new();

/// Returns the process-wide registry, initializing it on first use.
///
/// With the `auto_register` feature enabled (the default), initialization
/// runs every registration hook submitted through
/// [`impl_auto_register!`](crate::impl_auto_register).
pub fn global() -> &'static RwLock<TypeRegistry> {
    GLOBAL.get_or_init(|| {
        #[allow(unused_mut)]
        let mut registry = TypeRegistry::new();
        #[cfg(feature = "auto_register")]
        for entry in inventory::iter::<AutoRegistration> {
            (entry.register)(&mut registry);
        }
        RwLock::new(registry)
    })
}

/// Locks the process-wide registry for reading.
pub fn global_read() -> RwLockReadGuard<'static, TypeRegistry> {
    global().read().unwrap_or_else(PoisonError::into_inner)
}

/// Locks the process-wide registry for writing.
pub fn global_write() -> RwLockWriteGuard<'static, TypeRegistry> {
    global().write().unwrap_or_else(PoisonError::into_inner)
}

/// A registration hook collected at link time and run when the process-wide
/// registry is first initialized.
///
/// Submitted by [`impl_auto_register!`](crate::impl_auto_register); rarely
/// constructed by hand.
#[cfg(feature = "auto_register")]
pub struct AutoRegistration {
    /// Registers one or more types into the given registry.
    pub register: fn(&mut TypeRegistry),
}

#[cfg(feature = "auto_register")]
inventory::collect!(AutoRegistration);

/// Submits a type for automatic registration into the process-wide registry.
///
/// ```
/// use memberpath::impl_reflect;
/// use memberpath::info::{GetMemberTable, MemberInfo, MemberTable};
///
/// struct Beacon {
///     lit: bool,
/// }
/// impl_reflect!(Beacon);
///
/// impl GetMemberTable for Beacon {
///     fn member_table() -> MemberTable {
///         MemberTable::of::<Beacon>()
///             .with(MemberInfo::field("lit", |b: &Beacon| &b.lit, |b: &mut Beacon| &mut b.lit))
///     }
/// }
///
/// memberpath::impl_auto_register!(Beacon);
///
/// let registry = memberpath::registry::global_read();
/// assert!(registry.contains::<Beacon>());
/// ```
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! impl_auto_register {
    ($ty:ty) => {
        $crate::__macro_exports::inventory::submit! {
            $crate::registry::AutoRegistration {
                register: |registry| {
                    registry.register::<$ty>();
                },
            }
        }
    };
}
