use alloc::boxed::Box;

use crate::Reflect;
use crate::access::error::MemberAccessError;
use crate::access::resolver::PathResolver;
use crate::info::ArgList;
use crate::registry::global_read;

/// One-call member access through the process-wide registry.
///
/// Blanket-implemented for every [`Reflect`] type; each call resolves the
/// path and performs the operation in one go. Resolve once and hold a
/// handle instead when performing several operations on the same member.
///
/// # Examples
///
/// ```
/// use memberpath::MemberAccess;
/// use memberpath::impl_reflect;
/// use memberpath::info::{GetMemberTable, MemberInfo, MemberTable};
///
/// struct Torch {
///     fuel: u32,
/// }
/// impl_reflect!(Torch);
///
/// impl GetMemberTable for Torch {
///     fn member_table() -> MemberTable {
///         MemberTable::of::<Torch>()
///             .with(MemberInfo::field("fuel", |t: &Torch| &t.fuel, |t: &mut Torch| &mut t.fuel))
///     }
/// }
///
/// memberpath::impl_auto_register!(Torch);
///
/// let mut torch = Torch { fuel: 80 };
/// assert_eq!(torch.member_get::<u32>("fuel").unwrap(), 80);
/// torch.member_set("fuel", 75_u32).unwrap();
/// assert_eq!(torch.fuel, 75);
/// ```
pub trait MemberAccess: Reflect {
    /// Resolves `path` on `self` and reads the member as a `T`.
    ///
    /// The expected type `T` also constrains the terminal member lookup,
    /// so a same-named member of the wrong type on a derived level does
    /// not shadow a matching one on a base level.
    fn member_get<'p, T: Reflect + Clone>(&self, path: &'p str) -> Result<T, MemberAccessError<'p>>
    where
        Self: Sized,
    {
        let registry = global_read();
        let handle = PathResolver::new(&registry).resolve_expecting::<T>(self, path)?;
        Ok(handle.get_as::<T>()?)
    }

    /// Resolves `path` on `self` and writes `value` into the member.
    fn member_set<'p, T: Reflect>(
        &mut self,
        path: &'p str,
        value: T,
    ) -> Result<(), MemberAccessError<'p>>
    where
        Self: Sized,
    {
        let registry = global_read();
        let mut handle = PathResolver::new(&registry).resolve_mut_expecting::<T>(self, path)?;
        Ok(handle.set(value)?)
    }

    /// Resolves `path` on `self` and invokes the method there.
    fn member_call<'p>(
        &mut self,
        path: &'p str,
        args: ArgList,
    ) -> Result<Box<dyn Reflect>, MemberAccessError<'p>>
    where
        Self: Sized,
    {
        let registry = global_read();
        let mut handle = PathResolver::new(&registry).resolve_mut(self, path)?;
        Ok(handle.invoke(args)?)
    }
}

impl<T: Reflect> MemberAccess for T {}
