use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::TypeId;
use core::fmt;

use crate::Reflect;
use crate::info::MemberInfo;

// -----------------------------------------------------------------------------
// Base link

/// Erased upcast projections from a type to its declared base, plus the hook
/// that registers the base's own table on demand.
pub struct BaseLink {
    base: TypeId,
    base_path: &'static str,
    upcast: Box<dyn for<'a> Fn(&'a dyn Reflect) -> Option<&'a dyn Reflect> + Send + Sync>,
    upcast_mut:
        Box<dyn for<'a> Fn(&'a mut dyn Reflect) -> Option<&'a mut dyn Reflect> + Send + Sync>,
    register: fn(&mut crate::registry::TypeRegistry),
}

impl BaseLink {
    /// Returns the [`TypeId`] of the base type.
    #[inline]
    pub fn base(&self) -> TypeId {
        self.base
    }

    /// Returns the path of the base type.
    #[inline]
    pub fn base_path(&self) -> &'static str {
        self.base_path
    }

    /// Projects a receiver onto its base part.
    #[inline]
    pub fn upcast<'a>(&self, value: &'a dyn Reflect) -> Option<&'a dyn Reflect> {
        (self.upcast)(value)
    }

    /// Projects a receiver mutably onto its base part.
    #[inline]
    pub fn upcast_mut<'a>(&self, value: &'a mut dyn Reflect) -> Option<&'a mut dyn Reflect> {
        (self.upcast_mut)(value)
    }

    #[inline]
    pub(crate) fn register(&self, registry: &mut crate::registry::TypeRegistry) {
        (self.register)(registry);
    }
}

impl fmt::Debug for BaseLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseLink")
            .field("base", &self.base_path)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Member table

/// The declared members of one type, in declaration order, with an optional
/// link to a base type whose members the lookup walk continues into.
///
/// # Examples
///
/// ```
/// use memberpath::impl_reflect;
/// use memberpath::info::{GetMemberTable, MemberInfo, MemberTable};
///
/// struct Door {
///     open: bool,
/// }
/// impl_reflect!(Door);
///
/// impl GetMemberTable for Door {
///     fn member_table() -> MemberTable {
///         MemberTable::of::<Door>()
///             .with(MemberInfo::field("open", |d: &Door| &d.open, |d: &mut Door| &mut d.open))
///     }
/// }
///
/// let table = Door::member_table();
/// assert_eq!(table.len(), 1);
/// assert!(table.get("open").is_some());
/// ```
pub struct MemberTable {
    ty: TypeId,
    type_path: &'static str,
    base: Option<Arc<BaseLink>>,
    members: Vec<Arc<MemberInfo>>,
}

impl MemberTable {
    /// Creates an empty table for `T` with no base link.
    pub fn of<T: Reflect>() -> Self {
        Self {
            ty: TypeId::of::<T>(),
            type_path: core::any::type_name::<T>(),
            base: None,
            members: Vec::new(),
        }
    }

    /// Creates an empty table for `T` whose lookup walk continues into `B`
    /// through the given projections.
    ///
    /// Registering `T` also registers `B`, so a chain of linked types only
    /// needs its most-derived type registered explicitly.
    pub fn with_base<T, B>(upcast: fn(&T) -> &B, upcast_mut: fn(&mut T) -> &mut B) -> Self
    where
        T: Reflect,
        B: crate::info::GetMemberTable,
    {
        let link = BaseLink {
            base: TypeId::of::<B>(),
            base_path: core::any::type_name::<B>(),
            upcast: Box::new(move |value: &dyn Reflect| {
                value.downcast_ref::<T>().map(|value| upcast(value) as &dyn Reflect)
            }),
            upcast_mut: Box::new(move |value: &mut dyn Reflect| {
                value
                    .downcast_mut::<T>()
                    .map(|value| upcast_mut(value) as &mut dyn Reflect)
            }),
            register: |registry| {
                registry.register::<B>();
            },
        };
        Self {
            ty: TypeId::of::<T>(),
            type_path: core::any::type_name::<T>(),
            base: Some(Arc::new(link)),
            members: Vec::new(),
        }
    }

    /// Appends a member declaration.
    pub fn with(mut self, member: MemberInfo) -> Self {
        self.members.push(Arc::new(member));
        self
    }

    /// Returns the [`TypeId`] of the declaring type.
    #[inline]
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    /// Returns the path of the declaring type.
    #[inline]
    pub fn type_path(&self) -> &'static str {
        self.type_path
    }

    /// Returns the link to the base type, if one is declared.
    #[inline]
    pub fn base(&self) -> Option<&Arc<BaseLink>> {
        self.base.as_ref()
    }

    /// Returns the first member with the given name declared directly on
    /// this type, ignoring the base chain.
    pub fn get(&self, name: &str) -> Option<&Arc<MemberInfo>> {
        self.members.iter().find(|member| member.name() == name)
    }

    /// Iterates the members declared directly on this type, in declaration
    /// order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MemberInfo>> {
        self.members.iter()
    }

    /// Returns the number of members declared directly on this type.
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if no members are declared directly on this type.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl fmt::Debug for MemberTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberTable")
            .field("type_path", &self.type_path)
            .field("base", &self.base)
            .field("members", &self.members)
            .finish()
    }
}

/// Trait for types that declare a member table.
///
/// Implemented by hand next to the type definition; the table is consumed
/// once by [`TypeRegistry::register`](crate::registry::TypeRegistry::register).
pub trait GetMemberTable: Reflect + Sized {
    /// Builds the member table for this type.
    fn member_table() -> MemberTable;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_reflect;
    use crate::info::MemberKind;
    use alloc::string::String;

    struct Base {
        id: u32,
    }
    impl_reflect!(Base);

    impl GetMemberTable for Base {
        fn member_table() -> MemberTable {
            MemberTable::of::<Base>()
                .with(MemberInfo::field("id", |b: &Base| &b.id, |b: &mut Base| &mut b.id))
        }
    }

    struct Derived {
        base: Base,
        label: String,
    }
    impl_reflect!(Derived);

    impl GetMemberTable for Derived {
        fn member_table() -> MemberTable {
            MemberTable::with_base::<Derived, Base>(|d| &d.base, |d| &mut d.base)
                .with(MemberInfo::field(
                    "label",
                    |d: &Derived| &d.label,
                    |d: &mut Derived| &mut d.label,
                ))
        }
    }

    #[test]
    fn declaration_order_is_preserved() {
        let table = MemberTable::of::<Base>()
            .with(MemberInfo::field("id", |b: &Base| &b.id, |b: &mut Base| &mut b.id))
            .with(MemberInfo::method("id", |b: &Base| b.id));
        let names: Vec<_> = table.iter().map(|m| m.kind()).collect();
        assert_eq!(names, [MemberKind::Field, MemberKind::Method]);
    }

    #[test]
    fn base_link_projects_the_base_part() {
        let table = Derived::member_table();
        let link = table.base().unwrap();
        assert_eq!(link.base(), core::any::TypeId::of::<Base>());

        let derived = Derived {
            base: Base { id: 9 },
            label: String::from("door"),
        };
        let base = link.upcast(&derived).unwrap();
        assert!(base.is::<Base>());
    }

    #[test]
    fn direct_lookup_ignores_the_base_chain() {
        let table = Derived::member_table();
        assert!(table.get("label").is_some());
        assert!(table.get("id").is_none());
    }
}
