use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::TypeId;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::Reflect;
use crate::info::{GetMemberTable, MemberKind, MemberTable};
use crate::lookup::{ExpectedType, LookupError, MemberDescriptor};

#[derive(PartialEq, Eq, Hash)]
struct LookupKey {
    ty: TypeId,
    name: Box<str>,
    expected: Option<TypeId>,
}

/// The store of registered member tables, keyed by [`TypeId`], with a cache
/// over member lookups.
///
/// Types are registered explicitly (or through
/// [`impl_auto_register!`](crate::impl_auto_register) for the process-wide
/// registry); registering a type also registers every base its table links
/// to.
///
/// # Examples
///
/// ```
/// use memberpath::impl_reflect;
/// use memberpath::info::{GetMemberTable, MemberInfo, MemberTable};
/// use memberpath::registry::TypeRegistry;
///
/// struct Gauge {
///     reading: f32,
/// }
/// impl_reflect!(Gauge);
///
/// impl GetMemberTable for Gauge {
///     fn member_table() -> MemberTable {
///         MemberTable::of::<Gauge>().with(MemberInfo::field(
///             "reading",
///             |g: &Gauge| &g.reading,
///             |g: &mut Gauge| &mut g.reading,
///         ))
///     }
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Gauge>();
/// assert!(registry.contains::<Gauge>());
/// ```
pub struct TypeRegistry {
    tables: HashMap<TypeId, MemberTable>,
    cache: RwLock<HashMap<LookupKey, Option<MemberDescriptor>>>,
}

impl TypeRegistry {
    /// Creates a registry with the well-known value types pre-registered.
    ///
    /// Pre-registration gives primitives empty tables, so resolving a member
    /// on one reports the member as missing rather than the type as unknown.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        crate::impls::register_value_types(&mut registry);
        registry
    }

    /// Creates a registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            tables: HashMap::new(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Registers `T` and, recursively, every base its table links to.
    ///
    /// Returns `false` if `T` was already registered.
    pub fn register<T: GetMemberTable>(&mut self) -> bool {
        if self.contains::<T>() {
            return false;
        }
        let table = T::member_table();
        let base = table.base().cloned();
        self.tables.insert(table.ty(), table);
        if let Some(link) = base {
            link.register(self);
        }
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        true
    }

    /// Returns `true` if `T` is registered.
    #[inline]
    pub fn contains<T: Reflect>(&self) -> bool {
        self.contains_id(TypeId::of::<T>())
    }

    /// Returns `true` if the given type is registered.
    #[inline]
    pub fn contains_id(&self, ty: TypeId) -> bool {
        self.tables.contains_key(&ty)
    }

    /// Returns the member table registered for `T`, if any.
    #[inline]
    pub fn table<T: Reflect>(&self) -> Option<&MemberTable> {
        self.table_by_id(TypeId::of::<T>())
    }

    /// Returns the member table registered for the given type, if any.
    #[inline]
    pub fn table_by_id(&self, ty: TypeId) -> Option<&MemberTable> {
        self.tables.get(&ty)
    }

    /// Looks up the first eligible member named `name` on the given type or
    /// its base chain.
    ///
    /// `ty_path` is only used for error reporting when the type is not
    /// registered. Hits and name misses are cached; unknown types are not,
    /// since registering the type should make the next lookup succeed.
    pub fn find_member(
        &self,
        ty: TypeId,
        ty_path: &'static str,
        name: &str,
        expected: Option<&ExpectedType>,
    ) -> Result<MemberDescriptor, LookupError> {
        let key = LookupKey {
            ty,
            name: name.into(),
            expected: expected.map(|e| e.id()),
        };
        if let Some(cached) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return match cached {
                Some(descriptor) => Ok(descriptor.clone()),
                None => Err(LookupError::NotFound {
                    ty_path: self
                        .table_by_id(ty)
                        .map(MemberTable::type_path)
                        .unwrap_or(ty_path),
                    name: name.into(),
                }),
            };
        }

        let result = crate::lookup::walk_member(self, ty, ty_path, name, expected);
        match &result {
            Ok(descriptor) => {
                self.cache
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(key, Some(descriptor.clone()));
            }
            Err(LookupError::NotFound { .. }) => {
                self.cache
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(key, None);
            }
            Err(LookupError::UnknownType { .. }) => {}
        }
        result
    }

    /// Looks up a member by name on `T`.
    pub fn find_member_of<T: Reflect>(
        &self,
        name: &str,
        expected: Option<&ExpectedType>,
    ) -> Result<MemberDescriptor, LookupError> {
        self.find_member(TypeId::of::<T>(), core::any::type_name::<T>(), name, expected)
    }

    /// Collects every field on the given type and its base chain that
    /// carries a custom attribute of type `A`, derived-most declarations
    /// first.
    pub fn fields_with_attribute<A: Reflect>(&self, ty: TypeId) -> Vec<AttributedField<'_, A>> {
        let mut found = Vec::new();
        let mut upcasts = Vec::new();
        let mut table = self.table_by_id(ty);
        while let Some(current) = table {
            for member in current.iter() {
                if member.kind() != MemberKind::Field {
                    continue;
                }
                let Some(attribute) = member.get_attribute::<A>() else {
                    continue;
                };
                found.push(AttributedField {
                    attribute,
                    descriptor: MemberDescriptor::new(
                        ty,
                        current.ty(),
                        current.type_path(),
                        upcasts.clone(),
                        member.clone(),
                    ),
                });
            }
            table = current.base().and_then(|link| {
                upcasts.push(link.clone());
                self.table_by_id(link.base())
            });
        }
        found
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A field carrying a custom attribute of type `A`, as collected by
/// [`TypeRegistry::fields_with_attribute`].
pub struct AttributedField<'r, A> {
    /// The attribute value attached to the field.
    pub attribute: &'r A,
    /// The field itself, with the projections needed to reach it from the
    /// queried type.
    pub descriptor: MemberDescriptor,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_reflect;
    use crate::info::MemberInfo;
    use alloc::string::String;

    struct Actor {
        name: String,
    }
    impl_reflect!(Actor);

    impl GetMemberTable for Actor {
        fn member_table() -> MemberTable {
            MemberTable::of::<Actor>().with(MemberInfo::field(
                "name",
                |a: &Actor| &a.name,
                |a: &mut Actor| &mut a.name,
            ))
        }
    }

    struct Npc {
        actor: Actor,
        name: u32,
        hostile: bool,
    }
    impl_reflect!(Npc);

    impl GetMemberTable for Npc {
        fn member_table() -> MemberTable {
            MemberTable::with_base::<Npc, Actor>(|n| &n.actor, |n| &mut n.actor)
                .with(MemberInfo::field("name", |n: &Npc| &n.name, |n: &mut Npc| &mut n.name))
                .with(MemberInfo::field(
                    "hostile",
                    |n: &Npc| &n.hostile,
                    |n: &mut Npc| &mut n.hostile,
                ))
        }
    }

    #[test]
    fn registering_a_type_registers_its_bases() {
        let mut registry = TypeRegistry::empty();
        assert!(registry.register::<Npc>());
        assert!(registry.contains::<Actor>());
        assert!(!registry.register::<Npc>());
    }

    #[test]
    fn primitives_have_empty_tables() {
        let registry = TypeRegistry::new();
        let table = registry.table::<u32>().unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn derived_members_shadow_base_members() {
        let mut registry = TypeRegistry::empty();
        registry.register::<Npc>();
        let descriptor = registry.find_member_of::<Npc>("name", None).unwrap();
        assert_eq!(descriptor.declared_by(), TypeId::of::<Npc>());
        assert!(descriptor.member().produces_is::<u32>());
    }

    #[test]
    fn expected_type_falls_through_to_the_base() {
        let mut registry = TypeRegistry::empty();
        registry.register::<Npc>();
        let descriptor = registry
            .find_member_of::<Npc>("name", Some(&ExpectedType::of::<String>()))
            .unwrap();
        assert_eq!(descriptor.declared_by(), TypeId::of::<Actor>());
    }

    #[test]
    fn misses_are_reported_and_cached() {
        let mut registry = TypeRegistry::empty();
        registry.register::<Npc>();
        let err = registry.find_member_of::<Npc>("mood", None).unwrap_err();
        assert!(matches!(err, LookupError::NotFound { .. }));
        // Second lookup hits the cache and reports the same miss.
        let err = registry.find_member_of::<Npc>("mood", None).unwrap_err();
        assert!(matches!(err, LookupError::NotFound { .. }));
    }

    #[test]
    fn unregistered_types_are_unknown() {
        let registry = TypeRegistry::empty();
        let err = registry.find_member_of::<Actor>("name", None).unwrap_err();
        assert!(matches!(err, LookupError::UnknownType { .. }));
    }

    #[test]
    fn attributed_fields_are_collected_across_the_chain() {
        #[derive(Clone, Copy)]
        struct Saved;
        impl_reflect!(Saved);

        struct Root {
            id: u64,
        }
        impl_reflect!(Root);
        impl GetMemberTable for Root {
            fn member_table() -> MemberTable {
                MemberTable::of::<Root>().with(
                    MemberInfo::field("id", |r: &Root| &r.id, |r: &mut Root| &mut r.id)
                        .with_attribute(Saved),
                )
            }
        }

        struct Leaf {
            root: Root,
            tag: String,
        }
        impl_reflect!(Leaf);
        impl GetMemberTable for Leaf {
            fn member_table() -> MemberTable {
                MemberTable::with_base::<Leaf, Root>(|l| &l.root, |l| &mut l.root).with(
                    MemberInfo::field("tag", |l: &Leaf| &l.tag, |l: &mut Leaf| &mut l.tag)
                        .with_attribute(Saved),
                )
            }
        }

        let mut registry = TypeRegistry::empty();
        registry.register::<Leaf>();
        let fields = registry.fields_with_attribute::<Saved>(TypeId::of::<Leaf>());
        let names: Vec<_> = fields.iter().map(|f| f.descriptor.name()).collect();
        assert_eq!(names, ["tag", "id"]);

        let leaf = Leaf {
            root: Root { id: 7 },
            tag: String::from("oak"),
        };
        let root_part = fields[1].descriptor.project(&leaf).unwrap();
        assert!(root_part.is::<Root>());
    }
}
