//! Path-based member access: parse a dotted path string, resolve it
//! against a live object, and read, write, or invoke the member it lands
//! on.
//!
//! # Path grammar
//!
//! A path is a `.`-separated sequence of segments:
//!
//! - A **member segment** is any non-empty run of characters other than
//!   `.`, naming a field, property, or zero-argument method on the
//!   current value's type or one of its linked bases.
//! - An **element segment** steps into an ordered collection. It is
//!   written in the serialization convention `Array.data[<n>]`: the
//!   literal marker `Array`, a dot, then `data[` with a decimal index and
//!   a closing bracket. The marker is recognized only directly after a
//!   member segment and only when `data[` follows it; anywhere else,
//!   `Array` and `data[...]` are ordinary member names. A recognized
//!   marker with a malformed index is a parse error.
//!
//! `stats.health` reads the `health` member of the `stats` member of the
//! root; `items.Array.data[2].name` reads the `name` member of the third
//! element of the `items` collection.
//!
//! Resolution descends through non-empty optional slots transparently and
//! fails with [`ResolveErrorKind::PathBroken`] when an empty slot is hit
//! with path still left to walk. Members that produce detached values
//! (methods and type-level fields) are read when a shared resolution
//! walks through them, with the handle keeping the produced value alive;
//! a mutable resolution rejects them mid-path, since a write through a
//! detached value would never reach the original object.

mod error;
mod handle;
mod member_access;
mod parse;
mod path;
mod resolver;
mod segment;

pub use error::{AccessError, MemberAccessError, ResolveError, ResolveErrorKind};
pub use handle::{MemberHandle, MemberHandleMut, MemberValue};
pub use member_access::MemberAccess;
pub use parse::{ParseError, ParseErrorKind};
pub use path::MemberPath;
pub use resolver::PathResolver;
pub use segment::{OffsetSegment, Segment};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_reflect;
    use crate::info::{GetMemberTable, MemberInfo, MemberTable};
    use crate::registry::TypeRegistry;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    struct Entity {
        id: u32,
        name: String,
    }
    impl_reflect!(Entity);

    impl GetMemberTable for Entity {
        fn member_table() -> MemberTable {
            MemberTable::of::<Entity>()
                .with(MemberInfo::field("id", |e: &Entity| &e.id, |e: &mut Entity| &mut e.id))
                .with(MemberInfo::property_backed(
                    "name",
                    |e: &Entity| &e.name,
                    |e: &mut Entity| &mut e.name,
                ))
        }
    }

    // Redeclares `name` with a different type; the entity's string name is
    // still reachable through the base chain.
    struct Marker {
        entity: Entity,
        name: u32,
    }
    impl_reflect!(Marker);

    impl GetMemberTable for Marker {
        fn member_table() -> MemberTable {
            MemberTable::with_base::<Marker, Entity>(|m| &m.entity, |m| &mut m.entity).with(
                MemberInfo::field("name", |m: &Marker| &m.name, |m: &mut Marker| &mut m.name),
            )
        }
    }

    struct Squad {
        items: Vec<Entity>,
        leader: Option<Marker>,
    }
    impl_reflect!(Squad);

    impl GetMemberTable for Squad {
        fn member_table() -> MemberTable {
            MemberTable::of::<Squad>()
                .with(MemberInfo::field(
                    "items",
                    |s: &Squad| &s.items,
                    |s: &mut Squad| &mut s.items,
                ))
                .with(MemberInfo::field(
                    "leader",
                    |s: &Squad| &s.leader,
                    |s: &mut Squad| &mut s.leader,
                ))
        }
    }

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register::<Squad>();
        registry.register::<Marker>();
        registry
    }

    fn squad() -> Squad {
        let entity = |id, name: &str| Entity {
            id,
            name: String::from(name),
        };
        Squad {
            items: vec![entity(1, "alpha"), entity(2, "bravo"), entity(3, "charlie")],
            leader: Some(Marker {
                entity: entity(9, "lead"),
                name: 400,
            }),
        }
    }

    #[test]
    fn setting_one_element_leaves_the_others_untouched() {
        let registry = registry();
        let mut squad = squad();
        let resolver = PathResolver::new(&registry);

        let handle = resolver.resolve(&squad, "items.Array.data[1].name").unwrap();
        assert_eq!(handle.get_as::<String>().unwrap(), "bravo");

        let mut handle = resolver
            .resolve_mut(&mut squad, "items.Array.data[1].name")
            .unwrap();
        handle.set(String::from("X")).unwrap();

        assert_eq!(squad.items[0].name, "alpha");
        assert_eq!(squad.items[1].name, "X");
        assert_eq!(squad.items[2].name, "charlie");
    }

    #[test]
    fn resolution_descends_through_populated_slots() {
        let registry = registry();
        let squad = squad();
        let resolver = PathResolver::new(&registry);

        // `leader` is an occupied slot holding a `Marker`; its own `name`
        // shadows the entity's.
        let handle = resolver.resolve(&squad, "leader.name").unwrap();
        assert_eq!(handle.get_as::<u32>().unwrap(), 400);

        // The expected type skips the shadowing declaration and finds the
        // base one.
        let handle = resolver
            .resolve_expecting::<String>(&squad, "leader.name")
            .unwrap();
        assert_eq!(handle.get_as::<String>().unwrap(), "lead");
    }

    #[test]
    fn an_emptied_slot_breaks_the_path() {
        let registry = registry();
        let mut squad = squad();
        squad.leader = None;
        let resolver = PathResolver::new(&registry);
        let err = resolver.resolve(&squad, "leader.name").unwrap_err();
        assert_eq!(*err.kind(), ResolveErrorKind::PathBroken);
    }

    #[test]
    fn writing_through_a_backed_property() {
        let registry = registry();
        let mut squad = squad();
        let resolver = PathResolver::new(&registry);
        let mut handle = resolver
            .resolve_mut_expecting::<String>(&mut squad, "leader.name")
            .unwrap();
        handle.set(String::from("captain")).unwrap();
        assert_eq!(squad.leader.as_ref().unwrap().entity.name, "captain");
    }

    #[cfg(feature = "auto_register")]
    mod one_call_access {
        use super::*;
        use crate::MemberAccess;
        use crate::info::ArgList;

        struct Door {
            open: bool,
            cycles: u32,
        }
        impl_reflect!(Door);

        impl Door {
            fn toggle(&mut self) -> bool {
                self.open = !self.open;
                self.cycles += 1;
                self.open
            }
        }

        impl GetMemberTable for Door {
            fn member_table() -> MemberTable {
                MemberTable::of::<Door>()
                    .with(MemberInfo::field(
                        "open",
                        |d: &Door| &d.open,
                        |d: &mut Door| &mut d.open,
                    ))
                    .with(MemberInfo::field(
                        "cycles",
                        |d: &Door| &d.cycles,
                        |d: &mut Door| &mut d.cycles,
                    ))
                    .with(MemberInfo::method_mut("toggle", Door::toggle))
            }
        }

        crate::impl_auto_register!(Door);

        #[test]
        fn get_set_and_call_through_the_global_registry() {
            let mut door = Door {
                open: false,
                cycles: 0,
            };

            assert!(!door.member_get::<bool>("open").unwrap());
            door.member_set("open", true).unwrap();
            assert!(door.open);

            let returned = door.member_call("toggle", ArgList::new()).unwrap();
            assert_eq!(returned.downcast_ref::<bool>(), Some(&false));
            assert_eq!(door.cycles, 1);
        }
    }
}
