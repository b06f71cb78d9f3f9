use alloc::boxed::Box;
use alloc::vec::Vec;
use core::iter::Peekable;

use crate::access::error::{ResolveError, ResolveErrorKind};
use crate::access::handle::{
    DetachedStep, DetachedTarget, DetachedTerminal, MemberHandle, MemberHandleMut,
};
use crate::access::parse::{ParseError, ParseErrorKind, PathParser};
use crate::access::segment::{OffsetSegment, Segment};
use crate::info::{ArgList, MemberNode, MethodCall};
use crate::lookup::{ExpectedType, MemberDescriptor};
use crate::registry::TypeRegistry;
use crate::{Reflect, ReflectMut, ReflectRef};

/// Resolves member paths against live objects using a borrowed registry.
///
/// Resolution walks the path segment by segment: each member segment is
/// looked up on the current value's runtime type (searching its base
/// chain), each element segment steps into an ordered collection, and
/// non-empty slots are descended through transparently. The terminal
/// segment is not read; it becomes the returned handle.
///
/// A shared resolution also walks through members that produce detached
/// values: a zero-argument method is invoked (and a type-level field
/// read) once at resolve time, the walk continues inside the produced
/// value, and the handle keeps that value alive. A mutable resolution
/// rejects such members mid-path with
/// [`ResolveErrorKind::NotTraversable`], since a write through a
/// detached value would never reach the original object.
///
/// Resolution itself never mutates the object graph, in either flavor;
/// only the returned handle's set/invoke operations do.
///
/// # Examples
///
/// ```
/// use memberpath::access::PathResolver;
/// use memberpath::impl_reflect;
/// use memberpath::info::{GetMemberTable, MemberInfo, MemberTable};
/// use memberpath::registry::TypeRegistry;
///
/// struct Item {
///     name: String,
/// }
/// impl_reflect!(Item);
///
/// impl GetMemberTable for Item {
///     fn member_table() -> MemberTable {
///         MemberTable::of::<Item>()
///             .with(MemberInfo::field("name", |i: &Item| &i.name, |i: &mut Item| &mut i.name))
///     }
/// }
///
/// struct Chest {
///     items: Vec<Item>,
/// }
/// impl_reflect!(Chest);
///
/// impl GetMemberTable for Chest {
///     fn member_table() -> MemberTable {
///         MemberTable::of::<Chest>()
///             .with(MemberInfo::field("items", |c: &Chest| &c.items, |c: &mut Chest| &mut c.items))
///     }
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Chest>();
/// registry.register::<Item>();
///
/// let mut chest = Chest {
///     items: vec![
///         Item { name: "sword".into() },
///         Item { name: "shield".into() },
///     ],
/// };
///
/// let resolver = PathResolver::new(&registry);
/// let mut handle = resolver
///     .resolve_mut(&mut chest, "items.Array.data[1].name")
///     .unwrap();
/// assert_eq!(handle.get_as::<String>().unwrap(), "shield");
/// handle.set(String::from("buckler")).unwrap();
/// assert_eq!(chest.items[1].name, "buckler");
/// ```
pub struct PathResolver<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> PathResolver<'r> {
    /// Creates a resolver over the given registry.
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// Resolves `path` against a shared borrow of `root`.
    pub fn resolve<'p, 'obj>(
        &self,
        root: &'obj dyn Reflect,
        path: &'p str,
    ) -> Result<MemberHandle<'obj>, ResolveError<'p>> {
        resolve_in(self.registry, root, path, PathParser::new(path), None)
    }

    /// Resolves `path` against a shared borrow of `root`, constraining the
    /// terminal member to produce values of type `T`.
    pub fn resolve_expecting<'p, 'obj, T: Reflect>(
        &self,
        root: &'obj dyn Reflect,
        path: &'p str,
    ) -> Result<MemberHandle<'obj>, ResolveError<'p>> {
        let expected = ExpectedType::of::<T>();
        resolve_in(self.registry, root, path, PathParser::new(path), Some(&expected))
    }

    /// Resolves `path` against a mutable borrow of `root`.
    pub fn resolve_mut<'p, 'obj>(
        &self,
        root: &'obj mut dyn Reflect,
        path: &'p str,
    ) -> Result<MemberHandleMut<'obj>, ResolveError<'p>> {
        resolve_mut_in(self.registry, root, path, PathParser::new(path), None)
    }

    /// Resolves `path` against a mutable borrow of `root`, constraining the
    /// terminal member to produce values of type `T`.
    pub fn resolve_mut_expecting<'p, 'obj, T: Reflect>(
        &self,
        root: &'obj mut dyn Reflect,
        path: &'p str,
    ) -> Result<MemberHandleMut<'obj>, ResolveError<'p>> {
        let expected = ExpectedType::of::<T>();
        resolve_mut_in(self.registry, root, path, PathParser::new(path), Some(&expected))
    }
}

// -----------------------------------------------------------------------------
// Shared walk

pub(crate) fn resolve_in<'p, 'obj, I>(
    registry: &TypeRegistry,
    root: &'obj dyn Reflect,
    path: &'p str,
    segments: I,
    expected: Option<&ExpectedType>,
) -> Result<MemberHandle<'obj>, ResolveError<'p>>
where
    I: Iterator<Item = Result<OffsetSegment<'p>, ParseError<'p>>>,
{
    let mut segments = segments.peekable();
    let mut current: &'obj dyn Reflect = root;
    while let Some(result) = segments.next() {
        let OffsetSegment { segment, offset } = result.map_err(ResolveError::from_parse)?;
        current = punch_slots(current, path, offset)?;
        let last = is_last(&mut segments);
        match segment {
            Segment::Member(name) => {
                let descriptor =
                    lookup(registry, current, &name, if last { expected } else { None })
                        .map_err(|error| ResolveError::from_lookup(path, offset, error))?;
                if last {
                    return Ok(MemberHandle::member(current, descriptor));
                }
                match member_step(current, &descriptor, path, offset)? {
                    StepValue::Borrowed(next) => current = next,
                    StepValue::Detached(value) => {
                        return resolve_detached(
                            registry,
                            descriptor.name(),
                            value,
                            segments,
                            path,
                            expected,
                        );
                    }
                }
            }
            Segment::Element(index) => {
                let element = element_step(current, index, path, offset)?;
                if last {
                    return Ok(MemberHandle::element(element));
                }
                current = element;
            }
        }
    }
    Err(empty_path(path))
}

/// Continues a shared walk inside a detached value, recording the
/// borrow-preserving steps so the handle can replay them. A further
/// detaching member replaces the stored value and restarts the recording.
fn resolve_detached<'p, I>(
    registry: &TypeRegistry,
    produced_by: &'static str,
    value: Box<dyn Reflect>,
    mut segments: Peekable<I>,
    path: &'p str,
    expected: Option<&ExpectedType>,
) -> Result<MemberHandle<'static>, ResolveError<'p>>
where
    I: Iterator<Item = Result<OffsetSegment<'p>, ParseError<'p>>>,
{
    let mut produced_by = produced_by;
    let mut root = value;
    let mut steps: Vec<DetachedStep> = Vec::new();
    let mut cursor: &dyn Reflect = root.as_ref();
    while let Some(result) = segments.next() {
        let OffsetSegment { segment, offset } = result.map_err(ResolveError::from_parse)?;
        cursor = punch_slots(cursor, path, offset)?;
        let last = is_last(&mut segments);
        match segment {
            Segment::Member(name) => {
                let descriptor =
                    lookup(registry, cursor, &name, if last { expected } else { None })
                        .map_err(|error| ResolveError::from_lookup(path, offset, error))?;
                if last {
                    return Ok(MemberHandle::detached(DetachedTarget {
                        produced_by,
                        root,
                        steps: steps.into(),
                        terminal: DetachedTerminal::Member(descriptor),
                    }));
                }
                match member_step(cursor, &descriptor, path, offset)? {
                    StepValue::Borrowed(next) => {
                        steps.push(DetachedStep::Member(descriptor));
                        cursor = next;
                    }
                    StepValue::Detached(next) => {
                        produced_by = descriptor.name();
                        root = next;
                        steps.clear();
                        cursor = root.as_ref();
                    }
                }
            }
            Segment::Element(index) => {
                let element = element_step(cursor, index, path, offset)?;
                if last {
                    return Ok(MemberHandle::detached(DetachedTarget {
                        produced_by,
                        root,
                        steps: steps.into(),
                        terminal: DetachedTerminal::Element(index),
                    }));
                }
                steps.push(DetachedStep::Element(index));
                cursor = element;
            }
        }
    }
    Err(empty_path(path))
}

fn punch_slots<'a, 'p>(
    mut current: &'a dyn Reflect,
    path: &'p str,
    offset: usize,
) -> Result<&'a dyn Reflect, ResolveError<'p>> {
    loop {
        match current.reflect_ref() {
            ReflectRef::Slot(Some(inner)) => current = inner,
            ReflectRef::Slot(None) => {
                return Err(ResolveError::new(path, offset, ResolveErrorKind::PathBroken));
            }
            _ => return Ok(current),
        }
    }
}

/// What a member segment stepped into: a borrow deeper into the current
/// graph, or an owned value detached from it.
enum StepValue<'a> {
    Borrowed(&'a dyn Reflect),
    Detached(Box<dyn Reflect>),
}

fn member_step<'a, 'p>(
    current: &'a dyn Reflect,
    descriptor: &MemberDescriptor,
    path: &'p str,
    offset: usize,
) -> Result<StepValue<'a>, ResolveError<'p>> {
    let member = descriptor.member();
    match member.node() {
        MemberNode::Field(node) => {
            let receiver = project(current, descriptor, path, offset)?;
            (node.get)(receiver)
                .map(StepValue::Borrowed)
                .ok_or_else(|| broken(path, offset))
        }
        MemberNode::Property(node) => {
            let receiver = project(current, descriptor, path, offset)?;
            (node.get)(receiver)
                .map(StepValue::Borrowed)
                .ok_or_else(|| broken(path, offset))
        }
        MemberNode::StaticField(node) => Ok(StepValue::Detached((node.get)())),
        // Lookup only returns zero-argument methods found on the receiver's
        // own runtime type, so the calls below cannot fail.
        MemberNode::Method(node) => match &node.call {
            MethodCall::Ref(call) => {
                let receiver = project(current, descriptor, path, offset)?;
                call(receiver, ArgList::new())
                    .map(StepValue::Detached)
                    .map_err(|_| broken(path, offset))
            }
            MethodCall::Static(call) => call(ArgList::new())
                .map(StepValue::Detached)
                .map_err(|_| broken(path, offset)),
            MethodCall::Mut(_) => Err(not_traversable(descriptor, path, offset)),
        },
    }
}

fn element_step<'a, 'p>(
    current: &'a dyn Reflect,
    index: usize,
    path: &'p str,
    offset: usize,
) -> Result<&'a dyn Reflect, ResolveError<'p>> {
    let ReflectRef::Sequence(sequence) = current.reflect_ref() else {
        return Err(ResolveError::new(
            path,
            offset,
            ResolveErrorKind::NotEnumerable {
                ty_path: current.type_path(),
            },
        ));
    };
    let len = sequence.len();
    sequence
        .iter()
        .nth(index)
        .ok_or_else(|| out_of_range(index, len, path, offset))
}

fn project<'a, 'p>(
    current: &'a dyn Reflect,
    descriptor: &MemberDescriptor,
    path: &'p str,
    offset: usize,
) -> Result<&'a dyn Reflect, ResolveError<'p>> {
    // Projection only fails on a receiver of the wrong type, which lookup
    // against the receiver's own runtime type rules out.
    descriptor.project(current).ok_or_else(|| broken(path, offset))
}

// -----------------------------------------------------------------------------
// Mutable walk

pub(crate) fn resolve_mut_in<'p, 'obj, I>(
    registry: &TypeRegistry,
    root: &'obj mut dyn Reflect,
    path: &'p str,
    segments: I,
    expected: Option<&ExpectedType>,
) -> Result<MemberHandleMut<'obj>, ResolveError<'p>>
where
    I: Iterator<Item = Result<OffsetSegment<'p>, ParseError<'p>>>,
{
    let mut segments = segments.peekable();
    let mut current: &'obj mut dyn Reflect = root;
    while let Some(result) = segments.next() {
        let OffsetSegment { segment, offset } = result.map_err(ResolveError::from_parse)?;
        current = punch_slots_mut(current, path, offset)?;
        let last = is_last(&mut segments);
        match segment {
            Segment::Member(name) => {
                let descriptor =
                    lookup(registry, current, &name, if last { expected } else { None })
                        .map_err(|error| ResolveError::from_lookup(path, offset, error))?;
                if last {
                    return Ok(MemberHandleMut::member(current, descriptor));
                }
                current = member_step_mut(current, &descriptor, path, offset)?;
            }
            Segment::Element(index) => {
                let element = element_step_mut(current, index, path, offset)?;
                if last {
                    return Ok(MemberHandleMut::element(element));
                }
                current = element;
            }
        }
    }
    Err(empty_path(path))
}

fn punch_slots_mut<'a, 'p>(
    mut current: &'a mut dyn Reflect,
    path: &'p str,
    offset: usize,
) -> Result<&'a mut dyn Reflect, ResolveError<'p>> {
    loop {
        if !matches!(current.reflect_ref(), ReflectRef::Slot(_)) {
            return Ok(current);
        }
        current = match slot_inner_mut(current) {
            Some(inner) => inner,
            None => {
                return Err(ResolveError::new(path, offset, ResolveErrorKind::PathBroken));
            }
        };
    }
}

fn slot_inner_mut<'a>(value: &'a mut dyn Reflect) -> Option<&'a mut dyn Reflect> {
    match value.reflect_mut() {
        ReflectMut::Slot(slot) => slot,
        _ => None,
    }
}

fn member_step_mut<'a, 'p>(
    current: &'a mut dyn Reflect,
    descriptor: &MemberDescriptor,
    path: &'p str,
    offset: usize,
) -> Result<&'a mut dyn Reflect, ResolveError<'p>> {
    let member = descriptor.member();
    match member.node() {
        MemberNode::Field(node) => {
            let receiver = project_mut(current, descriptor, path, offset)?;
            (node.get_mut)(receiver).ok_or_else(|| broken(path, offset))
        }
        MemberNode::Property(node) => {
            // A property with no mutable projection has no storage a
            // mutable walk could continue through.
            let Some(get_mut) = node.get_mut.as_ref() else {
                return Err(not_traversable(descriptor, path, offset));
            };
            let receiver = project_mut(current, descriptor, path, offset)?;
            get_mut(receiver).ok_or_else(|| broken(path, offset))
        }
        MemberNode::StaticField(_) | MemberNode::Method(_) => {
            Err(not_traversable(descriptor, path, offset))
        }
    }
}

fn element_step_mut<'a, 'p>(
    current: &'a mut dyn Reflect,
    index: usize,
    path: &'p str,
    offset: usize,
) -> Result<&'a mut dyn Reflect, ResolveError<'p>> {
    let ty_path = current.type_path();
    let ReflectMut::Sequence(sequence) = current.reflect_mut() else {
        return Err(ResolveError::new(
            path,
            offset,
            ResolveErrorKind::NotEnumerable { ty_path },
        ));
    };
    let len = sequence.len();
    sequence
        .iter_mut()
        .nth(index)
        .ok_or_else(|| out_of_range(index, len, path, offset))
}

fn project_mut<'a, 'p>(
    current: &'a mut dyn Reflect,
    descriptor: &MemberDescriptor,
    path: &'p str,
    offset: usize,
) -> Result<&'a mut dyn Reflect, ResolveError<'p>> {
    descriptor.project_mut(current).ok_or_else(|| broken(path, offset))
}

// -----------------------------------------------------------------------------
// Shared pieces

fn is_last<'p, I>(segments: &mut Peekable<I>) -> bool
where
    I: Iterator<Item = Result<OffsetSegment<'p>, ParseError<'p>>>,
{
    segments.peek().is_none()
}

fn lookup(
    registry: &TypeRegistry,
    current: &dyn Reflect,
    name: &str,
    expected: Option<&ExpectedType>,
) -> Result<MemberDescriptor, crate::lookup::LookupError> {
    registry.find_member(current.ty_id(), current.type_path(), name, expected)
}

fn broken<'p>(path: &'p str, offset: usize) -> ResolveError<'p> {
    ResolveError::new(path, offset, ResolveErrorKind::PathBroken)
}

fn not_traversable<'p>(
    descriptor: &MemberDescriptor,
    path: &'p str,
    offset: usize,
) -> ResolveError<'p> {
    let member = descriptor.member();
    ResolveError::new(
        path,
        offset,
        ResolveErrorKind::NotTraversable {
            member: member.name(),
            kind: member.kind(),
        },
    )
}

fn out_of_range<'p>(index: usize, len: usize, path: &'p str, offset: usize) -> ResolveError<'p> {
    ResolveError::new(path, offset, ResolveErrorKind::IndexOutOfRange { index, len })
}

fn empty_path(path: &str) -> ResolveError<'_> {
    ResolveError::new(path, 0, ResolveErrorKind::Parse(ParseErrorKind::EmptySegment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_reflect;
    use crate::info::{GetMemberTable, MemberInfo, MemberTable};
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    struct Tachometer {
        limit: u32,
    }
    impl_reflect!(Tachometer);

    impl GetMemberTable for Tachometer {
        fn member_table() -> MemberTable {
            MemberTable::of::<Tachometer>()
                .with(MemberInfo::field(
                    "limit",
                    |t: &Tachometer| &t.limit,
                    |t: &mut Tachometer| &mut t.limit,
                ))
                .with(MemberInfo::method("headroom", |t: &Tachometer| t.limit / 2))
        }
    }

    struct Engine {
        rpm: u32,
    }
    impl_reflect!(Engine);

    impl GetMemberTable for Engine {
        fn member_table() -> MemberTable {
            MemberTable::of::<Engine>()
                .with(MemberInfo::field("rpm", |e: &Engine| &e.rpm, |e: &mut Engine| &mut e.rpm))
                .with(MemberInfo::method("redline", |_: &Engine| 7200_u32))
                .with(MemberInfo::method("tachometer", |e: &Engine| Tachometer {
                    limit: e.rpm + 100,
                }))
                .with(MemberInfo::method("history", |e: &Engine| vec![e.rpm, e.rpm + 50]))
        }
    }

    struct Car {
        engine: Option<Engine>,
        wheels: Vec<u32>,
        plate: String,
    }
    impl_reflect!(Car);

    impl GetMemberTable for Car {
        fn member_table() -> MemberTable {
            MemberTable::of::<Car>()
                .with(MemberInfo::field(
                    "engine",
                    |c: &Car| &c.engine,
                    |c: &mut Car| &mut c.engine,
                ))
                .with(MemberInfo::field(
                    "wheels",
                    |c: &Car| &c.wheels,
                    |c: &mut Car| &mut c.wheels,
                ))
                .with(MemberInfo::field(
                    "plate",
                    |c: &Car| &c.plate,
                    |c: &mut Car| &mut c.plate,
                ))
        }
    }

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register::<Car>();
        registry.register::<Engine>();
        registry.register::<Tachometer>();
        registry
    }

    fn car() -> Car {
        Car {
            engine: Some(Engine { rpm: 900 }),
            wheels: vec![17, 17, 18, 18],
            plate: String::from("KX-11"),
        }
    }

    #[test]
    fn resolving_matches_a_direct_read() {
        let registry = registry();
        let car = car();
        let resolver = PathResolver::new(&registry);
        let handle = resolver.resolve(&car, "engine.rpm").unwrap();
        assert_eq!(handle.get_as::<u32>().unwrap(), car.engine.as_ref().unwrap().rpm);
    }

    #[test]
    fn an_absent_slot_mid_path_is_broken() {
        let registry = registry();
        let car = Car {
            engine: None,
            ..car()
        };
        let resolver = PathResolver::new(&registry);
        let err = resolver.resolve(&car, "engine.rpm").unwrap_err();
        assert_eq!(*err.kind(), ResolveErrorKind::PathBroken);
        // The slot itself is still resolvable; it is only descending that
        // breaks.
        assert!(resolver.resolve(&car, "engine").is_ok());
    }

    #[test]
    fn element_segments_step_into_collections() {
        let registry = registry();
        let mut car = car();
        let resolver = PathResolver::new(&registry);

        let handle = resolver.resolve(&car, "wheels.Array.data[2]").unwrap();
        assert_eq!(handle.get_as::<u32>().unwrap(), 18);
        assert!(handle.descriptor().is_none());

        let mut handle = resolver.resolve_mut(&mut car, "wheels.Array.data[2]").unwrap();
        handle.set(19_u32).unwrap();
        assert_eq!(car.wheels, [17, 17, 19, 18]);
    }

    #[test]
    fn out_of_range_indices_report_the_length() {
        let registry = registry();
        let car = car();
        let resolver = PathResolver::new(&registry);
        let err = resolver.resolve(&car, "wheels.Array.data[9]").unwrap_err();
        assert_eq!(*err.kind(), ResolveErrorKind::IndexOutOfRange { index: 9, len: 4 });
    }

    #[test]
    fn indexing_a_plain_value_is_not_enumerable() {
        let registry = registry();
        let car = car();
        let resolver = PathResolver::new(&registry);
        let err = resolver.resolve(&car, "plate.Array.data[0]").unwrap_err();
        assert!(matches!(err.kind(), ResolveErrorKind::NotEnumerable { .. }));
    }

    #[test]
    fn unknown_members_name_the_starting_type() {
        let registry = registry();
        let car = car();
        let resolver = PathResolver::new(&registry);
        let err = resolver.resolve(&car, "engine.boost").unwrap_err();
        assert!(matches!(err.kind(), ResolveErrorKind::MemberNotFound { .. }));
        assert_eq!(err.offset(), 7);
    }

    #[test]
    fn methods_terminate_a_path() {
        let registry = registry();
        let car = car();
        let resolver = PathResolver::new(&registry);
        let handle = resolver.resolve(&car, "engine.redline").unwrap();
        assert_eq!(handle.get_as::<u32>().unwrap(), 7200);
    }

    #[test]
    fn methods_are_read_through_mid_path() {
        let registry = registry();
        let car = car();
        let resolver = PathResolver::new(&registry);

        let handle = resolver.resolve(&car, "engine.tachometer.limit").unwrap();
        assert_eq!(handle.get_as::<u32>().unwrap(), 1000);

        // A method on the detached value can itself terminate the path.
        let handle = resolver.resolve(&car, "engine.tachometer.headroom").unwrap();
        assert_eq!(handle.get_as::<u32>().unwrap(), 500);
    }

    #[test]
    fn elements_of_a_method_return_are_reachable() {
        let registry = registry();
        let car = car();
        let resolver = PathResolver::new(&registry);
        let handle = resolver.resolve(&car, "engine.history.Array.data[1]").unwrap();
        assert_eq!(handle.get_as::<u32>().unwrap(), 950);
        assert!(handle.descriptor().is_none());
    }

    #[test]
    fn mutable_resolution_rejects_methods_mid_path() {
        let registry = registry();
        let mut car = car();
        let resolver = PathResolver::new(&registry);
        let err = resolver
            .resolve_mut(&mut car, "engine.tachometer.limit")
            .unwrap_err();
        assert!(matches!(err.kind(), ResolveErrorKind::NotTraversable { .. }));
    }

    #[test]
    fn parse_errors_surface_with_their_offset() {
        let registry = registry();
        let car = car();
        let resolver = PathResolver::new(&registry);
        let err = resolver.resolve(&car, "engine..rpm").unwrap_err();
        assert_eq!(*err.kind(), ResolveErrorKind::Parse(ParseErrorKind::EmptySegment));
        assert_eq!(err.offset(), 7);
    }

    #[test]
    fn expected_type_constrains_the_terminal_member() {
        let registry = registry();
        let car = car();
        let resolver = PathResolver::new(&registry);
        let err = resolver
            .resolve_expecting::<String>(&car, "engine.rpm")
            .unwrap_err();
        assert!(matches!(err.kind(), ResolveErrorKind::MemberNotFound { .. }));
    }
}
