use alloc::boxed::Box;
use core::any::TypeId;
use core::fmt;

use crate::Reflect;
use crate::info::{ArgList, CustomAttributes, InvokeError};

// -----------------------------------------------------------------------------
// Member kind

/// The kind of a declared member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Stored data, directly readable and writable.
    Field,
    /// Data behind a getter, optionally writable through a setter or a
    /// mutable projection.
    Property,
    /// An invocable; only zero-argument methods take part in path
    /// resolution.
    Method,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Field => f.write_str("field"),
            MemberKind::Property => f.write_str("property"),
            MemberKind::Method => f.write_str("method"),
        }
    }
}

// -----------------------------------------------------------------------------
// Erased capability signatures

pub(crate) type GetFn =
    Box<dyn for<'a> Fn(&'a dyn Reflect) -> Option<&'a dyn Reflect> + Send + Sync>;
pub(crate) type GetMutFn =
    Box<dyn for<'a> Fn(&'a mut dyn Reflect) -> Option<&'a mut dyn Reflect> + Send + Sync>;
pub(crate) type SetFn =
    Box<dyn Fn(&mut dyn Reflect, Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>> + Send + Sync>;
pub(crate) type StaticGetFn = Box<dyn Fn() -> Box<dyn Reflect> + Send + Sync>;
pub(crate) type StaticSetFn =
    Box<dyn Fn(Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>> + Send + Sync>;
pub(crate) type CallRefFn =
    Box<dyn Fn(&dyn Reflect, ArgList) -> Result<Box<dyn Reflect>, InvokeError> + Send + Sync>;
pub(crate) type CallMutFn =
    Box<dyn Fn(&mut dyn Reflect, ArgList) -> Result<Box<dyn Reflect>, InvokeError> + Send + Sync>;
pub(crate) type CallStaticFn =
    Box<dyn Fn(ArgList) -> Result<Box<dyn Reflect>, InvokeError> + Send + Sync>;

// -----------------------------------------------------------------------------
// Member nodes

pub(crate) struct FieldNode {
    pub(crate) get: GetFn,
    pub(crate) get_mut: GetMutFn,
}

pub(crate) struct StaticFieldNode {
    pub(crate) get: StaticGetFn,
    pub(crate) set: StaticSetFn,
}

pub(crate) struct PropertyNode {
    pub(crate) get: GetFn,
    pub(crate) get_mut: Option<GetMutFn>,
    pub(crate) set: Option<SetFn>,
}

pub(crate) enum MethodCall {
    Ref(CallRefFn),
    Mut(CallMutFn),
    Static(CallStaticFn),
}

pub(crate) struct MethodNode {
    pub(crate) arity: usize,
    pub(crate) call: MethodCall,
}

pub(crate) enum MemberNode {
    Field(FieldNode),
    StaticField(StaticFieldNode),
    Property(PropertyNode),
    Method(MethodNode),
}

// -----------------------------------------------------------------------------
// MemberInfo

/// One declared member of a type: its name, kind, produced type, and the
/// erased get/set/invoke capabilities the accessor layer drives.
///
/// Built through the typed constructors and collected into a
/// [`MemberTable`](crate::info::MemberTable) in declaration order.
///
/// # Examples
///
/// ```
/// use memberpath::info::{MemberInfo, MemberKind};
/// use memberpath::impl_reflect;
///
/// struct Lamp {
///     watts: u32,
/// }
/// impl_reflect!(Lamp);
///
/// let member = MemberInfo::field("watts", |l: &Lamp| &l.watts, |l: &mut Lamp| &mut l.watts);
/// assert_eq!(member.name(), "watts");
/// assert_eq!(member.kind(), MemberKind::Field);
/// assert!(member.produces_is::<u32>());
/// ```
pub struct MemberInfo {
    name: &'static str,
    produces: TypeId,
    produces_path: &'static str,
    node: MemberNode,
    // `Option` to avoid a heap allocation when there are no attributes.
    attributes: Option<Box<CustomAttributes>>,
}

impl MemberInfo {
    fn new(
        name: &'static str,
        produces: TypeId,
        produces_path: &'static str,
        node: MemberNode,
    ) -> Self {
        Self {
            name,
            produces,
            produces_path,
            node,
            attributes: None,
        }
    }

    /// Declares an instance field with borrowed access in both directions.
    pub fn field<T, V>(
        name: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self
    where
        T: Reflect,
        V: Reflect,
    {
        let get: GetFn = Box::new(move |recv: &dyn Reflect| {
            recv.downcast_ref::<T>().map(|recv| get(recv) as &dyn Reflect)
        });
        let get_mut: GetMutFn = Box::new(move |recv: &mut dyn Reflect| {
            recv.downcast_mut::<T>()
                .map(|recv| get_mut(recv) as &mut dyn Reflect)
        });
        Self::new(
            name,
            TypeId::of::<V>(),
            core::any::type_name::<V>(),
            MemberNode::Field(FieldNode { get, get_mut }),
        )
    }

    /// Declares a type-level (static) field.
    ///
    /// The accessors ignore the receiver entirely: reads snapshot the
    /// current value and writes go through the type's own storage, not
    /// through an instance.
    pub fn static_field<V>(name: &'static str, get: fn() -> V, set: fn(V)) -> Self
    where
        V: Reflect,
    {
        let get: StaticGetFn = Box::new(move || Box::new(get()) as Box<dyn Reflect>);
        let set: StaticSetFn = Box::new(move |value: Box<dyn Reflect>| {
            set(value.take::<V>()?);
            Ok(())
        });
        Self::new(
            name,
            TypeId::of::<V>(),
            core::any::type_name::<V>(),
            MemberNode::StaticField(StaticFieldNode { get, set }),
        )
    }

    /// Declares a read-only property.
    ///
    /// Without a setter or a mutable projection the property cannot be
    /// written and cannot be descended through by a mutable resolution.
    pub fn property<T, V>(name: &'static str, get: fn(&T) -> &V) -> Self
    where
        T: Reflect,
        V: Reflect,
    {
        Self::property_node(name, get, None, None)
    }

    /// Declares a storage-backed property: a getter plus a mutable
    /// projection onto the same storage.
    ///
    /// Writable, and traversable by mutable resolutions.
    pub fn property_backed<T, V>(
        name: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self
    where
        T: Reflect,
        V: Reflect,
    {
        let get_mut: GetMutFn = Box::new(move |recv: &mut dyn Reflect| {
            recv.downcast_mut::<T>()
                .map(|recv| get_mut(recv) as &mut dyn Reflect)
        });
        Self::property_node(name, get, Some(get_mut), None)
    }

    /// Declares a property with an explicit setter.
    pub fn property_with_setter<T, V>(
        name: &'static str,
        get: fn(&T) -> &V,
        set: fn(&mut T, V),
    ) -> Self
    where
        T: Reflect,
        V: Reflect,
    {
        let set: SetFn = Box::new(move |recv: &mut dyn Reflect, value: Box<dyn Reflect>| {
            let Some(recv) = recv.downcast_mut::<T>() else {
                return Err(value);
            };
            set(recv, value.take::<V>()?);
            Ok(())
        });
        Self::property_node(name, get, None, Some(set))
    }

    fn property_node<T, V>(
        name: &'static str,
        get: fn(&T) -> &V,
        get_mut: Option<GetMutFn>,
        set: Option<SetFn>,
    ) -> Self
    where
        T: Reflect,
        V: Reflect,
    {
        let get: GetFn = Box::new(move |recv: &dyn Reflect| {
            recv.downcast_ref::<T>().map(|recv| get(recv) as &dyn Reflect)
        });
        Self::new(
            name,
            TypeId::of::<V>(),
            core::any::type_name::<V>(),
            MemberNode::Property(PropertyNode { get, get_mut, set }),
        )
    }

    /// Declares a zero-argument method taking the receiver by `&self`.
    ///
    /// Invocable through both shared and mutable handles; its return value
    /// is what `get` on a resolved method handle yields.
    pub fn method<T, R>(name: &'static str, call: fn(&T) -> R) -> Self
    where
        T: Reflect,
        R: Reflect,
    {
        let call: CallRefFn = Box::new(move |recv: &dyn Reflect, args: ArgList| {
            check_arity(0, &args)?;
            let recv = recv
                .downcast_ref::<T>()
                .ok_or(InvokeError::ReceiverMismatch {
                    expected: core::any::type_name::<T>(),
                })?;
            Ok(Box::new(call(recv)) as Box<dyn Reflect>)
        });
        Self::new(
            name,
            TypeId::of::<R>(),
            core::any::type_name::<R>(),
            MemberNode::Method(MethodNode {
                arity: 0,
                call: MethodCall::Ref(call),
            }),
        )
    }

    /// Declares a zero-argument method taking the receiver by `&mut self`.
    ///
    /// Only invocable through a mutable handle.
    pub fn method_mut<T, R>(name: &'static str, call: fn(&mut T) -> R) -> Self
    where
        T: Reflect,
        R: Reflect,
    {
        let call: CallMutFn = Box::new(move |recv: &mut dyn Reflect, args: ArgList| {
            check_arity(0, &args)?;
            let recv = recv
                .downcast_mut::<T>()
                .ok_or(InvokeError::ReceiverMismatch {
                    expected: core::any::type_name::<T>(),
                })?;
            Ok(Box::new(call(recv)) as Box<dyn Reflect>)
        });
        Self::new(
            name,
            TypeId::of::<R>(),
            core::any::type_name::<R>(),
            MemberNode::Method(MethodNode {
                arity: 0,
                call: MethodCall::Mut(call),
            }),
        )
    }

    /// Declares a method taking `arity` arguments through an [`ArgList`].
    ///
    /// Methods with a non-zero arity are skipped by member lookup; in
    /// practice they are invoked through a descriptor built from a member
    /// table queried directly.
    pub fn method_with_args<T, R>(
        name: &'static str,
        arity: usize,
        call: fn(&mut T, ArgList) -> Result<R, InvokeError>,
    ) -> Self
    where
        T: Reflect,
        R: Reflect,
    {
        let erased: CallMutFn = Box::new(move |recv: &mut dyn Reflect, args: ArgList| {
            check_arity(arity, &args)?;
            let recv = recv
                .downcast_mut::<T>()
                .ok_or(InvokeError::ReceiverMismatch {
                    expected: core::any::type_name::<T>(),
                })?;
            call(recv, args).map(|ret| Box::new(ret) as Box<dyn Reflect>)
        });
        Self::new(
            name,
            TypeId::of::<R>(),
            core::any::type_name::<R>(),
            MemberNode::Method(MethodNode {
                arity,
                call: MethodCall::Mut(erased),
            }),
        )
    }

    /// Declares a type-level (static) method.
    pub fn static_method<R>(
        name: &'static str,
        arity: usize,
        call: fn(ArgList) -> Result<R, InvokeError>,
    ) -> Self
    where
        R: Reflect,
    {
        let erased: CallStaticFn = Box::new(move |args: ArgList| {
            check_arity(arity, &args)?;
            call(args).map(|ret| Box::new(ret) as Box<dyn Reflect>)
        });
        Self::new(
            name,
            TypeId::of::<R>(),
            core::any::type_name::<R>(),
            MemberNode::Method(MethodNode {
                arity,
                call: MethodCall::Static(erased),
            }),
        )
    }

    /// Attaches a custom attribute to this member.
    pub fn with_attribute<A: Reflect>(mut self, value: A) -> Self {
        let attributes = match self.attributes.take() {
            Some(attributes) => *attributes,
            None => CustomAttributes::new(),
        };
        self.attributes = Some(Box::new(attributes.with_attribute(value)));
        self
    }

    /// Returns the member name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the member kind.
    #[inline]
    pub fn kind(&self) -> MemberKind {
        match self.node {
            MemberNode::Field(_) | MemberNode::StaticField(_) => MemberKind::Field,
            MemberNode::Property(_) => MemberKind::Property,
            MemberNode::Method(_) => MemberKind::Method,
        }
    }

    /// Returns `true` for a type-level member (receiver ignored).
    #[inline]
    pub fn is_static(&self) -> bool {
        matches!(
            self.node,
            MemberNode::StaticField(_)
                | MemberNode::Method(MethodNode {
                    call: MethodCall::Static(_),
                    ..
                })
        )
    }

    /// Returns the [`TypeId`] of the type this member produces: the field
    /// or property type, or the method return type.
    #[inline]
    pub fn produces(&self) -> TypeId {
        self.produces
    }

    /// Returns the path of the produced type.
    #[inline]
    pub fn produces_path(&self) -> &'static str {
        self.produces_path
    }

    /// Check if the produced type matches the given one.
    #[inline]
    pub fn produces_is<T: Reflect>(&self) -> bool {
        self.produces == TypeId::of::<T>()
    }

    /// Returns the number of arguments a method member takes; `0` for
    /// fields and properties.
    #[inline]
    pub fn arity(&self) -> usize {
        match &self.node {
            MemberNode::Method(method) => method.arity,
            _ => 0,
        }
    }

    /// Returns the custom attributes attached to this member.
    #[inline]
    pub fn custom_attributes(&self) -> &CustomAttributes {
        match &self.attributes {
            Some(attributes) => attributes,
            None => CustomAttributes::empty(),
        }
    }

    /// Returns the attribute of type `A` attached to this member, if any.
    #[inline]
    pub fn get_attribute<A: Reflect>(&self) -> Option<&A> {
        self.custom_attributes().get::<A>()
    }

    #[inline]
    pub(crate) fn node(&self) -> &MemberNode {
        &self.node
    }
}

impl fmt::Debug for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberInfo")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("produces", &self.produces_path)
            .field("is_static", &self.is_static())
            .finish()
    }
}

fn check_arity(arity: usize, args: &ArgList) -> Result<(), InvokeError> {
    if args.len() != arity {
        return Err(InvokeError::ArgCount {
            expected: arity,
            got: args.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_reflect;

    struct Dial {
        level: u8,
    }
    impl_reflect!(Dial);

    #[test]
    fn field_metadata() {
        let member = MemberInfo::field("level", |d: &Dial| &d.level, |d: &mut Dial| &mut d.level);
        assert_eq!(member.name(), "level");
        assert_eq!(member.kind(), MemberKind::Field);
        assert!(!member.is_static());
        assert!(member.produces_is::<u8>());
        assert_eq!(member.arity(), 0);
    }

    #[test]
    fn method_metadata() {
        let member = MemberInfo::method("level", |d: &Dial| d.level);
        assert_eq!(member.kind(), MemberKind::Method);
        assert!(member.produces_is::<u8>());
    }

    #[test]
    fn attributes_round_trip() {
        #[derive(Debug, PartialEq)]
        struct Tag(u32);
        impl_reflect!(Tag);

        let member = MemberInfo::field("level", |d: &Dial| &d.level, |d: &mut Dial| &mut d.level)
            .with_attribute(Tag(4));
        assert_eq!(member.get_attribute::<Tag>(), Some(&Tag(4)));
        assert!(member.get_attribute::<u32>().is_none());
    }
}
