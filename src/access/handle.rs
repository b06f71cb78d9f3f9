use alloc::boxed::Box;

use crate::access::error::AccessError;
use crate::info::{ArgList, MemberInfo, MemberKind, MemberNode, MethodCall};
use crate::lookup::MemberDescriptor;
use crate::{Reflect, ReflectRef};

/// A value read out of a handle: borrowed straight from the object graph
/// for fields and properties, owned for method returns and type-level
/// field snapshots.
pub enum MemberValue<'a> {
    /// A borrow into the object graph.
    Borrowed(&'a dyn Reflect),
    /// A detached value produced by the read.
    Owned(Box<dyn Reflect>),
}

impl core::fmt::Debug for MemberValue<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let variant = match self {
            MemberValue::Borrowed(_) => "Borrowed",
            MemberValue::Owned(_) => "Owned",
        };
        f.debug_tuple(variant).field(&self.as_reflect().type_path()).finish()
    }
}

impl MemberValue<'_> {
    /// Views the value as a [`Reflect`] trait object.
    pub fn as_reflect(&self) -> &dyn Reflect {
        match self {
            MemberValue::Borrowed(value) => *value,
            MemberValue::Owned(value) => value.as_ref(),
        }
    }

    /// Downcasts the value to a concrete type.
    pub fn downcast_ref<T: Reflect>(&self) -> Option<&T> {
        self.as_reflect().downcast_ref()
    }
}

pub(crate) enum HandleTarget<'obj> {
    /// A named member on a resolved owner instance.
    Member {
        owner: &'obj dyn Reflect,
        descriptor: MemberDescriptor,
    },
    /// A collection element reached by a terminal element segment; it has
    /// no declaration of its own.
    Element { value: &'obj dyn Reflect },
    /// A member inside a detached value produced mid-path.
    Detached(DetachedTarget),
}

// -----------------------------------------------------------------------------
// Detached targets

pub(crate) enum DetachedStep {
    Member(MemberDescriptor),
    Element(usize),
}

pub(crate) enum DetachedTerminal {
    Member(MemberDescriptor),
    Element(usize),
}

/// A resolution that left the original object graph: a method return or
/// type-level field snapshot produced mid-path, owned by the handle, with
/// the remaining walk down to the terminal replayed on demand.
pub(crate) struct DetachedTarget {
    /// Name of the member whose read produced the detached value.
    pub(crate) produced_by: &'static str,
    pub(crate) root: Box<dyn Reflect>,
    /// Borrow-preserving steps from the detached value to the terminal's
    /// owner; a further detaching member would have replaced the root.
    pub(crate) steps: Box<[DetachedStep]>,
    pub(crate) terminal: DetachedTerminal,
}

impl DetachedTarget {
    /// Walks the recorded steps from the stored value to the terminal's
    /// owner. The steps were validated during resolution and the stored
    /// value never changes afterward, so the replay is repeatable.
    fn owner(&self) -> Result<&dyn Reflect, AccessError> {
        let mut cursor: &dyn Reflect = self.root.as_ref();
        for step in self.steps.iter() {
            cursor = punch_slots(cursor).ok_or_else(|| self.replay_failed())?;
            cursor = match step {
                DetachedStep::Member(descriptor) => {
                    let receiver = descriptor
                        .project(cursor)
                        .ok_or_else(|| self.replay_failed())?;
                    match descriptor.member().node() {
                        MemberNode::Field(node) => (node.get)(receiver),
                        MemberNode::Property(node) => (node.get)(receiver),
                        _ => None,
                    }
                    .ok_or_else(|| self.replay_failed())?
                }
                DetachedStep::Element(index) => {
                    element_at(cursor, *index).ok_or_else(|| self.replay_failed())?
                }
            };
        }
        punch_slots(cursor).ok_or_else(|| self.replay_failed())
    }

    fn descriptor(&self) -> Option<&MemberDescriptor> {
        match &self.terminal {
            DetachedTerminal::Member(descriptor) => Some(descriptor),
            DetachedTerminal::Element(_) => None,
        }
    }

    fn read(&self) -> Result<MemberValue<'_>, AccessError> {
        let owner = self.owner()?;
        match &self.terminal {
            DetachedTerminal::Member(descriptor) => {
                read_member(owner, descriptor.member(), descriptor)
            }
            DetachedTerminal::Element(index) => element_at(owner, *index)
                .map(MemberValue::Borrowed)
                .ok_or_else(|| self.replay_failed()),
        }
    }

    fn invoke(&self, args: ArgList) -> Result<Box<dyn Reflect>, AccessError> {
        let owner = self.owner()?;
        match &self.terminal {
            DetachedTerminal::Member(descriptor) => invoke_member(owner, descriptor, args),
            DetachedTerminal::Element(index) => {
                let target = element_at(owner, *index)
                    .map(|element| element.type_path())
                    .unwrap_or(self.produced_by);
                Err(AccessError::NotInvocable { target })
            }
        }
    }

    fn replay_failed(&self) -> AccessError {
        AccessError::ReceiverMismatch {
            member: self.produced_by,
        }
    }
}

fn punch_slots(mut value: &dyn Reflect) -> Option<&dyn Reflect> {
    loop {
        match value.reflect_ref() {
            ReflectRef::Slot(Some(inner)) => value = inner,
            ReflectRef::Slot(None) => return None,
            _ => return Some(value),
        }
    }
}

fn element_at(value: &dyn Reflect, index: usize) -> Option<&dyn Reflect> {
    match value.reflect_ref() {
        ReflectRef::Sequence(sequence) => sequence.iter().nth(index),
        _ => None,
    }
}

/// The result of resolving a path against a shared borrow of an object:
/// one member (or collection element) on one live instance.
///
/// A shared handle can read and can invoke methods that take their
/// receiver by `&self`; writing needs [`MemberHandleMut`].
///
/// Handles are created fresh per resolution and borrow the object graph
/// for exactly as long as they live. When the path walked through a
/// member that produces a detached value, the handle owns that value
/// instead of borrowing the graph.
pub struct MemberHandle<'obj> {
    target: HandleTarget<'obj>,
}

impl core::fmt::Debug for MemberHandle<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemberHandle")
            .field("member", &self.descriptor().map(MemberDescriptor::name))
            .finish_non_exhaustive()
    }
}

impl<'obj> MemberHandle<'obj> {
    pub(crate) fn member(owner: &'obj dyn Reflect, descriptor: MemberDescriptor) -> Self {
        Self {
            target: HandleTarget::Member { owner, descriptor },
        }
    }

    pub(crate) fn element(value: &'obj dyn Reflect) -> Self {
        Self {
            target: HandleTarget::Element { value },
        }
    }

    pub(crate) fn detached(target: DetachedTarget) -> MemberHandle<'static> {
        MemberHandle {
            target: HandleTarget::Detached(target),
        }
    }

    /// Returns the resolved member's descriptor, or `None` for a
    /// collection element.
    pub fn descriptor(&self) -> Option<&MemberDescriptor> {
        match &self.target {
            HandleTarget::Member { descriptor, .. } => Some(descriptor),
            HandleTarget::Element { .. } => None,
            HandleTarget::Detached(target) => target.descriptor(),
        }
    }

    /// Returns the resolved member's kind, or `None` for a collection
    /// element.
    pub fn kind(&self) -> Option<MemberKind> {
        self.descriptor().map(|descriptor| descriptor.member().kind())
    }

    /// Reads the member: a field or property borrow, a method return
    /// value, or a type-level field snapshot.
    pub fn get(&self) -> Result<MemberValue<'_>, AccessError> {
        match &self.target {
            HandleTarget::Element { value } => Ok(MemberValue::Borrowed(*value)),
            HandleTarget::Member { owner, descriptor } => {
                read_member(*owner, descriptor.member(), descriptor)
            }
            HandleTarget::Detached(target) => target.read(),
        }
    }

    /// Reads the member and clones it out as a `T`.
    pub fn get_as<T: Reflect + Clone>(&self) -> Result<T, AccessError> {
        get_as(self.get()?)
    }

    /// Invokes a method member with the given arguments.
    ///
    /// Methods taking their receiver by `&mut self` fail with
    /// [`AccessError::ImmutableReceiver`]; resolve mutably to call them.
    pub fn invoke(&self, args: ArgList) -> Result<Box<dyn Reflect>, AccessError> {
        match &self.target {
            HandleTarget::Element { value } => Err(AccessError::NotInvocable {
                target: value.type_path(),
            }),
            HandleTarget::Member { owner, descriptor } => invoke_member(*owner, descriptor, args),
            HandleTarget::Detached(target) => target.invoke(args),
        }
    }
}

pub(crate) enum HandleTargetMut<'obj> {
    Member {
        owner: &'obj mut dyn Reflect,
        descriptor: MemberDescriptor,
    },
    Element { value: &'obj mut dyn Reflect },
}

/// The result of resolving a path against a mutable borrow of an object.
///
/// Adds writing and `&mut self` method invocation on top of what
/// [`MemberHandle`] can do.
pub struct MemberHandleMut<'obj> {
    target: HandleTargetMut<'obj>,
}

impl core::fmt::Debug for MemberHandleMut<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemberHandleMut")
            .field("member", &self.descriptor().map(MemberDescriptor::name))
            .finish_non_exhaustive()
    }
}

impl<'obj> MemberHandleMut<'obj> {
    pub(crate) fn member(owner: &'obj mut dyn Reflect, descriptor: MemberDescriptor) -> Self {
        Self {
            target: HandleTargetMut::Member { owner, descriptor },
        }
    }

    pub(crate) fn element(value: &'obj mut dyn Reflect) -> Self {
        Self {
            target: HandleTargetMut::Element { value },
        }
    }

    /// Returns the resolved member's descriptor, or `None` for a
    /// collection element.
    pub fn descriptor(&self) -> Option<&MemberDescriptor> {
        match &self.target {
            HandleTargetMut::Member { descriptor, .. } => Some(descriptor),
            HandleTargetMut::Element { .. } => None,
        }
    }

    /// Returns the resolved member's kind, or `None` for a collection
    /// element.
    pub fn kind(&self) -> Option<MemberKind> {
        self.descriptor().map(|descriptor| descriptor.member().kind())
    }

    /// Reads the member; see [`MemberHandle::get`].
    pub fn get(&self) -> Result<MemberValue<'_>, AccessError> {
        match &self.target {
            HandleTargetMut::Element { value } => Ok(MemberValue::Borrowed(&**value)),
            HandleTargetMut::Member { owner, descriptor } => {
                read_member(&**owner, descriptor.member(), descriptor)
            }
        }
    }

    /// Reads the member and clones it out as a `T`.
    pub fn get_as<T: Reflect + Clone>(&self) -> Result<T, AccessError> {
        get_as(self.get()?)
    }

    /// Borrows the member's storage mutably.
    ///
    /// Only fields, storage-backed properties, and collection elements have
    /// storage to borrow; everything else fails with
    /// [`AccessError::NoSetter`].
    pub fn get_mut(&mut self) -> Result<&mut dyn Reflect, AccessError> {
        match &mut self.target {
            HandleTargetMut::Element { value } => Ok(&mut **value),
            HandleTargetMut::Member { owner, descriptor } => {
                let member = descriptor.member();
                match member.node() {
                    MemberNode::Field(node) => {
                        let receiver = project_mut(&mut **owner, descriptor)?;
                        (node.get_mut)(receiver).ok_or(AccessError::ReceiverMismatch {
                            member: member.name(),
                        })
                    }
                    MemberNode::Property(node) => {
                        let get_mut = node.get_mut.as_ref().ok_or(AccessError::NoSetter {
                            member: member.name(),
                        })?;
                        let receiver = project_mut(&mut **owner, descriptor)?;
                        get_mut(receiver).ok_or(AccessError::ReceiverMismatch {
                            member: member.name(),
                        })
                    }
                    MemberNode::StaticField(_) | MemberNode::Method(_) => {
                        Err(AccessError::NoSetter {
                            member: member.name(),
                        })
                    }
                }
            }
        }
    }

    /// Writes a boxed value into the member.
    ///
    /// The value's runtime type must match the member's type exactly;
    /// there is no coercion.
    pub fn set_boxed(&mut self, value: Box<dyn Reflect>) -> Result<(), AccessError> {
        match &mut self.target {
            HandleTargetMut::Element { value: target } => {
                let expected = target.type_path();
                target.set(value).map_err(|returned| AccessError::TypeMismatch {
                    expected,
                    actual: returned.type_path(),
                })
            }
            HandleTargetMut::Member { owner, descriptor } => {
                let member = descriptor.member();
                match member.node() {
                    MemberNode::Field(node) => {
                        let receiver = project_mut(&mut **owner, descriptor)?;
                        let slot = (node.get_mut)(receiver).ok_or(AccessError::ReceiverMismatch {
                            member: member.name(),
                        })?;
                        let expected = slot.type_path();
                        slot.set(value).map_err(|returned| AccessError::TypeMismatch {
                            expected,
                            actual: returned.type_path(),
                        })
                    }
                    MemberNode::StaticField(node) => {
                        (node.set)(value).map_err(|returned| AccessError::TypeMismatch {
                            expected: member.produces_path(),
                            actual: returned.type_path(),
                        })
                    }
                    MemberNode::Property(node) => {
                        if let Some(set) = &node.set {
                            let receiver = project_mut(&mut **owner, descriptor)?;
                            set(receiver, value).map_err(|returned| AccessError::TypeMismatch {
                                expected: member.produces_path(),
                                actual: returned.type_path(),
                            })
                        } else if let Some(get_mut) = &node.get_mut {
                            let receiver = project_mut(&mut **owner, descriptor)?;
                            let slot = get_mut(receiver).ok_or(AccessError::ReceiverMismatch {
                                member: member.name(),
                            })?;
                            let expected = slot.type_path();
                            slot.set(value).map_err(|returned| AccessError::TypeMismatch {
                                expected,
                                actual: returned.type_path(),
                            })
                        } else {
                            Err(AccessError::NoSetter {
                                member: member.name(),
                            })
                        }
                    }
                    MemberNode::Method(_) => Err(AccessError::NoSetter {
                        member: member.name(),
                    }),
                }
            }
        }
    }

    /// Writes a value into the member.
    pub fn set<T: Reflect>(&mut self, value: T) -> Result<(), AccessError> {
        self.set_boxed(Box::new(value))
    }

    /// Invokes a method member with the given arguments.
    pub fn invoke(&mut self, args: ArgList) -> Result<Box<dyn Reflect>, AccessError> {
        match &mut self.target {
            HandleTargetMut::Element { value } => Err(AccessError::NotInvocable {
                target: value.type_path(),
            }),
            HandleTargetMut::Member { owner, descriptor } => {
                let member = descriptor.member();
                let MemberNode::Method(node) = member.node() else {
                    return Err(AccessError::NotInvocable {
                        target: member.name(),
                    });
                };
                match &node.call {
                    MethodCall::Ref(call) => {
                        let receiver = project(&**owner, descriptor)?;
                        Ok(call(receiver, args)?)
                    }
                    MethodCall::Mut(call) => {
                        let receiver = project_mut(&mut **owner, descriptor)?;
                        Ok(call(receiver, args)?)
                    }
                    MethodCall::Static(call) => Ok(call(args)?),
                }
            }
        }
    }
}

fn project<'a>(
    owner: &'a dyn Reflect,
    descriptor: &MemberDescriptor,
) -> Result<&'a dyn Reflect, AccessError> {
    descriptor.project(owner).ok_or(AccessError::ReceiverMismatch {
        member: descriptor.name(),
    })
}

fn project_mut<'a>(
    owner: &'a mut dyn Reflect,
    descriptor: &MemberDescriptor,
) -> Result<&'a mut dyn Reflect, AccessError> {
    descriptor.project_mut(owner).ok_or(AccessError::ReceiverMismatch {
        member: descriptor.name(),
    })
}

fn invoke_member(
    owner: &dyn Reflect,
    descriptor: &MemberDescriptor,
    args: ArgList,
) -> Result<Box<dyn Reflect>, AccessError> {
    let member = descriptor.member();
    let MemberNode::Method(node) = member.node() else {
        return Err(AccessError::NotInvocable {
            target: member.name(),
        });
    };
    match &node.call {
        MethodCall::Ref(call) => {
            let receiver = project(owner, descriptor)?;
            Ok(call(receiver, args)?)
        }
        MethodCall::Static(call) => Ok(call(args)?),
        MethodCall::Mut(_) => Err(AccessError::ImmutableReceiver {
            member: member.name(),
        }),
    }
}

fn read_member<'a>(
    owner: &'a dyn Reflect,
    member: &MemberInfo,
    descriptor: &MemberDescriptor,
) -> Result<MemberValue<'a>, AccessError> {
    match member.node() {
        MemberNode::Field(node) => {
            let receiver = project(owner, descriptor)?;
            (node.get)(receiver)
                .map(MemberValue::Borrowed)
                .ok_or(AccessError::ReceiverMismatch {
                    member: member.name(),
                })
        }
        MemberNode::Property(node) => {
            let receiver = project(owner, descriptor)?;
            (node.get)(receiver)
                .map(MemberValue::Borrowed)
                .ok_or(AccessError::ReceiverMismatch {
                    member: member.name(),
                })
        }
        MemberNode::StaticField(node) => Ok(MemberValue::Owned((node.get)())),
        MemberNode::Method(node) => match &node.call {
            MethodCall::Ref(call) => {
                let receiver = project(owner, descriptor)?;
                Ok(MemberValue::Owned(call(receiver, ArgList::new())?))
            }
            MethodCall::Static(call) => Ok(MemberValue::Owned(call(ArgList::new())?)),
            MethodCall::Mut(_) => Err(AccessError::ImmutableReceiver {
                member: member.name(),
            }),
        },
    }
}

fn get_as<T: Reflect + Clone>(value: MemberValue<'_>) -> Result<T, AccessError> {
    match value.downcast_ref::<T>() {
        Some(concrete) => Ok(concrete.clone()),
        None => Err(AccessError::TypeMismatch {
            expected: core::any::type_name::<T>(),
            actual: value.as_reflect().type_path(),
        }),
    }
}
