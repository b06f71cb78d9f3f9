use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::TypeId;
use core::fmt;

use crate::Reflect;
use crate::info::{BaseLink, MemberInfo};

/// A produced-type constraint for member lookup.
///
/// A name match whose produced type differs from the expectation is passed
/// over instead of returned, letting a base member of the right type win
/// over a shadowing derived member of the wrong one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedType {
    id: TypeId,
    path: &'static str,
}

impl ExpectedType {
    /// Expects the member to produce values of type `T`.
    pub fn of<T: Reflect>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            path: core::any::type_name::<T>(),
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub(crate) fn path(&self) -> &'static str {
        self.path
    }
}

/// A resolved member: the declaration itself plus the chain of base
/// projections needed to reach its declaring type from the type the lookup
/// started at.
///
/// Descriptors are cheap to clone; the declaration and the projection chain
/// are shared.
#[derive(Clone)]
pub struct MemberDescriptor {
    origin: TypeId,
    declared_by: TypeId,
    declared_by_path: &'static str,
    upcasts: Arc<[Arc<BaseLink>]>,
    member: Arc<MemberInfo>,
}

impl MemberDescriptor {
    pub(crate) fn new(
        origin: TypeId,
        declared_by: TypeId,
        declared_by_path: &'static str,
        upcasts: Vec<Arc<BaseLink>>,
        member: Arc<MemberInfo>,
    ) -> Self {
        Self {
            origin,
            declared_by,
            declared_by_path,
            upcasts: upcasts.into(),
            member,
        }
    }

    /// Returns the member declaration.
    #[inline]
    pub fn member(&self) -> &MemberInfo {
        &self.member
    }

    /// Returns the member name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.member.name()
    }

    /// Returns the [`TypeId`] of the type the lookup started at.
    #[inline]
    pub fn origin(&self) -> TypeId {
        self.origin
    }

    /// Returns the [`TypeId`] of the type that declares the member.
    #[inline]
    pub fn declared_by(&self) -> TypeId {
        self.declared_by
    }

    /// Returns the path of the type that declares the member.
    #[inline]
    pub fn declared_by_path(&self) -> &'static str {
        self.declared_by_path
    }

    /// Projects a receiver of the origin type down to the declaring type.
    ///
    /// Returns `None` when the receiver is not of the origin type.
    pub fn project<'a>(&self, value: &'a dyn Reflect) -> Option<&'a dyn Reflect> {
        let mut current = value;
        for link in self.upcasts.iter() {
            current = link.upcast(current)?;
        }
        Some(current)
    }

    /// Projects a receiver of the origin type mutably down to the declaring
    /// type.
    pub fn project_mut<'a>(&self, value: &'a mut dyn Reflect) -> Option<&'a mut dyn Reflect> {
        let mut current = value;
        for link in self.upcasts.iter() {
            current = link.upcast_mut(current)?;
        }
        Some(current)
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("member", &self.member)
            .field("declared_by", &self.declared_by_path)
            .field("depth", &self.upcasts.len())
            .finish()
    }
}
