use alloc::boxed::Box;

use crate::{Reflect, ReflectMut, ReflectRef};

// -----------------------------------------------------------------------------
// Option as a slot

/// `Option<T>` is the optional-reference slot of the object model: `None`
/// is an absent reference, and a resolution that has to descend through an
/// absent slot reports the path as broken rather than continuing.
impl<T: Reflect> Reflect for Option<T> {
    #[inline]
    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::Slot(self.as_ref().map(|value| value as &dyn Reflect))
    }

    #[inline]
    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Slot(self.as_mut().map(|value| value as &mut dyn Reflect))
    }

    /// Slot assignment accepts either a whole `Option<T>` or a bare `T`
    /// (which fills the slot with `Some`).
    fn set(&mut self, value: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>> {
        let value = match value.take::<Self>() {
            Ok(replacement) => {
                *self = replacement;
                return Ok(());
            }
            Err(value) => value,
        };
        *self = Some(value.take::<T>()?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Reflect, ReflectKind, ReflectRef};

    #[test]
    fn none_is_an_absent_slot() {
        let slot: Option<u32> = None;
        assert_eq!(slot.reflect_kind(), ReflectKind::Slot);
        assert!(matches!(slot.reflect_ref(), ReflectRef::Slot(None)));
    }

    #[test]
    fn some_exposes_the_inner_value() {
        let slot = Some(3_u32);
        let ReflectRef::Slot(Some(inner)) = slot.reflect_ref() else {
            panic!("expected populated slot");
        };
        assert_eq!(inner.downcast_ref::<u32>(), Some(&3));
    }

    #[test]
    fn set_accepts_bare_values() {
        let mut slot: Option<u32> = None;
        slot.set(Box::new(9_u32)).unwrap();
        assert_eq!(slot, Some(9));

        slot.set(Box::new(Option::<u32>::None)).unwrap();
        assert_eq!(slot, None);

        assert!(slot.set(Box::new(5_i64)).is_err());
    }
}
