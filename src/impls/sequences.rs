use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::{Reflect, ReflectMut, ReflectRef, Sequence};

// -----------------------------------------------------------------------------
// Vec

impl<T: Reflect> Reflect for Vec<T> {
    #[inline]
    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::Sequence(self)
    }

    #[inline]
    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Sequence(self)
    }

    fn set(&mut self, value: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>> {
        *self = value.take::<Self>()?;
        Ok(())
    }
}

impl<T: Reflect> Sequence for Vec<T> {
    #[inline]
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
        Box::new(self.as_slice().iter().map(|elem| elem as &dyn Reflect))
    }

    fn iter_mut(&mut self) -> Box<dyn Iterator<Item = &mut dyn Reflect> + '_> {
        Box::new(
            self.as_mut_slice()
                .iter_mut()
                .map(|elem| elem as &mut dyn Reflect),
        )
    }
}

// -----------------------------------------------------------------------------
// VecDeque

impl<T: Reflect> Reflect for VecDeque<T> {
    #[inline]
    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::Sequence(self)
    }

    #[inline]
    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Sequence(self)
    }

    fn set(&mut self, value: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>> {
        *self = value.take::<Self>()?;
        Ok(())
    }
}

impl<T: Reflect> Sequence for VecDeque<T> {
    #[inline]
    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
        Box::new(VecDeque::iter(self).map(|elem| elem as &dyn Reflect))
    }

    fn iter_mut(&mut self) -> Box<dyn Iterator<Item = &mut dyn Reflect> + '_> {
        Box::new(VecDeque::iter_mut(self).map(|elem| elem as &mut dyn Reflect))
    }
}

// -----------------------------------------------------------------------------
// Fixed-size array

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    #[inline]
    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::Sequence(self)
    }

    #[inline]
    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Sequence(self)
    }

    fn set(&mut self, value: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>> {
        *self = value.take::<Self>()?;
        Ok(())
    }
}

impl<T: Reflect, const N: usize> Sequence for [T; N] {
    #[inline]
    fn len(&self) -> usize {
        N
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
        Box::new(self.as_slice().iter().map(|elem| elem as &dyn Reflect))
    }

    fn iter_mut(&mut self) -> Box<dyn Iterator<Item = &mut dyn Reflect> + '_> {
        Box::new(
            self.as_mut_slice()
                .iter_mut()
                .map(|elem| elem as &mut dyn Reflect),
        )
    }
}

// -----------------------------------------------------------------------------
// Boxed slice

impl<T: Reflect> Reflect for Box<[T]> {
    #[inline]
    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::Sequence(self)
    }

    #[inline]
    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Sequence(self)
    }

    fn set(&mut self, value: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>> {
        *self = value.take::<Self>()?;
        Ok(())
    }
}

impl<T: Reflect> Sequence for Box<[T]> {
    #[inline]
    fn len(&self) -> usize {
        self.as_ref().len()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
        Box::new(self.as_ref().iter().map(|elem| elem as &dyn Reflect))
    }

    fn iter_mut(&mut self) -> Box<dyn Iterator<Item = &mut dyn Reflect> + '_> {
        Box::new(self.as_mut().iter_mut().map(|elem| elem as &mut dyn Reflect))
    }
}

#[cfg(test)]
mod tests {
    use crate::{Reflect, ReflectKind, ReflectRef};

    #[test]
    fn vec_classifies_as_sequence() {
        let vec = vec![1_i32, 2, 3];
        assert_eq!(vec.reflect_kind(), ReflectKind::Sequence);

        let ReflectRef::Sequence(seq) = vec.reflect_ref() else {
            panic!("expected sequence");
        };
        assert_eq!(seq.len(), 3);
        let collected: Vec<i32> = seq
            .iter()
            .map(|elem| *elem.downcast_ref::<i32>().unwrap())
            .collect();
        assert_eq!(collected, [1, 2, 3]);
    }

    #[test]
    fn array_iteration_is_in_order() {
        let arr = [5_u8, 6, 7];
        let ReflectRef::Sequence(seq) = arr.reflect_ref() else {
            panic!("expected sequence");
        };
        assert_eq!(
            seq.iter().nth(2).and_then(|e| e.downcast_ref::<u8>()),
            Some(&7)
        );
        assert!(seq.iter().nth(3).is_none());
    }

    #[test]
    fn sequence_set_replaces_whole_value() {
        let mut vec = vec![1_i32];
        vec.set(Box::new(vec![7_i32, 8])).unwrap();
        assert_eq!(vec, [7, 8]);

        // Element type is part of the sequence type.
        assert!(vec.set(Box::new(vec![1_u8])).is_err());
    }
}
