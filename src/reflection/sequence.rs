use alloc::boxed::Box;

use crate::Reflect;

// -----------------------------------------------------------------------------
// Sequence

/// An ordered, iterate-only collection of reflected elements.
///
/// No random access is assumed: index segments in a resolution path advance
/// the iterator returned by [`iter`] exactly as many steps as the requested
/// index. Enumeration order is the order the source collection exposes and
/// is assumed stable across repeated reads within one resolution.
///
/// Implementations for `Vec<T>`, `VecDeque<T>`, `[T; N]` and `Box<[T]>`
/// live in [`crate::impls`].
///
/// # Examples
///
/// ```
/// use memberpath::Sequence;
///
/// let vec = vec![10_i32, 20, 30];
/// let seq: &dyn Sequence = &vec;
///
/// assert_eq!(seq.len(), 3);
/// let second = seq.iter().nth(1).unwrap();
/// assert_eq!(second.downcast_ref::<i32>(), Some(&20));
/// ```
///
/// [`iter`]: Sequence::iter
pub trait Sequence: Reflect {
    /// Returns the number of elements.
    fn len(&self) -> usize;

    /// Returns an iterator over the elements.
    fn iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_>;

    /// Returns a mutable iterator over the elements.
    fn iter_mut(&mut self) -> Box<dyn Iterator<Item = &mut dyn Reflect> + '_>;

    /// Returns `true` if the sequence has no elements.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
