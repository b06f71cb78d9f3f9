use alloc::borrow::Cow;
use core::fmt;

/// One step of a parsed member path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'p> {
    /// Descend into the named member of the current value.
    Member(Cow<'p, str>),
    /// Descend into the element at the given position of the current
    /// ordered collection.
    Element(usize),
}

impl Segment<'_> {
    /// Detaches the segment from the path string it was parsed from.
    pub fn into_owned(self) -> Segment<'static> {
        match self {
            Segment::Member(name) => Segment::Member(Cow::Owned(name.into_owned())),
            Segment::Element(index) => Segment::Element(index),
        }
    }
}

impl fmt::Display for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Member(name) => f.write_str(name),
            Segment::Element(index) => write!(f, "Array.data[{index}]"),
        }
    }
}

/// A [`Segment`] paired with its byte offset in the source path, for error
/// reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetSegment<'p> {
    pub(crate) segment: Segment<'p>,
    pub(crate) offset: usize,
}

impl<'p> OffsetSegment<'p> {
    /// Returns the segment itself.
    #[inline]
    pub fn segment(&self) -> &Segment<'p> {
        &self.segment
    }

    /// Returns the byte offset of the segment in the source path.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Detaches the segment from the path string it was parsed from.
    pub fn into_owned(self) -> OffsetSegment<'static> {
        OffsetSegment {
            segment: self.segment.into_owned(),
            offset: self.offset,
        }
    }
}
