use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::Reflect;
use crate::access::error::ResolveError;
use crate::access::handle::{MemberHandle, MemberHandleMut};
use crate::access::parse::{ParseError, PathParser};
use crate::access::resolver::{resolve_in, resolve_mut_in};
use crate::access::segment::OffsetSegment;
use crate::lookup::ExpectedType;
use crate::registry::TypeRegistry;

/// A pre-parsed member path, reusable across objects and resolutions.
///
/// Parsing a path string validates its grammar once; resolving it against a
/// value then skips straight to the walk. Prefer this over
/// [`PathResolver`](crate::access::PathResolver)'s string methods when the
/// same path is resolved repeatedly, for example on every change signal of
/// a bound value.
///
/// # Examples
///
/// ```
/// use memberpath::access::MemberPath;
///
/// let path = MemberPath::parse("items.Array.data[1].name").unwrap();
/// assert_eq!(path.source(), "items.Array.data[1].name");
/// assert_eq!(path.len(), 3);
///
/// assert!(MemberPath::parse("items..name").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct MemberPath {
    source: Box<str>,
    segments: Box<[OffsetSegment<'static>]>,
}

impl MemberPath {
    /// Parses a path string.
    pub fn parse(path: &str) -> Result<Self, ParseError<'_>> {
        let mut segments = Vec::new();
        for result in PathParser::new(path) {
            segments.push(result?.into_owned());
        }
        Ok(Self {
            source: path.into(),
            segments: segments.into_boxed_slice(),
        })
    }

    /// Returns the string this path was parsed from.
    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the number of segments.
    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if the path has no segments.
    ///
    /// Cannot currently happen through [`parse`](Self::parse), which
    /// rejects the empty string.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Iterates the parsed segments.
    pub fn segments(&self) -> impl Iterator<Item = &OffsetSegment<'static>> {
        self.segments.iter()
    }

    /// Resolves this path against a shared borrow of `root`.
    pub fn resolve<'obj>(
        &self,
        registry: &TypeRegistry,
        root: &'obj dyn Reflect,
    ) -> Result<MemberHandle<'obj>, ResolveError<'_>> {
        resolve_in(registry, root, &self.source, self.iter_results(), None)
    }

    /// Resolves this path against a shared borrow of `root`, constraining
    /// the terminal member to produce values of type `T`.
    pub fn resolve_expecting<'obj, T: Reflect>(
        &self,
        registry: &TypeRegistry,
        root: &'obj dyn Reflect,
    ) -> Result<MemberHandle<'obj>, ResolveError<'_>> {
        let expected = ExpectedType::of::<T>();
        resolve_in(registry, root, &self.source, self.iter_results(), Some(&expected))
    }

    /// Resolves this path against a mutable borrow of `root`.
    pub fn resolve_mut<'obj>(
        &self,
        registry: &TypeRegistry,
        root: &'obj mut dyn Reflect,
    ) -> Result<MemberHandleMut<'obj>, ResolveError<'_>> {
        resolve_mut_in(registry, root, &self.source, self.iter_results(), None)
    }

    /// Resolves this path against a mutable borrow of `root`, constraining
    /// the terminal member to produce values of type `T`.
    pub fn resolve_mut_expecting<'obj, T: Reflect>(
        &self,
        registry: &TypeRegistry,
        root: &'obj mut dyn Reflect,
    ) -> Result<MemberHandleMut<'obj>, ResolveError<'_>> {
        let expected = ExpectedType::of::<T>();
        resolve_mut_in(registry, root, &self.source, self.iter_results(), Some(&expected))
    }

    fn iter_results<'s>(
        &'s self,
    ) -> impl Iterator<Item = Result<OffsetSegment<'s>, ParseError<'s>>> + 's {
        self.segments.iter().map(|segment| Ok(segment.clone()))
    }
}

impl fmt::Display for MemberPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl<'p> TryFrom<&'p str> for MemberPath {
    type Error = ParseError<'p>;

    fn try_from(path: &'p str) -> Result<Self, Self::Error> {
        MemberPath::parse(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::segment::Segment;
    use crate::impl_reflect;
    use crate::info::{GetMemberTable, MemberInfo, MemberTable};
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    struct Shelf {
        books: Vec<String>,
    }
    impl_reflect!(Shelf);

    impl GetMemberTable for Shelf {
        fn member_table() -> MemberTable {
            MemberTable::of::<Shelf>().with(MemberInfo::field(
                "books",
                |s: &Shelf| &s.books,
                |s: &mut Shelf| &mut s.books,
            ))
        }
    }

    #[test]
    fn a_parsed_path_resolves_repeatedly() {
        let mut registry = TypeRegistry::new();
        registry.register::<Shelf>();

        let path = MemberPath::parse("books.Array.data[0]").unwrap();
        let first = Shelf {
            books: vec![String::from("Dune")],
        };
        let second = Shelf {
            books: vec![String::from("Solaris")],
        };

        let handle = path.resolve(&registry, &first).unwrap();
        assert_eq!(handle.get_as::<String>().unwrap(), "Dune");
        let handle = path.resolve(&registry, &second).unwrap();
        assert_eq!(handle.get_as::<String>().unwrap(), "Solaris");
    }

    #[test]
    fn segments_survive_the_source_string() {
        let path = {
            let source = String::from("books.Array.data[4]");
            MemberPath::parse(&source).unwrap()
        };
        let segments: Vec<_> = path.segments().map(OffsetSegment::segment).collect();
        assert_eq!(segments[1], &Segment::Element(4));
        assert_eq!(path.to_string(), "books.Array.data[4]");
    }
}
