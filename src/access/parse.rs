use alloc::borrow::Cow;
use core::fmt;

use crate::access::segment::{OffsetSegment, Segment};

/// What went wrong while parsing a member path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A segment between two dots (or at either end of the path) was empty.
    EmptySegment,
    /// An element index after an `Array` marker was missing its closing
    /// bracket.
    UnterminatedIndex,
    /// An element index after an `Array` marker was empty, contained a
    /// non-digit, or did not fit in `usize`.
    InvalidIndex,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::EmptySegment => f.write_str("empty path segment"),
            ParseErrorKind::UnterminatedIndex => f.write_str("unterminated element index"),
            ParseErrorKind::InvalidIndex => f.write_str("invalid element index"),
        }
    }
}

/// An error produced while parsing a member path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError<'p> {
    path: &'p str,
    offset: usize,
    kind: ParseErrorKind,
}

impl<'p> ParseError<'p> {
    /// Returns the path being parsed.
    #[inline]
    pub fn path(&self) -> &'p str {
        self.path
    }

    /// Returns the byte offset the error was detected at.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the kind of error.
    #[inline]
    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }
}

impl fmt::Display for ParseError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "path `{}` is malformed at offset {}: {}",
            self.path, self.offset, self.kind,
        )
    }
}

impl core::error::Error for ParseError<'_> {}

/// A lazy parser over a member path string.
///
/// Produces [`OffsetSegment`]s one at a time. The `Array.data[n]` element
/// convention is folded into a single [`Segment::Element`]: the `Array`
/// marker is recognized only directly after a member segment and only when
/// the token after it starts with `data[`; anywhere else both tokens are
/// ordinary member names. Fuses after the first error.
pub(crate) struct PathParser<'p> {
    path: &'p str,
    /// Byte offset of the next unread token; `path.len() + 1` once the last
    /// token has been taken.
    index: usize,
    prev_was_member: bool,
    failed: bool,
}

impl<'p> PathParser<'p> {
    pub(crate) fn new(path: &'p str) -> Self {
        Self {
            path,
            index: 0,
            prev_was_member: false,
            failed: false,
        }
    }

    /// Takes the next raw dot-separated token and its byte offset.
    fn next_token(&mut self) -> Option<(usize, &'p str)> {
        if self.index > self.path.len() {
            return None;
        }
        let offset = self.index;
        let rest = &self.path[offset..];
        match rest.find('.') {
            Some(dot) => {
                self.index = offset + dot + 1;
                Some((offset, &rest[..dot]))
            }
            None => {
                self.index = self.path.len() + 1;
                Some((offset, rest))
            }
        }
    }

    fn peek_token(&self) -> Option<(usize, &'p str)> {
        let mut lookahead = PathParser {
            path: self.path,
            index: self.index,
            prev_was_member: self.prev_was_member,
            failed: self.failed,
        };
        lookahead.next_token()
    }

    fn fail(&mut self, offset: usize, kind: ParseErrorKind) -> ParseError<'p> {
        self.failed = true;
        ParseError {
            path: self.path,
            offset,
            kind,
        }
    }
}

impl<'p> Iterator for PathParser<'p> {
    type Item = Result<OffsetSegment<'p>, ParseError<'p>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let (offset, token) = self.next_token()?;
        if token.is_empty() {
            return Some(Err(self.fail(offset, ParseErrorKind::EmptySegment)));
        }

        if token == "Array"
            && self.prev_was_member
            && let Some((data_offset, data)) = self.peek_token()
            && let Some(body) = data.strip_prefix("data[")
        {
            self.next_token();
            let Some(digits) = body.strip_suffix(']') else {
                return Some(Err(self.fail(data_offset, ParseErrorKind::UnterminatedIndex)));
            };
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Some(Err(self.fail(data_offset, ParseErrorKind::InvalidIndex)));
            }
            let Ok(index) = digits.parse::<usize>() else {
                return Some(Err(self.fail(data_offset, ParseErrorKind::InvalidIndex)));
            };
            self.prev_was_member = false;
            return Some(Ok(OffsetSegment {
                segment: Segment::Element(index),
                offset,
            }));
        }

        self.prev_was_member = true;
        Some(Ok(OffsetSegment {
            segment: Segment::Member(Cow::Borrowed(token)),
            offset,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn parse(path: &str) -> Result<Vec<Segment<'_>>, ParseError<'_>> {
        PathParser::new(path)
            .map(|result| result.map(|seg| seg.segment))
            .collect()
    }

    fn member(name: &str) -> Segment<'_> {
        Segment::Member(Cow::Borrowed(name))
    }

    #[test]
    fn plain_members() {
        assert_eq!(
            parse("stats.health").unwrap(),
            [member("stats"), member("health")],
        );
    }

    #[test]
    fn element_convention_collapses_to_one_segment() {
        assert_eq!(
            parse("items.Array.data[2].name").unwrap(),
            [member("items"), Segment::Element(2), member("name")],
        );
    }

    #[test]
    fn marker_needs_a_preceding_member() {
        // A leading `Array` is an ordinary member name.
        assert_eq!(
            parse("Array.data[0]").unwrap(),
            [member("Array"), member("data[0]")],
        );
    }

    #[test]
    fn marker_needs_a_data_token_after_it() {
        assert_eq!(
            parse("items.Array.next").unwrap(),
            [member("items"), member("Array"), member("next")],
        );
        assert_eq!(parse("items.Array").unwrap(), [member("items"), member("Array")]);
    }

    #[test]
    fn marker_is_not_recognized_after_an_element() {
        // An element segment refers to the collection named by the member
        // segment right before it, so two in a row have nothing to index.
        assert_eq!(
            parse("rows.Array.data[1].Array.data[3]").unwrap(),
            [
                member("rows"),
                Segment::Element(1),
                member("Array"),
                member("data[3]"),
            ],
        );
    }

    #[test]
    fn empty_segments_are_rejected() {
        assert_eq!(parse("").unwrap_err().kind(), ParseErrorKind::EmptySegment);
        assert_eq!(parse("a..b").unwrap_err().kind(), ParseErrorKind::EmptySegment);
        let err = parse("a.b.").unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::EmptySegment);
        assert_eq!(err.offset(), 4);
    }

    #[test]
    fn malformed_indices_are_rejected() {
        assert_eq!(
            parse("items.Array.data[2").unwrap_err().kind(),
            ParseErrorKind::UnterminatedIndex,
        );
        assert_eq!(
            parse("items.Array.data[]").unwrap_err().kind(),
            ParseErrorKind::InvalidIndex,
        );
        assert_eq!(
            parse("items.Array.data[-1]").unwrap_err().kind(),
            ParseErrorKind::InvalidIndex,
        );
    }

    #[test]
    fn offsets_point_at_segment_starts() {
        let segments: Vec<_> = PathParser::new("a.items.Array.data[0]")
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(segments[0].offset(), 0);
        assert_eq!(segments[1].offset(), 2);
        assert_eq!(segments[2].offset(), 8);
    }

    #[test]
    fn parser_fuses_after_an_error() {
        let mut parser = PathParser::new("..a");
        assert!(matches!(parser.next(), Some(Err(_))));
        assert!(parser.next().is_none());
    }
}
