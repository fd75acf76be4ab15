use std::fmt;

/// A location in source text.
///
/// Lines are 1-based and columns are 0-based offsets counted in `char`s.
/// A column of `-1` denotes the position just before the first character of a line,
/// which is where a token whose text ends in a newline ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineColumn {
    /// 1-based.
    pub line: u32,
    /// 0-based, counted in characters.
    pub column: i32,
}

impl LineColumn {
    /// The position of the first character of a document.
    pub const START: Self = Self { line: 1, column: 0 };

    pub const fn new(line: u32, column: i32) -> Self {
        Self { line, column }
    }

    /// Returns the position directly after `text`, assuming `text` starts here.
    pub fn advance(self, text: &str) -> Self {
        let end = compute_end(self, text);
        Self { line: end.line, column: end.column + 1 }
    }
}

impl fmt::Display for LineColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The inclusive start and end positions of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: LineColumn,
    pub end: LineColumn,
}

impl Span {
    /// Computes the span of `text` when it starts at `start`.
    pub fn of(start: LineColumn, text: &str) -> Self {
        Self { start, end: compute_end(start, text) }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Computes the inclusive end position of `text` when it starts at `start`.
///
/// Without a newline the token ends on its start line,
/// `len - 1` columns to the right of where it starts.
/// Otherwise it ends `k` lines further down (for `k` newlines),
/// on the last character following the final newline.
pub fn compute_end(start: LineColumn, text: &str) -> LineColumn {
    let mut len = 0_i32;
    let mut newlines = 0_u32;
    let mut last_newline = None;

    for (idx, c) in text.chars().enumerate() {
        if c == '\n' {
            newlines += 1;
            last_newline = Some(idx as i32);
        }
        len += 1;
    }

    match last_newline {
        None => LineColumn { line: start.line, column: start.column + len - 1 },
        Some(last_newline) => {
            LineColumn { line: start.line + newlines, column: len - last_newline - 2 }
        }
    }
}

/// Returns the slice of `source` covered by `span`,
/// or `None` if the span does not lie within `source`.
pub fn slice(source: &str, span: Span) -> Option<&str> {
    let start = byte_offset(source, span.start.line, span.start.column)?;
    let end = byte_offset(source, span.end.line, span.end.column + 1)?;
    source.get(start..end)
}

fn byte_offset(source: &str, line: u32, column: i32) -> Option<usize> {
    let column = usize::try_from(column).ok()?;
    let line_start = line_start(source, line)?;

    let rest = &source[line_start..];
    match rest.char_indices().nth(column) {
        Some((offset, _)) => Some(line_start + offset),
        None if rest.chars().count() == column => Some(source.len()),
        None => None,
    }
}

fn line_start(source: &str, line: u32) -> Option<usize> {
    if line == 0 {
        return None;
    }

    let mut remaining = line - 1;
    if remaining == 0 {
        return Some(0);
    }

    for (offset, c) in source.char_indices() {
        if c == '\n' {
            remaining -= 1;
            if remaining == 0 {
                return Some(offset + 1);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn end(line: u32, column: i32, text: &str) -> (u32, i32) {
        let end = compute_end(LineColumn::new(line, column), text);
        (end.line, end.column)
    }

    #[test]
    fn single_line() {
        assert_eq!(end(1, 0, "class"), (1, 4));
        assert_eq!(end(3, 6, "K"), (3, 6));
    }

    #[test]
    fn multi_line() {
        assert_eq!(end(1, 4, "/* a\n b */"), (2, 4));
        assert_eq!(end(2, 0, "\n\n  "), (4, 1));
    }

    #[test]
    fn ending_in_newline() {
        assert_eq!(end(1, 9, "// test\n"), (2, -1));
        assert_eq!(end(5, 0, "\n"), (6, -1));
    }

    #[test]
    fn empty_text() {
        assert_eq!(end(1, 3, ""), (1, 2));
    }

    #[test]
    fn counts_chars_not_bytes() {
        assert_eq!(end(1, 0, "héllo"), (1, 4));
        assert_eq!(end(1, 0, "ü\nßß"), (2, 1));
    }

    #[test]
    fn advance() {
        assert_eq!(LineColumn::START.advance("class"), LineColumn::new(1, 5));
        assert_eq!(LineColumn::new(1, 5).advance(" \n"), LineColumn::new(2, 0));
        assert_eq!(LineColumn::new(2, 0).advance(""), LineColumn::new(2, 0));
    }

    #[test]
    fn does_not_mutate_input() {
        let text = String::from("a\nb");
        let _ = compute_end(LineColumn::START, &text);
        assert_eq!(text, "a\nb");
    }

    #[test]
    fn slice_round_trips_spans() {
        let source = "ab\n// c\n  dé";
        let mut start = LineColumn::START;
        for text in ["ab", "\n", "// c\n", "  ", "dé"] {
            let span = Span::of(start, text);
            assert_eq!(slice(source, span), Some(text), "{text:?} at {span}");
            start = start.advance(text);
        }
    }

    #[test]
    fn slice_out_of_bounds() {
        let span = Span::of(LineColumn::new(4, 0), "x");
        assert_eq!(slice("a\nb", span), None);
    }
}
