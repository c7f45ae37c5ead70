//! Statement-batch boundary search.
//!
//! A batch is the text between two `GO` separator lines. A separator line is
//! a line whose trimmed content is `GO` (any case), terminated by `\n`,
//! `\r\n` or the end of the script.
//!
//! A statement that spans a separator has no defined enclosing batch.

use std::ops::Range;

/// Batch separator keyword.
pub const BATCH_SEPARATOR: &str = "GO";

/// Location of a statement and its enclosing batch (byte offsets).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchMatch {
    pub statement_start: usize,
    pub statement_end: usize,
    /// Right after the preceding separator line, or 0.
    pub batch_start: usize,
    /// Start of the next separator line, or the script length.
    pub batch_end: usize,
}

impl BatchMatch {
    pub fn batch_range(&self) -> Range<usize> {
        self.batch_start..self.batch_end
    }

    /// Text of the enclosing batch.
    pub fn batch<'a>(&self, script: &'a str) -> &'a str {
        &script[self.batch_range()]
    }

    /// Start of the line the statement begins on.
    pub fn line_start(&self, script: &str) -> usize {
        script[..self.statement_start]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0)
    }
}

/// Byte ranges of all separator lines, line breaks included.
pub fn separator_lines(script: &str) -> Vec<Range<usize>> {
    let mut separators = Vec::new();
    let mut line_start = 0;

    for line in script.split_inclusive('\n') {
        let line_end = line_start + line.len();
        if line.trim().eq_ignore_ascii_case(BATCH_SEPARATOR) {
            separators.push(line_start..line_end);
        }
        line_start = line_end;
    }

    separators
}

/// Separator lines of one script, computed once for repeated lookups.
#[derive(Debug, Clone)]
pub struct BatchIndex<'a> {
    script: &'a str,
    separators: Vec<Range<usize>>,
}

impl<'a> BatchIndex<'a> {
    pub fn new(script: &'a str) -> Self {
        Self {
            script,
            separators: separator_lines(script),
        }
    }

    pub fn separators(&self) -> &[Range<usize>] {
        &self.separators
    }

    /// Find the first occurrence of `statement` at or after `search_from`
    /// together with its enclosing batch.
    pub fn find(&self, statement: &str, search_from: usize) -> Option<BatchMatch> {
        if statement.is_empty() {
            return None;
        }

        let script = self.script;
        let statement_start = search_from + script.get(search_from..)?.find(statement)?;
        let statement_end = statement_start + statement.len();

        let before = self
            .separators
            .partition_point(|s| s.end <= statement_start);
        let batch_start = self.separators[..before]
            .last()
            .map(|s| s.end)
            .unwrap_or(0);
        let after = self
            .separators
            .partition_point(|s| s.start < statement_end);
        let batch_end = self
            .separators
            .get(after)
            .map(|s| s.start)
            .unwrap_or(script.len());

        Some(BatchMatch {
            statement_start,
            statement_end,
            batch_start,
            batch_end,
        })
    }

    /// The separator line closing the batch of `found`, if any.
    pub fn closing_separator(&self, found: &BatchMatch) -> Option<Range<usize>> {
        let i = self
            .separators
            .partition_point(|s| s.start < found.batch_end);
        self.separators
            .get(i)
            .filter(|s| s.start == found.batch_end)
            .cloned()
    }
}

/// Find the first occurrence of `statement` at or after `search_from`
/// together with its enclosing batch.
///
/// Scans the whole script for separators; use [`BatchIndex`] when looking up
/// several occurrences in the same script.
pub fn find_statement_batch(script: &str, statement: &str, search_from: usize) -> Option<BatchMatch> {
    BatchIndex::new(script).find(statement, search_from)
}

/// Rewrite every batch containing `statement`.
///
/// `rewrite` receives the batch text and returns its replacement. A batch
/// containing the statement several times is rewritten once. Returns the new
/// script and the number of rewritten batches.
pub fn rewrite_batches<F>(script: &str, statement: &str, mut rewrite: F) -> (String, usize)
where
    F: FnMut(&str) -> String,
{
    let index = BatchIndex::new(script);
    let mut output = String::with_capacity(script.len());
    let mut cursor = 0;
    let mut count = 0;

    while let Some(found) = index.find(statement, cursor) {
        let start = found.batch_start.max(cursor);
        output.push_str(&script[cursor..start]);
        output.push_str(&rewrite(&script[start..found.batch_end]));
        cursor = found.batch_end;
        count += 1;

        if cursor >= script.len() {
            break;
        }
    }

    output.push_str(&script[cursor..]);
    (output, count)
}
