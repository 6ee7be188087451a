//! Line scanning with `BEGIN:`/`END:` scope tracking.

use crate::RecurrenceError;

/// A lazy iterator over the lines of recurrence text, tagging each line with
/// whether it sits at the top level or inside a `BEGIN:`/`END:` block.
///
/// `BEGIN:NAME` pushes `NAME` onto a scope stack and `END:NAME` pops it; a
/// pop that does not match the innermost open block, or input that ends with
/// blocks still open, surfaces as [`RecurrenceError::ScopeMismatch`]. The
/// marker lines themselves are yielded as interior lines so callers that
/// only care about top-level properties can skip them uniformly.
///
/// Scanning borrows the input, so a fresh scanner over the same text starts
/// over from the beginning; cloning mid-iteration snapshots the remaining
/// lines and open scopes.
#[derive(Debug, Clone)]
pub(crate) struct ScopedLines<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    stack: Vec<&'a str>,
    finished: bool,
}

impl<'a> ScopedLines<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        ScopedLines { lines: input.lines().enumerate(), stack: Vec::new(), finished: false }
    }

    fn mismatch(&mut self, message: String) -> Option<Result<(&'a str, bool), RecurrenceError>> {
        self.finished = true;
        Some(Err(RecurrenceError::ScopeMismatch(message)))
    }
}

impl<'a> Iterator for ScopedLines<'a> {
    type Item = Result<(&'a str, bool), RecurrenceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let Some((index, line)) = self.lines.next() else {
            self.finished = true;
            return match self.stack.last() {
                Some(open) => {
                    let message = format!("block `BEGIN:{open}` is never closed");
                    Some(Err(RecurrenceError::ScopeMismatch(message)))
                }
                None => None,
            };
        };
        let number = index + 1;
        if let Some(name) = line.strip_prefix("BEGIN:") {
            self.stack.push(name);
            return Some(Ok((line, false)));
        }
        if let Some(name) = line.strip_prefix("END:") {
            return match self.stack.pop() {
                Some(open) if open == name => Some(Ok((line, false))),
                Some(open) => self.mismatch(format!(
                    "line {number}: `END:{name}` closes `BEGIN:{open}`"
                )),
                None => self.mismatch(format!(
                    "line {number}: `END:{name}` without a matching `BEGIN:{name}`"
                )),
            };
        }
        Some(Ok((line, self.stack.is_empty())))
    }
}
