//! Merge cursor
//!
//! Wraps one sorted cell source with a stable recency rank and one cell of
//! lookahead, so the merge can compare the next key across all sources
//! before committing to consume any of them.

use crate::entry::Cell;

/// Peekable, recency-tagged iterator over one sorted source, a memtable
/// range or a run's range cursor. Higher recency wins key ties in the
/// merge; the live memtable uses `u64::MAX`.
pub struct MergeCursor<'a> {
    inner: Box<dyn Iterator<Item = Cell> + 'a>,
    peeked: Option<Cell>,
    recency: u64,
}

impl<'a> MergeCursor<'a> {
    pub fn new(recency: u64, mut inner: Box<dyn Iterator<Item = Cell> + 'a>) -> Self {
        let peeked = inner.next();
        Self {
            inner,
            peeked,
            recency,
        }
    }

    /// Key of the next cell without consuming it; `None` when exhausted.
    pub fn peek(&self) -> Option<&[u8]> {
        self.peeked.as_ref().map(|cell| cell.key().as_ref())
    }

    /// Consume and return the next cell.
    pub fn advance(&mut self) -> Option<Cell> {
        let cell = self.peeked.take();
        self.peeked = self.inner.next();
        cell
    }

    /// Recency rank of the underlying source.
    pub fn recency(&self) -> u64 {
        self.recency
    }

    pub fn is_exhausted(&self) -> bool {
        self.peeked.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Entry;

    fn cells(keys: &[&[u8]]) -> Vec<Cell> {
        keys.iter()
            .map(|k| Cell::from(Entry::put(k.to_vec(), &b"v"[..])))
            .collect()
    }

    #[test]
    fn peek_does_not_consume() {
        let mut cursor = MergeCursor::new(7, Box::new(cells(&[b"a", b"b"]).into_iter()));
        assert_eq!(cursor.peek(), Some(&b"a"[..]));
        assert_eq!(cursor.peek(), Some(&b"a"[..]));
        assert_eq!(cursor.recency(), 7);

        assert_eq!(cursor.advance().unwrap().key().as_ref(), b"a");
        assert_eq!(cursor.peek(), Some(&b"b"[..]));
        assert_eq!(cursor.advance().unwrap().key().as_ref(), b"b");
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.peek(), None);
        assert!(cursor.advance().is_none());
    }

    #[test]
    fn empty_source_starts_exhausted() {
        let cursor = MergeCursor::new(0, Box::new(std::iter::empty()));
        assert!(cursor.is_exhausted());
    }
}
