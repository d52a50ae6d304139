use crate::error::DbError;
use crate::results::Fetched;

use super::Statement;

/// Forward-only iterator over a statement's remaining fetch units.
///
/// Ends when the rows are exhausted (the cursor is released at that point) or
/// after the first error.
pub struct Rows<'s, 'c> {
    stmt: &'s mut Statement<'c>,
    done: bool,
}

impl<'s, 'c> Rows<'s, 'c> {
    pub(super) fn new(stmt: &'s mut Statement<'c>) -> Self {
        Self { stmt, done: false }
    }
}

impl Iterator for Rows<'_, '_> {
    type Item = Result<Fetched, DbError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.stmt.fetch() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl std::iter::FusedIterator for Rows<'_, '_> {}
