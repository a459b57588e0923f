//! Lazy-sequence iterator contract (§9), replacing the source's open-recursion
//! `AbstractCursor` hierarchy. `range_query`/`time_range_query` return types
//! implementing this trait so a caller is never forced to materialize an
//! entire scan to see its first element.

use crate::Result;

/// A pull-based sequence of `T`, closable to release any pinned pages it
/// still holds.
pub trait LazySeq<T> {
    fn has_next(&mut self) -> Result<bool>;

    fn next(&mut self) -> Result<Option<T>>;

    /// Release any buffer pins held by this sequence. Safe to call more
    /// than once.
    fn close(&mut self) {}
}

/// Adapts a [`LazySeq`] into a standard [`Iterator`], turning decode/IO
/// failures into a terminal `None` after surfacing the error once.
pub struct SeqIter<T, S: LazySeq<T>> {
    seq: S,
    done: bool,
    _marker: std::marker::PhantomData<T>,
}

impl<T, S: LazySeq<T>> SeqIter<T, S> {
    pub fn new(seq: S) -> SeqIter<T, S> {
        SeqIter { seq, done: false, _marker: std::marker::PhantomData }
    }
}

impl<T, S: LazySeq<T>> Iterator for SeqIter<T, S> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.seq.next() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.done = true;
                self.seq.close();
                None
            }
            Err(err) => {
                self.done = true;
                self.seq.close();
                Some(Err(err))
            }
        }
    }
}

/// An already-materialized sequence, used by bulk-load and simple in-memory
/// scans where buffering the whole result is cheap enough to not warrant a
/// real cursor.
pub struct VecSeq<T> {
    items: std::vec::IntoIter<T>,
}

impl<T> VecSeq<T> {
    pub fn new(items: Vec<T>) -> VecSeq<T> {
        VecSeq { items: items.into_iter() }
    }
}

impl<T> LazySeq<T> for VecSeq<T> {
    fn has_next(&mut self) -> Result<bool> {
        Ok(self.items.len() > 0)
    }

    fn next(&mut self) -> Result<Option<T>> {
        Ok(self.items.next())
    }
}

#[cfg(test)]
#[path = "iter_test.rs"]
mod iter_test;
