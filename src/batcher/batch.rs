//! Batch of elements.

use std::ops::Deref;

/// Upper bound on the capacity reserved up front for a new batch.
const MAX_PREALLOCATED: usize = 4096;

/// An ordered group of elements that is processed as one unit of work.
///
/// Batches are filled by a [`BatchAdder`](super::BatchAdder) and handed to the
/// consumer by value; nothing else holds on to a batch after hand-off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<E> {
    id: u64,
    elements: Vec<E>,
}

impl<E> Batch<E> {
    pub(crate) fn new(id: u64, batch_size: usize) -> Self {
        Self {
            id,
            elements: Vec::with_capacity(batch_size.min(MAX_PREALLOCATED)),
        }
    }

    pub(crate) fn push(&mut self, element: E) {
        self.elements.push(element);
    }

    /// Puts `earlier` in front of the current contents.
    pub(crate) fn restore_front(&mut self, earlier: Batch<E>) {
        let later = std::mem::replace(&mut self.elements, earlier.elements);
        self.id = earlier.id;
        self.elements.extend(later);
    }

    /// Sequence number within the owning batcher, for diagnostics.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn as_slice(&self) -> &[E] {
        &self.elements
    }

    pub fn into_vec(self) -> Vec<E> {
        self.elements
    }
}

impl<E> Deref for Batch<E> {
    type Target = [E];

    fn deref(&self) -> &[E] {
        &self.elements
    }
}

impl<E> IntoIterator for Batch<E> {
    type Item = E;
    type IntoIter = std::vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a, E> IntoIterator for &'a Batch<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
