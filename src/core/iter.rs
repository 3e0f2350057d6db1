//! Traversal over the segments of a [`SegmentedVector`].
//!
//! [`Segments`] and [`SegmentsMut`] are ordinary double-ended iterators; they borrow the
//! container, so its structure cannot change while a traversal is in progress.
//! [`SegmentCursor`] is a random-access position (variable index plus a reference to the
//! container) for callers that need to step back and forth or measure distances.

use std::iter::FusedIterator;
use std::ptr;

use crate::core::segmented_vector::SegmentedVector;

/// Iterator over `&[f64]` segments in variable order.
#[derive(Clone, Debug)]
pub struct Segments<'a> {
    values: &'a [f64],
    offsets: &'a [usize],
    front: usize,
    back: usize,
}

impl<'a> Segments<'a> {
    pub(crate) fn new(values: &'a [f64], offsets: &'a [usize]) -> Self {
        Self {
            values,
            offsets,
            front: 0,
            back: offsets.len() - 1,
        }
    }

    fn segment(&self, index: usize) -> &'a [f64] {
        &self.values[self.offsets[index]..self.offsets[index + 1]]
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = &'a [f64];

    fn next(&mut self) -> Option<&'a [f64]> {
        if self.front == self.back {
            return None;
        }
        let segment = self.segment(self.front);
        self.front += 1;
        Some(segment)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<&'a [f64]> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl<'a> DoubleEndedIterator for Segments<'a> {
    fn next_back(&mut self) -> Option<&'a [f64]> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(self.segment(self.back))
    }

    fn nth_back(&mut self, n: usize) -> Option<&'a [f64]> {
        self.back = self.back.saturating_sub(n).max(self.front);
        self.next_back()
    }
}

impl ExactSizeIterator for Segments<'_> {}

impl FusedIterator for Segments<'_> {}

/// Iterator over `&mut [f64]` segments in variable order.
///
/// `rest` always covers exactly the segments `front..back`.
#[derive(Debug)]
pub struct SegmentsMut<'a> {
    rest: &'a mut [f64],
    offsets: &'a [usize],
    front: usize,
    back: usize,
}

impl<'a> SegmentsMut<'a> {
    pub(crate) fn new(logical: &'a mut [f64], offsets: &'a [usize]) -> Self {
        Self {
            rest: logical,
            offsets,
            front: 0,
            back: offsets.len() - 1,
        }
    }

    fn segment_len(&self, index: usize) -> usize {
        self.offsets[index + 1] - self.offsets[index]
    }
}

impl<'a> Iterator for SegmentsMut<'a> {
    type Item = &'a mut [f64];

    fn next(&mut self) -> Option<&'a mut [f64]> {
        if self.front == self.back {
            return None;
        }
        let len = self.segment_len(self.front);
        let rest = std::mem::take(&mut self.rest);
        let (head, tail) = rest.split_at_mut(len);
        self.rest = tail;
        self.front += 1;
        Some(head)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<'a> DoubleEndedIterator for SegmentsMut<'a> {
    fn next_back(&mut self) -> Option<&'a mut [f64]> {
        if self.front == self.back {
            return None;
        }
        let len = self.segment_len(self.back - 1);
        let rest = std::mem::take(&mut self.rest);
        let split = rest.len() - len;
        let (head, tail) = rest.split_at_mut(split);
        self.rest = head;
        self.back -= 1;
        Some(tail)
    }
}

impl ExactSizeIterator for SegmentsMut<'_> {}

impl FusedIterator for SegmentsMut<'_> {}

/// Random-access position over the segments of one container.
///
/// Valid positions are `0..=len()`; `len()` is the end position and has no segment.
/// Cursors compare and subtract only against cursors of the same container instance.
#[derive(Clone, Copy, Debug)]
pub struct SegmentCursor<'a> {
    vector: &'a SegmentedVector,
    index: usize,
}

impl<'a> SegmentCursor<'a> {
    pub(crate) fn new(vector: &'a SegmentedVector, index: usize) -> Self {
        debug_assert!(index <= vector.len());
        Self { vector, index }
    }

    /// Current variable index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// True at the end position.
    pub fn is_end(&self) -> bool {
        self.index == self.vector.len()
    }

    /// Segment under the cursor, `None` at the end position.
    pub fn get(&self) -> Option<&'a [f64]> {
        self.vector.get(self.index)
    }

    /// Move to the next variable.
    ///
    /// # Panics
    /// Panics when already at the end position.
    pub fn step_forward(&mut self) -> &mut Self {
        self.advance_by(1)
    }

    /// Move to the previous variable.
    ///
    /// # Panics
    /// Panics when already at the first variable.
    pub fn step_back(&mut self) -> &mut Self {
        self.advance_by(-1)
    }

    /// Move by a signed number of variables.
    ///
    /// # Panics
    /// Panics if the target lies outside `0..=len()`.
    pub fn advance_by(&mut self, step: isize) -> &mut Self {
        let target = self
            .index
            .checked_add_signed(step)
            .filter(|&target| target <= self.vector.len());
        match target {
            Some(target) => self.index = target,
            None => panic!(
                "cursor step {step} from {} leaves 0..={}",
                self.index,
                self.vector.len()
            ),
        }
        self
    }

    /// Signed number of variables from `other` to `self`.
    ///
    /// # Panics
    /// Panics when the cursors belong to different containers.
    pub fn distance_from(&self, other: &SegmentCursor<'_>) -> isize {
        assert!(
            self.same_container(other),
            "cursors belong to different segmented vectors"
        );
        self.index as isize - other.index as isize
    }

    fn same_container(&self, other: &SegmentCursor<'_>) -> bool {
        ptr::eq(self.vector, other.vector)
    }
}

impl PartialEq for SegmentCursor<'_> {
    fn eq(&self, other: &Self) -> bool {
        debug_assert!(
            self.same_container(other),
            "cursors belong to different segmented vectors"
        );
        self.same_container(other) && self.index == other.index
    }
}

impl Eq for SegmentCursor<'_> {}
