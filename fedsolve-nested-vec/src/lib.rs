//! Compressed storage for a sequence of variable-length arrays.
//!
//! All arrays live in one contiguous buffer, delimited by an offset table of length
//! `len() + 1`. This is the layout of a CSR row structure without the values, and is used
//! to store e.g. the DOF indices of every element in a mesh.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Debug;
use std::ops::Range;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedVec<T> {
    data: Vec<T>,
    // Invariant: non-empty, starts at 0, non-decreasing, last entry == data.len()
    offsets: Vec<usize>,
}

impl<T: Debug> Debug for NestedVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Default for NestedVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NestedVec<T> {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            offsets: vec![0],
        }
    }

    /// Creates an empty container with room for `num_arrays` arrays holding
    /// `num_elements` elements in total.
    pub fn with_capacity(num_arrays: usize, num_elements: usize) -> Self {
        let mut offsets = Vec::with_capacity(num_arrays + 1);
        offsets.push(0);
        Self {
            data: Vec::with_capacity(num_elements),
            offsets,
        }
    }

    /// Begins a new array whose elements are appended one at a time.
    ///
    /// The array is closed when the returned appender is dropped, so that the result is
    /// equivalent to calling [`push`](Self::push) with all the appended elements at once.
    pub fn begin_array(&mut self) -> ArrayAppender<'_, T> {
        let initial_count = self.data.len();
        ArrayAppender {
            initial_count,
            data: &mut self.data,
            offsets: &mut self.offsets,
        }
    }

    /// The number of arrays.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl '_ + ExactSizeIterator<Item = &[T]> {
        self.offsets
            .windows(2)
            .map(move |w| &self.data[w[0]..w[1]])
    }

    /// Returns an iterator over all elements inside all arrays.
    pub fn iter_array_elements(&self) -> impl '_ + Iterator<Item = &T> {
        self.data.iter()
    }

    pub fn total_num_elements(&self) -> usize {
        self.data.len()
    }

    /// The length of the array at the given index, if it exists.
    pub fn array_len(&self, index: usize) -> Option<usize> {
        self.get_index_range(index).map(|range| range.len())
    }

    /// The length of the longest array, or zero if there are no arrays.
    pub fn max_array_len(&self) -> usize {
        self.offsets
            .windows(2)
            .map(|w| w[1] - w[0])
            .max()
            .unwrap_or(0)
    }

    pub fn get(&self, index: usize) -> Option<&[T]> {
        let range = self.get_index_range(index)?;
        self.data.get(range)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut [T]> {
        let range = self.get_index_range(index)?;
        self.data.get_mut(range)
    }

    fn get_index_range(&self, index: usize) -> Option<Range<usize>> {
        let begin = *self.offsets.get(index)?;
        let end = *self.offsets.get(index + 1)?;
        Some(begin..end)
    }

    pub fn first(&self) -> Option<&[T]> {
        self.get(0)
    }

    pub fn last(&self) -> Option<&[T]> {
        self.len().checked_sub(1).and_then(|idx| self.get(idx))
    }

    /// The offset table, of length `len() + 1`.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// All elements of all arrays, stored contiguously.
    pub fn flat_data(&self) -> &[T] {
        &self.data
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.offsets.clear();
        self.offsets.push(0);
    }
}

impl<T: Clone> NestedVec<T> {
    /// Creates a container with one array per entry in `counts`, with the given array lengths.
    ///
    /// Every element is initialized to `fill`. The storage is allocated exactly once.
    pub fn from_counts<I>(counts: I, fill: T) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let counts = counts.into_iter();
        let mut offsets = Vec::with_capacity(counts.size_hint().0 + 1);
        offsets.push(0);
        let mut total = 0;
        for count in counts {
            total += count;
            offsets.push(total);
        }
        Self {
            data: vec![fill; total],
            offsets,
        }
    }

    pub fn push(&mut self, array: &[T]) {
        self.data.extend_from_slice(array);
        self.offsets.push(self.data.len());
    }
}

#[derive(Debug)]
pub struct ArrayAppender<'a, T> {
    data: &'a mut Vec<T>,
    offsets: &'a mut Vec<usize>,
    initial_count: usize,
}

impl<'a, T> ArrayAppender<'a, T> {
    pub fn push_single(&mut self, element: T) -> &mut Self {
        self.data.push(element);
        self
    }

    /// The number of elements appended to the current array so far.
    pub fn count(&self) -> usize {
        self.data.len() - self.initial_count
    }
}

impl<'a, T> Drop for ArrayAppender<'a, T> {
    fn drop(&mut self) {
        self.offsets.push(self.data.len());
    }
}

impl<'a, T: Clone> From<&'a Vec<Vec<T>>> for NestedVec<T> {
    fn from(nested_vec: &'a Vec<Vec<T>>) -> Self {
        let total = nested_vec.iter().map(Vec::len).sum();
        let mut result = Self::with_capacity(nested_vec.len(), total);
        for vec in nested_vec {
            result.push(vec);
        }
        result
    }
}

impl<T: Clone> From<Vec<Vec<T>>> for NestedVec<T> {
    fn from(vec_vec: Vec<Vec<T>>) -> Self {
        Self::from(&vec_vec)
    }
}

impl<'a, T: Clone> From<&'a NestedVec<T>> for Vec<Vec<T>> {
    fn from(nested: &NestedVec<T>) -> Self {
        nested.iter().map(|slice| slice.to_vec()).collect()
    }
}

impl<T: Clone> From<NestedVec<T>> for Vec<Vec<T>> {
    fn from(nested: NestedVec<T>) -> Self {
        Self::from(&nested)
    }
}
