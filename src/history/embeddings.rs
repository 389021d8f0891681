//! A dense, row-major feature buffer.
//!
//! One row per node, `dim` columns per row, stored contiguously so that row copies
//! between a batch buffer and a [`History`](super::History) are plain slice copies.

use crate::error::{Component, Error, Result, StructuralViolation};

/// A dense `rows x dim` matrix of `f32`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Embeddings {
    data: Vec<f32>,
    rows: usize,
    dim: usize,
}

impl Embeddings {
    /// Creates a zero-filled buffer.
    pub fn zeros(rows: usize, dim: usize) -> Self {
        Self {
            data: vec![0.0; rows * dim],
            rows,
            dim,
        }
    }

    /// Creates a buffer from a linear, row-major vector.
    ///
    /// # Errors
    /// Returns [`StructuralViolation::BufferShape`] unless `data` holds exactly
    /// `rows x dim` values.
    pub fn from_vec(data: Vec<f32>, rows: usize, dim: usize) -> Result<Self> {
        if rows.checked_mul(dim) != Some(data.len()) {
            return Err(Error::structural(
                Component::Executor,
                StructuralViolation::BufferShape {
                    len: data.len(),
                    rows,
                    dim,
                },
            ));
        }
        Ok(Self { data, rows, dim })
    }

    /// Creates a buffer from equally sized rows.
    ///
    /// # Panics
    /// Panics if the rows differ in length.
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Self {
        let dim = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * dim);
        for row in rows {
            let row = row.as_ref();
            assert_eq!(row.len(), dim, "all rows must have the same length");
            data.extend_from_slice(row);
        }
        Self {
            data,
            rows: rows.len(),
            dim,
        }
    }

    /// Number of rows.
    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Row width.
    #[inline(always)]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Returns row `row`.
    ///
    /// # Panics
    /// Panics if `row >= self.rows()`.
    #[inline]
    pub fn row(&self, row: usize) -> &[f32] {
        assert!(row < self.rows, "row {row} out of bounds");
        &self.data[row * self.dim..(row + 1) * self.dim]
    }

    /// Returns row `row` mutably.
    ///
    /// # Panics
    /// Panics if `row >= self.rows()`.
    #[inline]
    pub fn row_mut(&mut self, row: usize) -> &mut [f32] {
        assert!(row < self.rows, "row {row} out of bounds");
        &mut self.data[row * self.dim..(row + 1) * self.dim]
    }

    /// Iterates over rows.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        // Not `chunks_exact`: a zero-width buffer still has `rows` rows.
        (0..self.rows).map(move |r| &self.data[r * self.dim..(r + 1) * self.dim])
    }

    /// Underlying storage.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Builds a new buffer from the given rows of `self`, in order.
    ///
    /// # Errors
    /// Returns a structural error if any row index is out of range.
    pub fn gather(&self, rows: &[usize]) -> Result<Self> {
        let mut data = Vec::with_capacity(rows.len() * self.dim);
        for &r in rows {
            if r >= self.rows {
                return Err(Error::structural(
                    Component::Executor,
                    StructuralViolation::LocalIdOutOfRange {
                        local: r,
                        node_count: self.rows,
                    },
                ));
            }
            data.extend_from_slice(&self.data[r * self.dim..(r + 1) * self.dim]);
        }
        Ok(Self {
            data,
            rows: rows.len(),
            dim: self.dim,
        })
    }

    /// Stacks buffers vertically.
    ///
    /// # Panics
    /// Panics if the buffers differ in width.
    pub fn concat(parts: &[Self]) -> Self {
        let dim = parts.first().map_or(0, |p| p.dim);
        let rows = parts.iter().map(|p| p.rows).sum();
        let mut data = Vec::with_capacity(rows * dim);
        for part in parts {
            assert_eq!(part.dim, dim, "all parts must have the same width");
            data.extend_from_slice(&part.data);
        }
        Self { data, rows, dim }
    }
}
