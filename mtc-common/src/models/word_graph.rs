//! Word graph and alignment domain types
//!
//! A word graph is a weighted lattice of candidate target-token sequences
//! for one source segment. Arcs connect decoder states; each arc carries
//! the tokens it produces, their confidences, the source slice it covers,
//! and a sparse word-to-word alignment over that slice.

use std::collections::HashSet;
use std::ops::{BitOr, BitOrAssign, Range};

/// Origin flags for a produced target token
///
/// A token can have several origins at once (e.g. both the statistical
/// model and the user's confirmed prefix), so this is a bit set combined
/// with `|`, not an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TranslationSources(u8);

impl TranslationSources {
    /// No recorded origin
    pub const NONE: Self = Self(0);
    /// Statistical machine translation output
    pub const SMT: Self = Self(1);
    /// Transfer-based output
    pub const TRANSFER: Self = Self(1 << 1);
    /// Confirmed translation prefix supplied by the user
    pub const PREFIX: Self = Self(1 << 2);

    /// True when no flag is set
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every flag of `other` is set in `self`
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for TranslationSources {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for TranslationSources {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Sparse boolean word-to-word correspondence relation
///
/// Dimensioned source-length × target-length; true only at explicitly
/// listed pairs. Reads outside the dimensions return false rather than
/// panicking.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WordAlignmentMatrix {
    row_count: usize,
    column_count: usize,
    cells: Vec<bool>,
}

impl WordAlignmentMatrix {
    /// All-false matrix of the given dimensions
    pub fn new(row_count: usize, column_count: usize) -> Self {
        Self {
            row_count,
            column_count,
            cells: vec![false; row_count * column_count],
        }
    }

    /// Matrix with true exactly at the listed (source, target) pairs.
    /// Out-of-range pairs are ignored.
    pub fn from_pairs(
        row_count: usize,
        column_count: usize,
        pairs: impl IntoIterator<Item = (usize, usize)>,
    ) -> Self {
        let mut matrix = Self::new(row_count, column_count);
        for (source_index, target_index) in pairs {
            matrix.set(source_index, target_index, true);
        }
        matrix
    }

    /// Source-side dimension
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Target-side dimension
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Whether source token `row` aligns to target token `column`;
    /// false for any index outside the dimensions
    pub fn get(&self, row: usize, column: usize) -> bool {
        if row >= self.row_count || column >= self.column_count {
            return false;
        }
        self.cells[row * self.column_count + column]
    }

    /// Set one cell; no-op outside the dimensions
    pub fn set(&mut self, row: usize, column: usize, value: bool) {
        if row < self.row_count && column < self.column_count {
            self.cells[row * self.column_count + column] = value;
        }
    }

    /// Listed (source, target) pairs in row-major order
    pub fn aligned_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for row in 0..self.row_count {
            for column in 0..self.column_count {
                if self.get(row, column) {
                    pairs.push((row, column));
                }
            }
        }
        pairs
    }
}

/// One edge of the word graph
#[derive(Debug, Clone, PartialEq)]
pub struct WordGraphArc {
    /// State this arc leaves
    pub prev_state: u32,
    /// State this arc enters
    pub next_state: u32,
    /// Log-probability delta contributed by this arc
    pub score: f64,
    /// Target tokens produced by this arc, in order
    pub target_tokens: Vec<String>,
    /// One confidence per target token
    pub confidences: Vec<f64>,
    /// Half-open range into the graph's source tokens covered by this arc
    pub source_range: Range<usize>,
    /// Alignment between the covered source slice and the target tokens,
    /// dimensioned by the slice length × target token count
    pub alignment: WordAlignmentMatrix,
    /// One origin flag set per target token
    pub sources: Vec<TranslationSources>,
}

/// Weighted lattice of candidate translations for one source segment
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WordGraph {
    /// Source-language tokens, in order
    pub source_tokens: Vec<String>,
    /// Log-probability of the start state
    pub initial_state_score: f64,
    /// Terminating state ids
    pub final_states: HashSet<u32>,
    /// Arcs, in wire order
    pub arcs: Vec<WordGraphArc>,
}

impl WordGraph {
    /// True when the graph carries no tokens and no arcs — the degraded
    /// value returned when the remote engine cannot serve a request
    pub fn is_empty(&self) -> bool {
        self.source_tokens.is_empty() && self.arcs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sources_or_merge_accumulates_flags() {
        let mut sources = TranslationSources::NONE;
        sources |= TranslationSources::SMT;
        sources |= TranslationSources::PREFIX;
        assert!(sources.contains(TranslationSources::SMT));
        assert!(sources.contains(TranslationSources::PREFIX));
        assert!(!sources.contains(TranslationSources::TRANSFER));
        assert!(TranslationSources::NONE.is_empty());
    }

    #[test]
    fn or_with_none_is_identity() {
        let smt = TranslationSources::SMT;
        assert_eq!(smt | TranslationSources::NONE, smt);
    }

    #[test]
    fn matrix_reads_are_total() {
        let matrix = WordAlignmentMatrix::from_pairs(2, 3, [(0, 0), (1, 2)]);
        assert!(matrix.get(0, 0));
        assert!(matrix.get(1, 2));
        assert!(!matrix.get(0, 1));
        // Out-of-range reads are false, not panics
        assert!(!matrix.get(5, 0));
        assert!(!matrix.get(0, 9));
    }

    #[test]
    fn matrix_ignores_out_of_range_pairs() {
        let matrix = WordAlignmentMatrix::from_pairs(2, 2, [(0, 1), (7, 7)]);
        assert_eq!(matrix.aligned_pairs(), vec![(0, 1)]);
    }

    #[test]
    fn empty_graph_is_empty() {
        assert!(WordGraph::default().is_empty());
    }
}
