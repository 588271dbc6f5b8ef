//! Iterator (§3): a polymorphic cursor over a [`DataSet`] that executors
//! advance row by row. Kept distinct from a plain `Vec` index so that
//! `erase()` can remove the current row without shifting every
//! subsequent row's index — important for Filter/Dedup, which erase
//! in place while scanning forward.

use std::collections::HashSet;

use crate::value::graph::{Edge, Vertex};
use crate::value::{DataSet, Value};

/// What shape of row this iterator walks. Distinguished because
/// `get_vertex`/`get_edge`/tag- and edge-prop accessors only make sense
/// for certain shapes (§3 "Iterator (polymorphic over shape)").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IteratorShape {
    /// Plain relational rows — `Project`, `Filter`, `Sort`, joins, ...
    Sequential,
    /// Rows produced by `GetNeighbors`: each row carries a source
    /// vertex, destination vertex, and the connecting edge.
    GetNeighbors,
    /// Rows carrying bare vertex/edge property columns (`Fetch`,
    /// `IndexScan`).
    Property,
}

/// A read-only cursor over a shared [`DataSet`] (§3: "shares a read-only
/// reference to the underlying DataSet; never copies rows"). Erased rows
/// are tombstoned rather than physically removed so indices stay stable
/// across an `erase()` call mid-scan.
pub struct RowIterator<'a> {
    dataset: &'a DataSet,
    shape: IteratorShape,
    pos: usize,
    erased: HashSet<usize>,
}

impl<'a> RowIterator<'a> {
    pub fn new(dataset: &'a DataSet, shape: IteratorShape) -> Self {
        let mut it = RowIterator { dataset, shape, pos: 0, erased: HashSet::new() };
        it.skip_erased();
        it
    }

    fn skip_erased(&mut self) {
        while self.pos < self.dataset.len() && self.erased.contains(&self.pos) {
            self.pos += 1;
        }
    }

    pub fn shape(&self) -> IteratorShape {
        self.shape
    }

    /// `valid()`: true while there is an un-erased row left to read.
    pub fn valid(&self) -> bool {
        self.pos < self.dataset.len()
    }

    /// `next()`: advance past the current row, skipping any erased ones.
    pub fn next(&mut self) {
        if self.pos < self.dataset.len() {
            self.pos += 1;
        }
        self.skip_erased();
    }

    /// `reset()`: rewind to the first un-erased row.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.skip_erased();
    }

    /// `erase()`: tombstone the current row without shifting indices;
    /// the cursor itself advances to the next valid row.
    pub fn erase(&mut self) {
        if self.pos < self.dataset.len() {
            self.erased.insert(self.pos);
        }
        self.next();
    }

    /// `size()`: number of un-erased rows remaining from here onward.
    pub fn size(&self) -> usize {
        (self.pos..self.dataset.len()).filter(|i| !self.erased.contains(i)).count()
    }

    pub fn get_column(&self, name: &str) -> Option<&Value> {
        if !self.valid() {
            return None;
        }
        let idx = self.dataset.column_index(name)?;
        self.dataset.rows.get(self.pos).and_then(|row| row.get(idx))
    }

    pub fn get_vertex(&self, column: &str) -> Option<&Vertex> {
        match self.get_column(column)? {
            Value::Vertex(v) => Some(v.as_ref()),
            _ => None,
        }
    }

    pub fn get_edge(&self, column: &str) -> Option<&Edge> {
        match self.get_column(column)? {
            Value::Edge(e) => Some(e.as_ref()),
            _ => None,
        }
    }

    pub fn get_tag_prop(&self, vertex_column: &str, prop: &str) -> Option<&Value> {
        self.get_vertex(vertex_column)?.tags.values().find_map(|props| props.get(prop))
    }

    pub fn get_edge_prop(&self, edge_column: &str, prop: &str) -> Option<&Value> {
        self.get_edge(edge_column)?.props.get(prop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::DataSet;

    fn sample() -> DataSet {
        let mut ds = DataSet::new(vec!["a".into()]);
        ds.push_row(vec![Value::Int(1)]);
        ds.push_row(vec![Value::Int(2)]);
        ds.push_row(vec![Value::Int(3)]);
        ds
    }

    #[test]
    fn erase_skips_row_without_shifting_subsequent_indices() {
        let ds = sample();
        let mut it = RowIterator::new(&ds, IteratorShape::Sequential);
        assert_eq!(it.get_column("a"), Some(&Value::Int(1)));
        it.erase();
        assert_eq!(it.get_column("a"), Some(&Value::Int(2)));
        assert_eq!(it.size(), 2);
    }

    #[test]
    fn reset_returns_to_first_unerased_row() {
        let ds = sample();
        let mut it = RowIterator::new(&ds, IteratorShape::Sequential);
        it.erase();
        it.next();
        it.reset();
        assert_eq!(it.get_column("a"), Some(&Value::Int(2)));
    }
}
