//! Expression evaluation contexts (C2, §4.2).
//!
//! `ExpressionContext` is the single trait every expression sees; the
//! three concrete implementations below differ only in how `src_prop`/
//! `dst_prop`/`edge_prop` resolve and how the cursor advances, per the
//! Design Note collapsing the source's per-iterator-kind subclasses into
//! one trait (§9).

use crate::error::{Error, Result};
use crate::value::{DataSet, Edge, Value, Vertex};

/// Resolves named-variable references (`var`/`versioned_var`/`var_prop`)
/// against the execution context's variable history. Implemented by
/// [`crate::query::ExecutionContext`]; kept as a trait here so `context`
/// does not depend on `query`.
pub trait VariableResolver {
    fn latest(&self, name: &str) -> Option<Value>;
    /// `v <= 0`: offset from newest (0 = newest); `v > 0`: index from
    /// oldest (1 = oldest). Out-of-range returns `None` (caller maps to
    /// `Value::Empty`, preserving the source's documented edge case at
    /// `|version| == history.len()`, §9 Open Question a).
    fn versioned(&self, name: &str, v: i64) -> Option<Value>;
    /// Column `prop` of the variable's latest dataset. Variables read via
    /// `$var.prop` are expected to carry a single row (e.g. the output of
    /// an Aggregate collapsing a pipe); with more than one row the first
    /// is used (see DESIGN.md).
    fn var_prop(&self, name: &str, prop: &str) -> Option<Value>;
}

/// The trait every `Expression` evaluates against (§4.2). Implementors
/// own a cursor over one logical row; advancing the cursor rebinds every
/// accessor without allocation.
pub trait ExpressionContext {
    fn var(&self, name: &str) -> Result<Value>;
    fn versioned_var(&self, name: &str, v: i64) -> Result<Value>;
    fn var_prop(&self, name: &str, prop: &str) -> Result<Value>;
    fn input_prop(&self, prop: &str) -> Value;
    fn src_prop(&self, tag: &str, prop: &str) -> Value;
    fn dst_prop(&self, tag: &str, prop: &str) -> Value;
    fn edge_prop(&self, edge_type: &str, prop: &str) -> Value;
}

fn resolve_var(resolver: &dyn VariableResolver, name: &str) -> Result<Value> {
    resolver
        .latest(name)
        .ok_or_else(|| Error::execution(format!("unbound variable: {name}")))
}

fn resolve_versioned(resolver: &dyn VariableResolver, name: &str, v: i64) -> Result<Value> {
    Ok(resolver.versioned(name, v).unwrap_or(Value::Empty))
}

fn resolve_var_prop(resolver: &dyn VariableResolver, name: &str, prop: &str) -> Result<Value> {
    Ok(resolver.var_prop(name, prop).unwrap_or(Value::Null))
}

/// Sequential / Aggregate context: a plain row cursor over a `DataSet`.
/// Used by Filter, Project, Sort keys, and per-row aggregate evaluation —
/// anything that only needs `input_prop` and named-variable references.
pub struct RowContext<'a> {
    dataset: &'a DataSet,
    row: usize,
    resolver: &'a dyn VariableResolver,
}

impl<'a> RowContext<'a> {
    pub fn new(dataset: &'a DataSet, row: usize, resolver: &'a dyn VariableResolver) -> Self {
        RowContext { dataset, row, resolver }
    }

    pub fn at(&self, row: usize) -> RowContext<'a> {
        RowContext { dataset: self.dataset, row, resolver: self.resolver }
    }
}

impl ExpressionContext for RowContext<'_> {
    fn var(&self, name: &str) -> Result<Value> {
        resolve_var(self.resolver, name)
    }
    fn versioned_var(&self, name: &str, v: i64) -> Result<Value> {
        resolve_versioned(self.resolver, name, v)
    }
    fn var_prop(&self, name: &str, prop: &str) -> Result<Value> {
        resolve_var_prop(self.resolver, name, prop)
    }
    fn input_prop(&self, prop: &str) -> Value {
        match self.dataset.column_index(prop) {
            Some(idx) => self
                .dataset
                .rows
                .get(self.row)
                .and_then(|r| r.get(idx))
                .cloned()
                .unwrap_or(Value::Null),
            None => Value::Null,
        }
    }
    fn src_prop(&self, _tag: &str, _prop: &str) -> Value {
        Value::Null
    }
    fn dst_prop(&self, _tag: &str, _prop: &str) -> Value {
        Value::Null
    }
    fn edge_prop(&self, _edge_type: &str, _prop: &str) -> Value {
        Value::Null
    }
}

/// GetNeighbors context: one logical row = (source vertex, one edge).
/// `src_prop`/`dst_prop`/`edge_prop` resolve against the live
/// vertex/edge pair rather than a flattened `DataSet` column.
pub struct GetNeighborsContext<'a> {
    src: &'a Vertex,
    dst: Option<&'a Vertex>,
    edge: &'a Edge,
    resolver: &'a dyn VariableResolver,
}

impl<'a> GetNeighborsContext<'a> {
    pub fn new(
        src: &'a Vertex,
        dst: Option<&'a Vertex>,
        edge: &'a Edge,
        resolver: &'a dyn VariableResolver,
    ) -> Self {
        GetNeighborsContext { src, dst, edge, resolver }
    }
}

impl ExpressionContext for GetNeighborsContext<'_> {
    fn var(&self, name: &str) -> Result<Value> {
        resolve_var(self.resolver, name)
    }
    fn versioned_var(&self, name: &str, v: i64) -> Result<Value> {
        resolve_versioned(self.resolver, name, v)
    }
    fn var_prop(&self, name: &str, prop: &str) -> Result<Value> {
        resolve_var_prop(self.resolver, name, prop)
    }
    fn input_prop(&self, prop: &str) -> Value {
        match prop {
            "_dst" => self.edge.dst.clone(),
            "_src" => self.edge.src.clone(),
            "_type" => Value::String(self.edge.edge_type.clone()),
            "_rank" => Value::Int(self.edge.rank),
            _ => self.edge.prop(prop),
        }
    }
    fn src_prop(&self, tag: &str, prop: &str) -> Value {
        self.src.tag_prop(tag, prop)
    }
    fn dst_prop(&self, tag: &str, prop: &str) -> Value {
        self.dst.map(|v| v.tag_prop(tag, prop)).unwrap_or(Value::Null)
    }
    fn edge_prop(&self, _edge_type: &str, prop: &str) -> Value {
        self.edge.prop(prop)
    }
}

/// Property context: one logical row = one vertex or edge property
/// record, used by `GetVertices`/`GetEdges`/`IndexScan`.
pub enum PropertySubject<'a> {
    Vertex(&'a Vertex),
    Edge(&'a Edge),
}

pub struct PropertyContext<'a> {
    subject: PropertySubject<'a>,
    resolver: &'a dyn VariableResolver,
}

impl<'a> PropertyContext<'a> {
    pub fn new(subject: PropertySubject<'a>, resolver: &'a dyn VariableResolver) -> Self {
        PropertyContext { subject, resolver }
    }
}

impl ExpressionContext for PropertyContext<'_> {
    fn var(&self, name: &str) -> Result<Value> {
        resolve_var(self.resolver, name)
    }
    fn versioned_var(&self, name: &str, v: i64) -> Result<Value> {
        resolve_versioned(self.resolver, name, v)
    }
    fn var_prop(&self, name: &str, prop: &str) -> Result<Value> {
        resolve_var_prop(self.resolver, name, prop)
    }
    fn input_prop(&self, prop: &str) -> Value {
        match &self.subject {
            PropertySubject::Vertex(v) => {
                if prop == "_vid" {
                    v.vid.clone()
                } else {
                    Value::Null
                }
            }
            PropertySubject::Edge(e) => e.prop(prop),
        }
    }
    fn src_prop(&self, tag: &str, prop: &str) -> Value {
        match &self.subject {
            PropertySubject::Vertex(v) => v.tag_prop(tag, prop),
            PropertySubject::Edge(_) => Value::Null,
        }
    }
    fn dst_prop(&self, _tag: &str, _prop: &str) -> Value {
        Value::Null
    }
    fn edge_prop(&self, _edge_type: &str, prop: &str) -> Value {
        match &self.subject {
            PropertySubject::Edge(e) => e.prop(prop),
            PropertySubject::Vertex(_) => Value::Null,
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;

    pub struct NullResolver;
    impl VariableResolver for NullResolver {
        fn latest(&self, _name: &str) -> Option<Value> {
            None
        }
        fn versioned(&self, _name: &str, _v: i64) -> Option<Value> {
            None
        }
        fn var_prop(&self, _name: &str, _prop: &str) -> Option<Value> {
            None
        }
    }

    pub struct MapResolver(pub HashMap<String, Value>);
    impl VariableResolver for MapResolver {
        fn latest(&self, name: &str) -> Option<Value> {
            self.0.get(name).cloned()
        }
        fn versioned(&self, name: &str, _v: i64) -> Option<Value> {
            self.0.get(name).cloned()
        }
        fn var_prop(&self, _name: &str, _prop: &str) -> Option<Value> {
            None
        }
    }

    /// Test helper: a `RowContext` over a one-column-per-value row with
    /// no variable bindings, used by `expr`'s unit tests.
    pub fn row_context(_values: Vec<Value>) -> OwnedRowContext {
        OwnedRowContext { dataset: DataSet::new(vec![]), resolver: NullResolver }
    }

    pub struct OwnedRowContext {
        dataset: DataSet,
        resolver: NullResolver,
    }

    impl ExpressionContext for OwnedRowContext {
        fn var(&self, name: &str) -> Result<Value> {
            resolve_var(&self.resolver, name)
        }
        fn versioned_var(&self, name: &str, v: i64) -> Result<Value> {
            resolve_versioned(&self.resolver, name, v)
        }
        fn var_prop(&self, name: &str, prop: &str) -> Result<Value> {
            resolve_var_prop(&self.resolver, name, prop)
        }
        fn input_prop(&self, prop: &str) -> Value {
            RowContext::new(&self.dataset, 0, &self.resolver).input_prop(prop)
        }
        fn src_prop(&self, _tag: &str, _prop: &str) -> Value {
            Value::Null
        }
        fn dst_prop(&self, _tag: &str, _prop: &str) -> Value {
            Value::Null
        }
        fn edge_prop(&self, _edge_type: &str, _prop: &str) -> Value {
            Value::Null
        }
    }

    #[test]
    fn row_context_reads_named_column() {
        let ds = DataSet::with_rows(
            vec!["col0".into(), "col1".into()],
            vec![vec![Value::Int(1), Value::Int(2)]],
        );
        let resolver = NullResolver;
        let ctx = RowContext::new(&ds, 0, &resolver);
        assert_eq!(ctx.input_prop("col1"), Value::Int(2));
        assert_eq!(ctx.input_prop("missing"), Value::Null);
    }

    #[test]
    fn get_neighbors_context_resolves_edge_meta_columns() {
        let src = Vertex::new("A");
        let dst = Vertex::new("B");
        let edge = Edge::new(Value::String("A".into()), Value::String("B".into()), "like");
        let resolver = NullResolver;
        let ctx = GetNeighborsContext::new(&src, Some(&dst), &edge, &resolver);
        assert_eq!(ctx.input_prop("_dst"), Value::String("B".into()));
        assert_eq!(ctx.input_prop("_type"), Value::String("like".into()));
    }
}
