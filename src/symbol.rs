//! Symbol table & variable registry (C1, §4.1).
//!
//! Names the dataflow slot a [`crate::plan::PlanNode`] writes into and
//! tracks who reads it. The table itself never touches [`Result`]
//! payloads — storage of the actual `DataSet` history lives in
//! [`crate::query::ExecutionContext`], which is keyed by the same
//! variable names this module hands out.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::plan::PlanNodeId;

/// A named, versioned dataflow slot (§3 "Variable"). The table only
/// records *identity and wiring*; the value history itself is owned by
/// `ExecutionContext` so that re-running a plan (e.g. inside a `Loop`
/// body) doesn't require rebuilding the symbol table.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    producer: Option<PlanNodeId>,
    readers: HashSet<PlanNodeId>,
    /// Set by the lifetime-analysis pass (§4.8): when true, the producer
    /// may overwrite rather than append each new `Result` version.
    pub in_place: bool,
}

impl Variable {
    fn new(name: String) -> Self {
        Variable { name, producer: None, readers: HashSet::new(), in_place: false }
    }

    pub fn producer(&self) -> Option<PlanNodeId> {
        self.producer
    }

    pub fn readers(&self) -> impl Iterator<Item = &PlanNodeId> {
        self.readers.iter()
    }

    pub fn last_user(&self) -> Option<PlanNodeId> {
        self.readers.iter().copied().max()
    }
}

/// Maps variable name → `Variable` and plan-node id → node name, per
/// §4.1. Node bodies themselves are owned by `ExecutionPlan`; this table
/// only needs the id for wiring checks (I1-I3).
#[derive(Debug, Default)]
pub struct SymbolTable {
    variables: HashMap<String, Variable>,
    anon_counter: u64,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// `new_variable(name?)`: auto-generates `__<kind>_<id>` when `name`
    /// is `None`; fails if the name already exists (a statement may not
    /// shadow a variable within one plan).
    pub fn new_variable(&mut self, name: Option<String>, kind: &str) -> Result<String> {
        let name = name.unwrap_or_else(|| {
            self.anon_counter += 1;
            format!("__{kind}_{}", self.anon_counter)
        });
        if self.variables.contains_key(&name) {
            return Err(Error::semantic(format!("variable already defined: {name}")));
        }
        self.variables.insert(name.clone(), Variable::new(name.clone()));
        Ok(name)
    }

    pub fn get_var(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn resolve(&self, name: &str) -> Result<&Variable> {
        self.variables
            .get(name)
            .ok_or_else(|| Error::semantic(format!("unknown variable: {name}")))
    }

    /// `bind_producer`: at most one producer per variable (I1); re-bind
    /// permitted only before any read has been recorded.
    pub fn bind_producer(&mut self, var: &str, node: PlanNodeId) -> Result<()> {
        let v = self
            .variables
            .get_mut(var)
            .ok_or_else(|| Error::semantic(format!("unknown variable: {var}")))?;
        if let Some(existing) = v.producer {
            if existing != node && !v.readers.is_empty() {
                return Err(Error::semantic(format!(
                    "variable {var} already has a producer and has been read"
                )));
            }
        }
        v.producer = Some(node);
        Ok(())
    }

    /// `bind_reader`: many-to-many (I2: readers form a set, no dups).
    pub fn bind_reader(&mut self, var: &str, node: PlanNodeId) -> Result<()> {
        let v = self
            .variables
            .get_mut(var)
            .ok_or_else(|| Error::semantic(format!("unknown variable: {var}")))?;
        v.readers.insert(node);
        Ok(())
    }

    /// Transitive readers of `var`: readers of `var`, plus readers of
    /// whatever those readers produce, and so on. Used by the lifetime
    /// analysis (§4.8) to decide in-place eligibility.
    pub fn derivatives(&self, var: &str) -> HashSet<PlanNodeId> {
        let mut seen = HashSet::new();
        let mut stack: Vec<&str> = vec![var];
        while let Some(v) = stack.pop() {
            if let Some(variable) = self.variables.get(v) {
                for r in &variable.readers {
                    seen.insert(*r);
                }
            }
        }
        seen
    }

    pub fn mark_in_place(&mut self, var: &str, in_place: bool) {
        if let Some(v) = self.variables.get_mut(var) {
            v.in_place = in_place;
        }
    }

    pub fn all_variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_variable_autogenerates_anonymous_name() {
        let mut st = SymbolTable::new();
        let a = st.new_variable(None, "GetNeighbors").unwrap();
        let b = st.new_variable(None, "GetNeighbors").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("__GetNeighbors_"));
    }

    #[test]
    fn duplicate_user_variable_name_rejected() {
        let mut st = SymbolTable::new();
        st.new_variable(Some("x".into()), "Project").unwrap();
        let err = st.new_variable(Some("x".into()), "Project").unwrap_err();
        assert!(matches!(err, Error::Semantic { .. }));
    }

    #[test]
    fn resolve_unknown_variable_is_semantic_error() {
        let st = SymbolTable::new();
        assert!(st.resolve("nope").is_err());
    }

    #[test]
    fn bind_reader_many_to_many_dedups() {
        let mut st = SymbolTable::new();
        let x = st.new_variable(Some("x".into()), "Project").unwrap();
        st.bind_reader(&x, PlanNodeId(1)).unwrap();
        st.bind_reader(&x, PlanNodeId(1)).unwrap();
        st.bind_reader(&x, PlanNodeId(2)).unwrap();
        assert_eq!(st.get_var(&x).unwrap().readers().count(), 2);
    }
}
