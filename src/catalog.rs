//! Synchronous schema catalog: a read-only snapshot of tag/edge schema,
//! refreshed from the [`crate::rpc::MetadataClient`] outside the
//! validation path.
//!
//! §5 ("Metadata client cache: many readers, refreshed asynchronously by
//! the client itself; the execution core only reads") describes the
//! metadata client as owning its own cache. Validators (§4.4) need
//! synchronous schema lookups mid-validation, so the driver (C9)
//! populates a `Catalog` from the async `MetadataClient` once per space
//! before validation begins, and every validator reads this snapshot —
//! never the client directly. See DESIGN.md for this boundary decision.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::value::ValueType;

#[derive(Debug, Clone)]
pub struct PropSchema {
    pub name: String,
    pub value_type: ValueType,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tags: HashMap<String, Vec<PropSchema>>,
    edges: HashMap<String, Vec<PropSchema>>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog::default()
    }

    pub fn register_tag(&mut self, name: impl Into<String>, props: Vec<(&str, ValueType)>) {
        let props = props
            .into_iter()
            .map(|(n, t)| PropSchema { name: n.to_string(), value_type: t })
            .collect();
        self.tags.insert(name.into(), props);
    }

    pub fn register_edge(&mut self, name: impl Into<String>, props: Vec<(&str, ValueType)>) {
        let props = props
            .into_iter()
            .map(|(n, t)| PropSchema { name: n.to_string(), value_type: t })
            .collect();
        self.edges.insert(name.into(), props);
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    pub fn has_edge(&self, name: &str) -> bool {
        self.edges.contains_key(name)
    }

    pub fn tag_props(&self, name: &str) -> Result<&[PropSchema]> {
        self.tags
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::semantic(format!("unknown tag: {name}")))
    }

    pub fn edge_props(&self, name: &str) -> Result<&[PropSchema]> {
        self.edges
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::semantic(format!("unknown edge type: {name}")))
    }

    pub fn resolve_tag_prop_type(&self, tag: &str, prop: &str) -> Result<ValueType> {
        self.tag_props(tag)?
            .iter()
            .find(|p| p.name == prop)
            .map(|p| p.value_type)
            .ok_or_else(|| Error::semantic(format!("unknown property '{prop}' on tag '{tag}'")))
    }

    pub fn resolve_edge_prop_type(&self, edge_type: &str, prop: &str) -> Result<ValueType> {
        self.edge_props(edge_type)?
            .iter()
            .find(|p| p.name == prop)
            .map(|p| p.value_type)
            .ok_or_else(|| {
                Error::semantic(format!("unknown property '{prop}' on edge type '{edge_type}'"))
            })
    }

    pub fn all_edge_types(&self) -> impl Iterator<Item = &String> {
        self.edges.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tag_is_semantic_error() {
        let cat = Catalog::new();
        assert!(cat.tag_props("player").is_err());
    }

    #[test]
    fn resolves_registered_edge_prop_type() {
        let mut cat = Catalog::new();
        cat.register_edge("like", vec![("start", ValueType::Int)]);
        assert_eq!(cat.resolve_edge_prop_type("like", "start").unwrap(), ValueType::Int);
    }

    #[test]
    fn unknown_property_on_known_tag_is_semantic_error() {
        let mut cat = Catalog::new();
        cat.register_tag("player", vec![("name", ValueType::String)]);
        assert!(cat.resolve_tag_prop_type("player", "age").is_err());
    }
}
