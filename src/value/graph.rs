//! Graph-shaped `Value` variants: vertices, edges and paths, each with
//! identity-based equality (§3 EXPANDED) independent of their property
//! payload.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::Value;

/// A vertex id. Kept as a `Value` rather than a bare `String`/`i64` since
/// the graph language allows either string or integer vids depending on
/// space configuration.
pub type Vid = Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    pub vid: Vid,
    /// tag name -> (property name -> value)
    pub tags: BTreeMap<String, BTreeMap<String, Value>>,
}

impl Vertex {
    pub fn new(vid: impl Into<String>) -> Self {
        Vertex { vid: Value::String(vid.into()), tags: BTreeMap::new() }
    }

    pub fn with_vid(vid: Vid) -> Self {
        Vertex { vid, tags: BTreeMap::new() }
    }

    pub fn tag_prop(&self, tag: &str, prop: &str) -> Value {
        self.tags
            .get(tag)
            .and_then(|props| props.get(prop))
            .cloned()
            .unwrap_or(Value::Null)
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.vid)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub src: Vid,
    pub dst: Vid,
    pub edge_type: String,
    /// Disambiguates parallel edges of the same type between the same
    /// pair of vertices.
    pub rank: i64,
    pub props: BTreeMap<String, Value>,
}

impl Edge {
    pub fn new(src: Vid, dst: Vid, edge_type: impl Into<String>) -> Self {
        Edge { src, dst, edge_type: edge_type.into(), rank: 0, props: BTreeMap::new() }
    }

    /// The reversed edge, used when a backward traversal direction needs
    /// to present an edge as though walked the other way.
    pub fn reversed(&self) -> Edge {
        Edge {
            src: self.dst.clone(),
            dst: self.src.clone(),
            edge_type: format!("-{}", self.edge_type),
            rank: self.rank,
            props: self.props.clone(),
        }
    }

    pub fn prop(&self, name: &str) -> Value {
        self.props.get(name).cloned().unwrap_or(Value::Null)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})-[{}]->({})", self.src, self.edge_type, self.dst)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Path {
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
}

impl Path {
    pub fn single(v: Vertex) -> Self {
        Path { vertices: vec![v], edges: Vec::new() }
    }

    pub fn length(&self) -> usize {
        self.edges.len()
    }

    /// Append one hop. The caller is responsible for ensuring `edge.src`
    /// matches the path's current tail vertex.
    pub fn extend(&mut self, edge: Edge, next: Vertex) {
        self.edges.push(edge);
        self.vertices.push(next);
    }

    pub fn contains_vertex(&self, vid: &Vid) -> bool {
        self.vertices.iter().any(|v| v.vid.value_eq(vid))
    }

    pub fn contains_edge(&self, edge: &Edge) -> bool {
        self.edges
            .iter()
            .any(|e| e.src.value_eq(&edge.src) && e.dst.value_eq(&edge.dst) && e.edge_type == edge.edge_type)
    }

    /// Reverse a path walked backward from destination to source so it
    /// can be concatenated onto a forward half (used by `ConjunctPath`
    /// and `AllPaths`, §4.7).
    pub fn reversed(&self) -> Path {
        let mut vertices = self.vertices.clone();
        vertices.reverse();
        let edges = self.edges.iter().rev().map(Edge::reversed).collect();
        Path { vertices, edges }
    }

    /// Concatenate two paths that share their meeting vertex (`self`'s
    /// last vertex == `other`'s first vertex).
    pub fn concat(&self, other: &Path) -> Path {
        let mut vertices = self.vertices.clone();
        vertices.extend(other.vertices.iter().skip(1).cloned());
        let mut edges = self.edges.clone();
        edges.extend(other.edges.iter().cloned());
        Path { vertices, edges }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.vertices.iter().enumerate() {
            if i > 0 {
                write!(f, "-[{}]->", self.edges[i - 1].edge_type)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_reversed_swaps_vertex_order_and_edge_direction() {
        let mut p = Path::single(Vertex::new("A"));
        p.extend(Edge::new(Value::String("A".into()), Value::String("B".into()), "like"), Vertex::new("B"));
        let r = p.reversed();
        assert_eq!(r.vertices[0].vid, Value::String("B".into()));
        assert_eq!(r.edges[0].src, Value::String("B".into()));
    }

    #[test]
    fn concat_joins_on_shared_meeting_vertex() {
        let mut left = Path::single(Vertex::new("A"));
        left.extend(Edge::new(Value::String("A".into()), Value::String("B".into()), "like"), Vertex::new("B"));
        let right = Path::single(Vertex::new("B"));
        let joined = left.concat(&right);
        assert_eq!(joined.vertices.len(), 2);
        assert_eq!(joined.length(), 1);
    }
}
