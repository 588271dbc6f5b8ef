//! Path-producing operators (§4.7): `BfsShortestPath`, `ProduceAllPaths`,
//! `ProduceSemiShortestPath`, `ConjunctPath`. These walk the storage
//! layer directly (except `ConjunctPath`, which only stitches together
//! paths its inputs already produced).

use std::collections::HashMap;

use crate::context::{ExpressionContext, RowContext, VariableResolver};
use crate::error::{Error, Result};
use crate::plan::{
    BfsShortestPathNode, ConjunctKind, ConjunctPathNode, ProduceAllPathsNode, ProduceSemiShortestPathNode,
};
use crate::rpc::StorageClient;
use crate::value::graph::{Edge, Path, Vertex};
use crate::value::{DataSet, Value};

/// Hard cap on hops explored by the weighted semi-shortest search when
/// the node carries no explicit step bound.
const MAX_SEMI_SHORTEST_HOPS: u32 = 64;

struct NoVars;
impl VariableResolver for NoVars {
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

fn eval_const(expr: &crate::expr::Expression) -> Result<Value> {
    let empty = DataSet::new(vec![]);
    let ctx = RowContext::new(&empty, 0, &NoVars);
    expr.eval(&ctx)
}

pub async fn bfs_shortest_path(
    node: &BfsShortestPathNode,
    space: &str,
    storage: &dyn StorageClient,
) -> Result<DataSet> {
    let from = eval_const(&node.from)?;
    let to = eval_const(&node.to)?;
    let mut ds = DataSet::new(node.base.col_names.clone());

    if from.value_eq(&to) {
        ds.push_row(vec![Value::Path(Box::new(Path::single(Vertex::with_vid(from))))]);
        return Ok(ds);
    }

    let mut predecessor: HashMap<String, (Value, Edge)> = HashMap::new();
    let mut frontier = vec![from.clone()];
    let mut seen: Vec<Value> = vec![from.clone()];

    for _ in 0..node.steps.max(1) {
        if frontier.is_empty() {
            break;
        }
        let resp = storage.get_neighbors(space, &frontier, &node.edge_types, node.direction).await?;
        let mut next_frontier = Vec::new();
        'outer: for part in &resp.responses {
            for vid in &frontier {
                let Some(bundle) = part.edges_by_src.get(&vid.to_string()) else { continue };
                for (edge, _dst) in bundle {
                    if seen.iter().any(|v| v.value_eq(&edge.dst)) {
                        continue;
                    }
                    predecessor.insert(edge.dst.to_string(), (vid.clone(), edge.clone()));
                    seen.push(edge.dst.clone());
                    if edge.dst.value_eq(&to) {
                        break 'outer;
                    }
                    next_frontier.push(edge.dst.clone());
                }
            }
        }
        if predecessor.contains_key(&to.to_string()) {
            break;
        }
        frontier = next_frontier;
    }

    if let Some(path) = reconstruct(&from, &to, &predecessor) {
        ds.push_row(vec![Value::Path(Box::new(path))]);
    }
    Ok(ds)
}

fn reconstruct(from: &Value, to: &Value, predecessor: &HashMap<String, (Value, Edge)>) -> Option<Path> {
    let mut edges = Vec::new();
    let mut cur = to.clone();
    while !cur.value_eq(from) {
        let (prev, edge) = predecessor.get(&cur.to_string())?;
        edges.push(edge.clone());
        cur = prev.clone();
    }
    edges.reverse();
    let mut path = Path::single(Vertex::with_vid(from.clone()));
    for edge in edges {
        let next = Vertex::with_vid(edge.dst.clone());
        path.extend(edge, next);
    }
    Some(path)
}

pub async fn produce_all_paths(
    node: &ProduceAllPathsNode,
    inputs: &[DataSet],
    space: &str,
    storage: &dyn StorageClient,
) -> Result<DataSet> {
    let sources = inputs.first().ok_or_else(|| Error::execution("ProduceAllPaths missing source input"))?;
    let targets = inputs.get(1).ok_or_else(|| Error::execution("ProduceAllPaths missing target input"))?;
    let target_vids: Vec<Value> = targets.rows.iter().filter_map(|r| r.first().cloned()).collect();

    let mut frontier: Vec<Path> = sources
        .rows
        .iter()
        .filter_map(|r| r.first().cloned())
        .map(|v| Path::single(Vertex::with_vid(v)))
        .collect();
    let mut found = Vec::new();

    for _ in 0..node.steps.max(1) {
        if frontier.is_empty() {
            break;
        }
        let tails: Vec<Value> = frontier.iter().map(|p| p.vertices.last().unwrap().vid.clone()).collect();
        let resp = storage.get_neighbors(space, &tails, &[], crate::plan::Direction::Out).await?;
        let mut next_frontier = Vec::new();
        for part in &resp.responses {
            for path in &frontier {
                let tail = &path.vertices.last().unwrap().vid;
                let Some(bundle) = part.edges_by_src.get(&tail.to_string()) else { continue };
                for (edge, _dst) in bundle {
                    if node.no_loop && path.contains_vertex(&edge.dst) {
                        continue;
                    }
                    let mut extended = Path {
                        vertices: path.vertices.clone(),
                        edges: path.edges.clone(),
                    };
                    extended.extend(edge.clone(), Vertex::with_vid(edge.dst.clone()));
                    if target_vids.iter().any(|t| t.value_eq(&edge.dst)) {
                        found.push(extended.clone());
                    }
                    next_frontier.push(extended);
                }
            }
        }
        frontier = next_frontier;
    }

    let mut ds = DataSet::new(node.base.col_names.clone());
    for path in found {
        ds.push_row(vec![Value::Path(Box::new(path))]);
    }
    Ok(ds)
}

pub async fn produce_semi_shortest_path(
    node: &ProduceSemiShortestPathNode,
    inputs: &[DataSet],
    space: &str,
    storage: &dyn StorageClient,
) -> Result<DataSet> {
    let sources = inputs.first().ok_or_else(|| Error::execution("ProduceSemiShortestPath missing source input"))?;
    let targets = inputs.get(1).ok_or_else(|| Error::execution("ProduceSemiShortestPath missing target input"))?;
    let target_vids: Vec<Value> = targets.rows.iter().filter_map(|r| r.first().cloned()).collect();

    let mut ds = DataSet::new(node.base.col_names.clone());
    for source_row in &sources.rows {
        let Some(source) = source_row.first().cloned() else { continue };
        let mut best_cost: HashMap<String, f64> = HashMap::new();
        let mut predecessor: HashMap<String, (Value, Edge)> = HashMap::new();
        best_cost.insert(source.to_string(), 0.0);
        let mut frontier = vec![source.clone()];

        for _ in 0..MAX_SEMI_SHORTEST_HOPS {
            if frontier.is_empty() {
                break;
            }
            let resp = storage.get_neighbors(space, &frontier, &[], crate::plan::Direction::Out).await?;
            let mut next_frontier = Vec::new();
            for part in &resp.responses {
                for vid in &frontier {
                    let Some(bundle) = part.edges_by_src.get(&vid.to_string()) else { continue };
                    let cur_cost = *best_cost.get(&vid.to_string()).unwrap_or(&0.0);
                    for (edge, _dst) in bundle {
                        let weight = node
                            .weight_prop
                            .as_ref()
                            .and_then(|p| match edge.prop(p) {
                                Value::Int(i) => Some(i as f64),
                                Value::Float(f) => Some(f.0),
                                _ => None,
                            })
                            .unwrap_or(1.0);
                        let candidate = cur_cost + weight;
                        let key = edge.dst.to_string();
                        if candidate < *best_cost.get(&key).unwrap_or(&f64::INFINITY) {
                            best_cost.insert(key.clone(), candidate);
                            predecessor.insert(key, (vid.clone(), edge.clone()));
                            next_frontier.push(edge.dst.clone());
                        }
                    }
                }
            }
            frontier = next_frontier;
        }

        for target in &target_vids {
            if let Some(path) = reconstruct(&source, target, &predecessor) {
                ds.push_row(vec![Value::Path(Box::new(path))]);
            }
        }
    }
    Ok(ds)
}

/// Stitches two half-paths together at their shared meeting vertex
/// (§4.7). `Floyd` is treated the same as `BiBfs` here: this crate does
/// not run a full all-pairs Floyd-Warshall, only pairwise meet-in-the-
/// middle concatenation (see DESIGN.md).
pub fn conjunct_path(node: &ConjunctPathNode, inputs: &[DataSet]) -> Result<DataSet> {
    let left = inputs.first().ok_or_else(|| Error::execution("ConjunctPath missing left input"))?;
    let right = inputs.get(1).ok_or_else(|| Error::execution("ConjunctPath missing right input"))?;
    let mut ds = DataSet::new(node.base.col_names.clone());
    let _ = node.kind == ConjunctKind::AllPaths;

    for lrow in &left.rows {
        let Some(Value::Path(lp)) = lrow.first() else { continue };
        for rrow in &right.rows {
            let Some(Value::Path(rp)) = rrow.first() else { continue };
            let rp_forward = rp.reversed();
            if let Some(meet) = lp.vertices.last() {
                if rp_forward.vertices.first().is_some_and(|v| v.vid.value_eq(&meet.vid)) {
                    let joined = lp.concat(&rp_forward);
                    ds.push_row(vec![Value::Path(Box::new(joined))]);
                }
            }
        }
    }
    Ok(ds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconstruct_builds_path_from_predecessor_chain() {
        let a = Value::String("A".into());
        let b = Value::String("B".into());
        let c = Value::String("C".into());
        let mut predecessor = HashMap::new();
        predecessor.insert("B".to_string(), (a.clone(), Edge::new(a.clone(), b.clone(), "like")));
        predecessor.insert("C".to_string(), (b.clone(), Edge::new(b.clone(), c.clone(), "like")));
        let path = reconstruct(&a, &c, &predecessor).unwrap();
        assert_eq!(path.length(), 2);
        assert_eq!(path.vertices[0].vid, a);
        assert_eq!(path.vertices[2].vid, c);
    }
}
