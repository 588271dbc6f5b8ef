//! Scan operators (§4.7): nodes that read from the storage layer or seed
//! a fresh column of literal values (`Start`).

use crate::context::{ExpressionContext, GetNeighborsContext, PropertyContext, PropertySubject, VariableResolver};
use crate::error::{Error, Result};
use crate::plan::{GetEdgesNode, GetNeighborsNode, GetVerticesNode, IndexScanNode, StartNode, SubgraphNode};
use crate::rpc::StorageClient;
use crate::value::graph::{Edge, Vertex};
use crate::value::{DataSet, Value};

use super::relational;

/// No named-variable references resolve inside a single executor step —
/// everything an operator needs beyond its own input columns is baked
/// into the expression at validation time (`Var`/`VarProp` only appear
/// ahead of a pipe boundary, which the planner already resolved into a
/// `PassThrough`/`Project` reading the producing operator's columns).
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

pub fn start(node: &StartNode) -> Result<DataSet> {
    let resolver = NoVars;
    let empty = DataSet::new(vec![]);
    let rctx = crate::context::RowContext::new(&empty, 0, &resolver);
    let mut ds = DataSet::new(node.base.col_names.clone());
    for seed in &node.seeds {
        ds.push_row(vec![seed.eval(&rctx)?]);
    }
    Ok(ds)
}

pub async fn get_neighbors(
    node: &GetNeighborsNode,
    inputs: &[DataSet],
    space: &str,
    storage: &dyn StorageClient,
) -> Result<DataSet> {
    let input = inputs.first().ok_or_else(|| Error::execution("GetNeighbors has no input"))?;
    let resolver = NoVars;
    let mut vids = Vec::with_capacity(input.len());
    for i in 0..input.len() {
        let rctx = crate::context::RowContext::new(input, i, &resolver);
        vids.push(node.src_expr.eval(&rctx)?);
    }

    let mut ds = DataSet::new(node.base.col_names.clone());
    if vids.is_empty() {
        return Ok(ds);
    }

    let resp = storage
        .get_neighbors(space, &vids, &node.edge_types, node.direction)
        .await?;
    for part in &resp.responses {
        for vid in &vids {
            let key = vid.to_string();
            let Some(bundle) = part.edges_by_src.get(&key) else { continue };
            for (edge, dst) in bundle {
                let src_vertex = Vertex::with_vid(edge.src.clone());
                let row = build_neighbor_row(node, edge, dst.as_ref(), &src_vertex)?;
                ds.push_row(row);
            }
        }
    }

    if let Some(pred) = &node.filter {
        keep_rows_matching(&mut ds, pred)?;
    }
    if node.dedup {
        relational::dedup_in_place(&mut ds);
    }
    if !node.order_by.is_empty() {
        relational::sort_in_place(&mut ds, &node.order_by)?;
    }
    if let Some(limit) = node.limit {
        ds.rows.truncate(limit.max(0) as usize);
    }
    Ok(ds)
}

fn build_neighbor_row(
    node: &GetNeighborsNode,
    edge: &Edge,
    dst: Option<&Vertex>,
    src: &Vertex,
) -> Result<Vec<Value>> {
    let resolver = NoVars;
    let placeholder_dst = Vertex::with_vid(edge.dst.clone());
    let dst_vertex = dst.unwrap_or(&placeholder_dst);
    let ctx = GetNeighborsContext::new(src, Some(dst_vertex), edge, &resolver);
    let mut row = Vec::with_capacity(node.base.col_names.len());
    for name in &node.base.col_names {
        let value = match name.as_str() {
            "_dst" | "_src" | "_type" | "_rank" => ctx.input_prop(name),
            _ if node.edge_props.iter().any(|p| p == name) => ctx.edge_prop(&edge.edge_type, name),
            _ if node.vertex_props.iter().any(|p| p == name) => match name.split_once('.') {
                Some((tag, prop)) => ctx.dst_prop(tag, prop),
                None => Value::Null,
            },
            _ => Value::Null,
        };
        row.push(value);
    }
    Ok(row)
}

fn keep_rows_matching(ds: &mut DataSet, pred: &crate::expr::Expression) -> Result<()> {
    let resolver = NoVars;
    let mut kept = Vec::with_capacity(ds.rows.len());
    for row in ds.rows.drain(..) {
        let tmp = DataSet::with_rows(ds.col_names.clone(), vec![row]);
        let rctx = crate::context::RowContext::new(&tmp, 0, &resolver);
        if pred.eval(&rctx)?.as_bool().unwrap_or(false) {
            kept.push(tmp.rows.into_iter().next().unwrap());
        }
    }
    ds.rows = kept;
    Ok(())
}

pub async fn get_vertices(
    node: &GetVerticesNode,
    inputs: &[DataSet],
    space: &str,
    storage: &dyn StorageClient,
) -> Result<DataSet> {
    let input = inputs.first().ok_or_else(|| Error::execution("GetVertices has no input"))?;
    let resolver = NoVars;
    let mut vids = Vec::with_capacity(input.len());
    for i in 0..input.len() {
        let rctx = crate::context::RowContext::new(input, i, &resolver);
        vids.push(node.vids.eval(&rctx)?);
    }
    if vids.is_empty() {
        return Ok(DataSet::new(node.base.col_names.clone()));
    }
    let resp = storage.get_vertex_props(space, &vids, &node.tag_props).await?;
    let mut ds = DataSet::new(node.base.col_names.clone());
    for part in &resp.responses {
        if let Some(props) = &part.props {
            ds.rows.extend(props.rows.iter().cloned());
        }
    }
    Ok(ds)
}

pub async fn get_edges(
    node: &GetEdgesNode,
    inputs: &[DataSet],
    space: &str,
    storage: &dyn StorageClient,
) -> Result<DataSet> {
    let input = inputs.first().ok_or_else(|| Error::execution("GetEdges has no input"))?;
    let resolver = NoVars;
    let mut keys = Vec::with_capacity(input.len());
    for i in 0..input.len() {
        let rctx = crate::context::RowContext::new(input, i, &resolver);
        if let Value::Edge(e) = node.edge_keys.eval(&rctx)? {
            keys.push((e.src.clone(), e.dst.clone(), e.edge_type.clone()));
        } else if input.col_names.len() >= 3 {
            let src = input.rows[i][0].clone();
            let dst = input.rows[i][1].clone();
            let ty = match &input.rows[i][2] {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            keys.push((src, dst, ty));
        }
    }
    if keys.is_empty() {
        return Ok(DataSet::new(node.base.col_names.clone()));
    }
    let resp = storage.get_edge_props(space, &keys, &node.edge_props).await?;
    let mut ds = DataSet::new(node.base.col_names.clone());
    for part in &resp.responses {
        if let Some(props) = &part.props {
            ds.rows.extend(props.rows.iter().cloned());
        }
    }
    Ok(ds)
}

pub async fn index_scan(node: &IndexScanNode, space: &str, storage: &dyn StorageClient) -> Result<DataSet> {
    let resp = storage
        .lookup_index(space, node.schema_id, node.is_edge, &node.return_columns)
        .await?;
    let mut ds = DataSet::new(node.base.col_names.clone());
    for part in &resp.responses {
        if let Some(data) = &part.data {
            ds.rows.extend(data.rows.iter().cloned());
        }
    }

    let resolver = NoVars;
    for iqc in &node.index_query_contexts {
        let mut kept = Vec::with_capacity(ds.rows.len());
        for row in ds.rows.drain(..) {
            let subject = if node.is_edge {
                PropertySubject::Edge(match row.first() {
                    Some(Value::Edge(e)) => e,
                    _ => {
                        kept.push(row);
                        continue;
                    }
                })
            } else {
                PropertySubject::Vertex(match row.first() {
                    Some(Value::Vertex(v)) => v,
                    _ => {
                        kept.push(row);
                        continue;
                    }
                })
            };
            let ctx = PropertyContext::new(subject, &resolver);
            if iqc.filter.eval(&ctx)?.as_bool().unwrap_or(true) {
                kept.push(row);
            }
        }
        ds.rows = kept;
    }
    Ok(ds)
}

/// Breadth-first collection of every vertex and edge reachable from the
/// input's seed vids within `steps` hops (§4.7 `GetSubgraph`). Distinct
/// vertices/edges are deduplicated by identity as they're discovered.
pub async fn subgraph(
    node: &SubgraphNode,
    inputs: &[DataSet],
    space: &str,
    storage: &dyn StorageClient,
) -> Result<DataSet> {
    let input = inputs.first().ok_or_else(|| Error::execution("Subgraph has no input"))?;
    let resolver = NoVars;
    let mut frontier = Vec::with_capacity(input.len());
    for i in 0..input.len() {
        let rctx = crate::context::RowContext::new(input, i, &resolver);
        frontier.push(rctx.input_prop("_vid"));
    }

    let mut visited_vids: Vec<Value> = frontier.clone();
    let mut vertices: Vec<Vertex> = Vec::new();
    let mut edges: Vec<Edge> = Vec::new();

    for _ in 0..node.steps.max(1) {
        if frontier.is_empty() {
            break;
        }
        let resp = storage.get_neighbors(space, &frontier, &node.edge_types, node.direction).await?;
        let mut next_frontier = Vec::new();
        for part in &resp.responses {
            for vid in &frontier {
                let key = vid.to_string();
                let Some(bundle) = part.edges_by_src.get(&key) else { continue };
                for (edge, dst) in bundle {
                    if let Some(pred) = &node.filter {
                        let src_vertex = Vertex::with_vid(edge.src.clone());
                        let dst_vertex = dst.clone().unwrap_or_else(|| Vertex::with_vid(edge.dst.clone()));
                        let ctx = GetNeighborsContext::new(&src_vertex, Some(&dst_vertex), edge, &resolver);
                        if !pred.eval(&ctx)?.as_bool().unwrap_or(false) {
                            continue;
                        }
                    }
                    if !edges.iter().any(|e| e.src.value_eq(&edge.src) && e.dst.value_eq(&edge.dst) && e.edge_type == edge.edge_type) {
                        edges.push(edge.clone());
                    }
                    if let Some(v) = dst {
                        if !vertices.iter().any(|existing| existing.vid.value_eq(&v.vid)) {
                            vertices.push(v.clone());
                        }
                    }
                    if !visited_vids.iter().any(|v| v.value_eq(&edge.dst)) {
                        visited_vids.push(edge.dst.clone());
                        next_frontier.push(edge.dst.clone());
                    }
                }
            }
        }
        frontier = next_frontier;
    }

    let mut ds = DataSet::new(node.base.col_names.clone());
    ds.push_row(vec![
        Value::List(vertices.into_iter().map(|v| Value::Vertex(Box::new(v))).collect()),
        Value::List(edges.into_iter().map(|e| Value::Edge(Box::new(e))).collect()),
    ]);
    Ok(ds)
}

