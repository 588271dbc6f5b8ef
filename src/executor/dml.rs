//! Administrative DML/DDL execution (§4.7, §6.2): dispatches
//! `AdminDmlNode` to the `StorageClient`/`MetadataClient` boundary.
//! Bulk `InsertVertices`/`InsertEdges` read their rows from the single
//! upstream input when one is wired; `params` alone carries everything
//! else (space/tag/edge names, partition counts).

use crate::error::Result;
use crate::plan::{AdminDmlNode, AdminDmlOp};
use crate::rpc::{MetadataClient, StorageClient};
use crate::value::{DataSet, Value};

pub async fn execute(
    node: &AdminDmlNode,
    inputs: &[DataSet],
    space: &str,
    storage: &dyn StorageClient,
    meta: &dyn MetadataClient,
) -> Result<DataSet> {
    let p = &node.params;
    let target_space = p.get("space").map(String::as_str).unwrap_or(space);
    let mut ds = DataSet::new(node.base.col_names.clone());

    match node.op {
        AdminDmlOp::CreateSpace => {
            let name = p.get("name").cloned().unwrap_or_default();
            let partitions: u32 = p.get("partitions").and_then(|s| s.parse().ok()).unwrap_or(1);
            meta.create_space(&name, partitions).await?;
        }
        AdminDmlOp::DropSpace => {
            let name = p.get("name").cloned().unwrap_or_default();
            meta.drop_space(&name).await?;
        }
        AdminDmlOp::ShowSpaces => {
            ds = DataSet::new(vec!["name".into(), "partitions".into()]);
            for info in meta.list_spaces().await? {
                ds.push_row(vec![Value::String(info.name), Value::Int(info.partitions as i64)]);
            }
        }
        AdminDmlOp::CreateTag | AdminDmlOp::CreateEdge => {
            // Schema registration is owned by the metadata service's DDL
            // path, not this trait (§6 Non-goals); validated names are
            // simply acknowledged here.
        }
        AdminDmlOp::InsertVertices => {
            if let Some(rows) = inputs.first() {
                storage.add_vertices(target_space, rows).await?;
            }
        }
        AdminDmlOp::InsertEdges => {
            if let Some(rows) = inputs.first() {
                storage.add_edges(target_space, rows).await?;
            }
        }
        AdminDmlOp::UpdateVertex => {
            if let (Some(vid_str), Some(set)) = (p.get("vid"), inputs.first()) {
                storage.update_vertex(target_space, &Value::String(vid_str.clone()), set).await?;
            }
        }
        AdminDmlOp::UpdateEdge => {
            if let (Some(src), Some(dst), Some(edge_type), Some(set)) =
                (p.get("src"), p.get("dst"), p.get("edge_type"), inputs.first())
            {
                let src = Value::String(src.clone());
                let dst = Value::String(dst.clone());
                storage.update_edge(target_space, (&src, &dst, edge_type), set).await?;
            }
        }
        AdminDmlOp::DeleteVertices => {
            let vids: Vec<Value> = p
                .get("vids")
                .map(|s| s.split(',').filter(|v| !v.is_empty()).map(|v| Value::String(v.to_string())).collect())
                .unwrap_or_default();
            if !vids.is_empty() {
                storage.delete_vertices(target_space, &vids).await?;
            }
        }
        AdminDmlOp::DeleteEdges => {
            let edge_type = p.get("edge_type").cloned().unwrap_or_default();
            let keys: Vec<(Value, Value, String)> = p
                .get("keys")
                .map(|s| {
                    s.split(';')
                        .filter_map(|pair| {
                            let mut it = pair.split(',');
                            let src = it.next()?;
                            let dst = it.next()?;
                            Some((Value::String(src.to_string()), Value::String(dst.to_string()), edge_type.clone()))
                        })
                        .collect()
                })
                .unwrap_or_default();
            if !keys.is_empty() {
                storage.delete_edges(target_space, &keys).await?;
            }
        }
    }
    Ok(ds)
}
