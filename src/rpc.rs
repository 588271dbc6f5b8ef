//! External interfaces (§6, C10): the storage and metadata services this
//! crate consumes. Only request/response shapes and the trait boundary
//! are specified here — transport, serialization and the services'
//! internal implementation are out of scope (§1). `InMemoryStorageClient`
//! and `InMemoryMetadataClient` are test doubles, not a storage engine
//! (§6.5 EXPANDED).

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::{Error, Result};
use crate::plan::{Direction, SortOrder};
use crate::value::{DataSet, Edge, Value, Vertex};

pub type PartId = u32;
pub type ErrorCode = i32;

/// Wraps every storage RPC response with the completeness accounting
/// described in §6.1: `responses` is one entry per partition that
/// answered, `completeness` is the percentage of partitions that
/// succeeded, and `failed_parts` names the ones that didn't.
#[derive(Debug, Clone)]
pub struct StorageRpcResponse<T> {
    pub responses: Vec<T>,
    pub completeness: u8,
    pub failed_parts: HashMap<PartId, ErrorCode>,
}

impl<T> StorageRpcResponse<T> {
    pub fn complete(responses: Vec<T>) -> Self {
        StorageRpcResponse { responses, completeness: 100, failed_parts: HashMap::new() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetNeighborsResponse {
    pub vertices: Option<DataSet>,
    /// Neighbor vertex/edge pairs keyed by source vid, as the storage
    /// layer would actually return them before the executor flattens
    /// them into `vertices`.
    pub edges_by_src: HashMap<String, Vec<(Edge, Option<Vertex>)>>,
}

#[derive(Debug, Clone, Default)]
pub struct GetPropResponse {
    pub props: Option<DataSet>,
}

#[derive(Debug, Clone, Default)]
pub struct ExecResponse {
    pub failed_parts: HashMap<PartId, ErrorCode>,
}

#[derive(Debug, Clone, Default)]
pub struct LookupIndexResponse {
    pub data: Option<DataSet>,
}

/// `#[async_trait]` per §6.5 EXPANDED — lets executors `.await` either a
/// real network client or an in-memory fake uniformly.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn get_neighbors(
        &self,
        space: &str,
        vertices: &[Value],
        edge_types: &[String],
        direction: Direction,
    ) -> Result<StorageRpcResponse<GetNeighborsResponse>>;

    async fn get_vertex_props(
        &self,
        space: &str,
        vertices: &[Value],
        props: &[String],
    ) -> Result<StorageRpcResponse<GetPropResponse>>;

    async fn get_edge_props(
        &self,
        space: &str,
        edges: &[(Value, Value, String)],
        props: &[String],
    ) -> Result<StorageRpcResponse<GetPropResponse>>;

    async fn add_vertices(&self, space: &str, rows: &DataSet) -> Result<ExecResponse>;
    async fn add_edges(&self, space: &str, rows: &DataSet) -> Result<ExecResponse>;
    async fn update_vertex(&self, space: &str, vid: &Value, set: &DataSet) -> Result<ExecResponse>;
    async fn update_edge(&self, space: &str, key: (&Value, &Value, &str), set: &DataSet) -> Result<ExecResponse>;
    async fn delete_vertices(&self, space: &str, vids: &[Value]) -> Result<ExecResponse>;
    async fn delete_edges(&self, space: &str, keys: &[(Value, Value, String)]) -> Result<ExecResponse>;

    async fn lookup_index(
        &self,
        space: &str,
        schema_id: i64,
        is_edge: bool,
        return_columns: &[String],
    ) -> Result<StorageRpcResponse<LookupIndexResponse>>;
}

#[derive(Debug, Clone)]
pub struct TagSchema {
    pub id: i64,
    pub props: Vec<(String, crate::value::ValueType)>,
}

#[derive(Debug, Clone)]
pub struct EdgeSchema {
    pub id: i64,
    pub props: Vec<(String, crate::value::ValueType)>,
}

#[derive(Debug, Clone)]
pub struct SpaceInfo {
    pub name: String,
    pub partitions: u32,
}

#[async_trait]
pub trait MetadataClient: Send + Sync {
    async fn to_tag_id(&self, space: &str, name: &str) -> Result<i64>;
    async fn to_edge_type(&self, space: &str, name: &str) -> Result<i64>;
    async fn get_tag_schema(&self, space: &str, tag: &str) -> Result<TagSchema>;
    async fn get_edge_schema(&self, space: &str, edge_type: &str) -> Result<EdgeSchema>;
    async fn get_space(&self, name: &str) -> Result<SpaceInfo>;
    async fn list_spaces(&self) -> Result<Vec<SpaceInfo>>;
    async fn create_space(&self, name: &str, partitions: u32) -> Result<()>;
    async fn drop_space(&self, name: &str) -> Result<()>;
}

/// `DashMap`-backed fake storage client sufficient to drive the §8 seed
/// scenarios and unit tests. Vertices/edges are stored in full, and
/// `get_neighbors`/`get_vertex_props` always report 100% completeness —
/// callers exercising partial-completeness handling construct a response
/// directly rather than going through this fake.
#[derive(Default)]
pub struct InMemoryStorageClient {
    vertices: DashMap<String, Vertex>,
    /// src vid -> outgoing edges
    out_edges: DashMap<String, Vec<Edge>>,
    /// dst vid -> incoming edges
    in_edges: DashMap<String, Vec<Edge>>,
}

impl InMemoryStorageClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_vertex(&self, v: Vertex) {
        let key = v.vid.to_string();
        self.vertices.insert(key, v);
    }

    pub fn insert_edge(&self, e: Edge) {
        let src = e.src.to_string();
        let dst = e.dst.to_string();
        self.out_edges.entry(src).or_default().push(e.clone());
        self.in_edges.entry(dst).or_default().push(e);
    }

    fn vid_key(v: &Value) -> String {
        v.to_string()
    }
}

#[async_trait]
impl StorageClient for InMemoryStorageClient {
    async fn get_neighbors(
        &self,
        _space: &str,
        vertices: &[Value],
        edge_types: &[String],
        direction: Direction,
    ) -> Result<StorageRpcResponse<GetNeighborsResponse>> {
        let mut edges_by_src: HashMap<String, Vec<(Edge, Option<Vertex>)>> = HashMap::new();
        for vid in vertices {
            let key = Self::vid_key(vid);
            let mut bundle = Vec::new();
            if matches!(direction, Direction::Out | Direction::Both) {
                if let Some(edges) = self.out_edges.get(&key) {
                    for e in edges.iter() {
                        if edge_types.is_empty() || edge_types.contains(&e.edge_type) {
                            let dst = self.vertices.get(&Self::vid_key(&e.dst)).map(|v| v.clone());
                            bundle.push((e.clone(), dst));
                        }
                    }
                }
            }
            if matches!(direction, Direction::In | Direction::Both) {
                if let Some(edges) = self.in_edges.get(&key) {
                    for e in edges.iter() {
                        if edge_types.is_empty() || edge_types.contains(&e.edge_type) {
                            let reversed = e.reversed();
                            let dst = self.vertices.get(&Self::vid_key(&reversed.dst)).map(|v| v.clone());
                            bundle.push((reversed, dst));
                        }
                    }
                }
            }
            edges_by_src.insert(key, bundle);
        }
        let resp = GetNeighborsResponse { vertices: None, edges_by_src };
        Ok(StorageRpcResponse::complete(vec![resp]))
    }

    async fn get_vertex_props(
        &self,
        _space: &str,
        vertices: &[Value],
        _props: &[String],
    ) -> Result<StorageRpcResponse<GetPropResponse>> {
        let mut rows = Vec::new();
        for vid in vertices {
            if let Some(v) = self.vertices.get(&Self::vid_key(vid)) {
                rows.push(vec![Value::Vertex(Box::new(v.clone()))]);
            }
        }
        let ds = DataSet::with_rows(vec!["vertex".into()], rows);
        Ok(StorageRpcResponse::complete(vec![GetPropResponse { props: Some(ds) }]))
    }

    async fn get_edge_props(
        &self,
        _space: &str,
        edges: &[(Value, Value, String)],
        _props: &[String],
    ) -> Result<StorageRpcResponse<GetPropResponse>> {
        let mut rows = Vec::new();
        for (src, dst, edge_type) in edges {
            if let Some(bundle) = self.out_edges.get(&Self::vid_key(src)) {
                if let Some(e) = bundle.iter().find(|e| e.dst.value_eq(dst) && &e.edge_type == edge_type) {
                    rows.push(vec![Value::Edge(Box::new(e.clone()))]);
                }
            }
        }
        let ds = DataSet::with_rows(vec!["edge".into()], rows);
        Ok(StorageRpcResponse::complete(vec![GetPropResponse { props: Some(ds) }]))
    }

    async fn add_vertices(&self, _space: &str, rows: &DataSet) -> Result<ExecResponse> {
        let idx = rows
            .column_index("vertex")
            .ok_or_else(|| Error::storage("addVertices: missing 'vertex' column"))?;
        for row in &rows.rows {
            if let Value::Vertex(v) = &row[idx] {
                self.insert_vertex((**v).clone());
            }
        }
        Ok(ExecResponse::default())
    }

    async fn add_edges(&self, _space: &str, rows: &DataSet) -> Result<ExecResponse> {
        let idx = rows
            .column_index("edge")
            .ok_or_else(|| Error::storage("addEdges: missing 'edge' column"))?;
        for row in &rows.rows {
            if let Value::Edge(e) = &row[idx] {
                self.insert_edge((**e).clone());
            }
        }
        Ok(ExecResponse::default())
    }

    async fn update_vertex(&self, _space: &str, vid: &Value, set: &DataSet) -> Result<ExecResponse> {
        let key = Self::vid_key(vid);
        let mut entry = self.vertices.entry(key).or_insert_with(|| Vertex::with_vid(vid.clone()));
        for (i, col) in set.col_names.iter().enumerate() {
            if let Some(row) = set.rows.first() {
                let tag = entry.tags.entry("default".into()).or_default();
                tag.insert(col.clone(), row[i].clone());
            }
        }
        Ok(ExecResponse::default())
    }

    async fn update_edge(
        &self,
        _space: &str,
        key: (&Value, &Value, &str),
        set: &DataSet,
    ) -> Result<ExecResponse> {
        let src_key = Self::vid_key(key.0);
        if let Some(mut bundle) = self.out_edges.get_mut(&src_key) {
            if let Some(e) = bundle.iter_mut().find(|e| e.dst.value_eq(key.1) && e.edge_type == key.2) {
                for (i, col) in set.col_names.iter().enumerate() {
                    if let Some(row) = set.rows.first() {
                        e.props.insert(col.clone(), row[i].clone());
                    }
                }
            }
        }
        Ok(ExecResponse::default())
    }

    async fn delete_vertices(&self, _space: &str, vids: &[Value]) -> Result<ExecResponse> {
        for vid in vids {
            self.vertices.remove(&Self::vid_key(vid));
        }
        Ok(ExecResponse::default())
    }

    async fn delete_edges(&self, _space: &str, keys: &[(Value, Value, String)]) -> Result<ExecResponse> {
        for (src, dst, edge_type) in keys {
            if let Some(mut bundle) = self.out_edges.get_mut(&Self::vid_key(src)) {
                bundle.retain(|e| !(e.dst.value_eq(dst) && &e.edge_type == edge_type));
            }
        }
        Ok(ExecResponse::default())
    }

    async fn lookup_index(
        &self,
        _space: &str,
        _schema_id: i64,
        _is_edge: bool,
        _return_columns: &[String],
    ) -> Result<StorageRpcResponse<LookupIndexResponse>> {
        Ok(StorageRpcResponse::complete(vec![LookupIndexResponse::default()]))
    }
}

/// `DashMap`-backed fake metadata client. Schema ids are assigned in
/// insertion order by a per-client atomic counter.
pub struct InMemoryMetadataClient {
    spaces: DashMap<String, SpaceInfo>,
    tags: DashMap<(String, String), TagSchema>,
    edges: DashMap<(String, String), EdgeSchema>,
    next_id: AtomicI64,
}

impl Default for InMemoryMetadataClient {
    fn default() -> Self {
        InMemoryMetadataClient {
            spaces: DashMap::new(),
            tags: DashMap::new(),
            edges: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl InMemoryMetadataClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_space(&self, name: impl Into<String>, partitions: u32) {
        let name = name.into();
        self.spaces.insert(name.clone(), SpaceInfo { name, partitions });
    }

    pub fn define_tag(&self, space: impl Into<String>, tag: impl Into<String>, props: Vec<(String, crate::value::ValueType)>) {
        let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst);
        self.tags.insert((space.into(), tag.into()), TagSchema { id, props });
    }

    pub fn define_edge(&self, space: impl Into<String>, edge_type: impl Into<String>, props: Vec<(String, crate::value::ValueType)>) {
        let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst);
        self.edges.insert((space.into(), edge_type.into()), EdgeSchema { id, props });
    }
}

#[async_trait]
impl MetadataClient for InMemoryMetadataClient {
    async fn to_tag_id(&self, space: &str, name: &str) -> Result<i64> {
        self.tags
            .get(&(space.to_string(), name.to_string()))
            .map(|t| t.id)
            .ok_or_else(|| Error::meta(format!("unknown tag: {name}")))
    }

    async fn to_edge_type(&self, space: &str, name: &str) -> Result<i64> {
        self.edges
            .get(&(space.to_string(), name.to_string()))
            .map(|e| e.id)
            .ok_or_else(|| Error::meta(format!("unknown edge type: {name}")))
    }

    async fn get_tag_schema(&self, space: &str, tag: &str) -> Result<TagSchema> {
        self.tags
            .get(&(space.to_string(), tag.to_string()))
            .map(|t| t.clone())
            .ok_or_else(|| Error::meta(format!("unknown tag: {tag}")))
    }

    async fn get_edge_schema(&self, space: &str, edge_type: &str) -> Result<EdgeSchema> {
        self.edges
            .get(&(space.to_string(), edge_type.to_string()))
            .map(|e| e.clone())
            .ok_or_else(|| Error::meta(format!("unknown edge type: {edge_type}")))
    }

    async fn get_space(&self, name: &str) -> Result<SpaceInfo> {
        self.spaces
            .get(name)
            .map(|s| s.clone())
            .ok_or_else(|| Error::meta(format!("unknown space: {name}")))
    }

    async fn list_spaces(&self) -> Result<Vec<SpaceInfo>> {
        Ok(self.spaces.iter().map(|e| e.value().clone()).collect())
    }

    async fn create_space(&self, name: &str, partitions: u32) -> Result<()> {
        self.spaces.insert(name.to_string(), SpaceInfo { name: name.to_string(), partitions });
        Ok(())
    }

    async fn drop_space(&self, name: &str) -> Result<()> {
        self.spaces.remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(id: &str) -> Value {
        Value::String(id.into())
    }

    #[tokio::test]
    async fn in_memory_storage_round_trips_neighbors() {
        let client = InMemoryStorageClient::new();
        client.insert_vertex(Vertex::new("A"));
        client.insert_vertex(Vertex::new("B"));
        client.insert_edge(Edge::new(v("A"), v("B"), "like"));

        let resp = client
            .get_neighbors("space", &[v("A")], &["like".to_string()], Direction::Out)
            .await
            .unwrap();
        assert_eq!(resp.completeness, 100);
        let bundle = &resp.responses[0].edges_by_src[&"A".to_string()];
        assert_eq!(bundle.len(), 1);
        assert_eq!(bundle[0].0.dst, v("B"));
    }

    #[tokio::test]
    async fn in_memory_meta_rejects_unknown_tag() {
        let client = InMemoryMetadataClient::new();
        let err = client.to_tag_id("space", "player").await.unwrap_err();
        assert!(matches!(err, Error::Meta { .. }));
    }
}
