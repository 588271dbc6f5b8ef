//! Kind-specific parameter structs for every `PlanNode` variant (§4.3).

use std::collections::HashMap;

use super::{PlanNodeBase, PlanNodeId};
use crate::expr::{AggregateFunction, Expression};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct GetNeighborsNode {
    pub base: PlanNodeBase,
    pub src_expr: Expression,
    pub edge_types: Vec<String>,
    pub direction: Direction,
    pub vertex_props: Vec<String>,
    pub edge_props: Vec<String>,
    pub stat_props: Vec<String>,
    pub dedup: bool,
    pub order_by: Vec<(String, SortOrder)>,
    pub limit: Option<i64>,
    pub filter: Option<Expression>,
}

#[derive(Debug, Clone)]
pub struct GetVerticesNode {
    pub base: PlanNodeBase,
    pub vids: Expression,
    pub tag_props: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GetEdgesNode {
    pub base: PlanNodeBase,
    pub edge_keys: Expression,
    pub edge_props: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct IndexQueryContext {
    pub filter: Expression,
}

#[derive(Debug, Clone)]
pub struct IndexScanNode {
    pub base: PlanNodeBase,
    pub schema_id: i64,
    pub index_query_contexts: Vec<IndexQueryContext>,
    pub is_edge: bool,
    pub return_columns: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ProjectNode {
    pub base: PlanNodeBase,
    /// (expression, output alias).
    pub columns: Vec<(Expression, String)>,
    /// `true` when this Project is a `YIELD *` / `$-.*` expansion: the
    /// effective columns are the input's full column list, computed at
    /// bind time rather than carried as literal expressions (§4.7).
    pub expand_star: bool,
}

#[derive(Debug, Clone)]
pub struct FilterNode {
    pub base: PlanNodeBase,
    pub predicate: Expression,
}

#[derive(Debug, Clone)]
pub struct SortNode {
    pub base: PlanNodeBase,
    pub keys: Vec<(String, SortOrder)>,
}

#[derive(Debug, Clone)]
pub struct LimitNode {
    pub base: PlanNodeBase,
    pub offset: i64,
    pub count: i64,
}

#[derive(Debug, Clone)]
pub struct TopNNode {
    pub base: PlanNodeBase,
    pub keys: Vec<(String, SortOrder)>,
    pub offset: i64,
    pub count: i64,
}

#[derive(Debug, Clone)]
pub struct DedupNode {
    pub base: PlanNodeBase,
}

#[derive(Debug, Clone)]
pub struct AggregateNode {
    pub base: PlanNodeBase,
    pub group_keys: Vec<Expression>,
    /// (expression, aggregate function, DISTINCT flag).
    pub group_items: Vec<(Expression, AggregateFunction, bool)>,
}

#[derive(Debug, Clone)]
pub struct UnwindNode {
    pub base: PlanNodeBase,
    pub list_expr: Expression,
    pub alias: String,
}

/// Shared params for the three bi-input set operators — they all just
/// validate equal column-name vectors and differ only in executor logic
/// (§4.7), so one struct covers `Union`/`Intersect`/`Minus`.
#[derive(Debug, Clone)]
pub struct SetOpNode {
    pub base: PlanNodeBase,
}

#[derive(Debug, Clone)]
pub struct JoinNode {
    pub base: PlanNodeBase,
    pub left_keys: Vec<Expression>,
    pub right_keys: Vec<Expression>,
}

#[derive(Debug, Clone)]
pub struct BfsShortestPathNode {
    pub base: PlanNodeBase,
    pub from: Expression,
    pub to: Expression,
    pub steps: u32,
    pub edge_types: Vec<String>,
    pub direction: Direction,
}

#[derive(Debug, Clone)]
pub struct ProduceAllPathsNode {
    pub base: PlanNodeBase,
    pub steps: u32,
    pub no_loop: bool,
}

#[derive(Debug, Clone)]
pub struct ProduceSemiShortestPathNode {
    pub base: PlanNodeBase,
    pub weight_prop: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConjunctKind {
    BiBfs,
    AllPaths,
    Floyd,
}

#[derive(Debug, Clone)]
pub struct ConjunctPathNode {
    pub base: PlanNodeBase,
    pub kind: ConjunctKind,
    pub steps: u32,
}

#[derive(Debug, Clone)]
pub struct SubgraphNode {
    pub base: PlanNodeBase,
    pub steps: u32,
    pub direction: Direction,
    pub edge_types: Vec<String>,
    pub filter: Option<Expression>,
}

#[derive(Debug, Clone)]
pub struct CartesianProductNode {
    pub base: PlanNodeBase,
}

#[derive(Debug, Clone)]
pub struct StartNode {
    pub base: PlanNodeBase,
    /// Literal vid expressions this Start seeds its single column with
    /// (`GO FROM "A"`, `FETCH PROP ON t "A"`, ...). Empty for a Start that
    /// exists only as a dependency anchor.
    pub seeds: Vec<Expression>,
}

#[derive(Debug, Clone)]
pub struct PassThroughNode {
    pub base: PlanNodeBase,
}

#[derive(Debug, Clone)]
pub struct MultiOutputsNode {
    pub base: PlanNodeBase,
}

#[derive(Debug, Clone)]
pub struct SelectNode {
    pub base: PlanNodeBase,
    pub condition: Expression,
    pub then_root: PlanNodeId,
    pub else_root: Option<PlanNodeId>,
}

#[derive(Debug, Clone)]
pub struct LoopNode {
    pub base: PlanNodeBase,
    pub condition: Expression,
    pub body_root: PlanNodeId,
}

#[derive(Debug, Clone)]
pub struct AssignNode {
    pub base: PlanNodeBase,
    pub var_name: String,
    pub expr: Expression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectKind {
    Subgraph,
    RowBasedMove,
    MToN,
    BfsShortest,
    AllPaths,
    MultiplePairShortest,
    PathProp,
}

#[derive(Debug, Clone)]
pub struct DataCollectNode {
    pub base: PlanNodeBase,
    pub kind: CollectKind,
    /// Extra named variables this collect reads beyond `base.input_vars`
    /// (DataCollect may name user variables directly, per invariant P1's
    /// carve-out).
    pub extra_inputs: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminDmlOp {
    CreateSpace,
    DropSpace,
    ShowSpaces,
    CreateTag,
    CreateEdge,
    InsertVertices,
    InsertEdges,
    UpdateVertex,
    UpdateEdge,
    DeleteVertices,
    DeleteEdges,
}

#[derive(Debug, Clone)]
pub struct AdminDmlNode {
    pub base: PlanNodeBase,
    pub op: AdminDmlOp,
    pub params: HashMap<String, String>,
}
