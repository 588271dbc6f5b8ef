//! Executor (C7, §4.7): runs one `PlanNode` against its already-resolved
//! input `DataSet`s, producing the `DataSet` bound to that node's
//! output variable. Dispatched per-node by the scheduler (C8); `Select`
//! and `Loop` are driven directly by the scheduler since their bodies
//! are separate subtrees rather than ordinary inputs.

mod aggregate;
mod control;
mod datacollect;
mod dml;
mod path;
mod relational;
mod scan;

use crate::error::Result;
use crate::plan::PlanNode;
use crate::rpc::{MetadataClient, StorageClient};
use crate::value::DataSet;

pub async fn execute(
    node: &PlanNode,
    inputs: &[DataSet],
    space: &str,
    storage: &dyn StorageClient,
    meta: &dyn MetadataClient,
) -> Result<DataSet> {
    match node {
        PlanNode::Start(n) => scan::start(n),
        PlanNode::PassThrough(_) => control::pass_through(inputs),
        PlanNode::MultiOutputs(_) => control::multi_outputs(inputs),
        PlanNode::Assign(n) => control::assign(n, inputs),

        PlanNode::GetNeighbors(n) => scan::get_neighbors(n, inputs, space, storage).await,
        PlanNode::GetVertices(n) => scan::get_vertices(n, inputs, space, storage).await,
        PlanNode::GetEdges(n) => scan::get_edges(n, inputs, space, storage).await,
        PlanNode::IndexScan(n) => scan::index_scan(n, space, storage).await,
        PlanNode::Subgraph(n) => scan::subgraph(n, inputs, space, storage).await,

        PlanNode::Project(n) => relational::project(n, inputs),
        PlanNode::Filter(n) => relational::filter(n, inputs),
        PlanNode::Sort(n) => relational::sort(n, inputs),
        PlanNode::Limit(n) => relational::limit(n, inputs),
        PlanNode::TopN(n) => relational::top_n(n, inputs),
        PlanNode::Dedup(_) => relational::dedup(inputs),
        PlanNode::Unwind(n) => relational::unwind(n, inputs),
        PlanNode::Union(_) => relational::union(inputs),
        PlanNode::Intersect(_) => relational::intersect(inputs),
        PlanNode::Minus(_) => relational::minus(inputs),
        PlanNode::InnerJoin(n) => relational::inner_join(n, inputs),
        PlanNode::LeftJoin(n) => relational::left_join(n, inputs),
        PlanNode::CartesianProduct(n) => relational::cartesian_product(n, inputs),

        PlanNode::Aggregate(n) => aggregate::aggregate(n, inputs),

        PlanNode::BfsShortestPath(n) => path::bfs_shortest_path(n, space, storage).await,
        PlanNode::ProduceAllPaths(n) => path::produce_all_paths(n, inputs, space, storage).await,
        PlanNode::ProduceSemiShortestPath(n) => {
            path::produce_semi_shortest_path(n, inputs, space, storage).await
        }
        PlanNode::ConjunctPath(n) => path::conjunct_path(n, inputs),

        PlanNode::DataCollect(n) => datacollect::collect(n, inputs),
        PlanNode::AdminDml(n) => dml::execute(n, inputs, space, storage, meta).await,

        PlanNode::Select(_) | PlanNode::Loop(_) => {
            unreachable!("Select/Loop are driven by the scheduler, not the executor")
        }
    }
}
