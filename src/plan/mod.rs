//! Plan node model (C3, §4.3) and the execution plan container.
//!
//! `PlanNode` is a tagged enum, not a class hierarchy (Design Note §9):
//! every variant embeds a [`PlanNodeBase`] carrying the fields every node
//! needs regardless of kind (id, dependencies, input/output variable
//! names, declared column names). Kind-specific parameters live in
//! `nodes`.

pub mod nodes;

use std::collections::HashMap;
use std::fmt;

pub use nodes::*;

/// Unique identity of a node within one plan (§3 "every node id is
/// unique within a plan").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlanNodeId(pub u64);

impl fmt::Display for PlanNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Fields common to every `PlanNode` kind (§4.3 "Common contract").
#[derive(Debug, Clone)]
pub struct PlanNodeBase {
    pub id: PlanNodeId,
    pub dependencies: Vec<PlanNodeId>,
    pub input_vars: Vec<String>,
    pub output_var: String,
    pub col_names: Vec<String>,
}

impl PlanNodeBase {
    pub fn new(id: PlanNodeId, output_var: impl Into<String>, col_names: Vec<String>) -> Self {
        PlanNodeBase {
            id,
            dependencies: Vec::new(),
            input_vars: Vec::new(),
            output_var: output_var.into(),
            col_names,
        }
    }

    pub fn with_single_input(mut self, dep: PlanNodeId, input_var: impl Into<String>) -> Self {
        self.dependencies = vec![dep];
        self.input_vars = vec![input_var.into()];
        self
    }

    pub fn with_two_inputs(
        mut self,
        left: PlanNodeId,
        left_var: impl Into<String>,
        right: PlanNodeId,
        right_var: impl Into<String>,
    ) -> Self {
        self.dependencies = vec![left, right];
        self.input_vars = vec![left_var.into(), right_var.into()];
        self
    }
}

/// A human-readable explain entry (§6.4 `NodeDescription`).
#[derive(Debug, Clone)]
pub struct NodeDescription {
    pub id: PlanNodeId,
    pub name: String,
    pub output_var: String,
    pub dependencies: Vec<PlanNodeId>,
    pub description: Vec<(String, String)>,
    pub branch_info: Option<String>,
}

macro_rules! plan_node_enum {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        /// The operator DAG's node type (§4.3). One variant per operator
        /// kind; every variant holds a kind-specific params struct from
        /// `nodes` plus a shared `base`.
        #[derive(Debug, Clone)]
        pub enum PlanNode {
            $($variant($ty)),+
        }

        impl PlanNode {
            pub fn base(&self) -> &PlanNodeBase {
                match self {
                    $(PlanNode::$variant(n) => &n.base),+
                }
            }

            pub fn base_mut(&mut self) -> &mut PlanNodeBase {
                match self {
                    $(PlanNode::$variant(n) => &mut n.base),+
                }
            }

            pub fn kind_name(&self) -> &'static str {
                match self {
                    $(PlanNode::$variant(_) => stringify!($variant)),+
                }
            }
        }
    };
}

plan_node_enum! {
    GetNeighbors(GetNeighborsNode),
    GetVertices(GetVerticesNode),
    GetEdges(GetEdgesNode),
    IndexScan(IndexScanNode),
    Project(ProjectNode),
    Filter(FilterNode),
    Sort(SortNode),
    Limit(LimitNode),
    TopN(TopNNode),
    Dedup(DedupNode),
    Aggregate(AggregateNode),
    Unwind(UnwindNode),
    Union(SetOpNode),
    Intersect(SetOpNode),
    Minus(SetOpNode),
    InnerJoin(JoinNode),
    LeftJoin(JoinNode),
    BfsShortestPath(BfsShortestPathNode),
    ProduceAllPaths(ProduceAllPathsNode),
    ProduceSemiShortestPath(ProduceSemiShortestPathNode),
    ConjunctPath(ConjunctPathNode),
    Subgraph(SubgraphNode),
    CartesianProduct(CartesianProductNode),
    Start(StartNode),
    PassThrough(PassThroughNode),
    MultiOutputs(MultiOutputsNode),
    Select(SelectNode),
    Loop(LoopNode),
    Assign(AssignNode),
    DataCollect(DataCollectNode),
    AdminDml(AdminDmlNode),
}

impl PlanNode {
    pub fn id(&self) -> PlanNodeId {
        self.base().id
    }

    pub fn dependencies(&self) -> &[PlanNodeId] {
        &self.base().dependencies
    }

    pub fn input_vars(&self) -> &[String] {
        &self.base().input_vars
    }

    pub fn output_var(&self) -> &str {
        &self.base().output_var
    }

    pub fn col_names(&self) -> &[String] {
        &self.base().col_names
    }

    /// Extra dependency edges reachable only through control-flow bodies
    /// (Select.then/else, Loop.body) — not ordinary `dependencies()`
    /// edges per (P2): no external operator may depend on them, so they
    /// are tracked separately from the DAG-over-`dependencies` invariant.
    pub fn control_flow_roots(&self) -> Vec<PlanNodeId> {
        match self {
            PlanNode::Select(n) => {
                let mut v = vec![n.then_root];
                if let Some(e) = n.else_root {
                    v.push(e);
                }
                v
            }
            PlanNode::Loop(n) => vec![n.body_root],
            _ => Vec::new(),
        }
    }

    pub fn explain(&self) -> NodeDescription {
        NodeDescription {
            id: self.id(),
            name: self.kind_name().to_string(),
            output_var: self.output_var().to_string(),
            dependencies: self.dependencies().to_vec(),
            description: self.describe_params(),
            branch_info: None,
        }
    }

    fn describe_params(&self) -> Vec<(String, String)> {
        match self {
            PlanNode::Filter(n) => vec![("predicate".into(), n.predicate.canonical_string())],
            PlanNode::Project(n) => vec![(
                "columns".into(),
                n.columns.iter().map(|(e, _)| e.canonical_string()).collect::<Vec<_>>().join(", "),
            )],
            PlanNode::Limit(n) => vec![
                ("offset".into(), n.offset.to_string()),
                ("count".into(), n.count.to_string()),
            ],
            PlanNode::GetNeighbors(n) => vec![
                ("edgeTypes".into(), n.edge_types.join(",")),
                ("direction".into(), format!("{:?}", n.direction)),
            ],
            _ => Vec::new(),
        }
    }
}

/// (root PlanNode id, collection of all nodes, plan id) — §3
/// `ExecutionPlan`. Nodes are stored by id so Select/Loop bodies and
/// ordinary dependencies can both be resolved uniformly.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub plan_id: u64,
    pub root: PlanNodeId,
    nodes: HashMap<PlanNodeId, PlanNode>,
}

impl ExecutionPlan {
    pub fn new(plan_id: u64, root: PlanNodeId, nodes: Vec<PlanNode>) -> Self {
        let nodes = nodes.into_iter().map(|n| (n.id(), n)).collect();
        ExecutionPlan { plan_id, root, nodes }
    }

    pub fn get(&self, id: PlanNodeId) -> Option<&PlanNode> {
        self.nodes.get(&id)
    }

    pub fn root_node(&self) -> &PlanNode {
        self.nodes.get(&self.root).expect("root node must exist in plan")
    }

    pub fn all_nodes(&self) -> impl Iterator<Item = &PlanNode> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// (I: DAG over `dependencies`, treating Select.then/else and
    /// Loop.body as separate subtrees, §8). Detects cycles via DFS over
    /// `dependencies()` only — control-flow roots are intentionally
    /// excluded per the invariant's own carve-out.
    pub fn is_acyclic(&self) -> bool {
        #[derive(PartialEq, Clone, Copy)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }
        let mut marks: HashMap<PlanNodeId, Mark> =
            self.nodes.keys().map(|id| (*id, Mark::Unvisited)).collect();

        fn visit(
            id: PlanNodeId,
            plan: &ExecutionPlan,
            marks: &mut HashMap<PlanNodeId, Mark>,
        ) -> bool {
            match marks.get(&id) {
                Some(Mark::Done) => return true,
                Some(Mark::InProgress) => return false,
                _ => {}
            }
            marks.insert(id, Mark::InProgress);
            if let Some(node) = plan.get(id) {
                for dep in node.dependencies() {
                    if !visit(*dep, plan, marks) {
                        return false;
                    }
                }
            }
            marks.insert(id, Mark::Done);
            true
        }

        for id in self.nodes.keys().copied().collect::<Vec<_>>() {
            if !visit(id, self, &mut marks) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expression;
    use crate::value::Value;

    fn filter_node(id: u64, dep: u64, input: &str) -> PlanNode {
        PlanNode::Filter(FilterNode {
            base: PlanNodeBase::new(PlanNodeId(id), "out", vec!["c".into()])
                .with_single_input(PlanNodeId(dep), input),
            predicate: Expression::Constant(Value::Bool(true)),
        })
    }

    #[test]
    fn plan_detects_acyclicity_for_a_simple_chain() {
        let start = PlanNode::Start(StartNode {
            base: PlanNodeBase::new(PlanNodeId(0), "src", vec![]),
            seeds: vec![],
        });
        let f = filter_node(1, 0, "src");
        let plan = ExecutionPlan::new(7, PlanNodeId(1), vec![start, f]);
        assert!(plan.is_acyclic());
    }

    #[test]
    fn plan_detects_a_cycle() {
        let mut a = filter_node(0, 1, "x");
        let b = filter_node(1, 0, "y");
        a.base_mut().dependencies = vec![PlanNodeId(1)];
        let plan = ExecutionPlan::new(1, PlanNodeId(0), vec![a, b]);
        assert!(!plan.is_acyclic());
    }
}
