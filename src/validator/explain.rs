//! EXPLAIN support (§6.4): rendering a validated [`crate::plan::ExecutionPlan`]
//! as a [`crate::plan::NodeDescription`] tree for `PlanDescription`. The
//! EXPLAIN statement itself is unwrapped straight through in
//! [`super::validate`]; this module only holds the description builder,
//! reused by the query driver (C9) when assembling `PlanDescription`.

use crate::plan::{ExecutionPlan, NodeDescription};

pub fn describe_plan(plan: &ExecutionPlan) -> Vec<NodeDescription> {
    let mut out: Vec<NodeDescription> = plan.all_nodes().map(|n| n.explain()).collect();
    out.sort_by_key(|d| d.id.0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{PlanNodeBase, PlanNodeId, PlanNode, StartNode};

    #[test]
    fn describe_plan_orders_by_node_id() {
        let a = PlanNode::Start(StartNode { base: PlanNodeBase::new(PlanNodeId(1), "a", vec![]), seeds: vec![] });
        let b = PlanNode::Start(StartNode { base: PlanNodeBase::new(PlanNodeId(0), "b", vec![]), seeds: vec![] });
        let plan = ExecutionPlan::new(1, PlanNodeId(1), vec![a, b]);
        let descs = describe_plan(&plan);
        assert_eq!(descs[0].id.0, 0);
        assert_eq!(descs[1].id.0, 1);
    }
}
