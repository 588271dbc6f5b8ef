//! Optimizer hook (C6, §4.6).
//!
//! A single identity-transform pass today — rule-based rewrites are out
//! of scope (§1 Non-goals) — plus the lifetime analysis (§4.8) that
//! marks variables safe for in-place overwrite: a variable whose last
//! reader is also its only reader's *sole* consumer (no other node ever
//! reads an earlier version) can have its producer reuse storage
//! instead of appending a new `Result` version.

use crate::plan::ExecutionPlan;
use crate::symbol::SymbolTable;

/// Runs the (currently identity) rewrite pass and the lifetime analysis,
/// returning the plan unchanged — only `symbols` is mutated.
pub fn optimize(plan: ExecutionPlan, symbols: &mut SymbolTable) -> ExecutionPlan {
    analyze_lifetimes(&plan, symbols);
    plan
}

fn analyze_lifetimes(plan: &ExecutionPlan, symbols: &mut SymbolTable) {
    let names: Vec<String> = symbols.all_variables().map(|v| v.name.clone()).collect();
    for name in names {
        let var = match symbols.get_var(&name) {
            Some(v) => v,
            None => continue,
        };
        let readers: Vec<_> = var.readers().copied().collect();
        // Safe in place only when there is exactly one reader and that
        // reader does not also appear among another variable's readers
        // that could observe a stale pre-overwrite value (i.e. no
        // control-flow fan-out through Select/Loop re-entry).
        let single_reader_no_loop = readers.len() == 1
            && !plan
                .get(readers[0])
                .map(|n| !n.control_flow_roots().is_empty())
                .unwrap_or(false);
        symbols.mark_in_place(&name, single_reader_no_loop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{FilterNode, PlanNode, PlanNodeBase, PlanNodeId, StartNode};
    use crate::expr::Expression;
    use crate::value::Value;

    #[test]
    fn single_reader_variable_marked_in_place() {
        let mut symbols = SymbolTable::new();
        let src = symbols.new_variable(Some("src".into()), "Start").unwrap();
        symbols.bind_producer(&src, PlanNodeId(0)).unwrap();
        symbols.bind_reader(&src, PlanNodeId(1)).unwrap();

        let start = PlanNode::Start(StartNode { base: PlanNodeBase::new(PlanNodeId(0), &src, vec![]), seeds: vec![] });
        let filter = PlanNode::Filter(FilterNode {
            base: PlanNodeBase::new(PlanNodeId(1), "out", vec![]).with_single_input(PlanNodeId(0), &src),
            predicate: Expression::Constant(Value::Bool(true)),
        });
        let plan = ExecutionPlan::new(1, PlanNodeId(1), vec![start, filter]);

        let plan = optimize(plan, &mut symbols);
        assert!(symbols.get_var(&src).unwrap().in_place);
        let _ = plan;
    }
}
