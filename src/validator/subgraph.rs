//! GET SUBGRAPH and path-finding validators (§4.4, §4.5).

use crate::ast::{FromClause, GetSubgraphStatement, Statement};
use crate::error::{Error, Result};
use crate::plan::{
    CollectKind, ConjunctPathNode, DataCollectNode, PlanNode, PlanNodeBase, StartNode, SubgraphNode,
};

use super::{SubPlan, ValidateContext};

pub fn validate_get_subgraph(stmt: &GetSubgraphStatement, ctx: &mut ValidateContext) -> Result<SubPlan> {
    ctx.require_space()?;
    for et in &stmt.edge_types {
        if !ctx.catalog.has_edge(et) {
            return Err(Error::semantic(format!("unknown edge type: {et}")));
        }
    }
    let (start_var, mut plan) = start_from(&stmt.from, ctx)?;

    let id = ctx.next_id();
    let out = format!("__subgraph_{id}");
    let node = PlanNode::Subgraph(SubgraphNode {
        base: PlanNodeBase::new(id, &out, vec!["vertices".into(), "edges".into()])
            .with_single_input(plan.head, &start_var),
        steps: stmt.steps,
        direction: stmt.direction,
        edge_types: stmt.edge_types.clone(),
        filter: stmt.where_.clone(),
    });
    plan = plan.push_head(node);

    let collect_var = ctx.symbols.new_variable(None, "DataCollect")?;
    let collect_id = ctx.next_id();
    let collect = PlanNode::DataCollect(DataCollectNode {
        base: PlanNodeBase::new(collect_id, &collect_var, vec!["vertices".into(), "edges".into()])
            .with_single_input(plan.head, &out),
        kind: CollectKind::Subgraph,
        extra_inputs: Vec::new(),
    });
    ctx.symbols.bind_producer(&collect_var, collect_id)?;
    Ok(plan.push_head(collect))
}

pub fn validate_find_path(stmt: &Statement, ctx: &mut ValidateContext) -> Result<SubPlan> {
    let Statement::FindPath { from, to, steps, kind, edge_types, direction } = stmt else {
        unreachable!("validate_find_path called with a non-FindPath statement")
    };
    ctx.require_space()?;
    for et in edge_types {
        if !ctx.catalog.has_edge(et) {
            return Err(Error::semantic(format!("unknown edge type: {et}")));
        }
    }
    let (from_var, from_plan) = start_from(from, ctx)?;
    let (to_var, to_plan) = start_from(to, ctx)?;
    let from_head = from_plan.head;
    let to_head = to_plan.head;
    let mut plan = from_plan.merge(to_plan);

    let id = ctx.next_id();
    let out = format!("__conjunct_{id}");
    let node = PlanNode::ConjunctPath(ConjunctPathNode {
        base: PlanNodeBase::new(id, &out, vec!["path".into()])
            .with_two_inputs(from_head, &from_var, to_head, &to_var),
        kind: *kind,
        steps: *steps,
    });
    let _ = direction;
    plan = plan.push_head(node);

    let collect_var = ctx.symbols.new_variable(None, "DataCollect")?;
    let collect_id = ctx.next_id();
    let collect = PlanNode::DataCollect(DataCollectNode {
        base: PlanNodeBase::new(collect_id, &collect_var, vec!["path".into()])
            .with_single_input(plan.head, &out),
        kind: CollectKind::AllPaths,
        extra_inputs: Vec::new(),
    });
    ctx.symbols.bind_producer(&collect_var, collect_id)?;
    Ok(plan.push_head(collect))
}

fn start_from(from: &FromClause, ctx: &mut ValidateContext) -> Result<(String, SubPlan)> {
    match from {
        FromClause::Constant(exprs) => {
            if exprs.is_empty() {
                return Err(Error::semantic("expected at least one vertex id"));
            }
            let var = ctx.symbols.new_variable(None, "Start")?;
            let id = ctx.next_id();
            let node = PlanNode::Start(StartNode {
                base: PlanNodeBase::new(id, &var, vec!["_vid".into()]),
                seeds: exprs.clone(),
            });
            ctx.symbols.bind_producer(&var, id)?;
            Ok((var, SubPlan::singleton(node)))
        }
        FromClause::Reference(_) => Err(Error::semantic(
            "referencing a piped input is not supported here",
        )),
    }
}
