//! YIELD validator (§4.4): standalone projection, with or without an
//! upstream input.

use crate::ast::YieldStatement;
use crate::error::Result;
use crate::plan::{DedupNode, PlanNode, PlanNodeBase, ProjectNode, StartNode};

use super::{validate, SubPlan, ValidateContext};

pub fn validate_yield(
    stmt: &YieldStatement,
    ctx: &mut ValidateContext,
    input_vars: &[String],
) -> Result<SubPlan> {
    let (input_head, input_var, mut plan) = match &stmt.input {
        Some(inner) => {
            let inner_plan = validate(inner, ctx, input_vars)?;
            let inner_out = inner_plan.nodes.iter().find(|n| n.id() == inner_plan.head).unwrap().output_var().to_string();
            (inner_plan.head, inner_out, inner_plan)
        }
        None => {
            let var = ctx.symbols.new_variable(None, "Start")?;
            let id = ctx.next_id();
            let node = PlanNode::Start(StartNode { base: PlanNodeBase::new(id, &var, vec![]), seeds: vec![] });
            ctx.symbols.bind_producer(&var, id)?;
            (id, var, SubPlan::singleton(node))
        }
    };

    let col_names: Vec<String> = stmt
        .yield_
        .iter()
        .map(|c| c.alias.clone().unwrap_or_else(|| c.expr.canonical_string()))
        .collect();
    let out_var = ctx.symbols.new_variable(None, "Project")?;
    let id = ctx.next_id();
    let project = PlanNode::Project(ProjectNode {
        base: PlanNodeBase::new(id, &out_var, col_names)
            .with_single_input(input_head, &input_var),
        columns: stmt
            .yield_
            .iter()
            .map(|c| (c.expr.clone(), c.alias.clone().unwrap_or_else(|| c.expr.canonical_string())))
            .collect(),
        expand_star: false,
    });
    ctx.symbols.bind_producer(&out_var, id)?;
    plan = plan.push_head(project);

    if stmt.distinct {
        let dedup_var = ctx.symbols.new_variable(None, "Dedup")?;
        let dedup_id = ctx.next_id();
        let dedup = PlanNode::Dedup(DedupNode {
            base: PlanNodeBase::new(dedup_id, &dedup_var, plan.nodes.last().unwrap().col_names().to_vec())
                .with_single_input(id, &out_var),
        });
        ctx.symbols.bind_producer(&dedup_var, dedup_id)?;
        plan = plan.push_head(dedup);
    }
    Ok(plan)
}
