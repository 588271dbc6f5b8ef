//! Set-operator validator (§4.4): UNION / INTERSECT / MINUS.
//!
//! Both sides must agree on column count and name (§8 "Set-operator
//! column compatibility").

use crate::ast::{SetOpKind, Statement};
use crate::error::{Error, Result};
use crate::plan::{DedupNode, PlanNode, PlanNodeBase, SetOpNode};

use super::{validate, SubPlan, ValidateContext};

pub fn validate_set(
    kind: SetOpKind,
    distinct: bool,
    left: &Statement,
    right: &Statement,
    ctx: &mut ValidateContext,
    input_vars: &[String],
) -> Result<SubPlan> {
    let left_plan = validate(left, ctx, input_vars)?;
    let right_plan = validate(right, ctx, input_vars)?;
    let left_node = left_plan.nodes.iter().find(|n| n.id() == left_plan.head).unwrap();
    let right_node = right_plan.nodes.iter().find(|n| n.id() == right_plan.head).unwrap();
    if left_node.col_names() != right_node.col_names() {
        return Err(Error::semantic(format!(
            "set-operator columns must match: {:?} vs {:?}",
            left_node.col_names(),
            right_node.col_names()
        )));
    }
    let left_head = left_plan.head;
    let left_out = left_node.output_var().to_string();
    let right_head = right_plan.head;
    let right_out = right_node.output_var().to_string();
    let col_names = left_node.col_names().to_vec();

    let mut plan = left_plan.merge(right_plan);

    let out_var = ctx.symbols.new_variable(None, "SetOp")?;
    let id = ctx.next_id();
    let base = PlanNodeBase::new(id, &out_var, col_names).with_two_inputs(left_head, &left_out, right_head, &right_out);
    let node = match kind {
        SetOpKind::Union => PlanNode::Union(SetOpNode { base }),
        SetOpKind::Intersect => PlanNode::Intersect(SetOpNode { base }),
        SetOpKind::Minus => PlanNode::Minus(SetOpNode { base }),
    };
    ctx.symbols.bind_producer(&out_var, id)?;
    plan = plan.push_head(node);

    if distinct {
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
