//! LIMIT validator (§4.4). Folds into the preceding Sort as a TopN when
//! possible, mirroring the optimizer's own Sort+Limit fusion rule — done
//! here directly since the grammar always presents them adjacently.

use crate::ast::LimitStatement;
use crate::error::{Error, Result};
use crate::plan::{LimitNode, PlanNode, PlanNodeBase, SortNode, TopNNode};

use super::{validate, SubPlan, ValidateContext};

pub fn validate_limit(
    stmt: &LimitStatement,
    ctx: &mut ValidateContext,
    input_vars: &[String],
) -> Result<SubPlan> {
    if stmt.count < 0 || stmt.offset < 0 {
        return Err(Error::semantic("LIMIT offset and count must be non-negative"));
    }
    let mut inner_plan = validate(&stmt.input, ctx, input_vars)?;
    let inner_node_idx = inner_plan.nodes.iter().position(|n| n.id() == inner_plan.head).unwrap();
    let inner_out = inner_plan.nodes[inner_node_idx].output_var().to_string();
    let col_names = inner_plan.nodes[inner_node_idx].col_names().to_vec();

    if let PlanNode::Sort(sort) = &inner_plan.nodes[inner_node_idx] {
        let keys = sort.keys.clone();
        let dep = sort.base.dependencies[0];
        let dep_var = sort.base.input_vars[0].clone();
        inner_plan.nodes.remove(inner_node_idx);
        let out_var = ctx.symbols.new_variable(None, "TopN")?;
        let id = ctx.next_id();
        let node = PlanNode::TopN(TopNNode {
            base: PlanNodeBase::new(id, &out_var, col_names).with_single_input(dep, &dep_var),
            keys,
            offset: stmt.offset,
            count: stmt.count,
        });
        ctx.symbols.bind_producer(&out_var, id)?;
        inner_plan.nodes.push(node);
        inner_plan.head = id;
        return Ok(inner_plan);
    }

    let out_var = ctx.symbols.new_variable(None, "Limit")?;
    let id = ctx.next_id();
    let node = PlanNode::Limit(LimitNode {
        base: PlanNodeBase::new(id, &out_var, col_names).with_single_input(inner_plan.head, &inner_out),
        offset: stmt.offset,
        count: stmt.count,
    });
    ctx.symbols.bind_producer(&out_var, id)?;
    Ok(inner_plan.push_head(node))
}
