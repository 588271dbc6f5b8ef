//! ORDER BY validator (§4.4).

use crate::ast::OrderByStatement;
use crate::error::{Error, Result};
use crate::plan::{PlanNode, PlanNodeBase, SortNode};

use super::{validate, SubPlan, ValidateContext};

pub fn validate_order_by(
    stmt: &OrderByStatement,
    ctx: &mut ValidateContext,
    input_vars: &[String],
) -> Result<SubPlan> {
    let inner_plan = validate(&stmt.input, ctx, input_vars)?;
    let inner_node = inner_plan.nodes.iter().find(|n| n.id() == inner_plan.head).unwrap();
    let inner_out = inner_node.output_var().to_string();
    let col_names = inner_node.col_names().to_vec();

    if stmt.keys.is_empty() {
        return Err(Error::semantic("ORDER BY requires at least one key"));
    }
    for (key, _) in &stmt.keys {
        if !col_names.iter().any(|c| c == key) {
            return Err(Error::semantic(format!("unknown ORDER BY column: {key}")));
        }
    }

    let out_var = ctx.symbols.new_variable(None, "Sort")?;
    let id = ctx.next_id();
    let node = PlanNode::Sort(SortNode {
        base: PlanNodeBase::new(id, &out_var, col_names).with_single_input(inner_plan.head, &inner_out),
        keys: stmt.keys.clone(),
    });
    ctx.symbols.bind_producer(&out_var, id)?;
    Ok(inner_plan.push_head(node))
}
