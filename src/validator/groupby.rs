//! GROUP BY validator (§4.4): aggregation over an upstream dataset.

use crate::ast::GroupByStatement;
use crate::error::{Error, Result};
use crate::expr::{is_aggregate_name, AggregateFunction, Expression};
use crate::plan::{AggregateNode, PlanNode, PlanNodeBase};

use super::{validate, SubPlan, ValidateContext};

pub fn validate_group_by(
    stmt: &GroupByStatement,
    ctx: &mut ValidateContext,
    input_vars: &[String],
) -> Result<SubPlan> {
    let inner_plan = validate(&stmt.input, ctx, input_vars)?;
    let inner_node = inner_plan.nodes.iter().find(|n| n.id() == inner_plan.head).unwrap();
    let inner_out = inner_node.output_var().to_string();

    let mut group_items = Vec::new();
    for col in &stmt.yield_ {
        if let Expression::FunctionCall { name, args } = &col.expr {
            if is_aggregate_name(name) {
                let func = aggregate_function(name)?;
                let arg = args.first().cloned().unwrap_or(Expression::Constant(crate::value::Value::Null));
                group_items.push((arg, func, false));
                continue;
            }
        }
        if !stmt.group_keys.iter().any(|k| k.canonical_string() == col.expr.canonical_string()) {
            return Err(Error::semantic(format!(
                "non-aggregated YIELD column '{}' must appear in GROUP BY",
                col.expr.canonical_string()
            )));
        }
    }

    let col_names: Vec<String> = stmt
        .yield_
        .iter()
        .map(|c| c.alias.clone().unwrap_or_else(|| c.expr.canonical_string()))
        .collect();
    let out_var = ctx.symbols.new_variable(None, "Aggregate")?;
    let id = ctx.next_id();
    let node = PlanNode::Aggregate(AggregateNode {
        base: PlanNodeBase::new(id, &out_var, col_names).with_single_input(inner_plan.head, &inner_out),
        group_keys: stmt.group_keys.clone(),
        group_items,
    });
    ctx.symbols.bind_producer(&out_var, id)?;
    Ok(inner_plan.push_head(node))
}

fn aggregate_function(name: &str) -> Result<AggregateFunction> {
    Ok(match name.to_ascii_uppercase().as_str() {
        "COUNT" => AggregateFunction::Count,
        "COUNT_DISTINCT" => AggregateFunction::CountDistinct,
        "SUM" => AggregateFunction::Sum,
        "AVG" => AggregateFunction::Avg,
        "MIN" => AggregateFunction::Min,
        "MAX" => AggregateFunction::Max,
        "COLLECT" => AggregateFunction::Collect,
        "STD" | "STDEV" => AggregateFunction::Stdev,
        "BIT_AND" => AggregateFunction::BitAnd,
        "BIT_OR" => AggregateFunction::BitOr,
        "BIT_XOR" => AggregateFunction::BitXor,
        other => return Err(Error::semantic(format!("unknown aggregate function: {other}"))),
    })
}
