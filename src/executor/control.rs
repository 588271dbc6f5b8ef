//! Control-adjacent operators that the scheduler itself doesn't drive:
//! `Assign`, `PassThrough`, `MultiOutputs` (§4.7/§4.8). `Select`/`Loop`
//! are handled directly in `scheduler::execute_one` since their bodies
//! are separate subtrees, not ordinary dependencies.

use crate::context::{RowContext, VariableResolver};
use crate::error::{Error, Result};
use crate::plan::AssignNode;
use crate::value::{DataSet, Value};

struct NoVars;
impl VariableResolver for NoVars {
    fn latest(&self, _name: &str) -> Option<Value> {
        None
    }
    fn versioned(&self, _name: &str, _v: i64) -> Option<Value> {
        None
    }
    fn var_prop(&self, _name: &str, _prop: &str) -> Option<Value> {
        None
    }
}

pub fn pass_through(inputs: &[DataSet]) -> Result<DataSet> {
    inputs.first().cloned().ok_or_else(|| Error::execution("PassThrough has no input"))
}

pub fn multi_outputs(inputs: &[DataSet]) -> Result<DataSet> {
    inputs.first().cloned().ok_or_else(|| Error::execution("MultiOutputs has no input"))
}

/// Evaluates `expr` against row 0 of the (possibly absent) single input
/// — sufficient for loop counters (`counter = counter + 1`), where the
/// input is the counter's own prior value fed back by the scheduler.
pub fn assign(node: &AssignNode, inputs: &[DataSet]) -> Result<DataSet> {
    let empty = DataSet::new(vec![]);
    let input = inputs.first().unwrap_or(&empty);
    let ctx = RowContext::new(input, 0, &NoVars);
    let value = node.expr.eval(&ctx)?;
    let mut ds = DataSet::new(vec![node.var_name.clone()]);
    ds.push_row(vec![value]);
    Ok(ds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{ArithOp, Expression};
    use crate::plan::{PlanNodeBase, PlanNodeId};

    #[test]
    fn assign_increments_counter_from_its_own_prior_value() {
        let prior = DataSet::with_rows(vec!["counter".into()], vec![vec![Value::Int(2)]]);
        let node = AssignNode {
            base: PlanNodeBase::new(PlanNodeId(0), "counter", vec!["counter".into()]),
            var_name: "counter".into(),
            expr: Expression::Arithmetic {
                op: ArithOp::Add,
                left: Box::new(Expression::InputProp("counter".into())),
                right: Box::new(Expression::Constant(Value::Int(1))),
            },
        };
        let out = assign(&node, &[prior]).unwrap();
        assert_eq!(out.rows[0][0], Value::Int(3));
    }
}
