//! Aggregate operator (§4.7): grouping plus the eleven aggregate
//! functions from §4.2's `AggregateFunction`.

use crate::context::{RowContext, VariableResolver};
use crate::error::{Error, Result};
use crate::expr::AggregateFunction;
use crate::plan::AggregateNode;
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

pub fn aggregate(node: &AggregateNode, inputs: &[DataSet]) -> Result<DataSet> {
    let input = inputs.first().ok_or_else(|| Error::execution("Aggregate has no input"))?;
    let mut groups: Vec<(Vec<Value>, Vec<usize>)> = Vec::new();
    for i in 0..input.len() {
        let ctx = RowContext::new(input, i, &NoVars);
        let mut key = Vec::with_capacity(node.group_keys.len());
        for k in &node.group_keys {
            key.push(k.eval(&ctx)?);
        }
        match groups.iter_mut().find(|(gk, _)| keys_eq(gk, &key)) {
            Some((_, rows)) => rows.push(i),
            None => groups.push((key, vec![i])),
        }
    }
    if groups.is_empty() && node.group_keys.is_empty() {
        groups.push((Vec::new(), Vec::new()));
    }

    let mut ds = DataSet::new(node.base.col_names.clone());
    for (key, rows) in &groups {
        let mut out_row = key.clone();
        for (expr, func, distinct) in &node.group_items {
            let mut values = Vec::with_capacity(rows.len());
            for &i in rows {
                let ctx = RowContext::new(input, i, &NoVars);
                values.push(expr.eval(&ctx)?);
            }
            if *distinct {
                dedup_values(&mut values);
            }
            out_row.push(fold(*func, &values));
        }
        ds.push_row(out_row);
    }
    Ok(ds)
}

fn keys_eq(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.value_eq(y))
}

fn dedup_values(values: &mut Vec<Value>) {
    let mut kept = Vec::with_capacity(values.len());
    for v in values.drain(..) {
        if !kept.iter().any(|k: &Value| k.value_eq(&v)) {
            kept.push(v);
        }
    }
    *values = kept;
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(f.0),
        _ => None,
    }
}

fn as_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Int(i) => Some(*i),
        _ => None,
    }
}

fn fold(func: AggregateFunction, values: &[Value]) -> Value {
    match func {
        AggregateFunction::Count => Value::Int(values.len() as i64),
        AggregateFunction::CountDistinct => {
            let mut seen: Vec<&Value> = Vec::new();
            for v in values {
                if !seen.iter().any(|s| s.value_eq(v)) {
                    seen.push(v);
                }
            }
            Value::Int(seen.len() as i64)
        }
        AggregateFunction::Sum => {
            if values.iter().all(|v| matches!(v, Value::Int(_))) {
                Value::Int(values.iter().filter_map(as_i64).sum())
            } else {
                let sum: f64 = values.iter().filter_map(as_f64).sum();
                Value::Float(crate::value::OrderedFloat(sum))
            }
        }
        AggregateFunction::Avg => {
            let nums: Vec<f64> = values.iter().filter_map(as_f64).collect();
            if nums.is_empty() {
                Value::Null
            } else {
                Value::Float(crate::value::OrderedFloat(nums.iter().sum::<f64>() / nums.len() as f64))
            }
        }
        AggregateFunction::Min => values
            .iter()
            .min_by(|a, b| a.partial_compare(b).unwrap_or(std::cmp::Ordering::Equal))
            .cloned()
            .unwrap_or(Value::Null),
        AggregateFunction::Max => values
            .iter()
            .max_by(|a, b| a.partial_compare(b).unwrap_or(std::cmp::Ordering::Equal))
            .cloned()
            .unwrap_or(Value::Null),
        AggregateFunction::Collect => Value::List(values.to_vec()),
        AggregateFunction::Stdev => {
            let nums: Vec<f64> = values.iter().filter_map(as_f64).collect();
            if nums.is_empty() {
                Value::Null
            } else {
                let mean = nums.iter().sum::<f64>() / nums.len() as f64;
                let variance = nums.iter().map(|n| (n - mean).powi(2)).sum::<f64>() / nums.len() as f64;
                Value::Float(crate::value::OrderedFloat(variance.sqrt()))
            }
        }
        AggregateFunction::BitAnd => Value::Int(values.iter().filter_map(as_i64).fold(-1i64, |a, b| a & b)),
        AggregateFunction::BitOr => Value::Int(values.iter().filter_map(as_i64).fold(0i64, |a, b| a | b)),
        AggregateFunction::BitXor => Value::Int(values.iter().filter_map(as_i64).fold(0i64, |a, b| a ^ b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expression;
    use crate::plan::{PlanNodeBase, PlanNodeId};

    #[test]
    fn count_groups_by_key() {
        let ds = DataSet::with_rows(
            vec!["k".into(), "v".into()],
            vec![
                vec![Value::String("a".into()), Value::Int(1)],
                vec![Value::String("a".into()), Value::Int(2)],
                vec![Value::String("b".into()), Value::Int(3)],
            ],
        );
        let node = AggregateNode {
            base: PlanNodeBase::new(PlanNodeId(0), "out", vec!["k".into(), "cnt".into()]),
            group_keys: vec![Expression::InputProp("k".into())],
            group_items: vec![(Expression::InputProp("v".into()), AggregateFunction::Count, false)],
        };
        let out = aggregate(&node, &[ds]).unwrap();
        assert_eq!(out.len(), 2);
        let a_row = out.rows.iter().find(|r| r[0] == Value::String("a".into())).unwrap();
        assert_eq!(a_row[1], Value::Int(2));
    }

    #[test]
    fn sum_stays_int_for_all_int_inputs() {
        let values = vec![Value::Int(1), Value::Int(2), Value::Int(3)];
        assert_eq!(fold(AggregateFunction::Sum, &values), Value::Int(6));
    }
}
