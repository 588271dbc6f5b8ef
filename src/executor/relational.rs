//! Row-shape operators (§4.7): Project/Filter/Sort/Limit/TopN/Dedup/
//! Unwind/set ops/joins/cartesian product. All of these read a `DataSet`
//! column-wise, so they share one `RowContext`-based evaluation style.

use crate::context::{ExpressionContext, RowContext, VariableResolver};
use crate::error::{Error, Result};
use crate::expr::Expression;
use crate::plan::{
    CartesianProductNode, FilterNode, JoinNode, LimitNode, ProjectNode, SortNode, SortOrder,
    TopNNode, UnwindNode,
};
use crate::value::{DataSet, Row, Value};

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

fn row_ctx(ds: &DataSet, row: usize) -> RowContext<'_> {
    RowContext::new(ds, row, &NoVars)
}

pub fn project(node: &ProjectNode, inputs: &[DataSet]) -> Result<DataSet> {
    let input = inputs.first().ok_or_else(|| Error::execution("Project has no input"))?;
    if node.expand_star {
        return Ok(input.clone());
    }
    let mut ds = DataSet::new(node.base.col_names.clone());
    for i in 0..input.len() {
        let ctx = RowContext::new(input, i, &NoVars);
        let mut row = Vec::with_capacity(node.columns.len());
        for (expr, _alias) in &node.columns {
            row.push(expr.eval(&ctx)?);
        }
        ds.push_row(row);
    }
    Ok(ds)
}

pub fn filter(node: &FilterNode, inputs: &[DataSet]) -> Result<DataSet> {
    let input = inputs.first().ok_or_else(|| Error::execution("Filter has no input"))?;
    let mut ds = DataSet::new(node.base.col_names.clone());
    for i in 0..input.len() {
        let ctx = row_ctx(input, i);
        if node.predicate.eval(&ctx)?.as_bool().unwrap_or(false) {
            ds.push_row(input.rows[i].clone());
        }
    }
    Ok(ds)
}

fn cmp_rows(a: &Row, b: &Row, keys: &[(String, SortOrder)], col_names: &[String]) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    for (name, order) in keys {
        let Some(idx) = col_names.iter().position(|c| c == name) else { continue };
        let ord = a[idx].partial_compare(&b[idx]).unwrap_or(Ordering::Equal);
        let ord = if *order == SortOrder::Desc { ord.reverse() } else { ord };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

pub fn sort(node: &SortNode, inputs: &[DataSet]) -> Result<DataSet> {
    let input = inputs.first().ok_or_else(|| Error::execution("Sort has no input"))?;
    let mut ds = input.clone();
    sort_in_place(&mut ds, &node.keys)?;
    Ok(ds)
}

/// Shared by the GetNeighbors inline sort/dedup/limit and the standalone
/// `Sort`/`Dedup`/`Limit` operators (§4.7 pushdown).
pub fn sort_in_place(ds: &mut DataSet, keys: &[(String, SortOrder)]) -> Result<()> {
    let col_names = ds.col_names.clone();
    ds.rows.sort_by(|a, b| cmp_rows(a, b, keys, &col_names));
    Ok(())
}

pub fn dedup_in_place(ds: &mut DataSet) {
    let mut kept: Vec<Row> = Vec::with_capacity(ds.rows.len());
    for row in ds.rows.drain(..) {
        if !kept.iter().any(|r| rows_equal(r, &row)) {
            kept.push(row);
        }
    }
    ds.rows = kept;
}

fn rows_equal(a: &Row, b: &Row) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.value_eq(y))
}

pub fn limit(node: &LimitNode, inputs: &[DataSet]) -> Result<DataSet> {
    let input = inputs.first().ok_or_else(|| Error::execution("Limit has no input"))?;
    let mut ds = DataSet::new(node.base.col_names.clone());
    let start = node.offset.max(0) as usize;
    let end = node.count.max(0) as usize;
    ds.rows = input.rows.iter().skip(start).take(end).cloned().collect();
    Ok(ds)
}

pub fn top_n(node: &TopNNode, inputs: &[DataSet]) -> Result<DataSet> {
    let input = inputs.first().ok_or_else(|| Error::execution("TopN has no input"))?;
    let mut ds = input.clone();
    sort_in_place(&mut ds, &node.keys)?;
    let start = node.offset.max(0) as usize;
    let end = node.count.max(0) as usize;
    ds.rows = ds.rows.into_iter().skip(start).take(end).collect();
    ds.col_names = node.base.col_names.clone();
    Ok(ds)
}

pub fn dedup(inputs: &[DataSet]) -> Result<DataSet> {
    let input = inputs.first().ok_or_else(|| Error::execution("Dedup has no input"))?;
    let mut ds = input.clone();
    dedup_in_place(&mut ds);
    Ok(ds)
}

pub fn unwind(node: &UnwindNode, inputs: &[DataSet]) -> Result<DataSet> {
    let input = inputs.first().ok_or_else(|| Error::execution("Unwind has no input"))?;
    let mut ds = DataSet::new(node.base.col_names.clone());
    for i in 0..input.len() {
        let ctx = row_ctx(input, i);
        let list = node.list_expr.eval(&ctx)?;
        let items: Vec<Value> = match list {
            Value::List(items) | Value::Set(items) => items,
            Value::Null => continue,
            other => vec![other],
        };
        for item in items {
            let mut row = input.rows[i].clone();
            row.push(item);
            ds.push_row(row);
        }
    }
    let _ = &node.alias;
    Ok(ds)
}

pub fn union(inputs: &[DataSet]) -> Result<DataSet> {
    let first = inputs.first().ok_or_else(|| Error::execution("Union has no input"))?;
    let mut ds = DataSet::new(first.col_names.clone());
    for input in inputs {
        if !ds.same_columns(input) {
            return Err(Error::execution("Union operands have mismatched columns"));
        }
        ds.rows.extend(input.rows.iter().cloned());
    }
    Ok(ds)
}

pub fn intersect(inputs: &[DataSet]) -> Result<DataSet> {
    let (first, rest) = inputs
        .split_first()
        .ok_or_else(|| Error::execution("Intersect has no input"))?;
    let mut ds = DataSet::new(first.col_names.clone());
    for row in &first.rows {
        if rest.iter().all(|other| other.rows.iter().any(|r| rows_equal(r, row))) {
            ds.push_row(row.clone());
        }
    }
    Ok(ds)
}

pub fn minus(inputs: &[DataSet]) -> Result<DataSet> {
    let first = inputs.first().ok_or_else(|| Error::execution("Minus has no input"))?;
    let mut ds = DataSet::new(first.col_names.clone());
    for row in &first.rows {
        let excluded = inputs[1..].iter().any(|other| other.rows.iter().any(|r| rows_equal(r, row)));
        if !excluded {
            ds.push_row(row.clone());
        }
    }
    Ok(ds)
}

fn eval_keys(ds: &DataSet, row: usize, keys: &[Expression]) -> Result<Vec<Value>> {
    let ctx = row_ctx(ds, row);
    keys.iter().map(|k| k.eval(&ctx)).collect()
}

pub fn inner_join(node: &JoinNode, inputs: &[DataSet]) -> Result<DataSet> {
    let left = inputs.first().ok_or_else(|| Error::execution("InnerJoin missing left input"))?;
    let right = inputs.get(1).ok_or_else(|| Error::execution("InnerJoin missing right input"))?;
    let mut ds = DataSet::new(node.base.col_names.clone());
    for li in 0..left.len() {
        let lkey = eval_keys(left, li, &node.left_keys)?;
        for ri in 0..right.len() {
            let rkey = eval_keys(right, ri, &node.right_keys)?;
            if keys_equal(&lkey, &rkey) {
                let mut row = left.rows[li].clone();
                row.extend(right.rows[ri].clone());
                ds.push_row(row);
            }
        }
    }
    Ok(ds)
}

pub fn left_join(node: &JoinNode, inputs: &[DataSet]) -> Result<DataSet> {
    let left = inputs.first().ok_or_else(|| Error::execution("LeftJoin missing left input"))?;
    let right = inputs.get(1).ok_or_else(|| Error::execution("LeftJoin missing right input"))?;
    let right_arity = right.arity();
    let mut ds = DataSet::new(node.base.col_names.clone());
    for li in 0..left.len() {
        let lkey = eval_keys(left, li, &node.left_keys)?;
        let mut matched = false;
        for ri in 0..right.len() {
            let rkey = eval_keys(right, ri, &node.right_keys)?;
            if keys_equal(&lkey, &rkey) {
                matched = true;
                let mut row = left.rows[li].clone();
                row.extend(right.rows[ri].clone());
                ds.push_row(row);
            }
        }
        if !matched {
            let mut row = left.rows[li].clone();
            row.extend(std::iter::repeat(Value::Null).take(right_arity));
            ds.push_row(row);
        }
    }
    Ok(ds)
}

fn keys_equal(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.value_eq(y))
}

pub fn cartesian_product(node: &CartesianProductNode, inputs: &[DataSet]) -> Result<DataSet> {
    let mut ds = DataSet::new(node.base.col_names.clone());
    if inputs.is_empty() {
        return Ok(ds);
    }
    let mut rows: Vec<Row> = vec![Vec::new()];
    for input in inputs {
        let mut next = Vec::with_capacity(rows.len() * input.len().max(1));
        for prefix in &rows {
            for row in &input.rows {
                let mut combined = prefix.clone();
                combined.extend(row.clone());
                next.push(combined);
            }
        }
        rows = next;
    }
    ds.rows = rows;
    Ok(ds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::CompareOp;
    use crate::plan::{PlanNodeBase, PlanNodeId};

    #[test]
    fn filter_keeps_only_matching_rows() {
        let ds = DataSet::with_rows(vec!["a".into()], vec![vec![Value::Int(1)], vec![Value::Int(2)]]);
        let node = FilterNode {
            base: PlanNodeBase::new(PlanNodeId(0), "out", vec!["a".into()]),
            predicate: Expression::Compare {
                op: CompareOp::Gt,
                left: Box::new(Expression::InputProp("a".into())),
                right: Box::new(Expression::Constant(Value::Int(1))),
            },
        };
        let out = filter(&node, &[ds]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.rows[0][0], Value::Int(2));
    }

    #[test]
    fn dedup_removes_value_equal_duplicates() {
        let mut ds = DataSet::new(vec!["a".into()]);
        ds.push_row(vec![Value::Int(1)]);
        ds.push_row(vec![Value::Int(1)]);
        ds.push_row(vec![Value::Int(2)]);
        dedup_in_place(&mut ds);
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn project_with_identity_columns_is_a_no_op() {
        let ds = DataSet::with_rows(
            vec!["a".into(), "b".into()],
            vec![vec![Value::Int(1), Value::Int(2)], vec![Value::Int(3), Value::Int(4)]],
        );
        let node = ProjectNode {
            base: PlanNodeBase::new(PlanNodeId(0), "out", vec!["a".into(), "b".into()]),
            columns: vec![
                (Expression::InputProp("a".into()), "a".into()),
                (Expression::InputProp("b".into()), "b".into()),
            ],
            expand_star: false,
        };
        let out = project(&node, &[ds.clone()]).unwrap();
        assert_eq!(out.rows, ds.rows);
    }

    #[test]
    fn cartesian_product_multiplies_row_counts() {
        let left = DataSet::with_rows(vec!["a".into()], vec![vec![Value::Int(1)], vec![Value::Int(2)]]);
        let right = DataSet::with_rows(vec!["b".into()], vec![vec![Value::Int(9)]]);
        let node = CartesianProductNode {
            base: PlanNodeBase::new(PlanNodeId(0), "out", vec!["a".into(), "b".into()]),
        };
        let out = cartesian_product(&node, &[left, right]).unwrap();
        assert_eq!(out.len(), 2);
    }
}
