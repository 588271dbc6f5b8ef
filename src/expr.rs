//! Expression AST shared by validators, the optimizer and executors.
//!
//! An `Expression` is built once by a validator (§4.4) and evaluated many
//! times by an executor against a [`crate::context::ExpressionContext`]
//! (§4.2). Validators also walk it structurally to compute `exprProps_`
//! (the set of columns/props it touches) without evaluating it.

use std::fmt;

use crate::context::ExpressionContext;
use crate::error::{Error, Result};
use crate::value::{Value, ValueType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Count,
    CountDistinct,
    Sum,
    Avg,
    Min,
    Max,
    Collect,
    Stdev,
    BitAnd,
    BitOr,
    BitXor,
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::CountDistinct => "COUNT_DISTINCT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Collect => "COLLECT",
            AggregateFunction::Stdev => "STDEV",
            AggregateFunction::BitAnd => "BIT_AND",
            AggregateFunction::BitOr => "BIT_OR",
            AggregateFunction::BitXor => "BIT_XOR",
        };
        write!(f, "{s}")
    }
}

/// Reference resolution kinds mirroring §4.2's accessor table. Kept
/// separate from `Expression::FunctionCall` since these bind against the
/// current `ExpressionContext` cursor rather than against evaluated
/// child expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Constant(Value),
    /// `var(name)` — latest value of a named variable.
    Var(String),
    /// `versioned_var(name, v)`.
    VersionedVar(String, i64),
    /// Column of the current operator's input iterator (`$-.col` or bare
    /// unqualified reference inside a pipe).
    InputProp(String),
    /// `var_prop(var, prop)` — `$var.col`.
    VarProp(String, String),
    /// `src_prop(tag, prop)` — `$$.tag.prop` / `$^.tag.prop` depending on
    /// direction; direction is resolved by the validator before this
    /// node is built, so the expression itself is direction-agnostic.
    SrcProp(String, String),
    DstProp(String, String),
    EdgeProp(String, String),
    Arithmetic { op: ArithOp, left: Box<Expression>, right: Box<Expression> },
    Compare { op: CompareOp, left: Box<Expression>, right: Box<Expression> },
    Logic { op: LogicOp, left: Box<Expression>, right: Box<Expression> },
    Not(Box<Expression>),
    /// `AND`/`OR` with already-flattened operands, used by the
    /// optimizer's filter-fusion rule (Filter∘Filter = Filter(p1 ∧ p2)).
    FunctionCall { name: String, args: Vec<Expression> },
    /// Validator-rejected: an aggregate nested inside another expression
    /// that itself contains an aggregate is a semantic error, never a
    /// constructible node — so `Aggregate` only ever appears as the sole
    /// top-level expression of a group item, never nested here.
    ListLiteral(Vec<Expression>),
}

impl Expression {
    pub fn eval(&self, ctx: &dyn ExpressionContext) -> Result<Value> {
        match self {
            Expression::Constant(v) => Ok(v.clone()),
            Expression::Var(name) => Ok(ctx.var(name)?),
            Expression::VersionedVar(name, v) => Ok(ctx.versioned_var(name, *v)?),
            Expression::InputProp(prop) => Ok(ctx.input_prop(prop)),
            Expression::VarProp(var, prop) => Ok(ctx.var_prop(var, prop)?),
            Expression::SrcProp(tag, prop) => Ok(ctx.src_prop(tag, prop)),
            Expression::DstProp(tag, prop) => Ok(ctx.dst_prop(tag, prop)),
            Expression::EdgeProp(edge_type, prop) => Ok(ctx.edge_prop(edge_type, prop)),
            Expression::Arithmetic { op, left, right } => {
                eval_arith(*op, &left.eval(ctx)?, &right.eval(ctx)?)
            }
            Expression::Compare { op, left, right } => {
                eval_compare(*op, &left.eval(ctx)?, &right.eval(ctx)?)
            }
            Expression::Logic { op, left, right } => {
                eval_logic(*op, &left.eval(ctx)?, &right.eval(ctx)?)
            }
            Expression::Not(inner) => match inner.eval(ctx)?.as_bool() {
                Some(b) => Ok(Value::Bool(!b)),
                None => Ok(Value::Null),
            },
            Expression::FunctionCall { name, args } => eval_builtin(name, args, ctx),
            Expression::ListLiteral(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(item.eval(ctx)?);
                }
                Ok(Value::List(out))
            }
        }
    }

    /// A stable, human-readable rendering used as the default column
    /// name for an unaliased yield item (§4.7 Project).
    pub fn canonical_string(&self) -> String {
        match self {
            Expression::Constant(v) => v.to_string(),
            Expression::Var(name) => format!("${name}"),
            Expression::VersionedVar(name, v) => format!("${name}@{v}"),
            Expression::InputProp(prop) => format!("$-.{prop}"),
            Expression::VarProp(var, prop) => format!("${var}.{prop}"),
            Expression::SrcProp(tag, prop) => format!("$^.{tag}.{prop}"),
            Expression::DstProp(tag, prop) => format!("$$.{tag}.{prop}"),
            Expression::EdgeProp(et, prop) => format!("{et}.{prop}"),
            Expression::Arithmetic { op, left, right } => {
                format!("({}{}{})", left.canonical_string(), arith_symbol(*op), right.canonical_string())
            }
            Expression::Compare { op, left, right } => {
                format!("({}{}{})", left.canonical_string(), compare_symbol(*op), right.canonical_string())
            }
            Expression::Logic { op, left, right } => format!(
                "({} {:?} {})",
                left.canonical_string(),
                op,
                right.canonical_string()
            ),
            Expression::Not(inner) => format!("!{}", inner.canonical_string()),
            Expression::FunctionCall { name, args } => format!(
                "{name}({})",
                args.iter().map(Expression::canonical_string).collect::<Vec<_>>().join(",")
            ),
            Expression::ListLiteral(items) => format!(
                "[{}]",
                items.iter().map(Expression::canonical_string).collect::<Vec<_>>().join(",")
            ),
        }
    }

    /// Structural walk computing the closed set of input columns this
    /// expression references (§4.4 `exprProps_`), used by validators to
    /// decide pushdown eligibility and by `Filter`'s predicate-fusion
    /// rule.
    pub fn referenced_input_props(&self, out: &mut Vec<String>) {
        match self {
            Expression::InputProp(p) => out.push(p.clone()),
            Expression::Arithmetic { left, right, .. }
            | Expression::Compare { left, right, .. }
            | Expression::Logic { left, right, .. } => {
                left.referenced_input_props(out);
                right.referenced_input_props(out);
            }
            Expression::Not(inner) => inner.referenced_input_props(out),
            Expression::FunctionCall { args, .. } | Expression::ListLiteral(args) => {
                for a in args {
                    a.referenced_input_props(out);
                }
            }
            _ => {}
        }
    }

    pub fn is_aggregate_free(&self) -> bool {
        !matches!(self, Expression::FunctionCall { name, .. } if is_aggregate_name(name))
    }
}

pub fn is_aggregate_name(name: &str) -> bool {
    matches!(
        name.to_ascii_uppercase().as_str(),
        "COUNT" | "COUNT_DISTINCT" | "SUM" | "AVG" | "MIN" | "MAX" | "COLLECT" | "STDEV"
    )
}

fn arith_symbol(op: ArithOp) -> &'static str {
    match op {
        ArithOp::Add => "+",
        ArithOp::Sub => "-",
        ArithOp::Mul => "*",
        ArithOp::Div => "/",
        ArithOp::Mod => "%",
    }
}

fn compare_symbol(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "==",
        CompareOp::Ne => "!=",
        CompareOp::Lt => "<",
        CompareOp::Le => "<=",
        CompareOp::Gt => ">",
        CompareOp::Ge => ">=",
    }
}

fn eval_arith(op: ArithOp, l: &Value, r: &Value) -> Result<Value> {
    let (a, b) = match (l, r) {
        (Value::Int(a), Value::Int(b)) if op != ArithOp::Div => {
            return Ok(int_arith(op, *a, *b));
        }
        (Value::Int(a), Value::Int(b)) => (*a as f64, *b as f64),
        (Value::Int(a), Value::Float(b)) => (*a as f64, b.0),
        (Value::Float(a), Value::Int(b)) => (a.0, *b as f64),
        (Value::Float(a), Value::Float(b)) => (a.0, b.0),
        _ => return Ok(Value::Null),
    };
    Ok(float_arith(op, a, b))
}

fn int_arith(op: ArithOp, a: i64, b: i64) -> Value {
    match op {
        ArithOp::Add => Value::Int(a.wrapping_add(b)),
        ArithOp::Sub => Value::Int(a.wrapping_sub(b)),
        ArithOp::Mul => Value::Int(a.wrapping_mul(b)),
        ArithOp::Mod => {
            if b == 0 {
                Value::Null
            } else {
                Value::Int(a % b)
            }
        }
        ArithOp::Div => unreachable!("Div handled via float path"),
    }
}

fn float_arith(op: ArithOp, a: f64, b: f64) -> Value {
    use crate::value::OrderedFloat;
    match op {
        ArithOp::Add => Value::Float(OrderedFloat(a + b)),
        ArithOp::Sub => Value::Float(OrderedFloat(a - b)),
        ArithOp::Mul => Value::Float(OrderedFloat(a * b)),
        ArithOp::Div => {
            if b == 0.0 {
                Value::Null
            } else {
                Value::Float(OrderedFloat(a / b))
            }
        }
        ArithOp::Mod => {
            if b == 0.0 {
                Value::Null
            } else {
                Value::Float(OrderedFloat(a % b))
            }
        }
    }
}

fn eval_compare(op: CompareOp, l: &Value, r: &Value) -> Result<Value> {
    if matches!(op, CompareOp::Eq | CompareOp::Ne) {
        let eq = l.value_eq(r);
        return Ok(Value::Bool(if op == CompareOp::Eq { eq } else { !eq }));
    }
    match l.partial_compare(r) {
        None => Ok(Value::Null),
        Some(ord) => {
            use std::cmp::Ordering::*;
            let b = match op {
                CompareOp::Lt => ord == Less,
                CompareOp::Le => ord != Greater,
                CompareOp::Gt => ord == Greater,
                CompareOp::Ge => ord != Less,
                CompareOp::Eq | CompareOp::Ne => unreachable!(),
            };
            Ok(Value::Bool(b))
        }
    }
}

fn eval_logic(op: LogicOp, l: &Value, r: &Value) -> Result<Value> {
    let (lb, rb) = (l.as_bool(), r.as_bool());
    Ok(match op {
        LogicOp::And => match (lb, rb) {
            (Some(false), _) | (_, Some(false)) => Value::Bool(false),
            (Some(true), Some(true)) => Value::Bool(true),
            _ => Value::Null,
        },
        LogicOp::Or => match (lb, rb) {
            (Some(true), _) | (_, Some(true)) => Value::Bool(true),
            (Some(false), Some(false)) => Value::Bool(false),
            _ => Value::Null,
        },
        LogicOp::Xor => match (lb, rb) {
            (Some(a), Some(b)) => Value::Bool(a ^ b),
            _ => Value::Null,
        },
    })
}

fn eval_builtin(name: &str, args: &[Expression], ctx: &dyn ExpressionContext) -> Result<Value> {
    let mut vals = Vec::with_capacity(args.len());
    for a in args {
        vals.push(a.eval(ctx)?);
    }
    match name.to_ascii_uppercase().as_str() {
        "ABS" => match vals.first() {
            Some(Value::Int(i)) => Ok(Value::Int(i.abs())),
            Some(Value::Float(f)) => Ok(Value::Float(crate::value::OrderedFloat(f.0.abs()))),
            _ => Ok(Value::Null),
        },
        "LENGTH" => match vals.first() {
            Some(Value::String(s)) => Ok(Value::Int(s.chars().count() as i64)),
            Some(Value::List(l)) | Some(Value::Set(l)) => Ok(Value::Int(l.len() as i64)),
            _ => Ok(Value::Null),
        },
        "TOSTRING" => Ok(vals
            .first()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null)),
        other => Err(Error::execution(format!("unknown builtin function: {other}"))),
    }
}

/// Expected type check used by validators (§4.4: "every expression has a
/// deducible Value::Type given the inputs' schema"). This crate does not
/// carry a full schema-driven type deduction table (the metadata client
/// boundary owns schema), so deduction here is best-effort on constants
/// and delegated to the caller-supplied declared type for references.
pub fn deduce_constant_type(expr: &Expression) -> Option<ValueType> {
    match expr {
        Expression::Constant(v) => Some(v.value_type()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::row_context;

    #[test]
    fn arithmetic_int_stays_int_except_division() {
        let ctx = row_context(vec![]);
        let e = Expression::Arithmetic {
            op: ArithOp::Add,
            left: Box::new(Expression::Constant(Value::Int(2))),
            right: Box::new(Expression::Constant(Value::Int(3))),
        };
        assert_eq!(e.eval(&ctx).unwrap(), Value::Int(5));
    }

    #[test]
    fn division_by_zero_yields_null() {
        let ctx = row_context(vec![]);
        let e = Expression::Arithmetic {
            op: ArithOp::Div,
            left: Box::new(Expression::Constant(Value::Int(1))),
            right: Box::new(Expression::Constant(Value::Int(0))),
        };
        assert_eq!(e.eval(&ctx).unwrap(), Value::Null);
    }

    #[test]
    fn and_short_circuits_on_false_even_with_null_other_operand() {
        let ctx = row_context(vec![]);
        let e = Expression::Logic {
            op: LogicOp::And,
            left: Box::new(Expression::Constant(Value::Bool(false))),
            right: Box::new(Expression::Constant(Value::Null)),
        };
        assert_eq!(e.eval(&ctx).unwrap(), Value::Bool(false));
    }

    #[test]
    fn canonical_string_is_stable_default_column_name() {
        let e = Expression::InputProp("col0".into());
        assert_eq!(e.canonical_string(), "$-.col0");
    }
}
