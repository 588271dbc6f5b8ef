//! Validator set (C4, §4.4).
//!
//! One function per statement kind, dispatched by [`validate`]. Each
//! validator type-checks its expressions, resolves schema references
//! against the [`Catalog`] snapshot, allocates output variables in the
//! [`SymbolTable`], and emits a [`SubPlan`] — §4.4's "sub-plan (head=tail,
//! root) of PlanNodes with output columns named." Composite statements
//! (Pipe/Set/Sequential) recurse into this same dispatcher for their
//! children, matching the source's validator-calls-validator structure.

mod admin;
mod explain;
mod fetch;
mod go;
mod groupby;
mod limit;
mod lookup;
mod orderby;
mod set;
mod subgraph;
mod yield_stmt;

use crate::arena::Arena;
use crate::ast::Statement;
use crate::catalog::Catalog;
use crate::error::Result;
use crate::plan::{PlanNode, PlanNodeId};
use crate::symbol::SymbolTable;

pub use explain::describe_plan;

/// (head, tail) of a validated operator chain plus every node it
/// allocated (§4.5 "SubPlan = (head PlanNode, tail PlanNode)"). `head` is
/// the chain's root (closest to the terminal output); `tail` is the
/// chain's deepest node, the one a caller should wire its own input
/// into when composing (Pipe/Sequential, §4.5).
#[derive(Debug, Clone)]
pub struct SubPlan {
    pub head: PlanNodeId,
    pub tail: PlanNodeId,
    pub nodes: Vec<PlanNode>,
}

impl SubPlan {
    pub fn singleton(node: PlanNode) -> Self {
        let id = node.id();
        SubPlan { head: id, tail: id, nodes: vec![node] }
    }

    /// Append `node` as the new head, depending on the current head.
    /// `node` must already declare its dependency edge onto `self.head`.
    pub fn push_head(mut self, node: PlanNode) -> Self {
        let id = node.id();
        self.nodes.push(node);
        self.head = id;
        self
    }

    pub fn merge(mut self, mut other: SubPlan) -> Self {
        self.nodes.append(&mut other.nodes);
        self
    }
}

/// Per-validation scratch shared by every validator function: the node
/// id generator, symbol table, schema snapshot, arena, and the current
/// space name (§4.4 "verify a space is chosen if the statement requires
/// one").
pub struct ValidateContext<'a> {
    pub catalog: &'a Catalog,
    pub symbols: &'a mut SymbolTable,
    pub arena: &'a mut Arena,
    pub space: Option<String>,
    next_node_id: u64,
}

impl<'a> ValidateContext<'a> {
    pub fn new(catalog: &'a Catalog, symbols: &'a mut SymbolTable, arena: &'a mut Arena) -> Self {
        ValidateContext { catalog, symbols, arena, space: None, next_node_id: 0 }
    }

    pub fn next_id(&mut self) -> PlanNodeId {
        let id = PlanNodeId(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    pub fn require_space(&self) -> Result<&str> {
        self.space
            .as_deref()
            .ok_or_else(|| crate::error::Error::semantic("no space selected"))
    }
}

/// Statement-kind dispatch, the entry point validators recurse through
/// for composite statements.
pub fn validate(stmt: &Statement, ctx: &mut ValidateContext, input_vars: &[String]) -> Result<SubPlan> {
    match stmt {
        Statement::Go(s) => go::validate_go(s, ctx, input_vars),
        Statement::Fetch(s) => fetch::validate_fetch(s, ctx, input_vars),
        Statement::Lookup(s) => lookup::validate_lookup(s, ctx),
        Statement::GetSubgraph(s) => subgraph::validate_get_subgraph(s, ctx),
        Statement::Pipe(left, right) => {
            let left_plan = validate(left, ctx, input_vars)?;
            let left_node = left_plan.nodes.iter().find(|n| n.id() == left_plan.head).unwrap();
            let left_out = left_node.output_var().to_string();
            let tail = left_plan.tail;
            let right_plan = validate(right, ctx, &[left_out])?;
            let head = right_plan.head;
            Ok(left_plan.merge(right_plan).with_head_tail(head, tail))
        }
        Statement::Set { kind, distinct, left, right } => set::validate_set(*kind, *distinct, left, right, ctx, input_vars),
        Statement::Sequential(stmts) => validate_sequential(stmts, ctx, input_vars),
        Statement::GroupBy(s) => groupby::validate_group_by(s, ctx, input_vars),
        Statement::Yield(s) => yield_stmt::validate_yield(s, ctx, input_vars),
        Statement::OrderBy(s) => orderby::validate_order_by(s, ctx, input_vars),
        Statement::Limit(s) => limit::validate_limit(s, ctx, input_vars),
        Statement::Assign { var, inner } => validate_assign(var, inner, ctx, input_vars),
        Statement::Explain { inner, .. } => validate(inner, ctx, input_vars),
        Statement::Admin(s) => admin::validate_admin(s, ctx),
        Statement::FindPath { .. } => subgraph::validate_find_path(stmt, ctx),
    }
}

impl SubPlan {
    fn with_head_tail(mut self, head: PlanNodeId, tail: PlanNodeId) -> Self {
        self.head = head;
        self.tail = tail;
        self
    }
}

/// Sequential validator (§4.4): caps statement count, rejects a leading
/// LIMIT/ORDER BY/GROUP BY, chains each statement's tail to the previous
/// root's output.
const MAX_SEQUENTIAL_STATEMENTS: usize = 64;

fn validate_sequential(
    stmts: &[Statement],
    ctx: &mut ValidateContext,
    input_vars: &[String],
) -> Result<SubPlan> {
    if stmts.len() > MAX_SEQUENTIAL_STATEMENTS {
        return Err(crate::error::Error::semantic(format!(
            "too many statements in sequence: {} (max {MAX_SEQUENTIAL_STATEMENTS})",
            stmts.len()
        )));
    }
    if let Some(first) = stmts.first() {
        if matches!(
            first,
            Statement::Limit(_) | Statement::OrderBy(_) | Statement::GroupBy(_)
        ) {
            return Err(crate::error::Error::semantic(
                "LIMIT/ORDER BY/GROUP BY cannot lead a statement sequence",
            ));
        }
    }
    let mut iter = stmts.iter();
    let first = iter
        .next()
        .ok_or_else(|| crate::error::Error::semantic("empty statement sequence"))?;
    let mut plan = validate(first, ctx, input_vars)?;
    for stmt in iter {
        let prev_out = plan.nodes.iter().find(|n| n.id() == plan.head).unwrap().output_var().to_string();
        let next = validate(stmt, ctx, &[prev_out])?;
        let tail = plan.tail;
        let head = next.head;
        plan = plan.merge(next).with_head_tail(head, tail);
    }
    Ok(plan)
}

fn validate_assign(
    var: &str,
    inner: &Statement,
    ctx: &mut ValidateContext,
    input_vars: &[String],
) -> Result<SubPlan> {
    use crate::expr::Expression;
    use crate::plan::{AssignNode, PlanNodeBase};

    let inner_plan = validate(inner, ctx, input_vars)?;
    let inner_out = inner_plan.nodes.iter().find(|n| n.id() == inner_plan.head).unwrap().output_var().to_string();
    ctx.symbols.new_variable(Some(var.to_string()), "Assign")?;
    let id = ctx.next_id();
    let node = PlanNode::Assign(AssignNode {
        base: PlanNodeBase::new(id, var, vec![])
            .with_single_input(inner_plan.head, inner_out.clone()),
        var_name: var.to_string(),
        expr: Expression::Var(inner_out),
    });
    ctx.symbols.bind_producer(var, id)?;
    Ok(inner_plan.push_head(node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FromClause, GoStatement, StepRange, YieldColumn};
    use crate::expr::Expression;
    use crate::plan::Direction;
    use crate::value::Value;

    pub fn empty_catalog() -> Catalog {
        let mut cat = Catalog::new();
        cat.register_edge("like", vec![("start", crate::value::ValueType::Int)]);
        cat
    }

    #[test]
    fn sequential_rejects_leading_limit() {
        let catalog = empty_catalog();
        let mut symbols = SymbolTable::new();
        let mut arena = Arena::new();
        let mut ctx = ValidateContext::new(&catalog, &mut symbols, &mut arena);
        ctx.space = Some("demo".into());
        let stmts = vec![Statement::Limit(crate::ast::LimitStatement {
            input: Box::new(Statement::Yield(crate::ast::YieldStatement {
                input: None,
                yield_: vec![YieldColumn { expr: Expression::Constant(Value::Int(1)), alias: None }],
                distinct: false,
            })),
            offset: 0,
            count: 1,
        })];
        let err = validate_sequential(&stmts, &mut ctx, &[]).unwrap_err();
        assert!(matches!(err, crate::error::Error::Semantic { .. }));
    }

    #[test]
    fn go_statement_validates_into_a_subplan() {
        let catalog = empty_catalog();
        let mut symbols = SymbolTable::new();
        let mut arena = Arena::new();
        let mut ctx = ValidateContext::new(&catalog, &mut symbols, &mut arena);
        ctx.space = Some("demo".into());
        let stmt = Statement::Go(GoStatement {
            steps: StepRange::Exact(1),
            from: FromClause::Constant(vec![Expression::Constant(Value::String("1".into()))]),
            edge_types: vec!["like".into()],
            direction: Direction::Out,
            where_: None,
            yield_: vec![YieldColumn { expr: Expression::InputProp("_dst".into()), alias: Some("id".into()) }],
            distinct: false,
        });
        let plan = validate(&stmt, &mut ctx, &[]).unwrap();
        assert!(!plan.nodes.is_empty());
    }
}
