//! FETCH validator (§4.4): direct vertex/edge property lookup by key.

use std::collections::BTreeMap;

use crate::ast::{FetchStatement, FetchTarget, FromClause};
use crate::error::{Error, Result};
use crate::expr::Expression;
use crate::plan::{GetEdgesNode, GetVerticesNode, PlanNode, PlanNodeBase, ProjectNode, StartNode};
use crate::value::{Edge, Value};

use super::{SubPlan, ValidateContext};

fn eval_const(expr: &Expression) -> Result<Value> {
    match expr {
        Expression::Constant(v) => Ok(v.clone()),
        _ => Err(Error::semantic("FETCH keys must be literal constants")),
    }
}

pub fn validate_fetch(
    stmt: &FetchStatement,
    ctx: &mut ValidateContext,
    input_vars: &[String],
) -> Result<SubPlan> {
    ctx.require_space()?;
    let (start_var, mut plan) = start_from(&stmt.target, ctx, input_vars)?;

    let fetch_node = match &stmt.target {
        FetchTarget::Vertices(_) => {
            let id = ctx.next_id();
            let out = format!("__fetchv_{id}");
            PlanNode::GetVertices(GetVerticesNode {
                base: PlanNodeBase::new(id, out, vec!["vertex".into()])
                    .with_single_input(plan.head, &start_var),
                vids: crate::expr::Expression::InputProp("_vid".into()),
                tag_props: Vec::new(),
            })
        }
        FetchTarget::Edges { edge_type, .. } => {
            if !ctx.catalog.has_edge(edge_type) {
                return Err(Error::semantic(format!("unknown edge type: {edge_type}")));
            }
            let id = ctx.next_id();
            let out = format!("__fetche_{id}");
            PlanNode::GetEdges(GetEdgesNode {
                base: PlanNodeBase::new(id, out, vec!["edge".into()])
                    .with_single_input(plan.head, &start_var),
                edge_keys: crate::expr::Expression::InputProp("_edgekey".into()),
                edge_props: Vec::new(),
            })
        }
    };
    let fetch_out = fetch_node.output_var().to_string();
    plan = plan.push_head(fetch_node);

    if stmt.yield_.is_empty() {
        return Ok(plan);
    }
    let col_names: Vec<String> = stmt
        .yield_
        .iter()
        .map(|c| c.alias.clone().unwrap_or_else(|| c.expr.canonical_string()))
        .collect();
    let out_var = ctx.symbols.new_variable(None, "Project")?;
    let id = ctx.next_id();
    let project = PlanNode::Project(ProjectNode {
        base: PlanNodeBase::new(id, &out_var, col_names)
            .with_single_input(plan.head, &fetch_out),
        columns: stmt
            .yield_
            .iter()
            .map(|c| (c.expr.clone(), c.alias.clone().unwrap_or_else(|| c.expr.canonical_string())))
            .collect(),
        expand_star: false,
    });
    ctx.symbols.bind_producer(&out_var, id)?;
    Ok(plan.push_head(project))
}

fn start_from(
    target: &FetchTarget,
    ctx: &mut ValidateContext,
    input_vars: &[String],
) -> Result<(String, SubPlan)> {
    match target {
        FetchTarget::Vertices(from) => vertex_start_from(from, ctx, input_vars),
        FetchTarget::Edges { keys, edge_type } => edges_start_from(keys, edge_type, ctx, input_vars),
    }
}

fn vertex_start_from(
    from: &FromClause,
    ctx: &mut ValidateContext,
    input_vars: &[String],
) -> Result<(String, SubPlan)> {
    match from {
        FromClause::Constant(exprs) => {
            if exprs.is_empty() {
                return Err(Error::semantic("FETCH requires at least one key"));
            }
            let var = ctx.symbols.new_variable(None, "Start")?;
            let id = ctx.next_id();
            let node = PlanNode::Start(StartNode {
                base: PlanNodeBase::new(id, &var, vec!["_vid".into()]),
                seeds: exprs.clone(),
            });
            ctx.symbols.bind_producer(&var, id)?;
            Ok((var, SubPlan::singleton(node)))
        }
        FromClause::Reference(_) => {
            let var = input_vars
                .first()
                .cloned()
                .ok_or_else(|| Error::semantic("FETCH references an input with no producer"))?;
            let producer = ctx
                .symbols
                .resolve(&var)?
                .producer()
                .ok_or_else(|| Error::semantic(format!("variable '{var}' has no producer")))?;
            let id = ctx.next_id();
            let pass_var = format!("__pass_{id}");
            let pass = PlanNode::PassThrough(crate::plan::PassThroughNode {
                base: PlanNodeBase::new(id, &pass_var, vec![]).with_single_input(producer, &var),
            });
            Ok((pass_var, SubPlan::singleton(pass)))
        }
    }
}

/// Edge keys don't share the vertex path's single-`_vid`-column shape: a
/// key is a `src`/`dst` pair, not a scalar. Constant keys are folded into
/// whole `Value::Edge` literals (one per pair) seeded under `_edgekey`;
/// a reference is projected into that same column so `GetEdgesNode`'s
/// `edge_keys` expression always finds it.
fn edges_start_from(
    keys: &FromClause,
    edge_type: &str,
    ctx: &mut ValidateContext,
    input_vars: &[String],
) -> Result<(String, SubPlan)> {
    match keys {
        FromClause::Constant(exprs) => {
            if exprs.is_empty() || exprs.len() % 2 != 0 {
                return Err(Error::semantic("FETCH edge keys require \"src\"->\"dst\" pairs"));
            }
            let mut seeds = Vec::with_capacity(exprs.len() / 2);
            for pair in exprs.chunks(2) {
                let src = eval_const(&pair[0])?;
                let dst = eval_const(&pair[1])?;
                seeds.push(Expression::Constant(Value::Edge(Box::new(Edge {
                    src,
                    dst,
                    edge_type: edge_type.to_string(),
                    rank: 0,
                    props: BTreeMap::new(),
                }))));
            }
            let var = ctx.symbols.new_variable(None, "Start")?;
            let id = ctx.next_id();
            let node = PlanNode::Start(StartNode {
                base: PlanNodeBase::new(id, &var, vec!["_edgekey".into()]),
                seeds,
            });
            ctx.symbols.bind_producer(&var, id)?;
            Ok((var, SubPlan::singleton(node)))
        }
        FromClause::Reference(expr) => {
            let var = input_vars
                .first()
                .cloned()
                .ok_or_else(|| Error::semantic("FETCH references an input with no producer"))?;
            let producer = ctx
                .symbols
                .resolve(&var)?
                .producer()
                .ok_or_else(|| Error::semantic(format!("variable '{var}' has no producer")))?;
            let id = ctx.next_id();
            let out_var = format!("__fetchekey_{id}");
            let node = PlanNode::Project(ProjectNode {
                base: PlanNodeBase::new(id, &out_var, vec!["_edgekey".into()])
                    .with_single_input(producer, &var),
                columns: vec![(expr.clone(), "_edgekey".into())],
                expand_star: false,
            });
            Ok((out_var, SubPlan::singleton(node)))
        }
    }
}
