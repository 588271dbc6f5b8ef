//! GO validator (§4.4): multi-step neighbor traversal.

use crate::ast::{FromClause, GoStatement};
use crate::ast::StepRange;
use crate::error::{Error, Result};
use crate::expr::Expression;
use crate::plan::{
    AssignNode, FilterNode, GetNeighborsNode, LoopNode, PlanNode, PlanNodeBase, PlanNodeId,
    ProjectNode, StartNode,
};
use crate::value::Value;

use super::{SubPlan, ValidateContext};

pub fn validate_go(
    stmt: &GoStatement,
    ctx: &mut ValidateContext,
    input_vars: &[String],
) -> Result<SubPlan> {
    ctx.require_space()?;
    for et in &stmt.edge_types {
        if !ctx.catalog.has_edge(et) {
            return Err(Error::semantic(format!("unknown edge type: {et}")));
        }
    }
    if stmt.yield_.is_empty() {
        return Err(Error::semantic("GO requires a YIELD clause"));
    }

    let (id_expr, src_var, mut plan) = resolve_from(&stmt.from, ctx, input_vars)?;

    // Materialize the seed's vertex-id expression into a single `_dst`-named
    // column: every hop (the first and every loop re-entry alike) then reads
    // its source vertex from the same column, whatever expression or alias
    // produced it (`_vid` from a literal seed, an arbitrary pipe alias from
    // `$-.col`, or the previous hop's own `_dst` output).
    let frontier_id = ctx.next_id();
    let frontier_var = format!("__gofrontier_{frontier_id}");
    let frontier = PlanNode::Project(ProjectNode {
        base: PlanNodeBase::new(frontier_id, &frontier_var, vec!["_dst".into()])
            .with_single_input(plan.head, &src_var),
        columns: vec![(id_expr, "_dst".into())],
        expand_star: false,
    });
    plan = plan.push_head(frontier);
    let src_var = frontier_var;

    let steps = match stmt.steps {
        StepRange::Exact(n) if n >= 1 => n,
        StepRange::Range(_, hi) if hi >= 1 => hi,
        _ => return Err(Error::semantic("GO requires at least one step")),
    };

    // Single hop is the common case and the building block for multi-hop
    // traversal (each further hop re-enters the same GetNeighbors shape
    // inside a Loop body, fed by the previous hop's `_dst` column). `dep`
    // is `None` for a Loop body: the scheduler re-enters that subtree once
    // per step and must read the frontier purely by variable name, rebound
    // by the scheduler after each iteration — a structural dependency edge
    // would make it re-run the (unchanged) frontier producer every step.
    let one_hop = |ctx: &mut ValidateContext, dep: Option<PlanNodeId>, input_var: &str| -> PlanNode {
        let id = ctx.next_id();
        let out = format!("__go_{id}");
        let base = PlanNodeBase::new(id, out, vec!["_dst".into(), "_src".into(), "_type".into(), "_rank".into()]);
        let base = match dep {
            Some(dep_id) => base.with_single_input(dep_id, input_var),
            None => PlanNodeBase { input_vars: vec![input_var.to_string()], ..base },
        };
        PlanNode::GetNeighbors(GetNeighborsNode {
            base,
            src_expr: Expression::InputProp("_dst".into()),
            edge_types: stmt.edge_types.clone(),
            direction: stmt.direction,
            vertex_props: Vec::new(),
            edge_props: Vec::new(),
            stat_props: Vec::new(),
            dedup: false,
            order_by: Vec::new(),
            limit: None,
            filter: None,
        })
    };

    let last_out;
    if steps == 1 {
        let hop = one_hop(ctx, Some(plan.head), &src_var);
        last_out = hop.output_var().to_string();
        plan = plan.push_head(hop);
    } else {
        let body = one_hop(ctx, None, &src_var);
        let body_id = body.id();
        let body_out = body.output_var().to_string();

        let counter_var = format!("__gostep_{}", ctx.next_id().0);
        let init_id = ctx.next_id();
        let init = PlanNode::Assign(AssignNode {
            base: PlanNodeBase::new(init_id, &counter_var, vec![]).with_single_input(plan.head, &src_var),
            var_name: counter_var.clone(),
            expr: Expression::Constant(Value::Int(0)),
        });

        let loop_id = ctx.next_id();
        let loop_out = format!("__go_loop_{loop_id}");
        let loop_node = PlanNode::Loop(LoopNode {
            base: PlanNodeBase::new(loop_id, &loop_out, vec![])
                .with_single_input(init_id, &counter_var),
            condition: Expression::Compare {
                op: crate::expr::CompareOp::Lt,
                left: Box::new(Expression::Var(counter_var)),
                right: Box::new(Expression::Constant(Value::Int(steps as i64))),
            },
            body_root: body_id,
        });

        last_out = body_out;
        plan.nodes.push(init);
        plan.nodes.push(body);
        plan.nodes.push(loop_node);
        plan.head = loop_id;
    }

    let filter_head = if let Some(pred) = &stmt.where_ {
        let id = ctx.next_id();
        let out = format!("__gofilter_{id}");
        let node = PlanNode::Filter(FilterNode {
            base: PlanNodeBase::new(id, out, vec![]).with_single_input(plan.head, &last_out),
            predicate: pred.clone(),
        });
        let out_var = node.output_var().to_string();
        plan = plan.push_head(node);
        out_var
    } else {
        last_out
    };

    let col_names: Vec<String> = stmt
        .yield_
        .iter()
        .map(|c| c.alias.clone().unwrap_or_else(|| c.expr.canonical_string()))
        .collect();
    let out_var = ctx.symbols.new_variable(None, "Project")?;
    let id = ctx.next_id();
    let project = PlanNode::Project(ProjectNode {
        base: PlanNodeBase::new(id, &out_var, col_names)
            .with_single_input(plan.head, &filter_head),
        columns: stmt.yield_.iter().map(|c| (c.expr.clone(), c.alias.clone().unwrap_or_else(|| c.expr.canonical_string()))).collect(),
        expand_star: false,
    });
    ctx.symbols.bind_producer(&out_var, id)?;
    Ok(plan.push_head(project))
}

/// Resolves `FROM` to (the expression that yields a source vertex id from
/// the resulting input, its output variable, the subplan producing it).
fn resolve_from(
    from: &FromClause,
    ctx: &mut ValidateContext,
    input_vars: &[String],
) -> Result<(Expression, String, SubPlan)> {
    match from {
        FromClause::Constant(exprs) => {
            if exprs.is_empty() {
                return Err(Error::semantic("GO FROM requires at least one vertex id"));
            }
            let var = ctx.symbols.new_variable(None, "Start")?;
            let id = ctx.next_id();
            let node = PlanNode::Start(StartNode {
                base: PlanNodeBase::new(id, &var, vec!["_vid".into()]),
                seeds: exprs.clone(),
            });
            ctx.symbols.bind_producer(&var, id)?;
            Ok((Expression::InputProp("_vid".into()), var, SubPlan::singleton(node)))
        }
        FromClause::Reference(expr) => {
            let var = input_vars
                .first()
                .cloned()
                .ok_or_else(|| Error::semantic("GO FROM references an input with no producer"))?;
            let node = ctx.symbols.resolve(&var)?;
            let producer = node
                .producer()
                .ok_or_else(|| Error::semantic(format!("variable '{var}' has no producer")))?;
            let id = ctx.next_id();
            let pass_var = format!("__pass_{id}");
            let pass = PlanNode::PassThrough(crate::plan::PassThroughNode {
                base: PlanNodeBase::new(id, &pass_var, vec![]).with_single_input(producer, &var),
            });
            Ok((expr.clone(), pass_var, SubPlan::singleton(pass)))
        }
    }
}
