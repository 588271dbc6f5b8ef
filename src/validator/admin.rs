//! Administrative (DDL/DML) validator (§4.4, §6.2): space/schema
//! management and bulk vertex/edge mutation, dispatched to
//! [`crate::rpc::MetadataClient`]/[`crate::rpc::StorageClient`] by the
//! executor.

use std::collections::{BTreeMap, HashMap};

use crate::ast::AdminStatement;
use crate::error::{Error, Result};
use crate::expr::Expression;
use crate::plan::{AdminDmlNode, AdminDmlOp, PlanNode, PlanNodeBase, ProjectNode, StartNode};
use crate::value::{Edge, Value, Vertex};

use super::{SubPlan, ValidateContext};

/// Requires `expr` to already be a literal (§4.7: admin statements carry
/// no upstream row context to evaluate against).
fn eval_const(expr: &Expression) -> Result<Value> {
    match expr {
        Expression::Constant(v) => Ok(v.clone()),
        _ => Err(Error::semantic("value must be a literal constant")),
    }
}

fn eval_props(props: &[(String, Expression)]) -> Result<BTreeMap<String, Value>> {
    props.iter().map(|(name, e)| Ok((name.clone(), eval_const(e)?))).collect()
}

/// Builds a single-row, single-column `Start` that exists only to drive
/// a `Project`; its own value is never read.
fn trigger(ctx: &mut ValidateContext) -> SubPlan {
    let id = ctx.next_id();
    let var = format!("__admintrigger_{id}");
    SubPlan::singleton(PlanNode::Start(StartNode {
        base: PlanNodeBase::new(id, var, vec!["_trigger".into()]),
        seeds: vec![Expression::Constant(Value::Null)],
    }))
}

/// Materializes `props` as a one-row `DataSet` (one column per property
/// name) for `UpdateVertex`/`UpdateEdge`'s "set" input.
fn props_plan(ctx: &mut ValidateContext, props: &[(String, Expression)]) -> Result<SubPlan> {
    let start = trigger(ctx);
    let start_var = start.nodes[0].output_var().to_string();
    let col_names: Vec<String> = props.iter().map(|(n, _)| n.clone()).collect();
    let columns: Vec<(Expression, String)> = props.iter().map(|(n, e)| (e.clone(), n.clone())).collect();
    for (_, expr) in props {
        eval_const(expr)?;
    }
    let id = ctx.next_id();
    let var = format!("__adminset_{id}");
    let node = PlanNode::Project(ProjectNode {
        base: PlanNodeBase::new(id, var, col_names).with_single_input(start.head, &start_var),
        columns,
        expand_star: false,
    });
    Ok(start.push_head(node))
}

pub fn validate_admin(stmt: &AdminStatement, ctx: &mut ValidateContext) -> Result<SubPlan> {
    let mut input: Option<SubPlan> = None;
    let (op, mut params) = match stmt {
        AdminStatement::CreateSpace { name, partitions } => {
            let mut p = HashMap::new();
            p.insert("name".to_string(), name.clone());
            p.insert("partitions".to_string(), partitions.to_string());
            (AdminDmlOp::CreateSpace, p)
        }
        AdminStatement::DropSpace { name } => {
            (AdminDmlOp::DropSpace, HashMap::from([("name".to_string(), name.clone())]))
        }
        AdminStatement::ShowSpaces => (AdminDmlOp::ShowSpaces, HashMap::new()),
        AdminStatement::CreateTag { space, name } => {
            (AdminDmlOp::CreateTag, HashMap::from([("space".to_string(), space.clone()), ("name".to_string(), name.clone())]))
        }
        AdminStatement::CreateEdge { space, name } => {
            (AdminDmlOp::CreateEdge, HashMap::from([("space".to_string(), space.clone()), ("name".to_string(), name.clone())]))
        }
        AdminStatement::InsertVertices { space, tag, rows } => {
            if rows.is_empty() {
                return Err(Error::semantic("INSERT VERTEX requires at least one row"));
            }
            if !ctx.catalog.has_tag(tag) {
                return Err(Error::semantic(format!("unknown tag: {tag}")));
            }
            let mut seeds = Vec::with_capacity(rows.len());
            for row in rows {
                let vid = eval_const(&row.vid)?;
                let props = eval_props(&row.props)?;
                let mut tags = BTreeMap::new();
                tags.insert(tag.clone(), props);
                seeds.push(Expression::Constant(Value::Vertex(Box::new(Vertex { vid, tags }))));
            }
            let id = ctx.next_id();
            let var = format!("__admininsert_{id}");
            input = Some(SubPlan::singleton(PlanNode::Start(StartNode {
                base: PlanNodeBase::new(id, var, vec!["vertex".into()]),
                seeds,
            })));
            (AdminDmlOp::InsertVertices, HashMap::from([("space".to_string(), space.clone())]))
        }
        AdminStatement::InsertEdges { space, edge_type, rows } => {
            if rows.is_empty() {
                return Err(Error::semantic("INSERT EDGE requires at least one row"));
            }
            if !ctx.catalog.has_edge(edge_type) {
                return Err(Error::semantic(format!("unknown edge type: {edge_type}")));
            }
            let mut seeds = Vec::with_capacity(rows.len());
            for row in rows {
                let src = eval_const(&row.src)?;
                let dst = eval_const(&row.dst)?;
                let props = eval_props(&row.props)?;
                seeds.push(Expression::Constant(Value::Edge(Box::new(Edge {
                    src,
                    dst,
                    edge_type: edge_type.clone(),
                    rank: row.rank,
                    props,
                }))));
            }
            let id = ctx.next_id();
            let var = format!("__admininsert_{id}");
            input = Some(SubPlan::singleton(PlanNode::Start(StartNode {
                base: PlanNodeBase::new(id, var, vec!["edge".into()]),
                seeds,
            })));
            (AdminDmlOp::InsertEdges, HashMap::from([("space".to_string(), space.clone())]))
        }
        AdminStatement::UpdateVertex { space, vid, tag, props } => {
            if !ctx.catalog.has_tag(tag) {
                return Err(Error::semantic(format!("unknown tag: {tag}")));
            }
            let vid = eval_const(vid)?;
            let plan = props_plan(ctx, props)?;
            input = Some(plan);
            (
                AdminDmlOp::UpdateVertex,
                HashMap::from([
                    ("space".to_string(), space.clone()),
                    ("vid".to_string(), vid.to_string()),
                ]),
            )
        }
        AdminStatement::UpdateEdge { space, src, dst, edge_type, props } => {
            if !ctx.catalog.has_edge(edge_type) {
                return Err(Error::semantic(format!("unknown edge type: {edge_type}")));
            }
            let src = eval_const(src)?;
            let dst = eval_const(dst)?;
            let plan = props_plan(ctx, props)?;
            input = Some(plan);
            (
                AdminDmlOp::UpdateEdge,
                HashMap::from([
                    ("space".to_string(), space.clone()),
                    ("src".to_string(), src.to_string()),
                    ("dst".to_string(), dst.to_string()),
                    ("edge_type".to_string(), edge_type.clone()),
                ]),
            )
        }
        AdminStatement::DeleteVertices { space, vids } => {
            if vids.is_empty() {
                return Err(Error::semantic("DELETE VERTEX requires at least one id"));
            }
            let vid_strings: Vec<String> = vids
                .iter()
                .map(|e| match e {
                    Expression::Constant(v) => Ok(v.to_string()),
                    _ => Err(Error::semantic("DELETE VERTEX ids must be literal constants")),
                })
                .collect::<Result<_>>()?;
            (
                AdminDmlOp::DeleteVertices,
                HashMap::from([
                    ("space".to_string(), space.clone()),
                    ("vids".to_string(), vid_strings.join(",")),
                ]),
            )
        }
        AdminStatement::DeleteEdges { space, edge_type } => {
            if !ctx.catalog.has_edge(edge_type) {
                return Err(Error::semantic(format!("unknown edge type: {edge_type}")));
            }
            (AdminDmlOp::DeleteEdges, HashMap::from([
                ("space".to_string(), space.clone()),
                ("edge_type".to_string(), edge_type.clone()),
            ]))
        }
    };
    if let Some(space) = &ctx.space {
        params.entry("space".to_string()).or_insert_with(|| space.clone());
    }

    let out_var = ctx.symbols.new_variable(None, "AdminDml")?;
    let id = ctx.next_id();
    let base = match &input {
        Some(plan) => {
            let input_var = plan.nodes.last().unwrap().output_var().to_string();
            PlanNodeBase::new(id, &out_var, vec![]).with_single_input(plan.head, input_var)
        }
        None => PlanNodeBase::new(id, &out_var, vec![]),
    };
    let node = PlanNode::AdminDml(AdminDmlNode { base, op, params });
    ctx.symbols.bind_producer(&out_var, id)?;
    Ok(match input {
        Some(plan) => plan.push_head(node),
        None => SubPlan::singleton(node),
    })
}
