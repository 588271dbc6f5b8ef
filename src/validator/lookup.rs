//! LOOKUP validator (§4.4): index-backed scan by tag/edge schema name.

use crate::ast::LookupStatement;
use crate::error::{Error, Result};
use crate::plan::{IndexQueryContext, IndexScanNode, PlanNode, PlanNodeBase, ProjectNode};

use super::{SubPlan, ValidateContext};

pub fn validate_lookup(stmt: &LookupStatement, ctx: &mut ValidateContext) -> Result<SubPlan> {
    ctx.require_space()?;
    let props = if stmt.is_edge {
        ctx.catalog.edge_props(&stmt.schema_name)?
    } else {
        ctx.catalog.tag_props(&stmt.schema_name)?
    };
    for filter in &stmt.filters {
        let mut refs = Vec::new();
        filter.referenced_input_props(&mut refs);
        for r in &refs {
            if !props.iter().any(|p| &p.name == r) {
                return Err(Error::semantic(format!(
                    "unknown property '{r}' on schema '{}'",
                    stmt.schema_name
                )));
            }
        }
    }

    let out_var = ctx.symbols.new_variable(None, "IndexScan")?;
    let id = ctx.next_id();
    let return_columns: Vec<String> = if stmt.yield_.is_empty() {
        vec!["_vid".into()]
    } else {
        stmt.yield_
            .iter()
            .map(|c| c.alias.clone().unwrap_or_else(|| c.expr.canonical_string()))
            .collect()
    };
    let scan = PlanNode::IndexScan(IndexScanNode {
        base: PlanNodeBase::new(id, &out_var, return_columns.clone()),
        schema_id: 0,
        index_query_contexts: stmt.filters.iter().map(|f| IndexQueryContext { filter: f.clone() }).collect(),
        is_edge: stmt.is_edge,
        return_columns,
    });
    ctx.symbols.bind_producer(&out_var, id)?;
    let plan = SubPlan::singleton(scan);

    if stmt.yield_.is_empty() {
        return Ok(plan);
    }
    let col_names: Vec<String> = stmt
        .yield_
        .iter()
        .map(|c| c.alias.clone().unwrap_or_else(|| c.expr.canonical_string()))
        .collect();
    let proj_var = ctx.symbols.new_variable(None, "Project")?;
    let proj_id = ctx.next_id();
    let project = PlanNode::Project(ProjectNode {
        base: PlanNodeBase::new(proj_id, &proj_var, col_names)
            .with_single_input(plan.head, &out_var),
        columns: stmt
            .yield_
            .iter()
            .map(|c| (c.expr.clone(), c.alias.clone().unwrap_or_else(|| c.expr.canonical_string())))
            .collect(),
        expand_star: false,
    });
    ctx.symbols.bind_producer(&proj_var, proj_id)?;
    Ok(plan.push_head(project))
}
