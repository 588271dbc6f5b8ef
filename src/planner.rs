//! Planner (C5, §4.5): turns a validated top-level statement into a
//! complete [`ExecutionPlan`], wrapping certain root kinds in a
//! `DataCollect` so the terminal result always carries the shape
//! `ExecutionResponse` expects (§6.3).

use crate::arena::Arena;
use crate::ast::Statement;
use crate::catalog::Catalog;
use crate::error::Result;
use crate::plan::{CollectKind, DataCollectNode, ExecutionPlan, PlanNode, PlanNodeBase};
use crate::symbol::SymbolTable;
use crate::validator::{self, ValidateContext};

/// Output of planning: the plan itself plus the name of the variable
/// holding its terminal result (what the query driver reads to build
/// `ExecutionResponse`, §4.9).
pub struct PlanResult {
    pub plan: ExecutionPlan,
    pub result_var: String,
}

pub fn plan_statement(
    stmt: &Statement,
    space: Option<String>,
    catalog: &Catalog,
    plan_id: u64,
) -> Result<(PlanResult, SymbolTable, Arena)> {
    let mut symbols = SymbolTable::new();
    let mut arena = Arena::new();
    let mut sub;
    {
        let mut ctx = ValidateContext::new(catalog, &mut symbols, &mut arena);
        ctx.space = space;
        sub = validator::validate(stmt, &mut ctx, &[])?;
    }

    let (needs_collect, col_names, head_id, head_out) = {
        let head_node = sub.nodes.iter().find(|n| n.id() == sub.head).unwrap();
        let needs_collect = !matches!(head_node, PlanNode::DataCollect(_) | PlanNode::AdminDml(_));
        (
            needs_collect,
            head_node.col_names().to_vec(),
            sub.head,
            head_node.output_var().to_string(),
        )
    };
    let root = if needs_collect {
        let out_var = symbols.new_variable(None, "DataCollect")?;
        let id = next_free_id(&mut sub);
        let collect = PlanNode::DataCollect(DataCollectNode {
            base: PlanNodeBase::new(id, &out_var, col_names).with_single_input(head_id, &head_out),
            kind: CollectKind::RowBasedMove,
            extra_inputs: Vec::new(),
        });
        symbols.bind_producer(&out_var, id)?;
        sub.nodes.push(collect);
        sub.head = id;
        out_var
    } else {
        head_out
    };

    let plan = ExecutionPlan::new(plan_id, sub.head, sub.nodes);
    Ok((PlanResult { plan, result_var: root }, symbols, arena))
}

// Every validator hands back ids it minted through its own `ValidateContext`
// counter, which starts at 0 each call; this finds the next free id across
// the already-assembled sub-plan so the wrapping DataCollect never collides.
fn next_free_id(sub: &mut crate::validator::SubPlan) -> crate::plan::PlanNodeId {
    let max = sub.nodes.iter().map(|n| n.id().0).max().unwrap_or(0);
    crate::plan::PlanNodeId(max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FromClause, GoStatement, StepRange, YieldColumn};
    use crate::expr::Expression;
    use crate::plan::Direction;
    use crate::value::Value;

    #[test]
    fn go_statement_gets_wrapped_in_a_data_collect_root() {
        let mut catalog = Catalog::new();
        catalog.register_edge("like", vec![("start", crate::value::ValueType::Int)]);
        let stmt = Statement::Go(GoStatement {
            steps: StepRange::Exact(1),
            from: FromClause::Constant(vec![Expression::Constant(Value::String("1".into()))]),
            edge_types: vec!["like".into()],
            direction: Direction::Out,
            where_: None,
            yield_: vec![YieldColumn { expr: Expression::InputProp("_dst".into()), alias: Some("id".into()) }],
            distinct: false,
        });
        let (result, _symbols, _arena) = plan_statement(&stmt, Some("demo".into()), &catalog, 1).unwrap();
        assert!(matches!(result.plan.root_node(), PlanNode::DataCollect(_)));
    }
}
