//! End-to-end scenarios exercising the validator/planner/optimizer/
//! scheduler/executor pipeline against the in-memory RPC fakes, built by
//! hand-constructing `Statement` trees (no parser is shipped by this
//! crate — see `ast.rs`).

use std::sync::Arc;

use graph_query_exec::ast::{
    FromClause, GoStatement, LimitStatement, OrderByStatement, SetOpKind, Statement, StepRange,
    YieldColumn, YieldStatement,
};
use graph_query_exec::executor;
use graph_query_exec::expr::{AggregateFunction, CompareOp, Expression};
use graph_query_exec::plan::{BfsShortestPathNode, Direction, FilterNode, PlanNode, PlanNodeBase, PlanNodeId, SortOrder};
use graph_query_exec::rpc::{InMemoryMetadataClient, InMemoryStorageClient};
use graph_query_exec::value::graph::{Edge, Vertex};
use graph_query_exec::value::{DataSet, Value};
use graph_query_exec::{Catalog, Error, ExecutionConfig, QueryContext};

fn fresh_clients() -> (Arc<InMemoryStorageClient>, Arc<InMemoryMetadataClient>) {
    let storage = Arc::new(InMemoryStorageClient::new());
    let meta = Arc::new(InMemoryMetadataClient::new());
    meta.define_space("demo", 1);
    (storage, meta)
}

async fn run(stmt: &Statement, catalog: &Catalog) -> graph_query_exec::ExecutionResponse {
    let (storage, meta) = fresh_clients();
    let mut ctx = QueryContext::new(Some("demo".into()), ExecutionConfig::default());
    ctx.validate_and_plan(stmt, catalog).expect("validation should succeed");
    ctx.optimize().expect("optimization should succeed");
    ctx.execute(storage, meta).await
}

fn yield_const(value: Value) -> Statement {
    Statement::Yield(YieldStatement {
        input: None,
        yield_: vec![YieldColumn { expr: Expression::Constant(value), alias: None }],
        distinct: false,
    })
}

/// 1. `YIELD 1` produces a single-column, single-row, successful result.
#[tokio::test]
async fn yield_literal_produces_one_row_one_column() {
    let catalog = Catalog::new();
    let resp = run(&yield_const(Value::Int(1)), &catalog).await;
    assert_eq!(resp.status, graph_query_exec::query::StatusKind::Success);
    let data = resp.data.expect("successful YIELD carries data");
    assert_eq!(data.col_names, vec!["1".to_string()]);
    assert_eq!(data.rows, vec![vec![Value::Int(1)]]);
}

/// 2. Piping a three-row dataset through a `Filter` keeps only rows
/// whose `col0` is positive, mirroring `YIELD $-.* WHERE $-.col0 > 0`.
#[tokio::test]
async fn filter_keeps_rows_matching_predicate() {
    let input = DataSet::with_rows(
        vec!["col0".into(), "col1".into()],
        vec![
            vec![Value::Int(0), Value::Int(0)],
            vec![Value::Int(1), Value::Int(1)],
            vec![Value::Int(2), Value::Int(2)],
        ],
    );
    let node = PlanNode::Filter(FilterNode {
        base: PlanNodeBase::new(PlanNodeId(0), "out", vec!["col0".into(), "col1".into()]),
        predicate: Expression::Compare {
            op: CompareOp::Gt,
            left: Box::new(Expression::InputProp("col0".into())),
            right: Box::new(Expression::Constant(Value::Int(0))),
        },
    });
    let (storage, meta) = fresh_clients();
    let out = executor::execute(&node, &[input], "demo", storage.as_ref(), meta.as_ref())
        .await
        .unwrap();
    assert_eq!(out.rows, vec![vec![Value::Int(1), Value::Int(1)], vec![Value::Int(2), Value::Int(2)]]);
}

/// 3. Grouping ten rows (`col2` taking each of 0..5 twice) by `col2` and
/// counting produces five groups of size two.
#[tokio::test]
async fn group_by_count_produces_five_groups_of_two() {
    let mut rows = Vec::new();
    for v in 0..5 {
        rows.push(vec![Value::Int(v)]);
        rows.push(vec![Value::Int(v)]);
    }
    let input = DataSet::with_rows(vec!["col2".into()], rows);

    let node = PlanNode::Aggregate(graph_query_exec::plan::AggregateNode {
        base: PlanNodeBase::new(PlanNodeId(0), "out", vec!["col2".into(), "COUNT(col2)".into()])
            .with_single_input(PlanNodeId(1), "in"),
        group_keys: vec![Expression::InputProp("col2".into())],
        group_items: vec![(Expression::InputProp("col2".into()), AggregateFunction::Count, false)],
    });
    let (storage, meta) = fresh_clients();
    let out = executor::execute(&node, &[input], "demo", storage.as_ref(), meta.as_ref())
        .await
        .unwrap();
    assert_eq!(out.len(), 5);
    for row in &out.rows {
        assert_eq!(row[1], Value::Int(2));
    }
}

/// 4. `UNION` of two YIELDs with different column shapes is rejected.
#[tokio::test]
async fn union_rejects_mismatched_columns() {
    let mut catalog = Catalog::new();
    catalog.register_edge("like", vec![("start", graph_query_exec::value::ValueType::Int)]);

    let left = Statement::Yield(YieldStatement {
        input: None,
        yield_: vec![YieldColumn {
            expr: Expression::Constant(Value::Int(2010)),
            alias: Some("like.start".into()),
        }],
        distinct: false,
    });
    let right = Statement::Yield(YieldStatement {
        input: None,
        yield_: vec![
            YieldColumn { expr: Expression::Constant(Value::Int(2010)), alias: Some("like.start".into()) },
            YieldColumn { expr: Expression::Constant(Value::Int(2012)), alias: Some("like.start".into()) },
        ],
        distinct: false,
    });
    let stmt = Statement::Set { kind: SetOpKind::Union, distinct: false, left: Box::new(left), right: Box::new(right) };

    let mut ctx = QueryContext::new(Some("demo".into()), ExecutionConfig::default());
    let err = ctx.validate_and_plan(&stmt, &catalog).unwrap_err();
    match err {
        Error::Semantic { message } => assert!(message.contains("columns"), "message was: {message}"),
        other => panic!("expected a semantic error, got {other:?}"),
    }
}

/// 5. `GO FROM "1" OVER like YIELD like._dst AS id | GO FROM $-.id OVER like`
/// plans two `GetNeighbors` steps and feeds the first hop's distinct
/// destinations into the second.
#[tokio::test]
async fn two_step_traversal_chains_through_the_pipe() {
    let mut catalog = Catalog::new();
    catalog.register_edge("like", vec![]);

    let (storage, meta) = fresh_clients();
    storage.insert_vertex(Vertex::new("A"));
    storage.insert_vertex(Vertex::new("B"));
    storage.insert_vertex(Vertex::new("C"));
    storage.insert_edge(Edge::new(Value::String("A".into()), Value::String("B".into()), "like"));
    storage.insert_edge(Edge::new(Value::String("B".into()), Value::String("C".into()), "like"));

    let first_hop = GoStatement {
        steps: StepRange::Exact(1),
        from: FromClause::Constant(vec![Expression::Constant(Value::String("A".into()))]),
        edge_types: vec!["like".into()],
        direction: Direction::Out,
        where_: None,
        yield_: vec![YieldColumn { expr: Expression::InputProp("_dst".into()), alias: Some("id".into()) }],
        distinct: false,
    };
    let second_hop = GoStatement {
        steps: StepRange::Exact(1),
        from: FromClause::Reference(Expression::InputProp("id".into())),
        edge_types: vec!["like".into()],
        direction: Direction::Out,
        where_: None,
        yield_: vec![YieldColumn { expr: Expression::InputProp("_dst".into()), alias: Some("id".into()) }],
        distinct: false,
    };
    let stmt = Statement::Pipe(Box::new(Statement::Go(first_hop)), Box::new(Statement::Go(second_hop)));

    let mut qctx = QueryContext::new(Some("demo".into()), ExecutionConfig::default());
    qctx.validate_and_plan(&stmt, &catalog).unwrap();

    let explain = qctx.explain().unwrap();
    let get_neighbors_count = explain
        .nodes
        .iter()
        .filter(|n| n.name == "GetNeighbors")
        .count();
    assert_eq!(get_neighbors_count, 2, "plan should contain two GetNeighbors steps");

    qctx.optimize().unwrap();
    let resp = qctx.execute(storage, meta).await;
    assert_eq!(resp.status, graph_query_exec::query::StatusKind::Success);
    let data = resp.data.unwrap();
    assert_eq!(data.rows, vec![vec![Value::String("C".into())]]);
}

/// 6. BFS shortest path from A to B across an intermediate vertex finds
/// the one length-2 path when allowed up to 3 hops.
#[tokio::test]
async fn bfs_shortest_path_finds_the_only_two_hop_path() {
    let (storage, meta) = fresh_clients();
    storage.insert_vertex(Vertex::new("A"));
    storage.insert_vertex(Vertex::new("M"));
    storage.insert_vertex(Vertex::new("B"));
    storage.insert_edge(Edge::new(Value::String("A".into()), Value::String("M".into()), "like"));
    storage.insert_edge(Edge::new(Value::String("M".into()), Value::String("B".into()), "like"));

    let node = PlanNode::BfsShortestPath(BfsShortestPathNode {
        base: PlanNodeBase::new(PlanNodeId(0), "out", vec!["path".into()]),
        from: Expression::Constant(Value::String("A".into())),
        to: Expression::Constant(Value::String("B".into())),
        steps: 3,
        edge_types: vec!["like".into()],
        direction: Direction::Out,
    });
    let out = executor::execute(&node, &[], "demo", storage.as_ref(), meta.as_ref()).await.unwrap();
    assert_eq!(out.len(), 1);
    let Value::Path(path) = &out.rows[0][0] else { panic!("expected a Path value") };
    assert_eq!(path.length(), 2);
}

/// 7a. `LIMIT -1, 3` is rejected outright.
#[tokio::test]
async fn negative_limit_offset_is_rejected() {
    let catalog = Catalog::new();
    let stmt = Statement::Limit(LimitStatement {
        input: Box::new(yield_const(Value::Int(1))),
        offset: -1,
        count: 3,
    });
    let mut ctx = QueryContext::new(Some("demo".into()), ExecutionConfig::default());
    let err = ctx.validate_and_plan(&stmt, &catalog).unwrap_err();
    assert!(matches!(err, Error::Semantic { .. }));
}

/// 7b. `LIMIT 1, 3` over `GO ... YIELD like._dst AS like` plans a Limit
/// directly over the Project, and caps the result at 3 rows.
#[tokio::test]
async fn limit_over_go_caps_cardinality() {
    let mut catalog = Catalog::new();
    catalog.register_edge("like", vec![]);
    let (storage, meta) = fresh_clients();
    storage.insert_vertex(Vertex::new("A"));
    for dst in ["B", "C", "D", "E"] {
        storage.insert_vertex(Vertex::new(dst));
        storage.insert_edge(Edge::new(Value::String("A".into()), Value::String(dst.into()), "like"));
    }

    let go = GoStatement {
        steps: StepRange::Exact(1),
        from: FromClause::Constant(vec![Expression::Constant(Value::String("A".into()))]),
        edge_types: vec!["like".into()],
        direction: Direction::Out,
        where_: None,
        yield_: vec![YieldColumn { expr: Expression::InputProp("_dst".into()), alias: Some("like".into()) }],
        distinct: false,
    };
    let stmt = Statement::Limit(LimitStatement { input: Box::new(Statement::Go(go)), offset: 1, count: 3 });

    let mut qctx = QueryContext::new(Some("demo".into()), ExecutionConfig::default());
    qctx.validate_and_plan(&stmt, &catalog).unwrap();
    let explain = qctx.explain().unwrap();
    let limit_node = explain.nodes.iter().find(|n| n.name == "Limit").expect("plan has a Limit node");
    assert!(explain
        .nodes
        .iter()
        .any(|n| n.name == "Project" && n.id == limit_node.dependencies[0]));

    qctx.optimize().unwrap();
    let resp = qctx.execute(storage, meta).await;
    assert_eq!(resp.status, graph_query_exec::query::StatusKind::Success);
    assert!(resp.data.unwrap().len() <= 3);
}

/// 8. `ORDER BY $-.name` fails when the upstream input has no `name`
/// column, naming the offending column in the error.
#[tokio::test]
async fn order_by_unknown_column_is_rejected() {
    let catalog = Catalog::new();
    let input = Statement::Yield(YieldStatement {
        input: None,
        yield_: vec![YieldColumn { expr: Expression::Constant(Value::Int(1)), alias: Some("id".into()) }],
        distinct: false,
    });
    let stmt = Statement::OrderBy(OrderByStatement {
        input: Box::new(input),
        keys: vec![("name".into(), SortOrder::Asc)],
    });
    let mut ctx = QueryContext::new(Some("demo".into()), ExecutionConfig::default());
    let err = ctx.validate_and_plan(&stmt, &catalog).unwrap_err();
    match err {
        Error::Semantic { message } => assert!(message.contains("name"), "message was: {message}"),
        other => panic!("expected a semantic error, got {other:?}"),
    }
}
