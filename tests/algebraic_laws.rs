//! Algebraic properties of the relational operators (§8 "testable
//! properties"): laws checked either as plain unit tests or, where the
//! law is naturally parameterized over arbitrary small datasets, as
//! `proptest` properties.

use proptest::prelude::*;

use graph_query_exec::executor;
use graph_query_exec::expr::{CompareOp, Expression};
use graph_query_exec::plan::{FilterNode, PlanNode, PlanNodeBase, PlanNodeId, SetOpNode};
use graph_query_exec::rpc::{InMemoryMetadataClient, InMemoryStorageClient};
use graph_query_exec::value::{DataSet, Value};

fn small_dataset(rows: Vec<i64>) -> DataSet {
    DataSet::with_rows(vec!["v".into()], rows.into_iter().map(|v| vec![Value::Int(v)]).collect())
}

fn sorted_values(ds: &DataSet) -> Vec<i64> {
    let mut values: Vec<i64> = ds
        .rows
        .iter()
        .map(|r| match &r[0] {
            Value::Int(i) => *i,
            other => panic!("expected Value::Int, got {other:?}"),
        })
        .collect();
    values.sort_unstable();
    values
}

async fn union(parts: &[DataSet]) -> DataSet {
    let storage = InMemoryStorageClient::new();
    let meta = InMemoryMetadataClient::new();
    let node = PlanNode::Union(SetOpNode { base: PlanNodeBase::new(PlanNodeId(0), "out", vec!["v".into()]) });
    executor::execute(&node, parts, "demo", &storage, &meta).await.unwrap()
}

fn small_ints() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(-20i64..20, 0..8)
}

proptest! {
    /// Union is commutative over its two operands, as a multiset of rows.
    #[test]
    fn union_is_commutative(a in small_ints(), b in small_ints()) {
        let ds_a = small_dataset(a);
        let ds_b = small_dataset(b);
        let forward = futures::executor::block_on(union(&[ds_a.clone(), ds_b.clone()]));
        let backward = futures::executor::block_on(union(&[ds_b, ds_a]));
        prop_assert_eq!(sorted_values(&forward), sorted_values(&backward));
    }

    /// Union is associative: `(a ∪ b) ∪ c` and `a ∪ (b ∪ c)` hold the
    /// same multiset of rows.
    #[test]
    fn union_is_associative(a in small_ints(), b in small_ints(), c in small_ints()) {
        let (ds_a, ds_b, ds_c) = (small_dataset(a), small_dataset(b), small_dataset(c));
        let left = futures::executor::block_on(async {
            let ab = union(&[ds_a.clone(), ds_b.clone()]).await;
            union(&[ab, ds_c.clone()]).await
        });
        let right = futures::executor::block_on(async {
            let bc = union(&[ds_b, ds_c]).await;
            union(&[ds_a, bc]).await
        });
        prop_assert_eq!(sorted_values(&left), sorted_values(&right));
    }
}

/// Filter∘Filter over p1 then p2 keeps exactly the rows a single Filter
/// over `p1 ∧ p2` would keep.
#[tokio::test]
async fn sequential_filters_equal_one_conjoined_filter() {
    let ds = small_dataset((-5..=5).collect());
    let storage = InMemoryStorageClient::new();
    let meta = InMemoryMetadataClient::new();

    let gt_zero = FilterNode {
        base: PlanNodeBase::new(PlanNodeId(0), "out", vec!["v".into()]),
        predicate: Expression::Compare {
            op: CompareOp::Gt,
            left: Box::new(Expression::InputProp("v".into())),
            right: Box::new(Expression::Constant(Value::Int(0))),
        },
    };
    let lt_four = FilterNode {
        base: PlanNodeBase::new(PlanNodeId(1), "out", vec!["v".into()]),
        predicate: Expression::Compare {
            op: CompareOp::Lt,
            left: Box::new(Expression::InputProp("v".into())),
            right: Box::new(Expression::Constant(Value::Int(4))),
        },
    };
    let conjoined = FilterNode {
        base: PlanNodeBase::new(PlanNodeId(2), "out", vec!["v".into()]),
        predicate: Expression::Logic {
            op: graph_query_exec::expr::LogicOp::And,
            left: Box::new(gt_zero.predicate.clone()),
            right: Box::new(lt_four.predicate.clone()),
        },
    };

    let after_first =
        executor::execute(&PlanNode::Filter(gt_zero), &[ds.clone()], "demo", &storage, &meta).await.unwrap();
    let sequential =
        executor::execute(&PlanNode::Filter(lt_four), &[after_first], "demo", &storage, &meta).await.unwrap();
    let fused =
        executor::execute(&PlanNode::Filter(conjoined), &[ds], "demo", &storage, &meta).await.unwrap();

    assert_eq!(sorted_values(&sequential), sorted_values(&fused));
}

/// Dedup is idempotent: applying it twice is the same as applying it once.
#[tokio::test]
async fn dedup_is_idempotent() {
    let ds = small_dataset(vec![1, 1, 2, 3, 3, 3, 4]);
    let storage = InMemoryStorageClient::new();
    let meta = InMemoryMetadataClient::new();
    let dedup_node = || {
        PlanNode::Dedup(graph_query_exec::plan::DedupNode {
            base: PlanNodeBase::new(PlanNodeId(0), "out", vec!["v".into()]),
        })
    };
    let once = executor::execute(&dedup_node(), &[ds], "demo", &storage, &meta).await.unwrap();
    let twice = executor::execute(&dedup_node(), &[once.clone()], "demo", &storage, &meta).await.unwrap();
    assert_eq!(sorted_values(&once), sorted_values(&twice));
}
