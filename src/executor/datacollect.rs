//! `DataCollect` (§4.7): gathers rows accumulated across a control-flow
//! subtree (loop iterations, the two halves of a bidirectional path
//! search, ...) into the variable the surrounding query reads next.
//! `kind` only disambiguates intent for `EXPLAIN` output — every variant
//! shapes its output the same way, by concatenating same-arity inputs.

use crate::error::Result;
use crate::plan::DataCollectNode;
use crate::value::DataSet;

pub fn collect(node: &DataCollectNode, inputs: &[DataSet]) -> Result<DataSet> {
    let mut ds = DataSet::new(node.base.col_names.clone());
    for input in inputs {
        if input.arity() == ds.arity() {
            ds.rows.extend(input.rows.iter().cloned());
        }
    }
    Ok(ds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{CollectKind, PlanNodeBase, PlanNodeId};
    use crate::value::Value;

    #[test]
    fn collect_concatenates_same_arity_inputs() {
        let a = DataSet::with_rows(vec!["v".into()], vec![vec![Value::Int(1)]]);
        let b = DataSet::with_rows(vec!["v".into()], vec![vec![Value::Int(2)]]);
        let node = DataCollectNode {
            base: PlanNodeBase::new(PlanNodeId(0), "out", vec!["v".into()]),
            kind: CollectKind::RowBasedMove,
            extra_inputs: vec![],
        };
        let out = collect(&node, &[a, b]).unwrap();
        assert_eq!(out.len(), 2);
    }
}
