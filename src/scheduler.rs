//! Scheduler (C8, §4.8, §5): walks an [`ExecutionPlan`] in dependency
//! order, running independent siblings concurrently under a
//! semaphore-bounded pool, and recurses into Select/Loop bodies as
//! separate sub-schedules since their roots aren't ordinary dependency
//! edges (§4.3 `control_flow_roots`).

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::config::ExecutionConfig;
use crate::error::{Error, Result};
use crate::executor;
use crate::plan::{ExecutionPlan, PlanNode, PlanNodeId};
use crate::query::ExecutionContext;
use crate::rpc::{MetadataClient, StorageClient};

/// Runs `plan` to completion, returning the populated
/// [`ExecutionContext`] (every variable the plan produced).
pub async fn run(
    plan: &ExecutionPlan,
    space: &str,
    storage: Arc<dyn StorageClient>,
    meta: Arc<dyn MetadataClient>,
    config: &ExecutionConfig,
) -> Result<ExecutionContext> {
    if !plan.is_acyclic() {
        return Err(Error::execution("execution plan contains a cycle"));
    }
    let sem = Arc::new(Semaphore::new(config.concurrency.max_parallel_nodes.max(1)));
    let mut ctx = ExecutionContext::new();
    let env = Env { plan, space, storage, meta, config, sem };
    tracing::debug!(plan_id = plan.plan_id, node_count = plan.nodes.len(), "scheduler_run_started");
    run_subtree(plan.root, &env, &mut ctx).await?;
    Ok(ctx)
}

struct Env<'a> {
    plan: &'a ExecutionPlan,
    space: &'a str,
    storage: Arc<dyn StorageClient>,
    meta: Arc<dyn MetadataClient>,
    config: &'a ExecutionConfig,
    sem: Arc<Semaphore>,
}

/// Execute every node reachable (through ordinary `dependencies()`
/// edges) from `root`, in topological order, batching nodes whose
/// dependencies are already satisfied so independent siblings run
/// concurrently.
fn run_subtree<'a>(
    root: PlanNodeId,
    env: &'a Env<'a>,
    ctx: &'a mut ExecutionContext,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + 'a>> {
    Box::pin(async move {
        let order = topo_order(root, env.plan)?;
        let mut done: HashSet<PlanNodeId> = HashSet::new();

        let mut i = 0;
        while i < order.len() {
            // Collect a batch: every node at the front of the remaining
            // order whose dependencies are already done.
            let mut batch = Vec::new();
            while i < order.len() {
                let id = order[i];
                let node = env.plan.get(id).expect("topo_order only yields known ids");
                if node.dependencies().iter().all(|d| done.contains(d)) {
                    batch.push(id);
                    i += 1;
                } else {
                    break;
                }
            }
            if batch.is_empty() {
                return Err(Error::execution("scheduler stalled: unresolved dependency"));
            }

            if batch.len() == 1 {
                execute_one(batch[0], env, ctx).await?;
            } else {
                // Control-flow nodes (Select/Loop) mutate `ctx` themselves
                // and recurse, so they can't share a concurrent batch with
                // siblings that read/write the same context. Run the
                // batch concurrently only when none of it is control flow.
                let any_control_flow = batch.iter().any(|id| {
                    matches!(env.plan.get(*id), Some(PlanNode::Select(_)) | Some(PlanNode::Loop(_)))
                });
                if any_control_flow {
                    for id in &batch {
                        execute_one(*id, env, ctx).await?;
                    }
                } else {
                    run_batch_concurrently(&batch, env, ctx).await?;
                }
            }
            done.extend(batch);
        }
        Ok(())
    })
}

async fn run_batch_concurrently(
    batch: &[PlanNodeId],
    env: &Env<'_>,
    ctx: &mut ExecutionContext,
) -> Result<()> {
    let mut futures = Vec::new();
    for id in batch {
        let node = env.plan.get(*id).expect("batch ids come from the plan").clone();
        let inputs = gather_inputs(&node, ctx)?;
        let permit = env.sem.clone();
        let storage = env.storage.clone();
        let meta = env.meta.clone();
        let space = env.space.to_string();
        futures.push(async move {
            let _permit = permit.acquire_owned().await.expect("semaphore never closes");
            executor::execute(&node, &inputs, &space, storage.as_ref(), meta.as_ref()).await
        });
    }
    let results = futures::future::try_join_all(futures).await?;
    for (id, dataset) in batch.iter().zip(results) {
        let var = env.plan.get(*id).unwrap().output_var().to_string();
        ctx.set(var, dataset);
    }
    Ok(())
}

async fn execute_one(id: PlanNodeId, env: &Env<'_>, ctx: &mut ExecutionContext) -> Result<()> {
    let node = env.plan.get(id).expect("scheduled id exists in plan").clone();
    match &node {
        PlanNode::Select(sel) => {
            let branch_cond = eval_condition(&sel.condition, ctx)?;
            let chosen = if branch_cond { Some(sel.then_root) } else { sel.else_root };
            if let Some(root) = chosen {
                run_subtree(root, env, ctx).await?;
                let branch_out = env.plan.get(root).unwrap().output_var().to_string();
                let value = ctx.get(&branch_out)?.clone();
                ctx.set(node.output_var().to_string(), value);
            } else {
                ctx.set(node.output_var().to_string(), crate::value::DataSet::new(vec![]));
            }
            Ok(())
        }
        PlanNode::Loop(lp) => {
            let mut iterations = 0u32;
            let max = env.config.concurrency.max_loop_iterations;
            let body_out = env.plan.get(lp.body_root).unwrap().output_var().to_string();
            let body_inputs: Vec<String> =
                env.plan.get(lp.body_root).unwrap().input_vars().to_vec();
            loop {
                if iterations >= max {
                    return Err(Error::execution("loop exceeded max_loop_iterations"));
                }
                if !eval_condition(&lp.condition, ctx)? {
                    break;
                }
                run_subtree(lp.body_root, env, ctx).await?;
                // Carry the body's own output forward as its next input so a
                // further iteration advances the frontier instead of
                // re-reading the one it started with (§4.4 step traversal).
                if let Ok(produced) = ctx.get(&body_out).cloned() {
                    for input_var in &body_inputs {
                        ctx.set(input_var.clone(), produced.clone());
                    }
                }
                iterations += 1;
            }
            let value = ctx.get(&body_out).cloned().unwrap_or_else(|_| crate::value::DataSet::new(vec![]));
            ctx.set(node.output_var().to_string(), value);
            Ok(())
        }
        _ => {
            let inputs = gather_inputs(&node, ctx)?;
            let dataset = executor::execute(&node, &inputs, env.space, env.storage.as_ref(), env.meta.as_ref()).await?;
            ctx.set(node.output_var().to_string(), dataset);
            Ok(())
        }
    }
}

fn gather_inputs(node: &PlanNode, ctx: &ExecutionContext) -> Result<Vec<crate::value::DataSet>> {
    let mut inputs: Vec<crate::value::DataSet> =
        node.input_vars().iter().map(|v| ctx.get(v).cloned()).collect::<Result<_>>()?;
    if let PlanNode::DataCollect(n) = node {
        for extra in &n.extra_inputs {
            inputs.push(ctx.get(extra)?.clone());
        }
    }
    Ok(inputs)
}

/// Resolves named variables against the live [`ExecutionContext`] by
/// reading the first row of the variable's latest `DataSet` column 0 —
/// sufficient for loop counters and boolean conditions, which are always
/// single-column, single-row results of an `Assign`/`Aggregate`.
struct ContextResolver<'a>(&'a ExecutionContext);

impl crate::context::VariableResolver for ContextResolver<'_> {
    fn latest(&self, name: &str) -> Option<crate::value::Value> {
        self.0.get(name).ok()?.rows.first()?.first().cloned()
    }
    fn versioned(&self, name: &str, _v: i64) -> Option<crate::value::Value> {
        self.latest(name)
    }
    fn var_prop(&self, name: &str, prop: &str) -> Option<crate::value::Value> {
        let ds = self.0.get(name).ok()?;
        let idx = ds.column_index(prop)?;
        ds.rows.first()?.get(idx).cloned()
    }
}

/// Evaluates a control-flow condition expression (§4.3 Select/Loop
/// `condition`) against the live context.
fn eval_condition(cond: &crate::expr::Expression, ctx: &ExecutionContext) -> Result<bool> {
    use crate::context::ExpressionContext as _;
    let resolver = ContextResolver(ctx);
    let empty_ds = crate::value::DataSet::new(vec![]);
    let rctx = crate::context::RowContext::new(&empty_ds, 0, &resolver);
    match cond.eval(&rctx)? {
        crate::value::Value::Bool(b) => Ok(b),
        crate::value::Value::Null => Ok(false),
        other => Err(Error::execution(format!(
            "Select/Loop condition must evaluate to a boolean, got {other:?}"
        ))),
    }
}

fn topo_order(root: PlanNodeId, plan: &ExecutionPlan) -> Result<Vec<PlanNodeId>> {
    let mut order = Vec::new();
    let mut visiting = HashSet::new();
    let mut visited = HashSet::new();
    fn visit(
        id: PlanNodeId,
        plan: &ExecutionPlan,
        visiting: &mut HashSet<PlanNodeId>,
        visited: &mut HashSet<PlanNodeId>,
        order: &mut Vec<PlanNodeId>,
    ) -> Result<()> {
        if visited.contains(&id) {
            return Ok(());
        }
        if !visiting.insert(id) {
            return Err(Error::execution("execution plan contains a cycle"));
        }
        if let Some(node) = plan.get(id) {
            for dep in node.dependencies() {
                visit(*dep, plan, visiting, visited, order)?;
            }
        }
        visiting.remove(&id);
        visited.insert(id);
        order.push(id);
        Ok(())
    }
    visit(root, plan, &mut visiting, &mut visited, &mut order)?;
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{AssignNode, LoopNode};
    use crate::rpc::{InMemoryMetadataClient, InMemoryStorageClient};

    /// A `Loop` whose condition never turns false still terminates, bounded
    /// by `max_loop_iterations` (§8 "bounded Loop termination").
    #[tokio::test]
    async fn loop_with_an_always_true_condition_is_bounded() {
        let body = PlanNode::Assign(AssignNode {
            base: PlanNodeBase::new(PlanNodeId(1), "x", vec!["x".into()]),
            var_name: "x".into(),
            expr: crate::expr::Expression::Constant(crate::value::Value::Int(1)),
        });
        let lp = PlanNode::Loop(LoopNode {
            base: PlanNodeBase::new(PlanNodeId(0), "loop_out", vec!["x".into()]),
            condition: crate::expr::Expression::Constant(crate::value::Value::Bool(true)),
            body_root: PlanNodeId(1),
        });
        let plan = ExecutionPlan::new(1, PlanNodeId(0), vec![lp, body]);

        let mut config = ExecutionConfig::default();
        config.concurrency.max_loop_iterations = 3;

        let storage: Arc<dyn StorageClient> = Arc::new(InMemoryStorageClient::new());
        let meta: Arc<dyn MetadataClient> = Arc::new(InMemoryMetadataClient::new());
        let err = run(&plan, "demo", storage, meta, &config).await.unwrap_err();
        assert!(matches!(err, Error::Execution { .. }));
    }
}
