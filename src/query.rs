//! Query instance driver (C9, §4.9): owns one request end to end through
//! its Created → Validated → Optimized → Executing → Finished/Failed
//! lifecycle (§3 "QueryContext"), and assembles the terminal
//! [`ExecutionResponse`]/[`PlanDescription`] (§6.3, §6.4).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;

use crate::arena::Arena;
use crate::ast::Statement;
use crate::catalog::Catalog;
use crate::config::ExecutionConfig;
use crate::error::{Error, Result, Status};
use crate::plan::{ExecutionPlan, NodeDescription, PlanNodeId};
use crate::planner;
use crate::rpc::{MetadataClient, StorageClient};
use crate::scheduler;
use crate::symbol::SymbolTable;
use crate::value::DataSet;

static NEXT_QUERY_ID: AtomicU64 = AtomicU64::new(1);

fn next_query_id() -> u64 {
    NEXT_QUERY_ID.fetch_add(1, AtomicOrdering::SeqCst)
}

/// §4.9 "Created → Validated → Optimized → Explain/Executing →
/// Finished/Failed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Created,
    Validated,
    Optimized,
    Executing,
    Finished,
    Failed,
}

/// Per-phase wall-clock timing (§4.9a), reported back in
/// `ExecutionResponse` for observability.
#[derive(Debug, Clone, Default)]
pub struct PhaseTiming {
    pub validate: Duration,
    pub optimize: Duration,
    pub execute: Duration,
}

/// §6.4: a flattened, explainable view of an [`ExecutionPlan`].
#[derive(Debug, Clone)]
pub struct PlanDescription {
    pub plan_id: u64,
    pub root: PlanNodeId,
    pub nodes: Vec<NodeDescription>,
}

/// §6.3: what a finished query hands back to its caller.
#[derive(Debug, Clone)]
pub struct ExecutionResponse {
    pub query_id: u64,
    pub status: StatusKind,
    pub error_code: i32,
    pub data: Option<DataSet>,
    pub latency: Duration,
    pub plan_description: Option<PlanDescription>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    PartialSuccess,
    Error,
}

/// Read-only variable store an executing plan reads from and writes to.
/// Deliberately a flat `HashMap` rather than a version history: §4.8's
/// in-place flag only tells the scheduler it's safe to overwrite, which a
/// `HashMap::insert` already does — there's no separate "old version"
/// consumer once the symbol table says nobody else will read it.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    variables: HashMap<String, DataSet>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        ExecutionContext::default()
    }

    pub fn get(&self, name: &str) -> Result<&DataSet> {
        self.variables
            .get(name)
            .ok_or_else(|| Error::execution(format!("variable '{name}' has no value yet")))
    }

    pub fn set(&mut self, name: impl Into<String>, value: DataSet) {
        self.variables.insert(name.into(), value);
    }
}

pub struct QueryContext {
    pub id: u64,
    pub state: QueryState,
    pub space: Option<String>,
    pub config: ExecutionConfig,
    pub timing: PhaseTiming,
    plan: Option<ExecutionPlan>,
    symbols: Option<SymbolTable>,
    #[allow(dead_code)]
    arena: Option<Arena>,
    result_var: Option<String>,
}

impl QueryContext {
    pub fn new(space: Option<String>, config: ExecutionConfig) -> Self {
        QueryContext {
            id: next_query_id(),
            state: QueryState::Created,
            space,
            config,
            timing: PhaseTiming::default(),
            plan: None,
            symbols: None,
            arena: None,
            result_var: None,
        }
    }

    /// Runs validation + planning (C4/C5) against `catalog`.
    pub fn validate_and_plan(&mut self, stmt: &Statement, catalog: &Catalog) -> Result<()> {
        if self.state != QueryState::Created {
            return Err(Error::execution("query already validated"));
        }
        let (result, symbols, arena) =
            planner::plan_statement(stmt, self.space.clone(), catalog, self.id)?;
        self.plan = Some(result.plan);
        self.result_var = Some(result.result_var);
        self.symbols = Some(symbols);
        self.arena = Some(arena);
        self.state = QueryState::Validated;
        tracing::debug!(query_id = self.id, result_var = %self.result_var.as_deref().unwrap_or(""), "query_validated");
        Ok(())
    }

    /// Runs the optimizer (C6) in place.
    pub fn optimize(&mut self) -> Result<()> {
        if self.state != QueryState::Validated {
            return Err(Error::execution("query must be validated before optimizing"));
        }
        let plan = self.plan.take().expect("validated query always has a plan");
        let mut symbols = self.symbols.take().expect("validated query always has symbols");
        let plan = crate::optimizer::optimize(plan, &mut symbols);
        self.plan = Some(plan);
        self.symbols = Some(symbols);
        self.state = QueryState::Optimized;
        Ok(())
    }

    pub fn explain(&self) -> Result<PlanDescription> {
        let plan = self.plan.as_ref().ok_or_else(|| Error::execution("query has no plan yet"))?;
        Ok(PlanDescription {
            plan_id: plan.plan_id,
            root: plan.root,
            nodes: crate::validator::describe_plan(plan),
        })
    }

    /// Runs the scheduler/executor (C7/C8) to completion and returns the
    /// terminal response (§6.3).
    pub async fn execute(
        &mut self,
        storage: Arc<dyn StorageClient>,
        meta: Arc<dyn MetadataClient>,
    ) -> ExecutionResponse {
        if self.state != QueryState::Optimized {
            return self.error_response(Error::execution("query must be optimized before executing"));
        }
        self.state = QueryState::Executing;
        let plan = self.plan.as_ref().expect("optimized query always has a plan");
        let space = self.space.clone().unwrap_or_default();

        let started = std::time::Instant::now();
        let outcome = scheduler::run(plan, &space, storage, meta, &self.config).await;
        self.timing.execute = started.elapsed();
        tracing::debug!(query_id = self.id, elapsed_ms = self.timing.execute.as_millis() as u64, ok = outcome.is_ok(), "query_executed");

        match outcome {
            Ok(ctx) => {
                self.state = QueryState::Finished;
                let result_var = self.result_var.clone().unwrap_or_default();
                let data = ctx.get(&result_var).ok().cloned();
                ExecutionResponse {
                    query_id: self.id,
                    status: StatusKind::Success,
                    error_code: 0,
                    data,
                    latency: self.timing.execute,
                    plan_description: self.explain().ok(),
                }
            }
            Err(err) => self.error_response(err),
        }
    }

    fn error_response(&mut self, err: Error) -> ExecutionResponse {
        self.state = QueryState::Failed;
        let status: Status = err.clone().into();
        ExecutionResponse {
            query_id: self.id,
            status: match status {
                Status::Success => StatusKind::Success,
                Status::PartialSuccess => StatusKind::PartialSuccess,
                Status::Error(_) => StatusKind::Error,
            },
            error_code: err.code(),
            data: None,
            latency: self.timing.execute,
            plan_description: self.explain().ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FromClause, GoStatement, StepRange, YieldColumn};
    use crate::expr::Expression;
    use crate::plan::Direction;
    use crate::rpc::{InMemoryMetadataClient, InMemoryStorageClient};
    use crate::value::graph::{Edge, Vertex};
    use crate::value::Value;

    #[tokio::test]
    async fn full_go_query_runs_end_to_end() {
        let mut catalog = Catalog::new();
        catalog.register_edge("like", vec![]);

        let storage = Arc::new(InMemoryStorageClient::new());
        storage.insert_vertex(Vertex::new("A"));
        storage.insert_vertex(Vertex::new("B"));
        storage.insert_edge(Edge::new(Value::String("A".into()), Value::String("B".into()), "like"));
        let meta = Arc::new(InMemoryMetadataClient::new());
        meta.define_space("demo", 1);

        let stmt = Statement::Go(GoStatement {
            steps: StepRange::Exact(1),
            from: FromClause::Constant(vec![Expression::Constant(Value::String("A".into()))]),
            edge_types: vec!["like".into()],
            direction: Direction::Out,
            where_: None,
            yield_: vec![YieldColumn { expr: Expression::InputProp("_dst".into()), alias: Some("id".into()) }],
            distinct: false,
        });

        let mut qctx = QueryContext::new(Some("demo".into()), ExecutionConfig::default());
        qctx.validate_and_plan(&stmt, &catalog).unwrap();
        qctx.optimize().unwrap();
        let resp = qctx.execute(storage, meta).await;
        assert_eq!(resp.status, StatusKind::Success);
        assert!(resp.data.is_some());
    }
}
