//! # Distributed Graph Query Execution Layer
//!
//! A validator/planner/optimizer/scheduler/executor pipeline for a
//! property-graph query language, built against Rust traits at the
//! storage/metadata RPC boundary rather than a concrete transport.
//!
//! ## Pipeline
//!
//! ```text
//! Statement (AST, built by an external parser)
//!     ↓
//! [Validator (C4)]   → per-statement SubPlan, schema-checked against Catalog
//!     ↓
//! [Planner (C5)]     → ExecutionPlan (operator DAG + variable-scoped dataflow)
//!     ↓
//! [Optimizer (C6)]   → rewritten ExecutionPlan (pushdown, fusion, lifetime analysis)
//!     ↓
//! [Scheduler (C8)]   → topological, concurrency-bounded dispatch
//!     ↓
//! [Executor (C7)]    → one PlanNode at a time, against StorageClient/MetadataClient
//!     ↓
//! ExecutionResponse
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use graph_query_exec::{Catalog, ExecutionConfig, QueryContext};
//! use graph_query_exec::rpc::{InMemoryStorageClient, InMemoryMetadataClient};
//! use std::sync::Arc;
//!
//! let catalog = Catalog::new();
//! let mut ctx = QueryContext::new(Some("demo".into()), ExecutionConfig::default());
//! ctx.validate_and_plan(&statement, &catalog)?;
//! ctx.optimize()?;
//! let response = ctx.execute(Arc::new(InMemoryStorageClient::new()), Arc::new(InMemoryMetadataClient::new())).await;
//! ```
//!
//! ## Module organization
//!
//! | Module | Component | Purpose |
//! |--------|-----------|---------|
//! | `ast` | - | Statement AST this crate's validators consume (no parser shipped) |
//! | `symbol` | C1 | Variable registry / symbol table |
//! | `catalog` | - | Schema snapshot (tags/edges/properties) validators check against |
//! | `arena` | §4.2a | Per-query `Expression` arena |
//! | `expr` | C3 | Expression AST + evaluation |
//! | `context` | C3 | `ExpressionContext`/`VariableResolver` implementations |
//! | `value` | C3 | `Value`/`DataSet`/graph types (Vertex/Edge/Path) |
//! | `iter` | C3 | Polymorphic row cursor over a `DataSet` |
//! | `plan` | C3/C5 | `PlanNode`/`ExecutionPlan` |
//! | `validator` | C4 | Per-statement-kind validators |
//! | `planner` | C5 | Statement → `ExecutionPlan` |
//! | `optimizer` | C6 | Plan rewriting + lifetime analysis |
//! | `executor` | C7 | Per-PlanNode execution |
//! | `scheduler` | C8 | Concurrency-bounded plan dispatch |
//! | `query` | C9 | `QueryContext` request driver |
//! | `rpc` | C10 | `StorageClient`/`MetadataClient` traits + in-memory fakes |
//! | `config`, `error` | C11 | `ExecutionConfig`, `Error`/`Status` |

pub mod arena;
pub mod ast;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod expr;
pub mod iter;
pub mod optimizer;
pub mod plan;
pub mod planner;
pub mod query;
pub mod rpc;
pub mod scheduler;
pub mod symbol;
pub mod validator;
pub mod value;

pub use arena::{Arena, ExprId};
pub use catalog::Catalog;
pub use config::ExecutionConfig;
pub use error::{Error, Result, Status};
pub use plan::{ExecutionPlan, PlanNode, PlanNodeId};
pub use query::{ExecutionContext, ExecutionResponse, PlanDescription, QueryContext, QueryState};
pub use symbol::SymbolTable;
pub use value::{DataSet, Value};
