//! Parse-tree shapes consumed by the validator set (C4, §4.4).
//!
//! The query parser itself is out of scope (§1); what matters here is
//! the *shape* a parse tree must have for §4.1's validators to consume
//! it. Expressions inside these statements are already expressed as
//! [`crate::expr::Expression`] trees — resolving surface syntax
//! (`$-.col`, `like.start`, …) into that tree is a parser/binder
//! concern, not a validator one.

use crate::expr::Expression;
use crate::plan::{ConjunctKind, Direction, SortOrder};

#[derive(Debug, Clone)]
pub enum StepRange {
    Exact(u32),
    Range(u32, u32),
}

#[derive(Debug, Clone)]
pub enum FromClause {
    Constant(Vec<Expression>),
    Reference(Expression),
}

#[derive(Debug, Clone)]
pub struct YieldColumn {
    pub expr: Expression,
    pub alias: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GoStatement {
    pub steps: StepRange,
    pub from: FromClause,
    pub edge_types: Vec<String>,
    pub direction: Direction,
    pub where_: Option<Expression>,
    pub yield_: Vec<YieldColumn>,
    pub distinct: bool,
}

#[derive(Debug, Clone)]
pub enum FetchTarget {
    Vertices(FromClause),
    Edges { keys: FromClause, edge_type: String },
}

#[derive(Debug, Clone)]
pub struct FetchStatement {
    pub target: FetchTarget,
    pub yield_: Vec<YieldColumn>,
    pub distinct: bool,
}

#[derive(Debug, Clone)]
pub struct LookupStatement {
    pub is_edge: bool,
    pub schema_name: String,
    pub filters: Vec<Expression>,
    pub fulltext: Option<(String, String)>,
    pub yield_: Vec<YieldColumn>,
}

#[derive(Debug, Clone)]
pub struct GetSubgraphStatement {
    pub steps: u32,
    pub from: FromClause,
    pub direction: Direction,
    pub edge_types: Vec<String>,
    pub where_: Option<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOpKind {
    Union,
    Intersect,
    Minus,
}

#[derive(Debug, Clone)]
pub struct GroupByStatement {
    pub input: Box<Statement>,
    pub group_keys: Vec<Expression>,
    pub yield_: Vec<YieldColumn>,
}

#[derive(Debug, Clone)]
pub struct YieldStatement {
    pub input: Option<Box<Statement>>,
    pub yield_: Vec<YieldColumn>,
    pub distinct: bool,
}

#[derive(Debug, Clone)]
pub struct OrderByStatement {
    pub input: Box<Statement>,
    pub keys: Vec<(String, SortOrder)>,
}

#[derive(Debug, Clone)]
pub struct LimitStatement {
    pub input: Box<Statement>,
    pub offset: i64,
    pub count: i64,
}

/// One `INSERT VERTEX`/`UPSERT` row: the vertex id plus its tag property
/// values, each still an unevaluated literal expression (§4.7).
#[derive(Debug, Clone)]
pub struct VertexRow {
    pub vid: Expression,
    pub props: Vec<(String, Expression)>,
}

/// One `INSERT EDGE` row.
#[derive(Debug, Clone)]
pub struct EdgeRow {
    pub src: Expression,
    pub dst: Expression,
    pub rank: i64,
    pub props: Vec<(String, Expression)>,
}

#[derive(Debug, Clone)]
pub enum AdminStatement {
    CreateSpace { name: String, partitions: u32 },
    DropSpace { name: String },
    ShowSpaces,
    CreateTag { space: String, name: String },
    CreateEdge { space: String, name: String },
    InsertVertices { space: String, tag: String, rows: Vec<VertexRow> },
    InsertEdges { space: String, edge_type: String, rows: Vec<EdgeRow> },
    UpdateVertex { space: String, vid: Expression, tag: String, props: Vec<(String, Expression)> },
    UpdateEdge { space: String, src: Expression, dst: Expression, edge_type: String, props: Vec<(String, Expression)> },
    DeleteVertices { space: String, vids: Vec<Expression> },
    DeleteEdges { space: String, edge_type: String },
}

#[derive(Debug, Clone)]
pub enum Statement {
    Go(GoStatement),
    Fetch(FetchStatement),
    Lookup(LookupStatement),
    GetSubgraph(GetSubgraphStatement),
    /// `left | right`; right's unqualified input is left's output.
    Pipe(Box<Statement>, Box<Statement>),
    Set { kind: SetOpKind, distinct: bool, left: Box<Statement>, right: Box<Statement> },
    Sequential(Vec<Statement>),
    GroupBy(GroupByStatement),
    Yield(YieldStatement),
    OrderBy(OrderByStatement),
    Limit(LimitStatement),
    Assign { var: String, inner: Box<Statement> },
    Explain { profile: bool, inner: Box<Statement> },
    Admin(AdminStatement),
    /// `ConjunctPath`'s statement-level entry point; not every path
    /// algorithm has distinct surface syntax, so the kind selects the
    /// strategy directly (§4.5 planner dispatch).
    FindPath { from: FromClause, to: FromClause, steps: u32, kind: ConjunctKind, edge_types: Vec<String>, direction: Direction },
}
