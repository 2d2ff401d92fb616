//! Read-only guard for model-generated SQL.
use askdb_core::DatabaseError;
use sqlparser::ast::{Expr, Query, SetExpr, Statement, Visit, Visitor};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use std::ops::ControlFlow;

const READ_ONLY_ONLY: &str = "only read-only SELECT queries are allowed";

/// Functions that change session state or reach outside the query.
const DENIED_FUNCTIONS: &[&str] = &["set_config", "dblink", "dblink_exec", "lo_import", "lo_export"];

/// Accept exactly one query statement (`SELECT`, `WITH … SELECT`, `VALUES`)
/// that writes nothing anywhere in its tree.
///
/// Rejections are reported as query execution failures so they reach the
/// caller the same way a driver error would.
pub fn ensure_read_only(sql: &str) -> Result<(), DatabaseError> {
    let dialect = PostgreSqlDialect {};
    let statements = Parser::parse_sql(&dialect, sql)
        .map_err(|e| DatabaseError::QueryExecution(format!("SQL parse error: {e}")))?;

    let statement = match statements.as_slice() {
        [statement @ Statement::Query(_)] => statement,
        [] => return Err(DatabaseError::QueryExecution("SQL is empty".to_string())),
        [_] => return Err(DatabaseError::QueryExecution(READ_ONLY_ONLY.to_string())),
        _ => {
            return Err(DatabaseError::QueryExecution(
                "SQL must contain exactly one statement".to_string(),
            ))
        }
    };

    match statement.visit(&mut ReadOnlyVisitor) {
        ControlFlow::Continue(()) => Ok(()),
        ControlFlow::Break(reason) => Err(DatabaseError::QueryExecution(reason)),
    }
}

/// Walks every nested query, statement and expression.
struct ReadOnlyVisitor;

impl Visitor for ReadOnlyVisitor {
    type Break = String;

    fn pre_visit_statement(&mut self, statement: &Statement) -> ControlFlow<String> {
        match statement {
            Statement::Query(_) => ControlFlow::Continue(()),
            // INSERT/UPDATE/DELETE inside a CTE or set operation.
            _ => ControlFlow::Break(READ_ONLY_ONLY.to_string()),
        }
    }

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<String> {
        if !query.locks.is_empty() {
            return ControlFlow::Break("row locking clauses are not allowed".to_string());
        }
        check_set_expr(&query.body)
    }

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<String> {
        if let Expr::Function(function) = expr {
            let name = function
                .name
                .0
                .last()
                .map(|ident| ident.value.to_lowercase())
                .unwrap_or_default();
            if name.starts_with("pg_") || DENIED_FUNCTIONS.contains(&name.as_str()) {
                return ControlFlow::Break(format!("function {name} is not allowed"));
            }
        }
        ControlFlow::Continue(())
    }
}

/// Set-operation arms are not queries of their own, so `SELECT … INTO` has
/// to be found by walking the body.
fn check_set_expr(body: &SetExpr) -> ControlFlow<String> {
    match body {
        SetExpr::Select(select) if select.into.is_some() => {
            ControlFlow::Break("SELECT INTO is not allowed".to_string())
        }
        SetExpr::SetOperation { left, right, .. } => {
            check_set_expr(left)?;
            check_set_expr(right)
        }
        SetExpr::Insert(_) | SetExpr::Update(_) => ControlFlow::Break(READ_ONLY_ONLY.to_string()),
        _ => ControlFlow::Continue(()),
    }
}
