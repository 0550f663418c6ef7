//! SQL parsing and classification logic.
//!
//! Uses sqlparser-rs with the PostgreSQL dialect to find the most dangerous
//! operation anywhere in a statement, including inside CTEs and subqueries.

use sqlparser::ast::{Query, Select, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

use crate::error::{CrmError, Result};

use super::{ClassificationResult, SafetyLevel, StatementType};

/// Parses SQL and classifies it by the operations it would perform.
#[derive(Debug)]
pub struct SqlClassifier {
    dialect: PostgreSqlDialect,
}

impl Default for SqlClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlClassifier {
    pub fn new() -> Self {
        Self {
            dialect: PostgreSqlDialect {},
        }
    }

    /// Classifies a SQL string.
    ///
    /// SQL that cannot be parsed is classified as destructive with a warning,
    /// so it never counts as read-only.
    pub fn classify(&self, sql: &str) -> ClassificationResult {
        match self.parse_and_classify(sql) {
            Ok(result) => result,
            Err(e) => ClassificationResult::with_warning(
                SafetyLevel::Destructive,
                StatementType::Unknown,
                format!("Could not parse SQL: {}", e.message()),
            ),
        }
    }

    fn parse_and_classify(&self, sql: &str) -> Result<ClassificationResult> {
        let statements = Parser::parse_sql(&self.dialect, sql)
            .map_err(|e| CrmError::query(format!("SQL parse error: {e}")))?;

        let (level, statement_type) = match statements.as_slice() {
            [] => {
                return Ok(ClassificationResult::with_warning(
                    SafetyLevel::Destructive,
                    StatementType::Unknown,
                    "Empty SQL statement",
                ))
            }
            [single] => classify_statement(single),
            many => {
                let (level, inner) = many
                    .iter()
                    .map(classify_statement)
                    .fold((SafetyLevel::Safe, StatementType::Select), most_dangerous);
                (level, StatementType::Multiple(Box::new(inner)))
            }
        };

        Ok(ClassificationResult::new(level, statement_type))
    }
}

/// Classifies SQL without creating a classifier instance.
pub fn classify_sql(sql: &str) -> ClassificationResult {
    SqlClassifier::new().classify(sql)
}

type Classification = (SafetyLevel, StatementType);

/// Keeps whichever classification is more dangerous; ties keep the first.
fn most_dangerous(current: Classification, candidate: Classification) -> Classification {
    if candidate.0 > current.0 {
        candidate
    } else {
        current
    }
}

fn classify_statement(statement: &Statement) -> Classification {
    match statement {
        Statement::Query(query) => classify_query(query),
        Statement::Explain {
            analyze, statement, ..
        } => {
            if *analyze {
                // EXPLAIN ANALYZE runs the statement.
                (classify_statement(statement).0, StatementType::Explain)
            } else {
                (SafetyLevel::Safe, StatementType::Explain)
            }
        }
        Statement::ExplainTable { .. } => (SafetyLevel::Safe, StatementType::Describe),
        Statement::ShowVariable { .. }
        | Statement::ShowTables { .. }
        | Statement::ShowColumns { .. }
        | Statement::ShowCreate { .. }
        | Statement::ShowFunctions { .. }
        | Statement::ShowStatus { .. }
        | Statement::ShowCollation { .. } => (SafetyLevel::Safe, StatementType::Show),

        Statement::Insert(_) => (SafetyLevel::Mutating, StatementType::Insert),
        Statement::Update { .. } => (SafetyLevel::Mutating, StatementType::Update),
        Statement::Merge { .. } => (SafetyLevel::Mutating, StatementType::Merge),

        Statement::Delete(_) => (SafetyLevel::Destructive, StatementType::Delete),
        Statement::Drop { .. } => (SafetyLevel::Destructive, StatementType::Drop),
        Statement::Truncate { .. } => (SafetyLevel::Destructive, StatementType::Truncate),
        Statement::AlterTable { .. }
        | Statement::AlterIndex { .. }
        | Statement::AlterView { .. }
        | Statement::AlterRole { .. } => (SafetyLevel::Destructive, StatementType::Alter),
        Statement::CreateTable { .. }
        | Statement::CreateIndex { .. }
        | Statement::CreateView { .. }
        | Statement::CreateSchema { .. }
        | Statement::CreateDatabase { .. }
        | Statement::CreateFunction { .. }
        | Statement::CreateProcedure { .. }
        | Statement::CreateRole { .. }
        | Statement::CreateSequence { .. }
        | Statement::CreateType { .. } => (SafetyLevel::Destructive, StatementType::Create),
        Statement::Grant { .. } => (SafetyLevel::Destructive, StatementType::Grant),
        Statement::Revoke { .. } => (SafetyLevel::Destructive, StatementType::Revoke),

        // SET, COPY, CALL, transaction control and anything newer.
        _ => (SafetyLevel::Destructive, StatementType::Unknown),
    }
}

fn classify_query(query: &Query) -> Classification {
    let mut result = (SafetyLevel::Safe, StatementType::Select);

    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            result = most_dangerous(result, classify_query(&cte.query));
        }
    }

    result = most_dangerous(result, classify_set_expr(&query.body));

    // SELECT ... FOR UPDATE takes row locks.
    if !query.locks.is_empty() {
        result = most_dangerous(result, (SafetyLevel::Mutating, StatementType::Select));
    }

    result
}

fn classify_set_expr(set_expr: &SetExpr) -> Classification {
    match set_expr {
        SetExpr::Delete(stmt)
        | SetExpr::Update(stmt)
        | SetExpr::Insert(stmt)
        | SetExpr::Merge(stmt) => classify_statement(stmt),
        SetExpr::Query(query) => classify_query(query),
        SetExpr::Select(select) => classify_select(select),
        SetExpr::SetOperation { left, right, .. } => {
            most_dangerous(classify_set_expr(left), classify_set_expr(right))
        }
        SetExpr::Values(_) | SetExpr::Table(_) => (SafetyLevel::Safe, StatementType::Select),
    }
}

fn classify_select(select: &Select) -> Classification {
    // SELECT ... INTO creates a table.
    if select.into.is_some() {
        return (SafetyLevel::Destructive, StatementType::Create);
    }

    select
        .from
        .iter()
        .map(classify_table_with_joins)
        .fold((SafetyLevel::Safe, StatementType::Select), most_dangerous)
}

fn classify_table_with_joins(twj: &TableWithJoins) -> Classification {
    twj.joins
        .iter()
        .map(|join| classify_table_factor(&join.relation))
        .fold(classify_table_factor(&twj.relation), most_dangerous)
}

fn classify_table_factor(factor: &TableFactor) -> Classification {
    match factor {
        TableFactor::Derived { subquery, .. } => classify_query(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => classify_table_with_joins(table_with_joins),
        _ => (SafetyLevel::Safe, StatementType::Select),
    }
}
