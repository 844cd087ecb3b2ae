//! SQL script generators.
//!
//! One function per deployment step. Every generator takes the frozen
//! [`Run`] and returns `Some(sql)`, or `None` when the step produces no
//! artifact for this configuration (helper table not requested, table
//! already exists, ...). No generator performs IO.

pub mod cleanup;
pub mod control;
pub mod ddl;

use crate::run::Run;
use std::fmt;

/// Deployment steps in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Backup,
    StControl,
    HsControl,
    JobControl,
    HsTable,
    HelperTable,
    MainTable,
    QuickHsTable,
    Cleanup,
}

impl Step {
    pub const ALL: [Step; 9] = [
        Step::Backup,
        Step::StControl,
        Step::HsControl,
        Step::JobControl,
        Step::HsTable,
        Step::HelperTable,
        Step::MainTable,
        Step::QuickHsTable,
        Step::Cleanup,
    ];

    pub fn number(&self) -> usize {
        match self {
            Step::Backup => 1,
            Step::StControl => 2,
            Step::HsControl => 3,
            Step::JobControl => 4,
            Step::HsTable => 5,
            Step::HelperTable => 6,
            Step::MainTable => 7,
            Step::QuickHsTable => 8,
            Step::Cleanup => 9,
        }
    }

    pub fn from_number(n: usize) -> Option<Step> {
        Step::ALL.iter().copied().find(|s| s.number() == n)
    }

    /// Short label used in fragment file names.
    pub fn label(&self) -> &'static str {
        match self {
            Step::Backup => "backup",
            Step::StControl => "st_control",
            Step::HsControl => "hs_control",
            Step::JobControl => "job_control",
            Step::HsTable => "hs_table",
            Step::HelperTable => "helper_table",
            Step::MainTable => "main_table",
            Step::QuickHsTable => "quick_hs_table",
            Step::Cleanup => "cleanup",
        }
    }

    /// Section title used in the composite script banner.
    pub fn title(&self) -> &'static str {
        match self {
            Step::Backup => "CREATE TEMPORARY CONTROL TABLES",
            Step::StControl => "UPDATE ST CONTROL TABLE",
            Step::HsControl => "UPDATE HS CONTROL TABLE",
            Step::JobControl => "UPDATE JOB CONTROL TABLE",
            Step::HsTable => "CREATE HS TABLE",
            Step::HelperTable => "CREATE HELPER TABLE",
            Step::MainTable => "CREATE MAIN TABLE",
            Step::QuickHsTable => "QUICK HS TABLE (ALTERNATIVE TO STEP 5)",
            Step::Cleanup => "CLEANUP",
        }
    }

    /// Run this step's generator.
    pub fn generate(&self, run: &Run) -> Option<String> {
        let sql = match self {
            Step::Backup => Some(control::backup(run)),
            Step::StControl => Some(control::st_control(run)),
            Step::HsControl => Some(control::hs_control(run)),
            Step::JobControl => Some(control::job_control(run)),
            Step::HsTable => ddl::hs_table(run),
            Step::HelperTable => ddl::helper_table(run),
            Step::MainTable => ddl::main_table(run),
            Step::QuickHsTable => ddl::quick_hs_table(run),
            Step::Cleanup => Some(cleanup::cleanup(run)),
        };
        log::debug!(
            "step {} ({}): {}",
            self.number(),
            self.label(),
            if sql.is_some() { "generated" } else { "no artifact" }
        );
        sql
    }

    /// Message shown in place of SQL when [`Step::generate`] yields nothing.
    pub fn skipped_reason(&self, run: &Run) -> &'static str {
        let cfg = run.config();
        match self {
            Step::HsTable | Step::QuickHsTable => "HS table already exists; creation skipped.",
            Step::HelperTable if !cfg.create_helper_table => {
                "Helper table creation was not selected."
            }
            Step::HelperTable => "Helper table needs both a schema and a business key column.",
            Step::MainTable if cfg.skip_main_table => "Main table already exists; creation skipped.",
            Step::MainTable => "Main table creation was not selected.",
            _ => "Nothing to generate.",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "STEP {}: {}", self.number(), self.title())
    }
}

/// Trait for rendering values as SQL literals.
pub trait ToSql {
    fn to_sql(&self) -> String;
}

/// A literal substituted into a generated statement.
///
/// Text is quoted but never escaped: a `'` inside user input ends up in the
/// script as-is (see [`crate::lint`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlValue<'a> {
    Null,
    Text(&'a str),
    Int(i64),
}

impl<'a> SqlValue<'a> {
    /// `NULL` for an unset field, the quoted text otherwise.
    pub fn opt(value: Option<&'a str>) -> Self {
        match value {
            Some(v) => SqlValue::Text(v),
            None => SqlValue::Null,
        }
    }
}

impl ToSql for SqlValue<'_> {
    fn to_sql(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Text(s) => format!("'{}'", s),
            SqlValue::Int(n) => n.to_string(),
        }
    }
}

/// Render a list of names as a SQL `IN` list: `'a','b'`.
pub fn in_list(names: &[&str]) -> String {
    names
        .iter()
        .map(|n| SqlValue::Text(n).to_sql())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_literal() {
        assert_eq!(SqlValue::opt(None).to_sql(), "NULL");
        assert_eq!(SqlValue::opt(Some("SOFT")).to_sql(), "'SOFT'");
    }

    #[test]
    fn test_text_is_not_escaped() {
        assert_eq!(SqlValue::Text("O'Brien").to_sql(), "'O'Brien'");
    }

    #[test]
    fn test_in_list() {
        assert_eq!(in_list(&["A", "B"]), "'A','B'");
    }

    #[test]
    fn test_step_numbering() {
        for (i, step) in Step::ALL.iter().enumerate() {
            assert_eq!(step.number(), i + 1);
            assert_eq!(Step::from_number(i + 1), Some(*step));
        }
        assert_eq!(Step::from_number(10), None);
        assert_eq!(
            Step::Backup.to_string(),
            "STEP 1: CREATE TEMPORARY CONTROL TABLES"
        );
    }
}
