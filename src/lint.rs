//! Configuration linting.
//!
//! Generated SQL substitutes user input without escaping. The lint pass
//! points out input that will corrupt the script; it never rewrites it.

use colored::*;

use crate::config::{Configuration, SourceSystem, FULL_LOAD};
use crate::error::DeployError;

/// Lint severity level.
#[derive(Debug, Clone, PartialEq)]
pub enum LintLevel {
    Error,
    Warning,
    Info,
}

/// A lint issue found in the configuration.
#[derive(Debug)]
pub struct LintIssue {
    pub level: LintLevel,
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl LintIssue {
    fn new(level: LintLevel, field: &str, message: impl Into<String>) -> Self {
        Self {
            level,
            field: field.to_string(),
            message: message.into(),
            suggestion: None,
        }
    }

    fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

fn identifiers(cfg: &Configuration) -> Vec<(&'static str, &str)> {
    vec![
        ("src_schema_name", cfg.src_schema_name.as_str()),
        ("src_table_name", cfg.src_table_name.as_str()),
        ("tgt_schema_name_st", cfg.tgt_schema_name_st.as_str()),
        ("tgt_table_name_st", cfg.tgt_table_name_st.as_str()),
        ("tgt_schema_name_hs", cfg.tgt_schema_name_hs.as_str()),
        ("tgt_table_name_hs", cfg.tgt_table_name_hs.as_str()),
        ("primary_key", cfg.primary_key.as_str()),
        ("helper_schema", cfg.helper_schema.as_str()),
        ("business_key_column", cfg.business_key_column.as_str()),
        ("main_table_schema", cfg.main_table_schema.as_str()),
        ("main_table_name", cfg.main_table_name.as_str()),
    ]
}

fn free_text(cfg: &Configuration) -> Vec<(&'static str, &str)> {
    let mut fields = identifiers(cfg);
    fields.extend([
        ("business_key", cfg.business_key.as_str()),
        ("scd2_columns", cfg.scd2_columns.as_str()),
        ("incremental_filter_st", cfg.incremental_filter_st.as_str()),
        ("incremental_filter_hs", cfg.incremental_filter_hs.as_str()),
        ("prescript", cfg.prescript.as_str()),
        ("postscript", cfg.postscript.as_str()),
        (
            "source_column_for_valid_from_date",
            cfg.source_column_for_valid_from_date.as_str(),
        ),
        ("source_column_for_sorting", cfg.source_column_for_sorting.as_str()),
        (
            "src_delete_column",
            cfg.src_delete_column.as_deref().unwrap_or_default(),
        ),
        (
            "src_delete_value",
            cfg.src_delete_value.as_deref().unwrap_or_default(),
        ),
    ]);
    fields
}

/// Lint a configuration.
pub fn lint_config(cfg: &Configuration) -> Vec<LintIssue> {
    let mut issues = Vec::new();

    // Check 1: fields generation would reject
    if let Err(DeployError::Validation { field, message }) = cfg.validate() {
        issues.push(LintIssue::new(LintLevel::Error, field, message));
    }

    // Check 2: quotes end the string literal they are substituted into
    for (field, value) in free_text(cfg) {
        if value.contains('\'') {
            issues.push(
                LintIssue::new(
                    LintLevel::Warning,
                    field,
                    "Contains a single quote; it is copied into a SQL string literal unescaped",
                )
                .suggest("Double the quote ('') or remove it before generating"),
            );
        }
    }

    // Check 3: identifiers that break bracketed or bare names
    for (field, value) in identifiers(cfg) {
        if value.contains(';') || value.contains(']') || value.contains('[') {
            issues.push(LintIssue::new(
                LintLevel::Warning,
                field,
                "Identifier contains ';', '[' or ']'",
            ));
        } else if value.trim().contains(char::is_whitespace) {
            issues.push(
                LintIssue::new(LintLevel::Warning, field, "Identifier contains whitespace")
                    .suggest("Unbracketed DML statements will not parse; rename the object"),
            );
        }
    }

    // Check 4: optional tables that will silently produce nothing
    if cfg.create_helper_table && cfg.business_key_column.trim().is_empty() {
        issues.push(
            LintIssue::new(
                LintLevel::Info,
                "business_key_column",
                "Helper table requested but no business key column given; it will not be generated",
            )
            .suggest("Set business_key_column, e.g. the first business key column"),
        );
    }
    if cfg.create_main_table && !cfg.skip_main_table && cfg.main_table_columns.trim().is_empty() {
        issues.push(LintIssue::new(
            LintLevel::Info,
            "main_table_columns",
            "Main table requested without columns; only technical columns will be created",
        ));
    }

    // Check 5: CDC daily loads normally filter on the change timestamp
    if cfg.source_system_daily == SourceSystem::ReplicateCdc && cfg.incremental_filter_st == FULL_LOAD
    {
        issues.push(
            LintIssue::new(
                LintLevel::Info,
                "incremental_filter_st",
                "Daily load reads the CT table with a full-load filter",
            )
            .suggest("Consider 'header__timestamp'"),
        );
    }

    for issue in &issues {
        if issue.level != LintLevel::Info {
            log::warn!("{}: {}", issue.field, issue.message);
        }
    }
    issues
}

impl LintLevel {
    fn heading(&self) -> &'static str {
        match self {
            LintLevel::Error => "errors",
            LintLevel::Warning => "warnings",
            LintLevel::Info => "notes",
        }
    }
}

impl LintIssue {
    /// `field: message`, with the suggestion in parentheses.
    pub fn line(&self) -> String {
        match &self.suggestion {
            Some(hint) => format!("{}: {} ({})", self.field, self.message, hint),
            None => format!("{}: {}", self.field, self.message),
        }
    }
}

/// Issue lines grouped by level, errors first. Empty groups are left out;
/// `strict` keeps only the errors.
pub fn report_sections(issues: &[LintIssue], strict: bool) -> Vec<(LintLevel, Vec<String>)> {
    let levels = if strict {
        vec![LintLevel::Error]
    } else {
        vec![LintLevel::Error, LintLevel::Warning, LintLevel::Info]
    };
    levels
        .into_iter()
        .filter_map(|level| {
            let lines: Vec<String> = issues
                .iter()
                .filter(|i| i.level == level)
                .map(LintIssue::line)
                .collect();
            (!lines.is_empty()).then_some((level, lines))
        })
        .collect()
}

/// Print the grouped report. Returns the number of errors.
pub fn print_report(issues: &[LintIssue], strict: bool) -> usize {
    let sections = report_sections(issues, strict);
    if sections.is_empty() {
        println!("{}", "nothing to report".green());
    }
    for (level, lines) in &sections {
        let heading = format!("{} ({})", level.heading(), lines.len());
        let heading = match level {
            LintLevel::Error => heading.red().bold(),
            LintLevel::Warning => heading.yellow().bold(),
            LintLevel::Info => heading.dimmed(),
        };
        println!("{}", heading);
        for line in lines {
            println!("  {}", line);
        }
        println!();
    }
    issues
        .iter()
        .filter(|i| i.level == LintLevel::Error)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::policy;

    fn fields(issues: &[LintIssue], level: LintLevel) -> Vec<&str> {
        issues
            .iter()
            .filter(|i| i.level == level)
            .map(|i| i.field.as_str())
            .collect()
    }

    #[test]
    fn test_clean_config() {
        let mut cfg = policy();
        cfg.incremental_filter_st = "header__timestamp".to_string();
        assert!(lint_config(&cfg).is_empty());
    }

    #[test]
    fn test_quote_in_prescript_warns() {
        let mut cfg = policy();
        cfg.prescript = "DELETE FROM X WHERE A = 'B'".to_string();
        let issues = lint_config(&cfg);
        assert_eq!(fields(&issues, LintLevel::Warning), vec!["prescript"]);
    }

    #[test]
    fn test_identifier_problems() {
        let mut cfg = policy();
        cfg.tgt_table_name_hs = "HS_X; DROP".to_string();
        cfg.helper_schema = "my schema".to_string();
        let issues = lint_config(&cfg);
        let warned = fields(&issues, LintLevel::Warning);
        assert!(warned.contains(&"tgt_table_name_hs"));
        assert!(warned.contains(&"helper_schema"));
    }

    #[test]
    fn test_validation_failure_is_error() {
        let mut cfg = policy();
        cfg.business_key.clear();
        let issues = lint_config(&cfg);
        assert_eq!(fields(&issues, LintLevel::Error), vec!["business_key"]);
    }

    #[test]
    fn test_helper_without_column_info() {
        let mut cfg = policy();
        cfg.create_helper_table = true;
        let issues = lint_config(&cfg);
        assert!(fields(&issues, LintLevel::Info).contains(&"business_key_column"));
    }

    #[test]
    fn test_report_groups_by_level() {
        let issues = vec![
            LintIssue::new(LintLevel::Info, "business_key_column", "helper table skipped"),
            LintIssue::new(LintLevel::Warning, "prescript", "contains a quote")
                .suggest("double it"),
            LintIssue::new(LintLevel::Error, "business_key", "required"),
        ];
        let sections = report_sections(&issues, false);
        let levels: Vec<_> = sections.iter().map(|(level, _)| level.clone()).collect();
        assert_eq!(
            levels,
            vec![LintLevel::Error, LintLevel::Warning, LintLevel::Info]
        );
        assert_eq!(sections[1].1, vec!["prescript: contains a quote (double it)"]);

        let strict = report_sections(&issues, true);
        assert_eq!(strict, vec![(LintLevel::Error, vec!["business_key: required".to_string()])]);
        assert!(report_sections(&[], false).is_empty());
    }
}
