//! # stagehand
//!
//! Deployment script generator for the stage → historic stage → dimension
//! pattern on SQL Server warehouses.
//!
//! A [`Configuration`](config::Configuration) describes one source table.
//! Freezing it into a [`Run`](run::Run) fixes the table suffix shared by
//! every temporary table; everything else is a pure function of the run.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use stagehand::prelude::*;
//!
//! let config = Configuration {
//!     user_initials: "jdo".into(),
//!     src_table_name: "POLICY".into(),
//!     business_key: "POLICY_ID".into(),
//!     scd2_columns: "STATUS,PREMIUM".into(),
//!     ..Configuration::default()
//! };
//! let run = Run::new(&config, chrono::Local::now().naive_local())?;
//! let artifacts = Artifacts::build(&run)?;
//! artifacts.write_to(std::path::Path::new("deploy"))?;
//! ```
//!
//! ## Steps
//!
//! | Step | Artifact                                   |
//! |------|--------------------------------------------|
//! | 1    | Sandbox copies of the control tables       |
//! | 2-4  | ST, HS and job control rows                |
//! | 5    | HS table                                   |
//! | 6    | Business key helper table (optional)       |
//! | 7    | Dimension table (optional)                 |
//! | 8    | HS table, quick path (alternative to 5)    |
//! | 9    | Promotion to production (commented out)    |

pub mod assemble;
pub mod config;
pub mod error;
pub mod instructions;
pub mod json;
pub mod lint;
pub mod naming;
pub mod params;
pub mod pipeline;
pub mod run;
pub mod settings;
pub mod sql;

#[cfg(test)]
pub(crate) mod fixtures;

pub mod prelude {
    pub use crate::assemble::Artifacts;
    pub use crate::config::*;
    pub use crate::error::*;
    pub use crate::lint::{lint_config, LintIssue, LintLevel};
    pub use crate::params::{export_parameters, import_parameters, ImportedParameters};
    pub use crate::pipeline::{Pipeline, PipelineMode};
    pub use crate::run::Run;
    pub use crate::sql::{Step, ToSql};
}

/// Validate `config` and generate every artifact for a new run.
///
/// # Example
///
/// ```
/// use stagehand::config::Configuration;
///
/// let config = Configuration {
///     user_initials: "jdo".into(),
///     src_table_name: "POLICY".into(),
///     business_key: "POLICY_ID".into(),
///     scd2_columns: "STATUS".into(),
///     ..Configuration::default()
/// };
/// let now = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
///     .unwrap()
///     .and_hms_opt(0, 0, 0)
///     .unwrap();
/// let artifacts = stagehand::generate(&config, now).unwrap();
/// assert_eq!(artifacts.script.file_name, "deploy_POLICY_jdo_20240101_000000.sql");
/// ```
pub fn generate(
    config: &config::Configuration,
    now: chrono::NaiveDateTime,
) -> error::DeployResult<assemble::Artifacts> {
    let run = run::Run::new(config, now)?;
    assemble::Artifacts::build(&run)
}
