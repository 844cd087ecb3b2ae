//! Step 9: cleanup.
//!
//! Everything emitted here is commented out. The block documents how the
//! temporary configuration is promoted to production once the initial load
//! has been verified; nothing in it runs when the script is executed.

use super::{SqlValue, ToSql};
use crate::naming::{
    CONTROL_SCHEMA, HS_CONTROL_TABLE, JOB_CONTROL_TABLE, SANDBOX_SCHEMA, STAGE_CONTROL_TABLE,
};
use crate::run::Run;

pub fn cleanup(run: &Run) -> String {
    let suffix = run.table_suffix();
    let targets = run.targets();
    let temp = run.temp_tables();

    let stage = format!("{}.{}", CONTROL_SCHEMA, STAGE_CONTROL_TABLE);
    let hs = format!("{}.{}", CONTROL_SCHEMA, HS_CONTROL_TABLE);
    let job = format!("{}.{}", CONTROL_SCHEMA, JOB_CONTROL_TABLE);
    let backups = [
        (stage.as_str(), format!("{}.backup_control_table_st_{}", SANDBOX_SCHEMA, suffix)),
        (hs.as_str(), format!("{}.backup_control_table_hs_{}", SANDBOX_SCHEMA, suffix)),
        (job.as_str(), format!("{}.backup_control_table_job_{}", SANDBOX_SCHEMA, suffix)),
    ];

    let mut lines: Vec<String> = vec![
        "Run these statements by hand after the initial load has been verified.".to_string(),
        String::new(),
        "1. Back up the production control tables".to_string(),
    ];
    for (table, backup) in &backups {
        lines.push(format!("SELECT * INTO {} FROM {};", backup, table));
    }

    lines.push(String::new());
    lines.push("2. Remove any previous configuration of this table".to_string());
    lines.push(format!(
        "DELETE FROM {} WHERE tgt_schema_name = {} AND tgt_table_name = {};",
        stage,
        SqlValue::Text(&targets.st_schema).to_sql(),
        SqlValue::Text(&targets.st_table).to_sql()
    ));
    lines.push(format!(
        "DELETE FROM {} WHERE tgt_schema_name = {} AND tgt_table_name = {};",
        hs,
        SqlValue::Text(&targets.hs_schema).to_sql(),
        SqlValue::Text(&targets.hs_table).to_sql()
    ));

    lines.push(String::new());
    lines.push("3. Merge the temporary configuration into production".to_string());
    lines.push(format!(
        "INSERT INTO {} SELECT * FROM {}.{};",
        stage, SANDBOX_SCHEMA, temp.st
    ));
    lines.push(format!(
        "INSERT INTO {} SELECT * FROM {}.{};",
        hs, SANDBOX_SCHEMA, temp.hs
    ));
    lines.push(format!(
        "{} is not merged: {}.{} only marks the jobs SUCCESS for the sandbox load.",
        job, SANDBOX_SCHEMA, temp.job
    ));

    lines.push(String::new());
    lines.push("4. Drop the temporary tables".to_string());
    for table in temp.qualified() {
        lines.push(format!("DROP TABLE {};", table));
    }

    lines.push(String::new());
    lines.push("5. Drop the backups once production has run a daily load".to_string());
    for (_, backup) in &backups {
        lines.push(format!("DROP TABLE {};", backup));
    }

    let mut sql = String::new();
    for line in lines {
        if line.is_empty() {
            sql.push_str("--\n");
        } else {
            sql.push_str("-- ");
            sql.push_str(&line);
            sql.push('\n');
        }
    }
    sql
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{policy, run_of};

    #[test]
    fn test_cleanup_is_inert() {
        let sql = cleanup(&run_of(policy()));
        for line in sql.lines() {
            assert!(line.starts_with("--"), "live line in cleanup: {}", line);
        }
    }

    #[test]
    fn test_cleanup_drops_every_temp_table() {
        let run = run_of(policy());
        let sql = cleanup(&run);
        for table in run.temp_tables().qualified() {
            assert!(sql.contains(&format!("-- DROP TABLE {};\n", table)));
        }
        assert!(sql.contains(
            "-- INSERT INTO DWH.CONTROL_TABLE_STAGE SELECT * FROM sandbox.temp_control_table_st_jdo_20240101_093000;"
        ));
        assert!(sql.contains(
            "-- SELECT * INTO sandbox.backup_control_table_hs_jdo_20240101_093000 FROM DWH.CONTROL_TABLE_HS;"
        ));
    }

    #[test]
    fn test_cleanup_accounts_for_job_control_copy() {
        let sql = cleanup(&run_of(policy()));
        assert!(sql.contains(
            "-- DWH.JOB_CONTROL is not merged: sandbox.temp_control_table_job_jdo_20240101_093000 \
             only marks the jobs SUCCESS for the sandbox load.\n"
        ));
        assert!(!sql.contains("INSERT INTO DWH.JOB_CONTROL"));
    }
}
