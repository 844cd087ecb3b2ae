//! Control table steps (1-4): copy the control tables into per-run sandbox
//! tables and point the copies at the table being deployed.

use super::{in_list, SqlValue, ToSql};
use crate::config::ScdType;
use crate::naming::{
    CONTROL_SCHEMA, HS_CONTROL_TABLE, JOB_CONTROL_TABLE, SANDBOX_SCHEMA, STAGE_CONTROL_TABLE,
};
use crate::run::Run;

/// Sentinel load date written for freshly configured jobs.
pub const SENTINEL_LOAD_DATE: &str = "1970-01-01";

/// Step 1: copy the three control tables into sandbox tables.
pub fn backup(run: &Run) -> String {
    let jobs = run.jobs();
    let temp = run.temp_tables();
    let stage = format!("{}.{}", CONTROL_SCHEMA, STAGE_CONTROL_TABLE);
    let hs = format!("{}.{}", CONTROL_SCHEMA, HS_CONTROL_TABLE);
    let job = format!("{}.{}", CONTROL_SCHEMA, JOB_CONTROL_TABLE);

    let mut sql = String::new();
    sql.push_str(&format!("-- Make a copy of {}\n", stage));
    sql.push_str("WITH cte AS (\n");
    sql.push_str(&format!(
        "    SELECT TOP 1 * FROM {} WHERE job_name IN ({})\n",
        stage,
        in_list(&[jobs.st_initial])
    ));
    sql.push_str("    UNION ALL\n");
    sql.push_str(&format!(
        "    SELECT TOP 1 * FROM {} WHERE job_name IN ({})\n",
        stage,
        in_list(&[jobs.st_daily])
    ));
    sql.push_str(")\n");
    sql.push_str("SELECT *\n");
    sql.push_str(&format!("INTO {}.{} FROM cte;\n\n", SANDBOX_SCHEMA, temp.st));

    sql.push_str(&format!("-- Make a copy of {}\n", hs));
    sql.push_str("SELECT TOP 1 *\n");
    sql.push_str(&format!("INTO {}.{}\n", SANDBOX_SCHEMA, temp.hs));
    sql.push_str(&format!("FROM {}\n", hs));
    sql.push_str(&format!("WHERE job_name IN ({});\n\n", in_list(&[jobs.hs_daily])));

    sql.push_str(&format!("-- Make a copy of {}\n", job));
    sql.push_str("SELECT *\n");
    sql.push_str(&format!("INTO {}.{}\n", SANDBOX_SCHEMA, temp.job));
    sql.push_str(&format!("FROM {}\n", job));
    sql.push_str(&format!("WHERE job_name IN ({});\n", in_list(&jobs.backup_set())));
    sql
}

/// Step 2: initial-load and daily-load rows of the ST control table.
pub fn st_control(run: &Run) -> String {
    let jobs = run.jobs();
    let temp = format!("{}.{}", SANDBOX_SCHEMA, run.temp_tables().st);

    let initial = st_update(
        run,
        &temp,
        jobs.st_initial,
        run.source_system_initial(),
        run.src_table(),
    );
    let daily = st_update(
        run,
        &temp,
        jobs.st_daily,
        run.source_system_daily(),
        run.src_table_ct(),
    );

    format!(
        "-- Update temporary control table for stage to reflect Initial Load values\n{}\n\
         -- Update temporary control table for stage to reflect Daily load values\n{}",
        initial, daily
    )
}

fn st_update(run: &Run, temp: &str, job_name: &str, source_system: &str, src_table: &str) -> String {
    let cfg = run.config();
    let targets = run.targets();
    let delete_type = cfg.delete_type.map(|d| d.as_str());

    let assignments = [
        ("job_name", SqlValue::Text(job_name)),
        ("source_system", SqlValue::Text(source_system)),
        ("src_schema_name", SqlValue::Text(&cfg.src_schema_name)),
        ("src_table_name", SqlValue::Text(src_table)),
        ("tgt_schema_name", SqlValue::Text(&targets.st_schema)),
        ("tgt_table_name", SqlValue::Text(&targets.st_table)),
        ("business_key", SqlValue::Text(&cfg.business_key)),
        ("initial_load_valid_from_column", SqlValue::Text("__lowDate")),
        ("incremental_filter_column", SqlValue::Text(&cfg.incremental_filter_st)),
        (
            "incremental_filter_column_timezone",
            SqlValue::Text(cfg.incremental_filter_timezone.as_str()),
        ),
        ("skip", SqlValue::Int(0)),
        ("priority", SqlValue::Int(0)),
        ("delete_type", SqlValue::opt(delete_type)),
        ("src_delete_column", SqlValue::opt(cfg.src_delete_column.as_deref())),
        ("src_delete_value", SqlValue::opt(cfg.src_delete_value.as_deref())),
    ];

    let set = assignments
        .iter()
        .map(|(col, val)| format!("    {} = {}", col, val.to_sql()))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "UPDATE {}\nSET\n{}\nWHERE job_name = {};\n",
        temp,
        set,
        SqlValue::Text(job_name).to_sql()
    )
}

/// Step 3: the daily-load row of the HS control table.
pub fn hs_control(run: &Run) -> String {
    let cfg = run.config();
    let targets = run.targets();
    let jobs = run.jobs();
    let from_ct = cfg.scd_type == ScdType::Scd2FromCt;

    let use_source_dates = from_ct && cfg.use_source_column_for_valid_dates;
    let valid_from = if use_source_dates && !cfg.source_column_for_valid_from_date.is_empty() {
        SqlValue::Text(&cfg.source_column_for_valid_from_date)
    } else {
        SqlValue::Null
    };

    let mut assignments = vec![
        ("job_name", SqlValue::Text(jobs.hs_daily)),
        ("src_schema_name", SqlValue::Text(&targets.st_schema)),
        ("src_table_name", SqlValue::Text(&targets.st_table)),
        ("tgt_schema_name", SqlValue::Text(&targets.hs_schema)),
        ("tgt_table_name", SqlValue::Text(&targets.hs_table)),
        ("business_key", SqlValue::Text(&cfg.business_key)),
        ("primary_key", SqlValue::Text(&cfg.primary_key)),
        ("incremental_filter_column", SqlValue::Text(&cfg.incremental_filter_hs)),
        (
            "incremental_filter_column_timezone",
            SqlValue::Text(cfg.incremental_filter_timezone.as_str()),
        ),
        ("scd_type", SqlValue::Text(cfg.scd_type.as_str())),
        ("scd2_columns", SqlValue::Text(cfg.effective_scd2_columns())),
        ("skip", SqlValue::Int(0)),
        ("priority", SqlValue::Int(0)),
        ("prescript", SqlValue::Text(&cfg.prescript)),
        ("postscript", SqlValue::Text(&cfg.postscript)),
        ("partitions", SqlValue::Int(i64::from(cfg.partitions))),
        (
            "use_source_column_for_valid_dates",
            SqlValue::Int(i64::from(use_source_dates)),
        ),
        ("source_column_for_valid_from_date", valid_from),
    ];
    if from_ct && !cfg.source_column_for_sorting.is_empty() {
        assignments.push((
            "source_column_for_sorting",
            SqlValue::Text(&cfg.source_column_for_sorting),
        ));
    }

    let set = assignments
        .iter()
        .map(|(col, val)| format!("{} = {}", col, val.to_sql()))
        .collect::<Vec<_>>()
        .join(",\n    ");

    format!(
        "-- Update temporary control table for historic stage to reflect daily load values\n\
         UPDATE {}.{}\nSET {}\nWHERE job_name = {};\n",
        SANDBOX_SCHEMA,
        run.temp_tables().hs,
        set,
        SqlValue::Text(jobs.hs_daily).to_sql()
    )
}

/// Step 4: mark the deployment's jobs as successfully finished.
pub fn job_control(run: &Run) -> String {
    let jobs = run.jobs();
    format!(
        "-- Update the control table so that the jobs are set to STATUS='SUCCESS'\n\
         UPDATE {}.{}\n\
         SET\n    STATUS = 'SUCCESS',\n    LAST_LOAD_DATE = {},\n    JOB_INTERVAL_IN_MINUTES = 0\n\
         WHERE job_name IN ({});\n",
        SANDBOX_SCHEMA,
        run.temp_tables().job,
        SqlValue::Text(SENTINEL_LOAD_DATE).to_sql(),
        in_list(&jobs.success_set())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Configuration, DeleteType, ProfiseeEnvironment, SourceSystem};
    use crate::fixtures::{jan_first, policy, run_of};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_backup_names_temp_tables() {
        let sql = backup(&run_of(policy()));
        assert!(sql.contains("INTO sandbox.temp_control_table_st_jdo_20240101_093000 FROM cte;"));
        assert!(sql.contains("INTO sandbox.temp_control_table_hs_jdo_20240101_093000\n"));
        assert!(sql.contains("INTO sandbox.temp_control_table_job_jdo_20240101_093000\n"));
        assert!(sql.contains(
            "WHERE job_name IN ('ST_Full_Daily','ST_Full_Initial','HS_Full_Daily','HS_Full_Daily_Control','ST_Placeholder');"
        ));
    }

    #[test]
    fn test_st_control_job_names_and_tables() {
        let sql = st_control(&run_of(policy()));
        let (initial, daily) = sql.split_once("Daily load values").unwrap();
        assert!(initial.contains("    job_name = 'ST_Full_Initial',"));
        assert!(initial.contains("    src_table_name = 'POLICY',"));
        assert!(initial.contains("WHERE job_name = 'ST_Full_Initial';"));
        assert!(daily.contains("    job_name = 'ST_Full_Daily',"));
        assert!(daily.contains("    src_table_name = 'POLICY__ct',"));
        assert!(daily.contains("    source_system = 'Replicate_CDC',"));
    }

    #[test]
    fn test_st_control_null_delete_fields() {
        let sql = st_control(&run_of(policy()));
        assert!(sql.contains("    delete_type = NULL,\n"));
        assert!(sql.contains("    src_delete_column = NULL,\n"));
        assert!(sql.contains("    src_delete_value = NULL\nWHERE"));
    }

    #[test]
    fn test_st_control_soft_delete() {
        let cfg = Configuration {
            delete_type: Some(DeleteType::Soft),
            src_delete_column: Some("IS_DELETED".to_string()),
            src_delete_value: Some("1".to_string()),
            ..policy()
        };
        let sql = st_control(&run_of(cfg));
        assert!(sql.contains("    delete_type = 'SOFT',\n"));
        assert!(sql.contains("    src_delete_column = 'IS_DELETED',\n"));
        assert!(sql.contains("    src_delete_value = '1'\n"));
    }

    #[test]
    fn test_st_control_hard_delete_nulls_columns() {
        let cfg = Configuration {
            delete_type: Some(DeleteType::Hard),
            ..policy()
        };
        let sql = st_control(&run_of(cfg));
        assert!(sql.contains("    delete_type = 'HARD',\n"));
        assert!(sql.contains("    src_delete_column = NULL,\n"));
    }

    #[test]
    fn test_st_control_profisee_override() {
        let cfg = Configuration {
            source_system_initial: SourceSystem::Profisee,
            profisee_environment: Some(ProfiseeEnvironment::Dev),
            src_table_name: "CLAIM".to_string(),
            tgt_table_name_st: "ST_SOMETHING_ELSE".to_string(),
            tgt_table_name_hs: "HS_SOMETHING_ELSE".to_string(),
            ..policy()
        };
        let run = run_of(cfg);
        let sql = st_control(&run);
        assert!(sql.contains("    tgt_table_name = 'ST_PRO_CLAIM',"));
        assert!(sql.contains("    source_system = 'Profisee_dev',"));
        assert!(sql.contains("    job_name = 'ST_Profisee_Initial',"));
        assert!(sql.contains("    job_name = 'ST_Profisee_Daily',"));
        assert!(!sql.contains("SOMETHING_ELSE"));

        let hs = hs_control(&run);
        assert!(hs.contains("src_table_name = 'ST_PRO_CLAIM'"));
        assert!(hs.contains("tgt_table_name = 'HS_PRO_CLAIM'"));
        assert!(hs.contains("SET job_name = 'HS_Profisee_Daily'"));
    }

    #[test]
    fn test_hs_control_scd2() {
        let sql = hs_control(&run_of(policy()));
        let expected = "\
-- Update temporary control table for historic stage to reflect daily load values
UPDATE sandbox.temp_control_table_hs_jdo_20240101_093000
SET job_name = 'HS_Full_Daily',
    src_schema_name = 'ST',
    src_table_name = 'ST_POLICY',
    tgt_schema_name = 'HS',
    tgt_table_name = 'HS_POLICY',
    business_key = 'POLICY_ID',
    primary_key = 'TC_ROW_ID',
    incremental_filter_column = '__fullLoad',
    incremental_filter_column_timezone = 'UTC',
    scd_type = 'SCD2',
    scd2_columns = 'STATUS,PREMIUM',
    skip = 0,
    priority = 0,
    prescript = '',
    postscript = '',
    partitions = 1,
    use_source_column_for_valid_dates = 0,
    source_column_for_valid_from_date = NULL
WHERE job_name = 'HS_Full_Daily';
";
        assert_eq!(sql, expected);
    }

    #[test]
    fn test_hs_control_scd2_from_ct() {
        let cfg = Configuration {
            scd_type: ScdType::Scd2FromCt,
            ..policy()
        };
        let sql = hs_control(&run_of(cfg));
        assert!(sql.contains("scd_type = 'SCD2 from CT'"));
        assert!(sql.contains("use_source_column_for_valid_dates = 1,"));
        assert!(sql.contains("source_column_for_valid_from_date = 'header__timestamp',"));
        assert!(sql.contains("source_column_for_sorting = 'header__change_seq'\nWHERE"));
    }

    #[test]
    fn test_hs_control_ct_fields_ignored_for_other_types() {
        // stale CT settings must not leak into a plain SCD1 load
        let cfg = Configuration {
            scd_type: ScdType::Scd1,
            use_source_column_for_valid_dates: true,
            source_column_for_sorting: "header__change_seq".to_string(),
            ..policy()
        };
        let sql = hs_control(&run_of(cfg));
        assert!(sql.contains("use_source_column_for_valid_dates = 0,"));
        assert!(sql.contains("source_column_for_valid_from_date = NULL\n"));
        assert!(!sql.contains("source_column_for_sorting"));
    }

    #[test]
    fn test_job_control() {
        let sql = job_control(&run_of(policy()));
        assert_eq!(
            sql,
            "-- Update the control table so that the jobs are set to STATUS='SUCCESS'\n\
             UPDATE sandbox.temp_control_table_job_jdo_20240101_093000\n\
             SET\n    STATUS = 'SUCCESS',\n    LAST_LOAD_DATE = '1970-01-01',\n    JOB_INTERVAL_IN_MINUTES = 0\n\
             WHERE job_name IN ('HS_Full_Daily','ST_Full_Daily','HS_Full_Daily_Control','ST_Full_Initial');\n"
        );
    }

    #[test]
    fn test_generators_are_deterministic() {
        let run = Run::new(&policy(), jan_first()).unwrap();
        assert_eq!(st_control(&run), st_control(&run));
        assert_eq!(hs_control(&run), hs_control(&run));
    }
}
