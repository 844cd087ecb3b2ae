//! Table DDL steps: HS table, helper table, dimension table.

use super::{SqlValue, ToSql};
use crate::naming::{JobNames, CONTROL_SCHEMA, JOB_CONTROL_TABLE};
use crate::run::Run;
use crate::sql::control::SENTINEL_LOAD_DATE;

/// Technical columns added to every HS table.
const HS_TECHNICAL_COLUMNS: [&str; 9] = [
    "TC_CURRENT_FLAG VARCHAR(1)",
    "TC_VALID_FROM_DATE DATETIME2(0)",
    "TC_VALID_TO_DATE DATETIME2(0)",
    "TC_CHECKSUM_BUSKEY VARCHAR(32)",
    "TC_CHECKSUM_SCD VARCHAR(32)",
    "TC_DELETED_FLAG VARCHAR(1)",
    "TC_DELETED_DATETIME DATETIME2(0)",
    "TC_INSERTED_DATE DATETIME2(0)",
    "TC_ROW_ID BIGINT IDENTITY(1,1) PRIMARY KEY",
];

/// Technical columns appended to every dimension table.
const DIM_TECHNICAL_COLUMNS: [&str; 10] = [
    "[TC_CURRENT_FLAG] [varchar](1) NULL",
    "[TC_VALID_FROM_DATE] [datetime2](0) NULL",
    "[TC_VALID_TO_DATE] [datetime2](0) NULL",
    "[TC_CHECKSUM_SCD] [varchar](32) NULL",
    "[TC_CHECKSUM_BUSKEY] [varchar](32) NULL",
    "[TC_DELETED_FLAG] [varchar](1) NULL",
    "[TC_DELETED_DATETIME] [datetime2](0) NULL",
    "[TC_SOURCE_SYSTEM] [varchar](10) NULL",
    "[TC_UPDATED_DATE] [datetime2](0) NULL",
    "[TC_ROW_ID] [int] NULL",
];

/// Column copied over from the stage table that has no meaning in HS.
const LEGACY_COLUMN: &str = "TC_INITIAL_LOAD_VALID_FROM_DATE";

/// Step 5: create the HS table as an empty copy of the ST table.
pub fn hs_table(run: &Run) -> Option<String> {
    if run.config().skip_hs_table {
        return None;
    }
    Some(format!(
        "-- Create the HS table with technical columns\n{}",
        hs_table_body(run)
    ))
}

/// Step 8: the same DDL for the quick path where the initial load was run
/// with an invalid HS job, so only the stage table was filled.
pub fn quick_hs_table(run: &Run) -> Option<String> {
    if run.config().skip_hs_table {
        return None;
    }
    let targets = run.targets();
    Some(format!(
        "-- Quick path to the HS table: the initial load was started with the HS job\n\
         -- '{}', so only the stage part ran and {}.{} is loaded.\n\
         -- Create the HS table from it, then rerun the initial load with the real HS job.\n{}",
        JobNames::HS_INVALID,
        targets.st_schema,
        targets.st_table,
        hs_table_body(run)
    ))
}

fn hs_table_body(run: &Run) -> String {
    let t = run.targets();
    if t.st_schema.trim().is_empty() || t.st_table.trim().is_empty() {
        return "-- Error: Source table information is missing.\n\
                -- Please provide the ST schema and table name to create the HS table correctly.\n"
            .to_string();
    }
    if t.hs_schema.trim().is_empty() || t.hs_table.trim().is_empty() {
        return "-- Error: Target table information is missing.\n\
                -- Please provide the HS schema and table name to create the HS table correctly.\n"
            .to_string();
    }

    let hs = format!("{}.{}", t.hs_schema, t.hs_table);
    let mut sql = format!(
        "SELECT * INTO {} FROM {}.{} WHERE 1 = 0;\n\n",
        hs, t.st_schema, t.st_table
    );
    sql.push_str(&format!("ALTER TABLE {}\n", hs));
    sql.push_str(&format!("ADD {};\n\n", HS_TECHNICAL_COLUMNS.join(",\n    ")));
    sql.push_str(&format!(
        "-- Drop {} if it was copied from the stage table\n",
        LEGACY_COLUMN
    ));
    sql.push_str("IF EXISTS (\n");
    sql.push_str("    SELECT 1 FROM INFORMATION_SCHEMA.COLUMNS\n");
    sql.push_str(&format!(
        "    WHERE TABLE_SCHEMA = {} AND TABLE_NAME = {} AND COLUMN_NAME = {}\n",
        SqlValue::Text(&t.hs_schema).to_sql(),
        SqlValue::Text(&t.hs_table).to_sql(),
        SqlValue::Text(LEGACY_COLUMN).to_sql()
    ));
    sql.push_str(")\n");
    sql.push_str(&format!("    ALTER TABLE {} DROP COLUMN {};\n", hs, LEGACY_COLUMN));
    sql
}

/// Step 6: business key helper table.
///
/// `None` unless the helper was requested and both its schema and business
/// key column are filled in.
pub fn helper_table(run: &Run) -> Option<String> {
    let cfg = run.config();
    let schema = cfg.helper_schema.trim();
    let bk_column = cfg.business_key_column.trim();
    if !cfg.create_helper_table || schema.is_empty() || bk_column.is_empty() {
        return None;
    }
    let names = run.dimension();

    let mut sql = String::from("SET ANSI_NULLS ON\nGO\n\nSET QUOTED_IDENTIFIER ON\nGO\n\n");
    sql.push_str(&format!("CREATE TABLE [{}].[{}](\n", schema, names.helper_table));
    sql.push_str(&format!(
        "    [{}] [int] IDENTITY(1,1) NOT NULL,\n",
        names.helper_identity_column
    ));
    sql.push_str(&format!("    [{}] [bigint] NOT NULL,\n", bk_column));
    sql.push_str(&primary_key_clause(&names.helper_identity_column, "    "));
    Some(sql)
}

/// Step 7: dimension table from the operator's column list.
pub fn main_table(run: &Run) -> Option<String> {
    let cfg = run.config();
    if !cfg.create_main_table || cfg.skip_main_table {
        return None;
    }
    let names = run.dimension();

    let mut columns = vec![
        format!("[{}] [int] IDENTITY(1,1) NOT NULL", names.primary_key_column),
        format!("[{}] [int] NULL", names.business_key_column),
    ];
    columns.extend(parse_column_lines(&cfg.main_table_columns));
    columns.extend(DIM_TECHNICAL_COLUMNS.iter().map(|c| c.to_string()));

    let mut sql = String::from("SET ANSI_NULLS ON\nGO\nSET QUOTED_IDENTIFIER ON\nGO\n");
    sql.push_str(&format!(
        "CREATE TABLE [{}].[{}](\n",
        cfg.main_table_schema, names.dimension_table
    ));
    for col in &columns {
        sql.push_str(&format!("\t{},\n", col));
    }
    sql.push_str(&primary_key_clause(&names.primary_key_column, "\t"));

    if cfg.register_main_table {
        sql.push_str(&format!(
            "\n-- Register the dimension table in the job control table\n\
             INSERT INTO {}.{} (job_name, STATUS, LAST_LOAD_DATE, JOB_INTERVAL_IN_MINUTES)\n\
             VALUES ({}, 'SUCCESS', {}, 0);\nGO\n",
            CONTROL_SCHEMA,
            JOB_CONTROL_TABLE,
            SqlValue::Text(&names.dimension_table).to_sql(),
            SqlValue::Text(SENTINEL_LOAD_DATE).to_sql()
        ));
    }
    Some(sql)
}

/// Split the operator's column definitions into one entry per line, blank
/// lines dropped and trailing commas removed (the generator adds its own).
pub fn parse_column_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .map(|l| l.trim_end_matches(',').trim_end())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn primary_key_clause(column: &str, indent: &str) -> String {
    format!(
        "PRIMARY KEY CLUSTERED\n(\n{}[{}] ASC\n)WITH (STATISTICS_NORECOMPUTE = OFF, IGNORE_DUP_KEY = OFF, OPTIMIZE_FOR_SEQUENTIAL_KEY = OFF) ON [PRIMARY]\n) ON [PRIMARY]\nGO\n",
        indent, column
    )
}
