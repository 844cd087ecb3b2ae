//! Shared test configurations.

use chrono::{NaiveDate, NaiveDateTime};

use crate::config::Configuration;
use crate::run::Run;

/// The reference SCD2 table used across the unit tests.
pub fn policy() -> Configuration {
    Configuration {
        user_initials: "jdo".to_string(),
        src_table_name: "POLICY".to_string(),
        business_key: "POLICY_ID".to_string(),
        scd2_columns: "STATUS,PREMIUM".to_string(),
        ..Configuration::default()
    }
}

/// A prefixed source table with helper and dimension tables requested.
pub fn party() -> Configuration {
    Configuration {
        src_table_name: "TIA_PARTY".to_string(),
        business_key: "PARTY_ID".to_string(),
        create_helper_table: true,
        business_key_column: "PARTY_ID".to_string(),
        create_main_table: true,
        main_table_columns: "PARTY_ID bigint NULL,\nNAME nvarchar(200) NOT NULL".to_string(),
        ..policy()
    }
}

pub fn jan_first() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .unwrap()
}

pub fn run_of(cfg: Configuration) -> Run {
    Run::new(&cfg, jan_first()).unwrap()
}
