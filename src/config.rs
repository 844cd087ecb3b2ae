//! The deployment configuration record.
//!
//! A [`Configuration`] holds every field an operator fills in for one table.
//! It is a plain value: generators never mutate it, and "applying imported
//! parameters" is the pure [`Configuration::merge`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DeployError, DeployResult};

/// Default value of the incremental filter columns.
pub const FULL_LOAD: &str = "__fullLoad";

/// Sentinel stored in `scd2_columns` when every column is tracked.
pub const ALL_COLUMNS: &str = "__allColumns";

/// Source system feeding the stage load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceSystem {
    #[serde(rename = "Replicate_Full")]
    ReplicateFull,
    #[serde(rename = "Replicate_CDC")]
    ReplicateCdc,
    #[serde(rename = "INS_temporal")]
    InsTemporal,
    #[serde(rename = "TIA")]
    Tia,
    #[serde(rename = "Profisee")]
    Profisee,
    #[serde(rename = "Replicate_CDC_AllTransactions")]
    ReplicateCdcAllTransactions,
    #[serde(rename = "Replicate_CDC_AllTransactions_fromArchive")]
    ReplicateCdcAllTransactionsFromArchive,
}

impl SourceSystem {
    pub const ALL: [SourceSystem; 7] = [
        SourceSystem::ReplicateFull,
        SourceSystem::ReplicateCdc,
        SourceSystem::InsTemporal,
        SourceSystem::Tia,
        SourceSystem::Profisee,
        SourceSystem::ReplicateCdcAllTransactions,
        SourceSystem::ReplicateCdcAllTransactionsFromArchive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceSystem::ReplicateFull => "Replicate_Full",
            SourceSystem::ReplicateCdc => "Replicate_CDC",
            SourceSystem::InsTemporal => "INS_temporal",
            SourceSystem::Tia => "TIA",
            SourceSystem::Profisee => "Profisee",
            SourceSystem::ReplicateCdcAllTransactions => "Replicate_CDC_AllTransactions",
            SourceSystem::ReplicateCdcAllTransactionsFromArchive => {
                "Replicate_CDC_AllTransactions_fromArchive"
            }
        }
    }
}

impl fmt::Display for SourceSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profisee database environment. Only meaningful when a source system is
/// [`SourceSystem::Profisee`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfiseeEnvironment {
    Prod,
    Dev,
    Test,
}

impl ProfiseeEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfiseeEnvironment::Prod => "prod",
            ProfiseeEnvironment::Dev => "dev",
            ProfiseeEnvironment::Test => "test",
        }
    }

    pub fn from_suffix(s: &str) -> Option<Self> {
        match s {
            "prod" => Some(Self::Prod),
            "dev" => Some(Self::Dev),
            "test" => Some(Self::Test),
            _ => None,
        }
    }
}

/// Timezone of the incremental filter column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Timezone {
    #[default]
    #[serde(rename = "UTC")]
    Utc,
    #[serde(rename = "W. Europe Standard Time")]
    WEurope,
}

impl Timezone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timezone::Utc => "UTC",
            Timezone::WEurope => "W. Europe Standard Time",
        }
    }
}

/// History-tracking policy of the HS load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScdType {
    #[default]
    #[serde(rename = "SCD2")]
    Scd2,
    #[serde(rename = "SCD1")]
    Scd1,
    #[serde(rename = "Transaction only")]
    TransactionOnly,
    #[serde(rename = "Trunc Load")]
    TruncLoad,
    #[serde(rename = "SCD2 from CT")]
    Scd2FromCt,
}

impl ScdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScdType::Scd2 => "SCD2",
            ScdType::Scd1 => "SCD1",
            ScdType::TransactionOnly => "Transaction only",
            ScdType::TruncLoad => "Trunc Load",
            ScdType::Scd2FromCt => "SCD2 from CT",
        }
    }
}

impl fmt::Display for ScdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the SCD2 column list is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Scd2ColumnsOption {
    #[default]
    #[serde(rename = "Specify Columns")]
    SpecifyColumns,
    #[serde(rename = "__allColumns")]
    AllColumns,
}

/// Delete detection policy of the stage load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteType {
    #[serde(rename = "SOFT")]
    Soft,
    #[serde(rename = "HARD")]
    Hard,
}

impl DeleteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeleteType::Soft => "SOFT",
            DeleteType::Hard => "HARD",
        }
    }
}

/// Every field collected for one table deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub user_initials: String,

    pub source_system_initial: SourceSystem,
    pub source_system_daily: SourceSystem,
    /// Shared Profisee environment, used by a Profisee system that has no
    /// environment of its own.
    pub profisee_environment: Option<ProfiseeEnvironment>,
    pub profisee_environment_initial: Option<ProfiseeEnvironment>,
    pub profisee_environment_daily: Option<ProfiseeEnvironment>,
    pub src_schema_name: String,
    pub src_table_name: String,

    pub tgt_schema_name_st: String,
    pub tgt_table_name_st: String,
    pub tgt_schema_name_hs: String,
    pub tgt_table_name_hs: String,

    pub business_key: String,
    pub primary_key: String,

    pub incremental_filter_st: String,
    pub incremental_filter_hs: String,
    pub incremental_filter_timezone: Timezone,

    pub scd_type: ScdType,
    pub scd2_columns_option: Scd2ColumnsOption,
    pub scd2_columns: String,

    pub delete_type: Option<DeleteType>,
    pub src_delete_column: Option<String>,
    pub src_delete_value: Option<String>,

    pub prescript: String,
    pub postscript: String,
    pub partitions: u32,
    pub use_source_column_for_valid_dates: bool,
    pub source_column_for_valid_from_date: String,
    pub source_column_for_sorting: String,

    pub create_helper_table: bool,
    pub helper_schema: String,
    pub business_key_column: String,

    pub create_main_table: bool,
    pub main_table_schema: String,
    pub main_table_name: String,
    pub main_table_columns: String,
    pub register_main_table: bool,

    pub skip_st_table: bool,
    pub skip_hs_table: bool,
    pub skip_main_table: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            user_initials: String::new(),
            source_system_initial: SourceSystem::ReplicateFull,
            source_system_daily: SourceSystem::ReplicateCdc,
            profisee_environment: None,
            profisee_environment_initial: None,
            profisee_environment_daily: None,
            src_schema_name: "TIA".to_string(),
            src_table_name: String::new(),
            tgt_schema_name_st: "ST".to_string(),
            tgt_table_name_st: String::new(),
            tgt_schema_name_hs: "HS".to_string(),
            tgt_table_name_hs: String::new(),
            business_key: String::new(),
            primary_key: "TC_ROW_ID".to_string(),
            incremental_filter_st: FULL_LOAD.to_string(),
            incremental_filter_hs: FULL_LOAD.to_string(),
            incremental_filter_timezone: Timezone::Utc,
            scd_type: ScdType::Scd2,
            scd2_columns_option: Scd2ColumnsOption::SpecifyColumns,
            scd2_columns: String::new(),
            delete_type: None,
            src_delete_column: Some("DELETED_FLAG".to_string()),
            src_delete_value: Some("Y".to_string()),
            prescript: String::new(),
            postscript: String::new(),
            partitions: 1,
            use_source_column_for_valid_dates: true,
            source_column_for_valid_from_date: "header__timestamp".to_string(),
            source_column_for_sorting: "header__change_seq".to_string(),
            create_helper_table: false,
            helper_schema: "DF".to_string(),
            business_key_column: String::new(),
            create_main_table: false,
            main_table_schema: "DIM".to_string(),
            main_table_name: String::new(),
            main_table_columns: String::new(),
            register_main_table: false,
            skip_st_table: false,
            skip_hs_table: false,
            skip_main_table: false,
        }
    }
}

impl Configuration {
    /// Check the fields that must be present before anything is generated.
    pub fn validate(&self) -> DeployResult<()> {
        if self.user_initials.trim().is_empty() {
            return Err(DeployError::validation(
                "user_initials",
                "operator initials are required",
            ));
        }
        if self.src_table_name.trim().is_empty() {
            return Err(DeployError::validation(
                "src_table_name",
                "source table name is required",
            ));
        }
        if self.business_key_columns().is_empty() {
            return Err(DeployError::validation(
                "business_key",
                "at least one business key column is required",
            ));
        }
        if self.scd2_columns_option == Scd2ColumnsOption::SpecifyColumns
            && self.scd2_columns.trim().is_empty()
        {
            return Err(DeployError::validation(
                "scd2_columns",
                "columns must be listed when 'Specify Columns' is chosen",
            ));
        }
        if self.partitions < 1 {
            return Err(DeployError::validation(
                "partitions",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Return a copy with the dependent fields forced to their neutral
    /// values: CT-only settings outside `SCD2 from CT`, delete column and
    /// value outside `SOFT`. Initials are trimmed, their case is kept.
    pub fn normalized(&self) -> Self {
        let mut cfg = self.clone();
        cfg.user_initials = cfg.user_initials.trim().to_string();
        if cfg.scd_type != ScdType::Scd2FromCt {
            cfg.use_source_column_for_valid_dates = false;
            cfg.source_column_for_valid_from_date = String::new();
            cfg.source_column_for_sorting = String::new();
        }
        if cfg.delete_type != Some(DeleteType::Soft) {
            cfg.src_delete_column = None;
            cfg.src_delete_value = None;
        }
        if cfg.scd2_columns_option == Scd2ColumnsOption::AllColumns {
            cfg.scd2_columns = ALL_COLUMNS.to_string();
        }
        cfg
    }

    /// Apply an imported configuration on top of `self`, producing a new
    /// value. Imported documents are complete records (missing keys were
    /// already defaulted), so the import wins field by field; only empty
    /// initials fall back to the current operator.
    pub fn merge(&self, imported: &Configuration) -> Self {
        let mut merged = imported.clone();
        if merged.user_initials.trim().is_empty() {
            merged.user_initials = self.user_initials.clone();
        }
        merged.normalized()
    }

    pub fn initial_profisee_environment(&self) -> Option<ProfiseeEnvironment> {
        self.profisee_environment_initial.or(self.profisee_environment)
    }

    pub fn daily_profisee_environment(&self) -> Option<ProfiseeEnvironment> {
        self.profisee_environment_daily.or(self.profisee_environment)
    }

    /// Business key columns in declaration order, blanks dropped.
    pub fn business_key_columns(&self) -> Vec<&str> {
        split_list(&self.business_key)
    }

    /// The SCD2 column list as written to the HS control table.
    pub fn effective_scd2_columns(&self) -> &str {
        match self.scd2_columns_option {
            Scd2ColumnsOption::AllColumns => ALL_COLUMNS,
            Scd2ColumnsOption::SpecifyColumns => &self.scd2_columns,
        }
    }
}

fn split_list(list: &str) -> Vec<&str> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
