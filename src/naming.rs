//! Naming resolver.
//!
//! Every identifier that is not typed in by the operator is derived here from
//! the primary configuration fields: the CT table name, the Profisee
//! qualified source system, the job-name family, the target ST/HS tables and
//! the helper/dimension table names.

use crate::config::{Configuration, ProfiseeEnvironment, SourceSystem};

/// Marker that switches the Profisee development naming branch on.
pub const PROFISEE_DEV: &str = "Profisee_dev";

/// Schema holding the temporary control table copies.
pub const SANDBOX_SCHEMA: &str = "sandbox";

/// Schema holding the production control tables.
pub const CONTROL_SCHEMA: &str = "DWH";

pub const STAGE_CONTROL_TABLE: &str = "CONTROL_TABLE_STAGE";
pub const HS_CONTROL_TABLE: &str = "CONTROL_TABLE_HS";
pub const JOB_CONTROL_TABLE: &str = "JOB_CONTROL";

/// Name of the source table read by the daily load.
pub fn ct_table_name(src_table: &str, daily: SourceSystem) -> String {
    if daily == SourceSystem::ReplicateCdc {
        format!("{}__ct", src_table)
    } else {
        src_table.to_string()
    }
}

/// Source system string written to the control tables.
///
/// Only Profisee is environment-qualified, and production keeps the bare
/// name.
pub fn qualify_source_system(system: SourceSystem, env: Option<ProfiseeEnvironment>) -> String {
    match (system, env) {
        (SourceSystem::Profisee, Some(env)) if env != ProfiseeEnvironment::Prod => {
            format!("Profisee_{}", env.as_str())
        }
        _ => system.as_str().to_string(),
    }
}

/// True when either qualified source system points at Profisee dev.
pub fn is_profisee_dev(initial: &str, daily: &str) -> bool {
    initial.contains(PROFISEE_DEV) || daily.contains(PROFISEE_DEV)
}

/// Drop the first `_`-delimited segment of a source table name.
///
/// `TIA_PARTY_ROLE` becomes `PARTY_ROLE`; a name without underscore is kept.
pub fn base_name(src_table: &str) -> &str {
    match src_table.split_once('_') {
        Some((_, rest)) => rest,
        None => src_table,
    }
}

/// The scheduler job names used by one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobNames {
    pub st_initial: &'static str,
    pub st_daily: &'static str,
    pub hs_initial: &'static str,
    pub hs_initial_control: &'static str,
    pub hs_daily: &'static str,
    pub hs_daily_control: &'static str,
}

impl JobNames {
    /// Stage job that loads nothing, used when the ST table is already filled.
    pub const ST_PLACEHOLDER: &'static str = "ST_Placeholder";

    /// HS job name that matches no control row, so the run stops after stage.
    pub const HS_INVALID: &'static str = "HS_Invalid_Job";

    pub const FULL: JobNames = JobNames {
        st_initial: "ST_Full_Initial",
        st_daily: "ST_Full_Daily",
        hs_initial: "HS_Full_Initial",
        hs_initial_control: "HS_Full_Initial_Control",
        hs_daily: "HS_Full_Daily",
        hs_daily_control: "HS_Full_Daily_Control",
    };

    // Profisee has no separate initial HS jobs.
    pub const PROFISEE: JobNames = JobNames {
        st_initial: "ST_Profisee_Initial",
        st_daily: "ST_Profisee_Daily",
        hs_initial: "HS_Profisee_Daily",
        hs_initial_control: "HS_Profisee_Daily_Control",
        hs_daily: "HS_Profisee_Daily",
        hs_daily_control: "HS_Profisee_Daily_Control",
    };

    pub fn resolve(profisee_dev: bool) -> &'static JobNames {
        if profisee_dev {
            &Self::PROFISEE
        } else {
            &Self::FULL
        }
    }

    /// Job rows copied into the temporary job control table.
    pub fn backup_set(&self) -> Vec<&'static str> {
        vec![
            self.st_daily,
            self.st_initial,
            self.hs_daily,
            self.hs_daily_control,
            Self::ST_PLACEHOLDER,
        ]
    }

    /// Jobs marked successful so the first scheduled run starts clean.
    pub fn success_set(&self) -> Vec<&'static str> {
        vec![
            self.hs_daily,
            self.st_daily,
            self.hs_daily_control,
            self.st_initial,
        ]
    }
}

/// Target stage and historic stage tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetTables {
    pub st_schema: String,
    pub st_table: String,
    pub hs_schema: String,
    pub hs_table: String,
}

impl TargetTables {
    pub fn resolve(cfg: &Configuration, profisee_dev: bool) -> Self {
        let src = cfg.src_table_name.as_str();
        let (st_table, hs_table) = if profisee_dev {
            (format!("ST_PRO_{}", src), format!("HS_PRO_{}", src))
        } else {
            (
                or_default(&cfg.tgt_table_name_st, || format!("ST_{}", src)),
                or_default(&cfg.tgt_table_name_hs, || format!("HS_{}", src)),
            )
        };
        Self {
            st_schema: cfg.tgt_schema_name_st.clone(),
            st_table,
            hs_schema: cfg.tgt_schema_name_hs.clone(),
            hs_table,
        }
    }
}

fn or_default(value: &str, default: impl FnOnce() -> String) -> String {
    let value = value.trim();
    if value.is_empty() {
        default()
    } else {
        value.to_string()
    }
}

/// Helper and dimension table identifiers.
///
/// Names keep the case of the source table: `TIA_party` gives `HLP_BK_party`
/// and `DIM_party`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionNames {
    pub base: String,
    pub helper_table: String,
    pub helper_identity_column: String,
    pub dimension_table: String,
    pub primary_key_column: String,
    pub business_key_column: String,
}

impl DimensionNames {
    pub fn resolve(src_table: &str, main_table_name: &str) -> Self {
        let base = base_name(src_table).to_string();
        let dimension_table = or_default(main_table_name, || format!("DIM_{}", base));
        let dim_base = dimension_table.replace("DIM_", "");
        Self {
            helper_table: format!("HLP_BK_{}", base),
            helper_identity_column: format!("BK_{}", base),
            primary_key_column: format!("PK_{}", dimension_table),
            business_key_column: format!("BK_{}", dim_base),
            dimension_table,
            base,
        }
    }
}

/// Names of the per-run temporary control tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempTables {
    pub st: String,
    pub hs: String,
    pub job: String,
}

impl TempTables {
    pub fn new(table_suffix: &str) -> Self {
        Self {
            st: format!("temp_control_table_st_{}", table_suffix),
            hs: format!("temp_control_table_hs_{}", table_suffix),
            job: format!("temp_control_table_job_{}", table_suffix),
        }
    }

    /// Schema-qualified names, in creation order.
    pub fn qualified(&self) -> [String; 3] {
        [
            format!("{}.{}", SANDBOX_SCHEMA, self.st),
            format!("{}.{}", SANDBOX_SCHEMA, self.hs),
            format!("{}.{}", SANDBOX_SCHEMA, self.job),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::policy;

    #[test]
    fn test_ct_name_for_replicate_cdc() {
        assert_eq!(
            ct_table_name("CUSTOMER", SourceSystem::ReplicateCdc),
            "CUSTOMER__ct"
        );
        for system in SourceSystem::ALL {
            if system != SourceSystem::ReplicateCdc {
                assert_eq!(ct_table_name("CUSTOMER", system), "CUSTOMER");
            }
        }
    }

    #[test]
    fn test_profisee_qualification() {
        use ProfiseeEnvironment::*;
        assert_eq!(
            qualify_source_system(SourceSystem::Profisee, Some(Prod)),
            "Profisee"
        );
        assert_eq!(
            qualify_source_system(SourceSystem::Profisee, Some(Dev)),
            "Profisee_dev"
        );
        assert_eq!(
            qualify_source_system(SourceSystem::Profisee, Some(Test)),
            "Profisee_test"
        );
        assert_eq!(qualify_source_system(SourceSystem::Profisee, None), "Profisee");
        assert_eq!(
            qualify_source_system(SourceSystem::Tia, Some(Dev)),
            "TIA"
        );
    }

    #[test]
    fn test_profisee_dev_detection() {
        assert!(is_profisee_dev("Profisee_dev", "Replicate_CDC"));
        assert!(is_profisee_dev("Replicate_Full", "Profisee_dev"));
        assert!(!is_profisee_dev("Profisee_test", "Profisee"));
    }

    #[test]
    fn test_base_name_strips_first_segment_only() {
        assert_eq!(base_name("TIA_PARTY"), "PARTY");
        assert_eq!(base_name("PARTY"), "PARTY");
        assert_eq!(base_name("TIA_PARTY_ROLE"), "PARTY_ROLE");
        assert_eq!(base_name("_X"), "X");
    }

    #[test]
    fn test_target_tables_default_from_source() {
        let tables = TargetTables::resolve(&policy(), false);
        assert_eq!(tables.st_table, "ST_POLICY");
        assert_eq!(tables.hs_table, "HS_POLICY");
        assert_eq!(tables.st_schema, "ST");
    }

    #[test]
    fn test_profisee_dev_overrides_targets() {
        let mut cfg = policy();
        cfg.src_table_name = "CLAIM".to_string();
        cfg.tgt_table_name_st = "MY_ST".to_string();
        cfg.tgt_table_name_hs = "MY_HS".to_string();

        let tables = TargetTables::resolve(&cfg, false);
        assert_eq!(tables.st_table, "MY_ST");

        let tables = TargetTables::resolve(&cfg, true);
        assert_eq!(tables.st_table, "ST_PRO_CLAIM");
        assert_eq!(tables.hs_table, "HS_PRO_CLAIM");
    }

    #[test]
    fn test_dimension_names() {
        let names = DimensionNames::resolve("TIA_PARTY", "");
        assert_eq!(names.helper_table, "HLP_BK_PARTY");
        assert_eq!(names.helper_identity_column, "BK_PARTY");
        assert_eq!(names.dimension_table, "DIM_PARTY");
        assert_eq!(names.primary_key_column, "PK_DIM_PARTY");
        assert_eq!(names.business_key_column, "BK_PARTY");

        let names = DimensionNames::resolve("TIA_PARTY", "DIM_CUSTOMER");
        assert_eq!(names.primary_key_column, "PK_DIM_CUSTOMER");
        assert_eq!(names.business_key_column, "BK_CUSTOMER");
        assert_eq!(names.helper_table, "HLP_BK_PARTY");
    }

    #[test]
    fn test_dimension_business_key_drops_every_dim_marker() {
        let names = DimensionNames::resolve("TIA_PARTY", "DIM_X_DIM_Y");
        assert_eq!(names.primary_key_column, "PK_DIM_X_DIM_Y");
        assert_eq!(names.business_key_column, "BK_X_Y");
    }

    #[test]
    fn test_job_families() {
        assert_eq!(JobNames::resolve(false).st_initial, "ST_Full_Initial");
        let profisee = JobNames::resolve(true);
        assert_eq!(profisee.st_initial, "ST_Profisee_Initial");
        assert_eq!(profisee.st_daily, "ST_Profisee_Daily");
        assert_eq!(profisee.hs_daily, "HS_Profisee_Daily");
        assert_eq!(profisee.hs_daily_control, "HS_Profisee_Daily_Control");
        assert!(!profisee.backup_set().iter().any(|j| j.contains("_Full_")));
    }

    #[test]
    fn test_temp_tables() {
        let temp = TempTables::new("jdo_20240101");
        assert_eq!(
            temp.qualified()[0],
            "sandbox.temp_control_table_st_jdo_20240101"
        );
    }
}
