//! Immutable generation snapshot.
//!
//! A [`Run`] freezes a validated configuration together with the table
//! suffix that every temporary table of the run shares. Generators only ever
//! see a `&Run`; regenerating means building a new one.

use chrono::NaiveDateTime;

use crate::config::Configuration;
use crate::error::{DeployError, DeployResult};
use crate::naming::{self, DimensionNames, JobNames, TargetTables, TempTables};

#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    config: Configuration,
    table_suffix: String,
    generated_at: NaiveDateTime,
    source_system_initial: String,
    source_system_daily: String,
    src_table_ct: String,
    profisee_dev: bool,
    targets: TargetTables,
    dimension: DimensionNames,
    temp: TempTables,
}

impl Run {
    /// Validate `config` and start a new run stamped at `now`.
    ///
    /// The suffix is `{initials}_{YYYYMMDD_HHMMSS}`, so two runs of the same
    /// operator only share temporary tables if started in the same second.
    pub fn new(config: &Configuration, now: NaiveDateTime) -> DeployResult<Self> {
        let config = config.normalized();
        config.validate()?;
        let suffix = format!("{}_{}", config.user_initials, now.format("%Y%m%d_%H%M%S"));
        Ok(Self::build(config, suffix, now))
    }

    /// Rebuild a run around a suffix exported by an earlier run, so the
    /// deployer's artifacts reference the same temporary tables.
    pub fn resume(
        config: &Configuration,
        table_suffix: &str,
        now: NaiveDateTime,
    ) -> DeployResult<Self> {
        let config = config.normalized();
        config.validate()?;
        let suffix = table_suffix.trim();
        if suffix.is_empty() {
            return Err(DeployError::validation(
                "table_suffix",
                "exported suffix is empty",
            ));
        }
        Ok(Self::build(config, suffix.to_string(), now))
    }

    fn build(config: Configuration, table_suffix: String, generated_at: NaiveDateTime) -> Self {
        let source_system_initial = naming::qualify_source_system(
            config.source_system_initial,
            config.initial_profisee_environment(),
        );
        let source_system_daily = naming::qualify_source_system(
            config.source_system_daily,
            config.daily_profisee_environment(),
        );
        let profisee_dev = naming::is_profisee_dev(&source_system_initial, &source_system_daily);
        let src_table_ct = naming::ct_table_name(&config.src_table_name, config.source_system_daily);
        let targets = TargetTables::resolve(&config, profisee_dev);
        let dimension = DimensionNames::resolve(&config.src_table_name, &config.main_table_name);
        let temp = TempTables::new(&table_suffix);

        log::debug!(
            "run {} for {}.{} (profisee_dev={})",
            table_suffix,
            config.src_schema_name,
            config.src_table_name,
            profisee_dev
        );

        Self {
            config,
            table_suffix,
            generated_at,
            source_system_initial,
            source_system_daily,
            src_table_ct,
            profisee_dev,
            targets,
            dimension,
            temp,
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn table_suffix(&self) -> &str {
        &self.table_suffix
    }

    pub fn generated_at(&self) -> NaiveDateTime {
        self.generated_at
    }

    pub fn source_system_initial(&self) -> &str {
        &self.source_system_initial
    }

    pub fn source_system_daily(&self) -> &str {
        &self.source_system_daily
    }

    pub fn src_table(&self) -> &str {
        &self.config.src_table_name
    }

    pub fn src_table_ct(&self) -> &str {
        &self.src_table_ct
    }

    pub fn is_profisee_dev(&self) -> bool {
        self.profisee_dev
    }

    pub fn jobs(&self) -> &'static JobNames {
        JobNames::resolve(self.profisee_dev)
    }

    pub fn targets(&self) -> &TargetTables {
        &self.targets
    }

    pub fn dimension(&self) -> &DimensionNames {
        &self.dimension
    }

    pub fn temp_tables(&self) -> &TempTables {
        &self.temp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProfiseeEnvironment, SourceSystem};
    use crate::fixtures::{jan_first, policy};
    use chrono::NaiveDate;

    #[test]
    fn test_suffix_from_initials_and_timestamp() {
        let run = Run::new(&policy(), jan_first()).unwrap();
        assert_eq!(run.table_suffix(), "jdo_20240101_093000");
        assert_eq!(
            run.temp_tables().st,
            "temp_control_table_st_jdo_20240101_093000"
        );
    }

    #[test]
    fn test_same_day_runs_get_distinct_temp_tables() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let morning = Run::new(&policy(), day.and_hms_opt(9, 0, 0).unwrap()).unwrap();
        let afternoon = Run::new(&policy(), day.and_hms_opt(15, 45, 10).unwrap()).unwrap();
        assert_eq!(afternoon.table_suffix(), "jdo_20240101_154510");
        assert_ne!(morning.table_suffix(), afternoon.table_suffix());
        assert_ne!(morning.temp_tables().st, afternoon.temp_tables().st);
        assert_ne!(morning.temp_tables().hs, afternoon.temp_tables().hs);
        assert_ne!(morning.temp_tables().job, afternoon.temp_tables().job);
    }

    #[test]
    fn test_initials_keep_their_case() {
        let mut cfg = policy();
        cfg.user_initials = " JDo ".to_string();
        let run = Run::new(&cfg, jan_first()).unwrap();
        assert_eq!(run.table_suffix(), "JDo_20240101_093000");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut cfg = policy();
        cfg.business_key.clear();
        assert!(Run::new(&cfg, jan_first()).is_err());
    }

    #[test]
    fn test_resume_keeps_suffix() {
        let run = Run::resume(&policy(), "jdo_20231231", jan_first()).unwrap();
        assert_eq!(run.table_suffix(), "jdo_20231231");
        assert!(Run::resume(&policy(), "  ", jan_first()).is_err());
    }

    #[test]
    fn test_profisee_dev_run() {
        let mut cfg = policy();
        cfg.source_system_initial = SourceSystem::Profisee;
        cfg.profisee_environment = Some(ProfiseeEnvironment::Dev);
        let run = Run::new(&cfg, jan_first()).unwrap();
        assert_eq!(run.source_system_initial(), "Profisee_dev");
        assert_eq!(run.source_system_daily(), "Replicate_CDC");
        assert!(run.is_profisee_dev());
        assert_eq!(run.targets().st_table, "ST_PRO_POLICY");
        assert_eq!(run.src_table_ct(), "POLICY__ct");
    }

    #[test]
    fn test_profisee_environment_per_system() {
        let mut cfg = policy();
        cfg.source_system_initial = SourceSystem::Profisee;
        cfg.source_system_daily = SourceSystem::Profisee;
        cfg.profisee_environment_initial = Some(ProfiseeEnvironment::Dev);
        cfg.profisee_environment_daily = Some(ProfiseeEnvironment::Test);
        let run = Run::new(&cfg, jan_first()).unwrap();
        assert_eq!(run.source_system_initial(), "Profisee_dev");
        assert_eq!(run.source_system_daily(), "Profisee_test");
        assert!(run.is_profisee_dev());

        // shared environment fills the system without its own
        cfg.profisee_environment = Some(ProfiseeEnvironment::Prod);
        cfg.profisee_environment_daily = None;
        let run = Run::new(&cfg, jan_first()).unwrap();
        assert_eq!(run.source_system_initial(), "Profisee_dev");
        assert_eq!(run.source_system_daily(), "Profisee");
    }
}
