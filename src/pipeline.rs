//! Orchestration pipeline documents.
//!
//! Each [`PipelineMode`] renders one named pipeline made of
//! `ExecutePipeline` activities that call the framework loop pipelines.
//! The documents are typed structs, so key order is fixed and re-rendering
//! the same run gives byte-identical JSON.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DeployResult;
use crate::json::to_pretty_json;
use crate::naming::{
    JobNames, CONTROL_SCHEMA, HS_CONTROL_TABLE, JOB_CONTROL_TABLE, SANDBOX_SCHEMA,
    STAGE_CONTROL_TABLE,
};
use crate::run::Run;

const LOOP_PIPELINE: &str = "pl_framework_StageAndHSLoop";
const STAGE_DELETE_PIPELINE: &str = "pl_framework_StageDeleteLoop";
const DELETE_FLAG_PIPELINE: &str = "pl_framework_UpdateDeleteFlag";
const BK_PRELOAD_PIPELINE: &str = "pl_BKPreload_Test";
const STOP_DATE: &str = "@formatDateTime(addDays(utcNow(),1),'yyyy-MM-dd HH:mm:ss')";

const DEPLOYMENT_FOLDER: &str = "Deployment and initial load";
const SCHEDULING_FOLDER: &str = "Scheduling";

/// Which pipeline variant to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineMode {
    /// Full initial load of stage and HS against the temp control tables.
    Initial,
    /// Scheduled load against the production control tables.
    Daily,
    /// Initial load whose HS job is invalid, so only the stage part runs.
    InvalidHs,
    /// Initial load with a do-nothing stage job, so only HS runs.
    Placeholder,
}

impl PipelineMode {
    pub const ALL: [PipelineMode; 4] = [
        PipelineMode::Initial,
        PipelineMode::Daily,
        PipelineMode::InvalidHs,
        PipelineMode::Placeholder,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PipelineMode::Initial => "initial",
            PipelineMode::Daily => "daily",
            PipelineMode::InvalidHs => "invalid-hs",
            PipelineMode::Placeholder => "placeholder",
        }
    }

    pub fn pipeline_name(&self, src_table: &str) -> String {
        let prefix = match self {
            PipelineMode::Initial => "pl_StageAndHistoricStageInitialLoad",
            PipelineMode::Daily => "pl_StageAndHistoricStageDailyLoad",
            PipelineMode::InvalidHs => "pl_StageOnlyInitialLoad",
            PipelineMode::Placeholder => "pl_HistoricStageOnlyInitialLoad",
        };
        format!("{}_{}", prefix, src_table)
    }
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub name: String,
    pub properties: PipelineProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineProperties {
    pub activities: Vec<Activity>,
    pub folder: Folder,
    pub annotations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_inactive_mark_as: Option<String>,
    pub depends_on: Vec<Dependency>,
    pub policy: ActivityPolicy,
    pub user_properties: Vec<String>,
    pub type_properties: TypeProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub activity: String,
    pub dependency_conditions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPolicy {
    pub secure_input: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeProperties {
    pub pipeline: PipelineReference,
    pub wait_on_completion: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReference {
    pub reference_name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Parameters {
    Loop(LoopParameters),
    DeleteFlag(DeleteFlagParameters),
    StageDelete(StageDeleteParameters),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub value: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Parameters of the stage-and-HS framework loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopParameters {
    #[serde(rename = "pStopDate")]
    pub stop_date: Expression,
    #[serde(rename = "pSTJob")]
    pub st_job: String,
    #[serde(rename = "pHSJob")]
    pub hs_job: String,
    #[serde(rename = "pJobControlSchema")]
    pub job_control_schema: String,
    #[serde(rename = "pJobControlTable")]
    pub job_control_table: String,
    #[serde(rename = "pSTTablesControlSchema")]
    pub st_control_schema: String,
    #[serde(rename = "pSTTablesControlTable")]
    pub st_control_table: String,
    #[serde(rename = "pHSTablesControlSchema")]
    pub hs_control_schema: String,
    #[serde(rename = "pHSTablesControlTable")]
    pub hs_control_table: String,
    #[serde(rename = "pLoopJob")]
    pub loop_job: String,
    #[serde(rename = "pLogSchema")]
    pub log_schema: String,
    #[serde(rename = "pLogTableJobLevel")]
    pub log_table_job_level: String,
    #[serde(rename = "pLogTableTableLevel")]
    pub log_table_table_level: String,
    // parameter name as declared by the framework pipeline
    #[serde(rename = "pIntialLoad")]
    pub initial_load: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDeleteParameters {
    #[serde(rename = "pJobName")]
    pub job_name: String,
    #[serde(rename = "pDataControlTable")]
    pub data_control_table: String,
    #[serde(rename = "pDataControlSchema")]
    pub data_control_schema: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteFlagParameters {
    #[serde(rename = "pJobName")]
    pub job_name: String,
    #[serde(rename = "pDataControlTable")]
    pub data_control_table: String,
    #[serde(rename = "pDataControlSchema")]
    pub data_control_schema: String,
    #[serde(rename = "pStageControlTable")]
    pub stage_control_table: String,
    #[serde(rename = "pStageControlSchema")]
    pub stage_control_schema: String,
    #[serde(rename = "pStageJobName")]
    pub stage_job_name: String,
}

/// Where the loop reads its job and table configuration from.
struct ControlTables {
    schema: String,
    job: String,
    st: String,
    hs: String,
}

impl ControlTables {
    fn sandbox(run: &Run) -> Self {
        let temp = run.temp_tables();
        Self {
            schema: SANDBOX_SCHEMA.to_string(),
            job: temp.job.clone(),
            st: temp.st.clone(),
            hs: temp.hs.clone(),
        }
    }

    fn production() -> Self {
        Self {
            schema: CONTROL_SCHEMA.to_string(),
            job: JOB_CONTROL_TABLE.to_string(),
            st: STAGE_CONTROL_TABLE.to_string(),
            hs: HS_CONTROL_TABLE.to_string(),
        }
    }
}

impl Pipeline {
    /// Build the pipeline document for `mode`.
    pub fn build(run: &Run, mode: PipelineMode) -> Self {
        let jobs = run.jobs();
        let name = mode.pipeline_name(run.src_table());
        let (activities, folder) = match mode {
            PipelineMode::Initial => (
                vec![loop_activity(
                    "Initial Stage and HS",
                    jobs.st_initial,
                    jobs.hs_initial,
                    jobs.hs_initial_control,
                    ControlTables::sandbox(run),
                    true,
                )],
                DEPLOYMENT_FOLDER,
            ),
            PipelineMode::InvalidHs => (
                vec![loop_activity(
                    "Initial Stage only",
                    jobs.st_initial,
                    JobNames::HS_INVALID,
                    jobs.hs_initial_control,
                    ControlTables::sandbox(run),
                    true,
                )],
                DEPLOYMENT_FOLDER,
            ),
            PipelineMode::Placeholder => (
                vec![loop_activity(
                    "Initial HS only",
                    JobNames::ST_PLACEHOLDER,
                    jobs.hs_initial,
                    jobs.hs_initial_control,
                    ControlTables::sandbox(run),
                    true,
                )],
                DEPLOYMENT_FOLDER,
            ),
            PipelineMode::Daily => (daily_activities(jobs), SCHEDULING_FOLDER),
        };
        log::debug!("pipeline {} with {} activities", name, activities.len());

        Self {
            name,
            properties: PipelineProperties {
                activities,
                folder: Folder {
                    name: folder.to_string(),
                },
                annotations: Vec::new(),
            },
        }
    }

    /// Render with 4-space indentation.
    pub fn to_json(&self) -> DeployResult<String> {
        to_pretty_json(self)
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.name)
    }
}

fn loop_activity(
    name: &str,
    st_job: &str,
    hs_job: &str,
    loop_job: &str,
    control: ControlTables,
    initial_load: bool,
) -> Activity {
    let params = LoopParameters {
        stop_date: Expression {
            value: STOP_DATE.to_string(),
            kind: "Expression".to_string(),
        },
        st_job: st_job.to_string(),
        hs_job: hs_job.to_string(),
        job_control_schema: control.schema.clone(),
        job_control_table: control.job,
        st_control_schema: control.schema.clone(),
        st_control_table: control.st,
        hs_control_schema: control.schema,
        hs_control_table: control.hs,
        loop_job: loop_job.to_string(),
        log_schema: CONTROL_SCHEMA.to_string(),
        log_table_job_level: "JOB_LOG".to_string(),
        log_table_table_level: "JOB_TABLES_LOG".to_string(),
        initial_load,
    };
    activity(name, None, LOOP_PIPELINE, Some(Parameters::Loop(params)))
}

fn daily_activities(jobs: &JobNames) -> Vec<Activity> {
    let main = loop_activity(
        "Daily Stage and HS",
        jobs.st_daily,
        jobs.hs_daily,
        jobs.hs_daily_control,
        ControlTables::production(),
        false,
    );
    let deletes = activity(
        "Stage Deletes",
        Some(main.name.as_str()),
        STAGE_DELETE_PIPELINE,
        Some(Parameters::StageDelete(StageDeleteParameters {
            job_name: jobs.st_daily.to_string(),
            data_control_table: STAGE_CONTROL_TABLE.to_string(),
            data_control_schema: CONTROL_SCHEMA.to_string(),
        })),
    );
    let flags = activity(
        "Update Delete flags",
        Some(deletes.name.as_str()),
        DELETE_FLAG_PIPELINE,
        Some(Parameters::DeleteFlag(DeleteFlagParameters {
            job_name: jobs.hs_daily.to_string(),
            data_control_table: HS_CONTROL_TABLE.to_string(),
            data_control_schema: CONTROL_SCHEMA.to_string(),
            stage_control_table: STAGE_CONTROL_TABLE.to_string(),
            stage_control_schema: CONTROL_SCHEMA.to_string(),
            stage_job_name: jobs.st_daily.to_string(),
        })),
    );
    let preload = activity("BK_preload", Some(flags.name.as_str()), BK_PRELOAD_PIPELINE, None);
    vec![main, deletes, flags, preload]
}

/// An `ExecutePipeline` activity. Activities that follow another one are
/// present but inactive until someone enables them.
fn activity(
    name: &str,
    after: Option<&str>,
    reference: &str,
    parameters: Option<Parameters>,
) -> Activity {
    let depends_on = after
        .map(|prev| {
            vec![Dependency {
                activity: prev.to_string(),
                dependency_conditions: vec!["Succeeded".to_string()],
            }]
        })
        .unwrap_or_default();
    let inactive = after.is_some();

    Activity {
        name: name.to_string(),
        kind: "ExecutePipeline".to_string(),
        state: inactive.then(|| "Inactive".to_string()),
        on_inactive_mark_as: inactive.then(|| "Succeeded".to_string()),
        depends_on,
        policy: ActivityPolicy {
            secure_input: false,
        },
        user_properties: Vec::new(),
        type_properties: TypeProperties {
            pipeline: PipelineReference {
                reference_name: reference.to_string(),
                kind: "PipelineReference".to_string(),
            },
            wait_on_completion: true,
            parameters,
        },
    }
}
