//! Parameter export and import.
//!
//! The export is the configuration record plus the run's table suffix and a
//! little metadata. A deployer imports it to regenerate the same artifacts.

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::{Configuration, ProfiseeEnvironment};
use crate::error::{DeployError, DeployResult};
use crate::json::to_pretty_json;

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const EXPORT_TIMESTAMP: &str = "export_timestamp";
const APP_VERSION_KEY: &str = "app_version";
const TABLE_SUFFIX: &str = "table_suffix";

/// Keys whose `null` means "unset" rather than "use the default".
const NULLABLE_KEYS: [&str; 6] = [
    "profisee_environment",
    "profisee_environment_initial",
    "profisee_environment_daily",
    "delete_type",
    "src_delete_column",
    "src_delete_value",
];

/// Source system keys with the environment key each one qualifies.
const SOURCE_SYSTEM_KEYS: [(&str, &str); 2] = [
    ("source_system_initial", "profisee_environment_initial"),
    ("source_system_daily", "profisee_environment_daily"),
];

#[derive(Serialize)]
struct ParameterExport<'a> {
    #[serde(flatten)]
    config: &'a Configuration,
    table_suffix: Option<&'a str>,
    export_timestamp: String,
    app_version: &'a str,
}

/// A parsed parameter document.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedParameters {
    pub config: Configuration,
    pub table_suffix: Option<String>,
    pub exported_at: Option<String>,
}

/// Render the parameter export.
pub fn export_parameters(
    config: &Configuration,
    table_suffix: Option<&str>,
    now: NaiveDateTime,
) -> DeployResult<String> {
    let export = ParameterExport {
        config,
        table_suffix,
        export_timestamp: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        app_version: APP_VERSION,
    };
    to_pretty_json(&export)
}

/// Parse a parameter document.
///
/// Missing keys and `null` values take their defaults, unknown keys are
/// ignored. Anything that is not a JSON object is rejected as a whole.
pub fn import_parameters(json: &str) -> DeployResult<ImportedParameters> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Object(mut map) = value else {
        return Err(DeployError::BadInput(
            "parameter document must be a JSON object".to_string(),
        ));
    };

    map.retain(|k, v| !v.is_null() || NULLABLE_KEYS.contains(&k.as_str()));
    let exported_at = take_string(&mut map, EXPORT_TIMESTAMP);
    map.remove(APP_VERSION_KEY);
    let table_suffix = take_string(&mut map, TABLE_SUFFIX).filter(|s| !s.trim().is_empty());
    split_qualified_profisee(&mut map);

    let config: Configuration = serde_json::from_value(Value::Object(map))?;
    log::debug!(
        "imported parameters for {} (suffix {:?})",
        config.src_table_name,
        table_suffix
    );
    Ok(ImportedParameters {
        config,
        table_suffix,
        exported_at,
    })
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

/// Older exports store the qualified source system (`Profisee_dev`).
/// Split each back into the system and that system's own environment.
fn split_qualified_profisee(map: &mut Map<String, Value>) {
    for (system_key, env_key) in SOURCE_SYSTEM_KEYS {
        let env = match map.get(system_key) {
            Some(Value::String(s)) => s
                .strip_prefix("Profisee_")
                .and_then(ProfiseeEnvironment::from_suffix),
            _ => None,
        };
        if let Some(env) = env {
            map.insert(system_key.to_string(), Value::String("Profisee".to_string()));
            if map.get(env_key).is_none_or(Value::is_null) {
                map.insert(env_key.to_string(), Value::String(env.as_str().to_string()));
            }
        }
    }
}
