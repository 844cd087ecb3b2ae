//! JSON rendering shared by the pipeline and parameter documents.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::{DeployError, DeployResult};

/// Serialize `value` with 4-space indentation.
///
/// Key order follows struct field order, so identical input always renders
/// to identical bytes.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> DeployResult<String> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value
        .serialize(&mut ser)
        .map_err(|e| DeployError::Render(e.to_string()))?;
    String::from_utf8(buf).map_err(|e| DeployError::Render(e.to_string()))
}
