use serde::{Deserialize, Serialize};

/// Response of a code generation request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct GeneratedCodes {
    #[serde(default)]
    pub generated_codes: Vec<String>,
}
