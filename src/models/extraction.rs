use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Menu,
    Info,
    Help,
    Reserve,
    Confirm,
    Cancel,
}

/// Partial field set proposed by the model. Absent and `null` both decode to `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ExtractedFields {
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub cedula: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub cancha: Option<String>,
    #[serde(default)]
    pub fecha: Option<String>,
    #[serde(default)]
    pub hora: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Extraction {
    pub intent: Intent,
    pub reply: String,
    #[serde(default)]
    pub fields: ExtractedFields,
    #[serde(default)]
    pub ready_to_confirm: bool,
}
