use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// Display metadata for the risk formula panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FormulaSheet {
    pub title: String,
    #[serde(default)]
    pub expression: String,
    #[serde(default)]
    pub variables: Vec<FormulaVariable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormulaVariable {
    pub symbol: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl FormulaSheet {
    pub fn from_json_str(payload: &str) -> Result<Self, FormatError> {
        serde_json::from_str(payload).map_err(|e| FormatError::Json(e.to_string()))
    }

    /// Plain-text lines in panel order.
    pub fn lines(&self) -> Vec<String> {
        let mut out = vec![self.title.clone()];
        if !self.expression.is_empty() {
            out.push(self.expression.clone());
        }
        for v in &self.variables {
            match &v.unit {
                Some(unit) => out.push(format!("{}: {} [{}]", v.symbol, v.description, unit)),
                None => out.push(format!("{}: {}", v.symbol, v.description)),
            }
        }
        out.extend(self.notes.iter().cloned());
        out
    }
}
