use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Patient details printed on the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientInfo {
    #[serde(default = "default_patient_name")]
    pub patient_name: String,
    #[serde(default = "default_patient_id")]
    pub patient_id: String,
}

fn default_patient_name() -> String {
    "Unknown".to_string()
}

fn default_patient_id() -> String {
    "N/A".to_string()
}

impl Default for PatientInfo {
    fn default() -> Self {
        Self {
            patient_name: default_patient_name(),
            patient_id: default_patient_id(),
        }
    }
}

/// One page of a progress report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPage {
    pub title: String,
    pub lines: Vec<String>,
}

impl ReportPage {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }
}

/// Multi-page progress report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressReport {
    pub title: String,
    pub patient: PatientInfo,
    pub generated_at: DateTime<Utc>,
    pub pages: Vec<ReportPage>,
}

impl ProgressReport {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Output of a report renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedReport {
    pub media_type: String,
    pub page_count: usize,
    pub generated_at: DateTime<Utc>,
    pub content: String,
}
