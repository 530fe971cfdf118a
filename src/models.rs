//! Core data models shared by the calculators, the index and the report
//! renderer.
//!
//! Types that cross the HTTP boundary serialize with camelCase field names.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Brigade training level required by NBR 14276.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingTier {
    Basic,
    Intermediate,
    Advanced,
}

impl TrainingTier {
    pub const ALL: [TrainingTier; 3] = [
        TrainingTier::Basic,
        TrainingTier::Intermediate,
        TrainingTier::Advanced,
    ];

    pub fn from_label(label: &str) -> Option<TrainingTier> {
        TrainingTier::ALL.into_iter().find(|t| t.label() == label)
    }

    /// Portuguese label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            TrainingTier::Basic => "Básico",
            TrainingTier::Intermediate => "Intermediário",
            TrainingTier::Advanced => "Avançado",
        }
    }
}

/// Sizing rule for one occupancy division.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrigadeRule {
    pub code: String,
    pub name: String,
    pub base: u32,
    /// Marginal rate over the population above 10, in whole percent.
    pub rate_percent: u32,
    pub tier: TrainingTier,
}

/// Professional roles staffed by a SESMT (NR-04 Quadro II).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SesmtRole {
    SafetyTechnician,
    SafetyEngineer,
    NursingAssistant,
    Nurse,
    Physician,
}

impl SesmtRole {
    pub const ALL: [SesmtRole; 5] = [
        SesmtRole::SafetyTechnician,
        SesmtRole::SafetyEngineer,
        SesmtRole::NursingAssistant,
        SesmtRole::Nurse,
        SesmtRole::Physician,
    ];

    /// Wire name, matching the serde representation.
    pub fn key(&self) -> &'static str {
        match self {
            SesmtRole::SafetyTechnician => "safetyTechnician",
            SesmtRole::SafetyEngineer => "safetyEngineer",
            SesmtRole::NursingAssistant => "nursingAssistant",
            SesmtRole::Nurse => "nurse",
            SesmtRole::Physician => "physician",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SesmtRole::SafetyTechnician => "Técnico de Segurança do Trabalho",
            SesmtRole::SafetyEngineer => "Engenheiro de Segurança do Trabalho",
            SesmtRole::NursingAssistant => "Auxiliar/Técnico de Enfermagem do Trabalho",
            SesmtRole::Nurse => "Enfermeiro do Trabalho",
            SesmtRole::Physician => "Médico do Trabalho",
        }
    }

    pub fn from_key(key: &str) -> Option<SesmtRole> {
        SesmtRole::ALL.into_iter().find(|r| r.key() == key)
    }

    pub fn from_label(label: &str) -> Option<SesmtRole> {
        SesmtRole::ALL.into_iter().find(|r| r.label() == label)
    }
}

/// Role → required count. Every role is present; 0 means "not required at
/// this size".
pub type RoleCounts = BTreeMap<SesmtRole, u32>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrigadeResult {
    pub required_count: u32,
    pub training_tier: TrainingTier,
    pub computation_trace: String,
    pub classification_label: String,
    pub resolved_division: String,
    pub fallback_applied: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CipaResult {
    pub effective_members: u32,
    pub alternate_members: u32,
    pub risk_grade: u8,
    pub computation_trace: String,
    /// Below the commission threshold a designated person suffices.
    pub designated_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SesmtResult {
    pub role_counts: RoleCounts,
    pub risk_grade: u8,
    pub computation_trace: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalculationResult {
    Brigade(BrigadeResult),
    Cipa(CipaResult),
    Sesmt(SesmtResult),
}

impl CalculationResult {
    pub fn kind(&self) -> ReportKind {
        match self {
            CalculationResult::Brigade(_) => ReportKind::Brigade,
            CalculationResult::Cipa(_) => ReportKind::Cipa,
            CalculationResult::Sesmt(_) => ReportKind::Sesmt,
        }
    }

    /// The result's fields as a report payload.
    pub fn to_payload(&self) -> serde_json::Map<String, serde_json::Value> {
        let value = match self {
            CalculationResult::Brigade(r) => serde_json::to_value(r),
            CalculationResult::Cipa(r) => serde_json::to_value(r),
            CalculationResult::Sesmt(r) => serde_json::to_value(r),
        };
        match value {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Checklist,
    Brigade,
    Cipa,
    Sesmt,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Checklist => "checklist",
            ReportKind::Brigade => "brigade",
            ReportKind::Cipa => "cipa",
            ReportKind::Sesmt => "sesmt",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReportRequest {
    pub kind: ReportKind,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl ReportRequest {
    pub fn from_result(
        result: &CalculationResult,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            kind: result.kind(),
            metadata,
            payload: result.to_payload(),
        }
    }
}

/// Where an indexed record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Directory,
    Remote,
    Backup,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Directory => "directory",
            SourceKind::Remote => "remote",
            SourceKind::Backup => "backup",
        }
    }
}

/// A searchable record: one PDF page or one whole plain-text document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedDocument {
    pub title: String,
    pub body: String,
    pub locator: Option<String>,
    pub page: Option<u32>,
}

/// A search hit returned by the query engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub locator: Option<String>,
    pub page: Option<u32>,
    pub score: f64,
}
