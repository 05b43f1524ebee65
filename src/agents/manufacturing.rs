//! Manufacturing quality feedback
//!
//! Diagnoses are logged against the vehicle's production batch and the
//! batch's fleet statistics are summarised for the manufacturer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

use super::fleet::{FleetStore, VehicleRecord};
use super::traits::PatternLogger;
use super::types::{title_case, Component, Diagnosis};
use crate::error::RoadIqError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailurePattern {
    pub vehicle_id: String,
    pub component: Component,
    pub probability: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchQuality {
    pub batch_id: String,
    pub total_vehicles: usize,
    pub high_risk_vehicles: usize,
    pub avg_failure_risk: f64,
    pub primary_issue: String,
    pub insights: Vec<String>,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PatternLogOutcome {
    Analyzed(BatchQuality),
    Error { message: String },
}

impl PatternLogOutcome {
    fn error(message: &str) -> Self {
        PatternLogOutcome::Error {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub avg_failure_risk: f64,
    pub count: usize,
    pub common_component: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityTrend {
    Declining,
    Stable,
    Unknown,
}

impl std::fmt::Display for QualityTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityTrend::Declining => write!(f, "Declining"),
            QualityTrend::Stable => write!(f, "Stable"),
            QualityTrend::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityInsights {
    pub batch_summary: BTreeMap<String, BatchSummary>,
    pub total_batches: usize,
    pub quality_trend: QualityTrend,
}

impl QualityInsights {
    fn unknown() -> Self {
        Self {
            batch_summary: BTreeMap::new(),
            total_batches: 0,
            quality_trend: QualityTrend::Unknown,
        }
    }
}

pub struct ManufacturingAgent {
    store: FleetStore,
    patterns: Mutex<HashMap<String, Vec<FailurePattern>>>,
}

impl ManufacturingAgent {
    pub fn new(store: FleetStore) -> Self {
        Self {
            store,
            patterns: Mutex::new(HashMap::new()),
        }
    }

    /// Failure patterns logged for a batch so far
    pub fn patterns_for(&self, batch_id: &str) -> Vec<FailurePattern> {
        self.patterns
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(batch_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Statistics for one batch, `None` when the fleet has no vehicle in it
    pub fn analyze_batch_quality(&self, batch_id: &str) -> Option<BatchQuality> {
        match self.store.load() {
            Ok(records) => analyze_batch(&records, batch_id),
            Err(e) => {
                warn!(batch_id, error = %e, "batch analysis unavailable");
                None
            }
        }
    }
}

impl PatternLogger for ManufacturingAgent {
    fn log_pattern(&self, vehicle_id: &str, diagnosis: &Diagnosis) -> PatternLogOutcome {
        let records = match self.store.load() {
            Ok(records) => records,
            Err(RoadIqError::DataSourceMissing(_)) => {
                return PatternLogOutcome::error("Data file missing")
            }
            Err(e) => {
                warn!(vehicle_id, error = %e, "failed to read fleet data");
                return PatternLogOutcome::error("Unable to log failure pattern");
            }
        };

        let Some(vehicle) = records.iter().find(|v| v.vehicle_id == vehicle_id) else {
            return PatternLogOutcome::error("Vehicle not found");
        };
        let batch_id = vehicle.batch_id.clone();

        self.patterns
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(batch_id.clone())
            .or_default()
            .push(FailurePattern {
                vehicle_id: vehicle_id.to_string(),
                component: diagnosis.category,
                probability: diagnosis.probability,
                timestamp: Utc::now(),
            });
        debug!(vehicle_id, batch_id = %batch_id, "failure pattern logged");

        match analyze_batch(&records, &batch_id) {
            Some(quality) => PatternLogOutcome::Analyzed(quality),
            None => PatternLogOutcome::error("Unable to analyze batch quality"),
        }
    }

    fn quality_insights(&self) -> QualityInsights {
        let records = match self.store.load() {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "quality insights unavailable");
                return QualityInsights::unknown();
            }
        };
        if records.is_empty() {
            return QualityInsights::unknown();
        }

        let mut batches: BTreeMap<&str, Vec<&VehicleRecord>> = BTreeMap::new();
        for v in &records {
            batches.entry(v.batch_id.as_str()).or_default().push(v);
        }

        let batch_summary: BTreeMap<String, BatchSummary> = batches
            .iter()
            .map(|(batch_id, vehicles)| {
                let summary = BatchSummary {
                    avg_failure_risk: mean_risk(vehicles.iter().copied()),
                    count: vehicles.len(),
                    common_component: most_common(vehicles.iter().map(|v| v.component_health.as_str()))
                        .unwrap_or_else(|| "Unknown".to_string()),
                };
                (batch_id.to_string(), summary)
            })
            .collect();

        let quality_trend = if mean_risk(records.iter()) > 0.5 {
            QualityTrend::Declining
        } else {
            QualityTrend::Stable
        };

        QualityInsights {
            total_batches: batch_summary.len(),
            batch_summary,
            quality_trend,
        }
    }
}

fn analyze_batch(records: &[VehicleRecord], batch_id: &str) -> Option<BatchQuality> {
    let batch: Vec<&VehicleRecord> = records.iter().filter(|v| v.batch_id == batch_id).collect();
    if batch.is_empty() {
        return None;
    }

    let total = batch.len();
    let avg = mean_risk(batch.iter().copied());
    let high_risk = batch.iter().filter(|v| v.failure_risk > 0.7).count();
    let primary_issue = most_common(batch.iter().map(|v| v.component_health.as_str()))
        .unwrap_or_else(|| "Unknown".to_string());

    let mut insights = Vec::new();
    if avg > 0.6 {
        insights.push(format!(
            "Batch {} shows elevated failure risk ({:.2})",
            batch_id, avg
        ));
    }
    if high_risk as f64 > total as f64 * 0.3 {
        insights.push(format!("30%+ vehicles in batch {} are high-risk", batch_id));
    }
    insights.push(format!("Primary concern: {}", title_case(&primary_issue)));

    Some(BatchQuality {
        batch_id: batch_id.to_string(),
        total_vehicles: total,
        high_risk_vehicles: high_risk,
        avg_failure_risk: avg,
        recommendation: recommendation(avg, &primary_issue),
        primary_issue,
        insights,
    })
}

fn recommendation(avg_risk: f64, primary_issue: &str) -> String {
    if avg_risk > 0.8 {
        format!(
            "URGENT: Investigate {} supplier quality. Consider batch recall.",
            primary_issue
        )
    } else if avg_risk > 0.6 {
        format!(
            "Review {} manufacturing process and supplier standards.",
            primary_issue
        )
    } else {
        "Continue monitoring. No immediate action required.".to_string()
    }
}

fn mean_risk<'a>(vehicles: impl Iterator<Item = &'a VehicleRecord>) -> f64 {
    let (sum, count) = vehicles.fold((0.0, 0usize), |(s, n), v| (s + v.failure_risk, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Most frequent label; ties go to the alphabetically first one.
fn most_common<'a>(labels: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(label, _)| label.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::fleet::testing::{store_with, vehicle};

    fn fleet() -> FleetStore {
        store_with(&[
            vehicle("V001", 0.85, "brake_system", "B1"),
            vehicle("V002", 0.9, "brake_system", "B1"),
            vehicle("V003", 0.7, "engine", "B1"),
            vehicle("V004", 0.2, "suspension", "B2"),
        ])
    }

    #[test]
    fn test_log_pattern_returns_batch_analysis() {
        let agent = ManufacturingAgent::new(fleet());
        let diagnosis = Diagnosis::new(Component::BrakeSystem, 0.85);

        let outcome = agent.log_pattern("V001", &diagnosis);
        let PatternLogOutcome::Analyzed(quality) = outcome else {
            panic!("expected batch analysis, got {outcome:?}");
        };
        assert_eq!(quality.batch_id, "B1");
        assert_eq!(quality.total_vehicles, 3);
        assert_eq!(quality.high_risk_vehicles, 2);
        assert_eq!(quality.primary_issue, "brake_system");
        assert_eq!(
            quality.insights,
            vec![
                "Batch B1 shows elevated failure risk (0.82)",
                "30%+ vehicles in batch B1 are high-risk",
                "Primary concern: Brake System",
            ]
        );
        assert!(quality.recommendation.starts_with("URGENT"));

        let patterns = agent.patterns_for("B1");
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].vehicle_id, "V001");
    }

    #[test]
    fn test_log_pattern_errors_are_values() {
        let agent = ManufacturingAgent::new(fleet());
        let d = Diagnosis::fallback();
        assert_eq!(
            agent.log_pattern("V404", &d),
            PatternLogOutcome::Error {
                message: "Vehicle not found".into()
            }
        );

        let agent = ManufacturingAgent::new(FleetStore::new("/nonexistent/roadiq.json"));
        assert_eq!(
            agent.log_pattern("V001", &d),
            PatternLogOutcome::Error {
                message: "Data file missing".into()
            }
        );
    }

    #[test]
    fn test_quality_insights() {
        let agent = ManufacturingAgent::new(fleet());
        let insights = agent.quality_insights();
        assert_eq!(insights.total_batches, 2);
        assert_eq!(insights.batch_summary["B1"].count, 3);
        assert_eq!(insights.batch_summary["B1"].common_component, "brake_system");
        assert_eq!(insights.batch_summary["B2"].common_component, "suspension");
        assert_eq!(insights.quality_trend, QualityTrend::Declining);

        let empty = ManufacturingAgent::new(FleetStore::new("/nonexistent/roadiq.json"));
        assert_eq!(empty.quality_insights().quality_trend, QualityTrend::Unknown);
    }

    #[test]
    fn test_recommendation_tiers() {
        assert!(recommendation(0.7, "engine").starts_with("Review engine"));
        assert_eq!(
            recommendation(0.3, "engine"),
            "Continue monitoring. No immediate action required."
        );
    }

    #[test]
    fn test_most_common_tie_break() {
        assert_eq!(
            most_common(["engine", "brake_system"].into_iter()),
            Some("brake_system".to_string())
        );
        assert_eq!(most_common(std::iter::empty()), None);
    }
}
