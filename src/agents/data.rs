//! Risk assessment over fleet telemetry

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::fleet::{FleetStore, VehicleRecord};
use super::traits::RiskAssessor;
use super::types::{AssessmentLevel, RiskAssessment};
use crate::error::RoadIqError;

const MAX_ENGINE_TEMP: f64 = 100.0;
const MAX_VIBRATION: f64 = 1.0;
const MIN_BATTERY_VOLTAGE: f64 = 11.5;
const DEGRADATION_RISK: f64 = 0.7;

/// Fleet-wide risk distribution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetOverview {
    pub total_vehicles: usize,
    /// failure_risk > 0.7
    pub high_risk: usize,
    /// 0.4 < failure_risk <= 0.7
    pub medium_risk: usize,
    /// failure_risk <= 0.4
    pub low_risk: usize,
    pub avg_health_score: f64,
    pub vehicles: Vec<VehicleRecord>,
}

impl FleetOverview {
    pub fn from_records(vehicles: Vec<VehicleRecord>) -> Self {
        let total = vehicles.len();
        let high_risk = vehicles.iter().filter(|v| v.failure_risk > 0.7).count();
        let medium_risk = vehicles
            .iter()
            .filter(|v| v.failure_risk > 0.4 && v.failure_risk <= 0.7)
            .count();
        let low_risk = vehicles.iter().filter(|v| v.failure_risk <= 0.4).count();

        let avg_health_score = if total == 0 {
            0.0
        } else {
            let mean = vehicles.iter().map(|v| v.failure_risk).sum::<f64>() / total as f64;
            if mean.is_finite() {
                1.0 - mean
            } else {
                0.0
            }
        };

        Self {
            total_vehicles: total,
            high_risk,
            medium_risk,
            low_risk,
            avg_health_score,
            vehicles,
        }
    }
}

pub struct DataAgent {
    store: FleetStore,
}

impl DataAgent {
    pub fn new(store: FleetStore) -> Self {
        Self { store }
    }

    /// Apply the sensor thresholds to one record
    pub fn assess_record(vehicle: &VehicleRecord) -> RiskAssessment {
        let mut factors = Vec::new();
        if vehicle.engine_temp > MAX_ENGINE_TEMP {
            factors.push("High Engine Temperature".to_string());
        }
        if vehicle.vibration > MAX_VIBRATION {
            factors.push("Excessive Vibration".to_string());
        }
        if vehicle.battery_voltage < MIN_BATTERY_VOLTAGE {
            factors.push("Low Battery".to_string());
        }
        if vehicle.failure_risk > DEGRADATION_RISK {
            factors.push("Component Degradation".to_string());
        }

        let level = if factors.len() >= 2 || vehicle.failure_risk > 0.8 {
            AssessmentLevel::High
        } else if factors.len() == 1 || vehicle.failure_risk > 0.5 {
            AssessmentLevel::Medium
        } else {
            AssessmentLevel::Low
        };

        RiskAssessment {
            level,
            score: vehicle.failure_risk,
            factors,
            engine_temp: Some(vehicle.engine_temp),
            vibration: Some(vehicle.vibration),
            battery: Some(vehicle.battery_voltage),
        }
    }
}

impl RiskAssessor for DataAgent {
    fn assess(&self, vehicle_id: &str) -> RiskAssessment {
        match self.store.find(vehicle_id) {
            Ok(vehicle) => Self::assess_record(&vehicle),
            Err(RoadIqError::DataSourceMissing(path)) => {
                warn!(path = %path.display(), "fleet data source missing");
                RiskAssessment::fallback("Data source missing")
            }
            Err(RoadIqError::VehicleNotFound(_)) => RiskAssessment::fallback("Vehicle not found"),
            Err(e) => {
                warn!(vehicle_id, error = %e, "fleet data source unreadable");
                RiskAssessment::fallback("Data source unreadable")
            }
        }
    }

    fn fleet_overview(&self) -> FleetOverview {
        match self.store.load() {
            Ok(records) => FleetOverview::from_records(records),
            Err(e) => {
                warn!(error = %e, "fleet overview unavailable");
                FleetOverview::default()
            }
        }
    }
}
