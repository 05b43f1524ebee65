//! Fleet telemetry store
//!
//! The store is a JSON array of vehicle records. It is re-read on every
//! call so the file may be replaced while the process runs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, RoadIqError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub vehicle_id: String,
    pub engine_temp: f64,
    pub vibration: f64,
    pub battery_voltage: f64,
    pub failure_risk: f64,
    pub component_health: String,
    pub batch_id: String,
}

#[derive(Debug, Clone)]
pub struct FleetStore {
    path: PathBuf,
}

impl FleetStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All vehicle records
    pub fn load(&self) -> Result<Vec<VehicleRecord>> {
        if !self.path.exists() {
            return Err(RoadIqError::DataSourceMissing(self.path.clone()));
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// First record with the given id
    pub fn find(&self, vehicle_id: &str) -> Result<VehicleRecord> {
        self.load()?
            .into_iter()
            .find(|v| v.vehicle_id == vehicle_id)
            .ok_or_else(|| RoadIqError::VehicleNotFound(vehicle_id.to_string()))
    }
}
