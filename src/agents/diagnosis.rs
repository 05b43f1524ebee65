//! Rule-based failure prediction

use tracing::{debug, warn};

use super::fleet::{FleetStore, VehicleRecord};
use super::traits::FailureDiagnoser;
use super::types::{Component, Diagnosis};

pub struct DiagnosisAgent {
    store: FleetStore,
}

impl DiagnosisAgent {
    pub fn new(store: FleetStore) -> Self {
        Self { store }
    }

    pub fn diagnose_record(vehicle: &VehicleRecord) -> Diagnosis {
        Diagnosis::new(Component::parse(&vehicle.component_health), vehicle.failure_risk)
    }
}

impl FailureDiagnoser for DiagnosisAgent {
    fn diagnose(&self, vehicle_id: &str) -> Diagnosis {
        match self.store.find(vehicle_id) {
            Ok(vehicle) => Self::diagnose_record(&vehicle),
            Err(e) if e.is_data_error() => {
                debug!(vehicle_id, error = %e, "diagnosis fallback");
                Diagnosis::fallback()
            }
            Err(e) => {
                warn!(vehicle_id, error = %e, "diagnosis failed");
                Diagnosis::fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::fleet::testing::{store_with, vehicle};
    use crate::agents::types::Urgency;

    #[test]
    fn test_diagnose_known_vehicle() {
        let agent = DiagnosisAgent::new(store_with(&[vehicle("V001", 0.85, "brake_system", "B1")]));
        let d = agent.diagnose("V001");
        assert_eq!(d.category, Component::BrakeSystem);
        assert_eq!(d.probability, 0.85);
        assert_eq!(d.urgency, Urgency::Critical);
        assert_eq!(d.estimated_days, 7);
    }

    #[test]
    fn test_unknown_component_gets_general_inspection() {
        let d = DiagnosisAgent::diagnose_record(&vehicle("V002", 0.65, "exhaust", "B1"));
        assert_eq!(d.category, Component::Unknown);
        assert_eq!(d.urgency, Urgency::High);
        assert_eq!(d.recommendation, "General inspection required");
    }

    #[test]
    fn test_missing_vehicle_falls_back() {
        let agent = DiagnosisAgent::new(store_with(&[]));
        assert_eq!(agent.diagnose("V404"), Diagnosis::fallback());
    }
}
