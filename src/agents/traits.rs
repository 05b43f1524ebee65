//! Leaf agent contracts
//!
//! Every leaf degrades to a fallback value instead of failing, so the
//! pipeline can call them unconditionally.

use super::customer::{manufacturer_alerts, Engagement, ManufacturerAlert, QueryReply};
use super::data::FleetOverview;
use super::manufacturing::{PatternLogOutcome, QualityInsights};
use super::scheduling::Booking;
use super::types::{Diagnosis, RiskAssessment, Urgency};

pub trait RiskAssessor: Send + Sync {
    fn assess(&self, vehicle_id: &str) -> RiskAssessment;

    fn fleet_overview(&self) -> FleetOverview;
}

pub trait FailureDiagnoser: Send + Sync {
    fn diagnose(&self, vehicle_id: &str) -> Diagnosis;
}

pub trait PatternLogger: Send + Sync {
    /// Record the diagnosis against the vehicle's production batch
    fn log_pattern(&self, vehicle_id: &str, diagnosis: &Diagnosis) -> PatternLogOutcome;

    fn quality_insights(&self) -> QualityInsights;
}

pub trait CustomerEngager: Send + Sync {
    fn engage(&self, vehicle_id: &str, diagnosis: &Diagnosis) -> Engagement;

    fn answer_query(&self, text: &str) -> QueryReply;

    /// Recall and quality alerts for batches with elevated failure rates
    fn manufacturer_alerts(&self, insights: &QualityInsights) -> Vec<ManufacturerAlert> {
        manufacturer_alerts(insights)
    }
}

pub trait ServiceScheduler: Send + Sync {
    fn book_service(&self, vehicle_id: &str, urgency: Urgency) -> Booking;
}
