//! Leaf agents - telemetry analysis, diagnosis, manufacturing feedback,
//! customer engagement and scheduling.
//!
//! Each leaf implements one trait from `traits` and never fails: data
//! problems degrade to documented fallback values.

pub mod customer;
pub mod data;
pub mod diagnosis;
pub mod fleet;
pub mod manufacturing;
pub mod scheduling;
pub mod traits;
pub mod types;

pub use customer::{
    manufacturer_alerts, ConversationScript, CustomerAgent, Engagement, ManufacturerAlert,
    ManufacturerAlertKind, QueryReply,
};
pub use data::{DataAgent, FleetOverview};
pub use diagnosis::DiagnosisAgent;
pub use fleet::{FleetStore, VehicleRecord};
pub use manufacturing::{
    BatchQuality, BatchSummary, FailurePattern, ManufacturingAgent, PatternLogOutcome,
    QualityInsights, QualityTrend,
};
pub use scheduling::{Booking, BookingPriority, SchedulingAgent, ServiceCenter};
pub use traits::{CustomerEngager, FailureDiagnoser, PatternLogger, RiskAssessor, ServiceScheduler};
pub use types::{AssessmentLevel, Component, Diagnosis, RiskAssessment, Urgency};
