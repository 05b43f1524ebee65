pub mod agents;
pub mod cli;
pub mod config;
pub mod error;
pub mod governance;
pub mod notify;
pub mod orchestrator;

pub use config::AppConfig;
pub use error::{Result, RoadIqError};
pub use governance::{
    ActionMonitor, AnomalyRule, AnomalyRuleSet, AuditRecord, CapabilityRegistry, Outcome,
    RiskLevel, SecurityPosture,
};
pub use notify::{Emotion, NotificationBackend, NotificationDispatcher};
pub use orchestrator::{bootstrap, DashboardData, LeafAgents, MasterOrchestrator, PipelineResult};
