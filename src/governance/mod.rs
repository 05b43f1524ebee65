//! Governance layer
//!
//! Intercepts every inter-agent action:
//! - Capability registry (who may do what)
//! - Anomaly rules (pattern overrides, last match wins)
//! - Action monitor (append-only audit trail and security posture)

pub mod actors;
mod anomaly;
mod audit;
mod capability;
mod monitor;
mod sink;

pub use anomaly::{default_rules, AnomalyRule, AnomalyRuleSet, RuleEffect};
pub use audit::{ActorStats, AuditRecord, Outcome, RiskLevel, Verdict};
pub use capability::{
    default_grants, CapabilityGrant, CapabilityRegistry, GrantEntry, Permissions, WILDCARD,
};
pub use monitor::{
    ActionMonitor, AlertStatus, BehaviorAssessment, BehaviorStatus, MonitorLimits, SecurityAlert,
    SecurityPosture,
};
pub use sink::{AuditSink, JsonlAuditSink};
