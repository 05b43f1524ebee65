//! Action Monitor - governance gate for every inter-agent action
//!
//! Each reported action is checked against the capability registry, then
//! the anomaly rules are folded over the result, and the final verdict is
//! appended to the audit trail. The monitor is observational: it never
//! fails and never stops the caller from proceeding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use super::anomaly::AnomalyRuleSet;
use super::audit::{ActorStats, AuditLog, AuditRecord, Outcome, RiskLevel, Verdict};
use super::capability::CapabilityRegistry;
use super::sink::AuditSink;

/// Behaviour thresholds and alert retention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorLimits {
    /// Actions above this count mark an actor anomalous
    pub volume_threshold: usize,
    /// Blocked actions above this count mark an actor suspicious
    pub blocked_threshold: usize,
    /// Number of alerting records kept for the posture view
    pub alert_history: usize,
}

impl MonitorLimits {
    /// Volume takes precedence over blocked count.
    pub fn classify(&self, actor: &str, stats: ActorStats) -> BehaviorAssessment {
        let (status, reason) = if stats.total > self.volume_threshold {
            (BehaviorStatus::Anomalous, "Excessive activity detected")
        } else if stats.blocked > self.blocked_threshold {
            (BehaviorStatus::Suspicious, "Multiple unauthorized attempts")
        } else {
            (BehaviorStatus::Normal, "Behavior within expected parameters")
        };

        if status != BehaviorStatus::Normal {
            warn!(actor, %status, total = stats.total, blocked = stats.blocked, "{}", reason);
        }

        BehaviorAssessment {
            actor: actor.to_string(),
            status,
            reason: reason.to_string(),
            total_actions: stats.total,
            blocked_actions: stats.blocked,
        }
    }
}

impl Default for MonitorLimits {
    fn default() -> Self {
        Self {
            volume_threshold: 100,
            blocked_threshold: 5,
            alert_history: 20,
        }
    }
}

/// Behaviour classification for one actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorStatus {
    Normal,
    Suspicious,
    Anomalous,
}

impl std::fmt::Display for BehaviorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BehaviorStatus::Normal => write!(f, "normal"),
            BehaviorStatus::Suspicious => write!(f, "suspicious"),
            BehaviorStatus::Anomalous => write!(f, "anomalous"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorAssessment {
    pub actor: String,
    pub status: BehaviorStatus,
    pub reason: String,
    pub total_actions: usize,
    pub blocked_actions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Blocked,
    Monitoring,
}

/// Alert view of an audit record that carried an alert message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityAlert {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub severity: RiskLevel,
    pub actor: String,
    pub resource: String,
    pub description: String,
    pub status: AlertStatus,
    pub action_taken: String,
}

impl SecurityAlert {
    fn from_record(record: &AuditRecord) -> Self {
        let (status, action_taken) = match record.outcome {
            Outcome::Blocked => (AlertStatus::Blocked, "Access denied"),
            Outcome::Allowed => (AlertStatus::Monitoring, "Increased logging enabled"),
        };
        Self {
            id: format!("ALERT{:03}", record.sequence),
            timestamp: record.timestamp,
            severity: record.risk_level,
            actor: record.actor.clone(),
            resource: record.resource.clone(),
            description: record.alert.clone().unwrap_or_default(),
            status,
            action_taken: action_taken.to_string(),
        }
    }
}

/// Aggregate security posture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityPosture {
    pub total_events: usize,
    pub blocked_actions: usize,
    pub security_score: u8,
    pub active_alerts: Vec<SecurityAlert>,
}

/// Governance monitor
pub struct ActionMonitor {
    registry: CapabilityRegistry,
    rules: AnomalyRuleSet,
    limits: MonitorLimits,
    log: Mutex<AuditLog>,
    sink: Option<Box<dyn AuditSink>>,
}

impl ActionMonitor {
    pub fn new(registry: CapabilityRegistry, rules: AnomalyRuleSet, limits: MonitorLimits) -> Self {
        Self {
            registry,
            rules,
            limits,
            log: Mutex::new(AuditLog::new(limits.alert_history)),
            sink: None,
        }
    }

    /// Mirror every appended record to an external sink
    pub fn with_sink(mut self, sink: Box<dyn AuditSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn limits(&self) -> MonitorLimits {
        self.limits
    }

    // A panic while holding the lock cannot leave the trail half-written:
    // append pushes the record last.
    fn lock(&self) -> MutexGuard<'_, AuditLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Verdict for an action without recording it
    pub fn evaluate(&self, actor: &str, action: &str, resource: &str) -> Verdict {
        let mut verdict = if self.registry.is_permitted(actor, action) {
            Verdict::allowed()
        } else {
            Verdict::unauthorized(actor, action)
        };

        for effect in self.rules.evaluate(actor, action, resource) {
            debug!(rule = %effect.rule, actor, action, resource, "anomaly rule matched");
            effect.apply(&mut verdict);
        }

        verdict
    }

    /// Evaluate and append one action to the audit trail.
    pub fn record(&self, actor: &str, action: &str, resource: &str) -> AuditRecord {
        let verdict = self.evaluate(actor, action, resource);

        let record = {
            let mut log = self.lock();
            let record = log.append(actor, action, resource, verdict).clone();
            if let Some(sink) = &self.sink {
                if let Err(e) = sink.write(&record) {
                    warn!(sequence = record.sequence, "audit sink write failed: {}", e);
                }
            }
            record
        };

        match (&record.outcome, &record.alert) {
            (Outcome::Blocked, alert) => warn!(
                sequence = record.sequence,
                actor,
                action,
                resource,
                risk = %record.risk_level,
                "action blocked: {}",
                alert.as_deref().unwrap_or("no alert")
            ),
            (Outcome::Allowed, Some(alert)) => info!(
                sequence = record.sequence,
                actor,
                action,
                resource,
                risk = %record.risk_level,
                "action flagged: {}",
                alert
            ),
            (Outcome::Allowed, None) => {
                debug!(sequence = record.sequence, actor, action, resource, "action allowed")
            }
        }

        record
    }

    /// Aggregate counters, score and most recent alerts
    pub fn aggregate(&self) -> SecurityPosture {
        let log = self.lock();
        SecurityPosture {
            total_events: log.len(),
            blocked_actions: log.blocked(),
            security_score: log.security_score(),
            active_alerts: log.recent_alerts().map(SecurityAlert::from_record).collect(),
        }
    }

    pub fn validate_actor_behavior(&self, actor: &str) -> BehaviorAssessment {
        let stats = self.lock().actor_stats(actor);
        self.limits.classify(actor, stats)
    }

    /// Classify an actor over records replayed from a sink, using this
    /// monitor's thresholds.
    pub fn assess_records(&self, records: &[AuditRecord], actor: &str) -> BehaviorAssessment {
        self.limits.classify(actor, ActorStats::from_records(records, actor))
    }

    /// Snapshot of the whole trail
    pub fn records(&self) -> Vec<AuditRecord> {
        self.lock().snapshot()
    }

    pub fn records_for(&self, actor: &str) -> Vec<AuditRecord> {
        self.lock().snapshot_for(actor)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ActionMonitor {
    fn default() -> Self {
        Self::new(
            CapabilityRegistry::default(),
            AnomalyRuleSet::default(),
            MonitorLimits::default(),
        )
    }
}
