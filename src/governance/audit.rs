//! Append-only audit trail

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Governance decision for one action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Allowed,
    Blocked,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Allowed => write!(f, "allowed"),
            Outcome::Blocked => write!(f, "blocked"),
        }
    }
}

/// Risk attached to a governed action
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Score penalty for a blocked action at this level
    pub fn weight(&self) -> f64 {
        match self {
            RiskLevel::Low => 0.3,
            RiskLevel::Medium => 0.6,
            RiskLevel::High => 1.0,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// Penalty for an allowed action that still raised an alert
const FLAGGED_ALLOWED_PENALTY: f64 = 0.2;

/// Evaluated outcome before it is sequenced into the trail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub outcome: Outcome,
    pub risk_level: RiskLevel,
    pub alert: Option<String>,
}

impl Verdict {
    pub fn allowed() -> Self {
        Self {
            outcome: Outcome::Allowed,
            risk_level: RiskLevel::Low,
            alert: None,
        }
    }

    pub fn unauthorized(actor: &str, action: &str) -> Self {
        Self {
            outcome: Outcome::Blocked,
            risk_level: RiskLevel::High,
            alert: Some(format!("Unauthorized action: {} attempted {}", actor, action)),
        }
    }
}

/// Immutable, sequence-numbered audit entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub action: String,
    pub resource: String,
    pub outcome: Outcome,
    pub risk_level: RiskLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
}

impl AuditRecord {
    pub fn is_blocked(&self) -> bool {
        self.outcome == Outcome::Blocked
    }

    fn penalty(&self) -> f64 {
        match (self.outcome, &self.alert) {
            (Outcome::Blocked, _) => self.risk_level.weight(),
            (Outcome::Allowed, Some(_)) => FLAGGED_ALLOWED_PENALTY,
            (Outcome::Allowed, None) => 0.0,
        }
    }
}

/// Per-actor counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActorStats {
    pub total: usize,
    pub blocked: usize,
}

impl ActorStats {
    /// Counters for one actor over a replayed trail
    pub fn from_records(records: &[AuditRecord], actor: &str) -> Self {
        records
            .iter()
            .filter(|r| r.actor == actor)
            .fold(Self::default(), |mut stats, r| {
                stats.total += 1;
                stats.blocked += usize::from(r.is_blocked());
                stats
            })
    }
}

/// The trail plus counters derived from it.
///
/// Only reachable through the monitor's lock; callers get clones.
#[derive(Debug)]
pub(crate) struct AuditLog {
    records: Vec<AuditRecord>,
    blocked: usize,
    penalty: f64,
    actors: HashMap<String, ActorStats>,
    /// Indices of the latest alerting records, oldest first
    recent_alerts: VecDeque<usize>,
    alert_history: usize,
}

impl AuditLog {
    pub(crate) fn new(alert_history: usize) -> Self {
        Self {
            records: Vec::new(),
            blocked: 0,
            penalty: 0.0,
            actors: HashMap::new(),
            recent_alerts: VecDeque::with_capacity(alert_history),
            alert_history,
        }
    }

    /// Sequence, stamp and push; counters are updated in the same step.
    pub(crate) fn append(
        &mut self,
        actor: &str,
        action: &str,
        resource: &str,
        verdict: Verdict,
    ) -> &AuditRecord {
        let record = AuditRecord {
            sequence: self.records.len() as u64 + 1,
            timestamp: Utc::now(),
            actor: actor.to_string(),
            action: action.to_string(),
            resource: resource.to_string(),
            outcome: verdict.outcome,
            risk_level: verdict.risk_level,
            alert: verdict.alert,
        };

        let stats = self.actors.entry(record.actor.clone()).or_default();
        stats.total += 1;
        if record.is_blocked() {
            stats.blocked += 1;
            self.blocked += 1;
        }
        self.penalty += record.penalty();

        let index = self.records.len();
        if record.alert.is_some() && self.alert_history > 0 {
            if self.recent_alerts.len() == self.alert_history {
                self.recent_alerts.pop_front();
            }
            self.recent_alerts.push_back(index);
        }

        self.records.push(record);
        &self.records[index]
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn blocked(&self) -> usize {
        self.blocked
    }

    pub(crate) fn actor_stats(&self, actor: &str) -> ActorStats {
        self.actors.get(actor).copied().unwrap_or_default()
    }

    /// 0-100; an empty trail is a perfect score
    pub(crate) fn security_score(&self) -> u8 {
        if self.records.is_empty() {
            return 100;
        }
        let score = 100.0 * (1.0 - self.penalty / self.records.len() as f64);
        score.clamp(0.0, 100.0).round() as u8
    }

    /// Newest first
    pub(crate) fn recent_alerts(&self) -> impl Iterator<Item = &AuditRecord> {
        self.recent_alerts.iter().rev().map(|&i| &self.records[i])
    }

    pub(crate) fn snapshot(&self) -> Vec<AuditRecord> {
        self.records.clone()
    }

    pub(crate) fn snapshot_for(&self, actor: &str) -> Vec<AuditRecord> {
        self.records
            .iter()
            .filter(|r| r.actor == actor)
            .cloned()
            .collect()
    }
}
