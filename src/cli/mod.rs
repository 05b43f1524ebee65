//! RoadIQ CLI
//!
//! Commands:
//! - `roadiq assess <ids..>` - Run the decision pipeline per vehicle
//! - `roadiq dashboard` - Fleet overview and manufacturing quality
//! - `roadiq schedule <id>` - Book a service appointment
//! - `roadiq quality` - Recall and quality alerts for the manufacturer
//! - `roadiq security` - Security posture (optionally after assessments)
//! - `roadiq audit` - Persisted audit trail and per-actor behavior
//! - `roadiq record` - Report a single action to the monitor
//! - `roadiq ask <question..>` - Customer Q&A

mod report;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

use crate::agents::Urgency;
use crate::config::AppConfig;
use crate::governance::{ActionMonitor, AuditRecord, BehaviorAssessment, JsonlAuditSink};
use crate::orchestrator::{bootstrap, MasterOrchestrator};

/// RoadIQ predictive maintenance with a governed agent pipeline
#[derive(Parser, Debug)]
#[command(name = "roadiq")]
#[command(author, version, about = "Predictive maintenance with governed agent actions")]
pub struct Cli {
    /// Configuration directory (default.toml, {ROADIQ_ENV}.toml)
    #[arg(long, global = true, default_value = "config", env = "ROADIQ_CONFIG_DIR")]
    pub config_dir: PathBuf,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the decision pipeline for one or more vehicles
    Assess {
        #[arg(required = true)]
        vehicle_ids: Vec<String>,
    },

    /// Fleet overview, manufacturing quality and system status
    Dashboard,

    /// Book a service appointment
    Schedule {
        vehicle_id: String,

        /// low, medium, high or critical
        #[arg(short, long, default_value = "medium")]
        urgency: Urgency,
    },

    /// Recall and quality alerts for batches with elevated failure rates
    Quality,

    /// Show the security posture
    Security {
        /// Assess these vehicles first
        #[arg(long, value_delimiter = ',')]
        assess: Vec<String>,
    },

    /// Show the audit trail persisted by the JSONL sink
    Audit {
        /// Only records for this actor, plus its behavior assessment
        #[arg(long)]
        actor: Option<String>,

        /// Number of most recent records to show
        #[arg(short = 'n', long, default_value = "50")]
        tail: usize,
    },

    /// Report one action to the monitor and show the verdict
    Record {
        actor: String,
        action: String,
        resource: String,
    },

    /// Ask the customer assistant a question
    Ask {
        #[arg(required = true)]
        question: Vec<String>,
    },
}

impl Cli {
    pub fn load_config(&self) -> Result<AppConfig> {
        AppConfig::load_from(&self.config_dir).with_context(|| {
            format!(
                "failed to load configuration from {}",
                self.config_dir.display()
            )
        })
    }

    /// Run the command, then drain queued notifications.
    ///
    /// The pipeline is synchronous, so the command runs on the blocking
    /// pool and leaves the runtime free for the dispatcher and signals.
    pub async fn run(self, config: AppConfig) -> Result<()> {
        let orch = Arc::new(bootstrap(&config)?);
        let Cli { command, json, .. } = self;

        let worker = orch.clone();
        let outcome = tokio::task::spawn_blocking(move || command.execute(&worker, &config, json))
            .await
            .context("command task failed")?;
        orch.dispatcher().shutdown().await;

        let stats = orch.dispatcher().stats();
        if stats.failed > 0 {
            warn!(failed = stats.failed, "some notifications could not be delivered");
        }
        outcome
    }
}

impl Commands {
    fn execute(self, orch: &MasterOrchestrator, config: &AppConfig, json: bool) -> Result<()> {
        match self {
            Self::Assess { vehicle_ids } => {
                let results: Vec<_> = vehicle_ids
                    .iter()
                    .map(|id| orch.run_assessment(id))
                    .collect();
                emit(json, &results, || results.iter().for_each(report::pipeline))
            }
            Self::Dashboard => {
                let data = orch.dashboard();
                emit(json, &data, || report::dashboard(&data))
            }
            Self::Schedule {
                vehicle_id,
                urgency,
            } => {
                let booking = orch.schedule_service(&vehicle_id, urgency);
                emit(json, &booking, || report::booking(&booking))
            }
            Self::Quality => {
                let alerts = orch.manufacturer_alerts();
                emit(json, &alerts, || report::manufacturer_alerts(&alerts))
            }
            Self::Security { assess } => {
                for id in &assess {
                    orch.run_assessment(id);
                }
                let posture = orch.security_posture();
                emit(json, &posture, || report::posture(&posture))
            }
            Self::Audit { actor, tail } => {
                let Some(path) = &config.governance.audit_log_path else {
                    anyhow::bail!("governance.audit_log_path is not configured; no persisted trail to show");
                };
                let view = AuditView::load(path, orch.monitor(), actor.as_deref(), tail)?;
                emit(json, &view, || report::audit(&view.records, view.behavior.as_ref()))
            }
            Self::Record {
                actor,
                action,
                resource,
            } => {
                let record = orch.record(&actor, &action, &resource);
                emit(json, &record, || report::record(&record))
            }
            Self::Ask { question } => {
                let reply = orch.answer_query(&question.join(" "));
                emit(json, &reply, || report::reply(&reply))
            }
        }
    }
}

/// Persisted trail, optionally narrowed to one actor
#[derive(Debug, Serialize)]
struct AuditView {
    records: Vec<AuditRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    behavior: Option<BehaviorAssessment>,
}

impl AuditView {
    /// The behavior assessment covers the actor's whole persisted history,
    /// not only the `tail` records shown.
    fn load(path: &Path, monitor: &ActionMonitor, actor: Option<&str>, tail: usize) -> Result<Self> {
        let mut records = if path.exists() {
            JsonlAuditSink::read_all(path)
                .with_context(|| format!("failed to read {}", path.display()))?
        } else {
            Vec::new()
        };
        if let Some(actor) = actor {
            records.retain(|r| r.actor == actor);
        }
        let behavior = actor.map(|a| monitor.assess_records(&records, a));

        let skip = records.len().saturating_sub(tail);
        Ok(Self {
            records: records.split_off(skip),
            behavior,
        })
    }
}

fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce()) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        human();
    }
    Ok(())
}
