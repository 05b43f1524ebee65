//! Decision pipeline
//!
//! Sequences the leaf agents for one vehicle, reporting every step to the
//! action monitor. Governance is observational: a BLOCKED record is logged
//! and audited but never halts the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::agents::{
    Booking, CustomerEngager, Diagnosis, Engagement, FailureDiagnoser, FleetOverview,
    ManufacturerAlert, PatternLogOutcome, PatternLogger, QualityInsights, QueryReply, RiskAssessment, RiskAssessor,
    ServiceScheduler, Urgency,
};
use crate::governance::actors::{self, actions, batch_resource, vehicle_resource};
use crate::governance::{ActionMonitor, AuditRecord, SecurityPosture};
use crate::notify::{Emotion, NotificationDispatcher};

/// Agents reported on the dashboard (six pipeline agents plus the monitor)
pub const ACTIVE_AGENTS: u32 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub vehicle_id: String,
    pub risk_assessment: RiskAssessment,
    pub diagnosis: Option<Diagnosis>,
    pub pattern_log: Option<PatternLogOutcome>,
    pub customer_engagement: Option<Engagement>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardData {
    pub fleet_overview: FleetOverview,
    pub manufacturing_quality: QualityInsights,
    pub system_status: String,
    pub active_agents: u32,
}

/// The leaf agents the pipeline drives
#[derive(Clone)]
pub struct LeafAgents {
    pub risk: Arc<dyn RiskAssessor>,
    pub diagnosis: Arc<dyn FailureDiagnoser>,
    pub manufacturing: Arc<dyn PatternLogger>,
    pub customer: Arc<dyn CustomerEngager>,
    pub scheduling: Arc<dyn ServiceScheduler>,
}

/// Notification tone for a diagnosis urgency
pub fn emotion_for(urgency: Urgency) -> Emotion {
    match urgency {
        Urgency::Critical | Urgency::High => Emotion::Urgent,
        Urgency::Medium => Emotion::Professional,
        Urgency::Low => Emotion::Calm,
    }
}

pub struct MasterOrchestrator {
    monitor: Arc<ActionMonitor>,
    agents: LeafAgents,
    dispatcher: NotificationDispatcher,
}

impl MasterOrchestrator {
    pub fn new(
        monitor: Arc<ActionMonitor>,
        agents: LeafAgents,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            monitor,
            agents,
            dispatcher,
        }
    }

    pub fn monitor(&self) -> &Arc<ActionMonitor> {
        &self.monitor
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    /// Report an action to the monitor
    pub fn record(&self, actor: &str, action: &str, resource: &str) -> AuditRecord {
        self.monitor.record(actor, action, resource)
    }

    /// Full assessment for one vehicle.
    ///
    /// Diagnosis, pattern logging and engagement only run for MEDIUM or
    /// HIGH risk. A diagnosis produces exactly one notification.
    #[instrument(skip(self))]
    pub fn run_assessment(&self, vehicle_id: &str) -> PipelineResult {
        let resource = vehicle_resource(vehicle_id);

        self.record(actors::MASTER_AGENT, actions::ANALYZE_VEHICLE, &resource);

        self.record(actors::DATA_AGENT, actions::READ_SENSOR_DATA, &resource);
        let risk_assessment = self.agents.risk.assess(vehicle_id);

        let mut result = PipelineResult {
            vehicle_id: vehicle_id.to_string(),
            risk_assessment,
            diagnosis: None,
            pattern_log: None,
            customer_engagement: None,
            timestamp: Utc::now(),
        };

        if result.risk_assessment.level.is_elevated() {
            self.record(actors::DIAGNOSIS_AGENT, actions::PREDICT_FAILURE, &resource);
            let diagnosis = self.agents.diagnosis.diagnose(vehicle_id);

            self.record(
                actors::MANUFACTURING_AGENT,
                actions::LOG_FAILURE_PATTERN,
                &resource,
            );
            let pattern_log = self.agents.manufacturing.log_pattern(vehicle_id, &diagnosis);

            self.record(actors::CUSTOMER_AGENT, actions::ENGAGE_CUSTOMER, &resource);
            let engagement = self.agents.customer.engage(vehicle_id, &diagnosis);

            self.notify(&engagement.voice_message, emotion_for(diagnosis.urgency));

            result.diagnosis = Some(diagnosis);
            result.pattern_log = Some(pattern_log);
            result.customer_engagement = Some(engagement);
        }

        info!(
            vehicle_id,
            level = %result.risk_assessment.level,
            score = result.risk_assessment.score,
            diagnosed = result.diagnosis.is_some(),
            "assessment complete"
        );
        result
    }

    pub fn dashboard(&self) -> DashboardData {
        self.record(actors::MASTER_AGENT, actions::GET_DASHBOARD_DATA, "dashboard");

        DashboardData {
            fleet_overview: self.agents.risk.fleet_overview(),
            manufacturing_quality: self.agents.manufacturing.quality_insights(),
            system_status: "Operational".to_string(),
            active_agents: ACTIVE_AGENTS,
        }
    }

    pub fn schedule_service(&self, vehicle_id: &str, urgency: Urgency) -> Booking {
        self.record(
            actors::SCHEDULING_AGENT,
            actions::BOOK_SERVICE,
            &vehicle_resource(vehicle_id),
        );
        self.agents.scheduling.book_service(vehicle_id, urgency)
    }

    /// Recall and quality alerts for the manufacturer, one per batch over
    /// threshold. Each alert is audited against its batch and spoken.
    pub fn manufacturer_alerts(&self) -> Vec<ManufacturerAlert> {
        self.record(
            actors::MANUFACTURING_AGENT,
            actions::GENERATE_REPORTS,
            "quality_insights",
        );
        let insights = self.agents.manufacturing.quality_insights();
        let alerts = self.agents.customer.manufacturer_alerts(&insights);

        for alert in &alerts {
            self.record(
                actors::CUSTOMER_AGENT,
                actions::NOTIFY_MANUFACTURER,
                &batch_resource(&alert.batch_id),
            );
            self.notify(&alert.voice_message, emotion_for(alert.priority));
        }

        info!(
            batches = insights.total_batches,
            alerts = alerts.len(),
            "manufacturer alerts generated"
        );
        alerts
    }

    pub fn security_posture(&self) -> SecurityPosture {
        self.monitor.aggregate()
    }

    /// Answer a customer question; the reply is also spoken
    pub fn answer_query(&self, text: &str) -> QueryReply {
        self.record(actors::CUSTOMER_AGENT, actions::ANSWER_QUERY, "customer_query");
        let reply = self.agents.customer.answer_query(text);
        self.notify(&reply.answer, reply.emotion);
        reply
    }

    fn notify(&self, text: &str, emotion: Emotion) {
        if let Err(e) = self.dispatcher.submit(text, emotion) {
            warn!(error = %e, "notification not queued");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{
        AssessmentLevel, BookingPriority, Component, QualityTrend, SchedulingAgent,
    };
    use crate::error::Result;
    use crate::governance::{Outcome, RiskLevel};
    use crate::notify::{NotificationBackend, NotificationTask};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    struct FixedRisk(AssessmentLevel, f64);

    impl RiskAssessor for FixedRisk {
        fn assess(&self, _vehicle_id: &str) -> RiskAssessment {
            RiskAssessment {
                level: self.0,
                score: self.1,
                factors: vec![],
                engine_temp: None,
                vibration: None,
                battery: None,
            }
        }

        fn fleet_overview(&self) -> FleetOverview {
            FleetOverview {
                total_vehicles: 3,
                ..FleetOverview::default()
            }
        }
    }

    struct FixedDiagnosis(f64);

    impl FailureDiagnoser for FixedDiagnosis {
        fn diagnose(&self, _vehicle_id: &str) -> Diagnosis {
            Diagnosis::new(Component::BrakeSystem, self.0)
        }
    }

    struct NoBatches;

    impl PatternLogger for NoBatches {
        fn log_pattern(&self, _vehicle_id: &str, _diagnosis: &Diagnosis) -> PatternLogOutcome {
            PatternLogOutcome::Error {
                message: "Vehicle not found".into(),
            }
        }

        fn quality_insights(&self) -> QualityInsights {
            QualityInsights {
                batch_summary: BTreeMap::new(),
                total_batches: 0,
                quality_trend: QualityTrend::Stable,
            }
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(String, Emotion)>>);

    #[async_trait]
    impl NotificationBackend for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn deliver(&self, task: &NotificationTask) -> Result<()> {
            self.0.lock().unwrap().push((task.text.clone(), task.emotion));
            Ok(())
        }
    }

    fn orchestrator(level: AssessmentLevel, probability: f64) -> (MasterOrchestrator, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let agents = LeafAgents {
            risk: Arc::new(FixedRisk(level, probability)),
            diagnosis: Arc::new(FixedDiagnosis(probability)),
            manufacturing: Arc::new(NoBatches),
            customer: Arc::new(crate::agents::CustomerAgent::new(Some(9))),
            scheduling: Arc::new(SchedulingAgent::new(Some(9))),
        };
        let dispatcher = NotificationDispatcher::spawn(recorder.clone());
        (
            MasterOrchestrator::new(Arc::new(ActionMonitor::default()), agents, dispatcher),
            recorder,
        )
    }

    #[test]
    fn test_emotion_for_urgency() {
        assert_eq!(emotion_for(Urgency::Critical), Emotion::Urgent);
        assert_eq!(emotion_for(Urgency::High), Emotion::Urgent);
        assert_eq!(emotion_for(Urgency::Medium), Emotion::Professional);
        assert_eq!(emotion_for(Urgency::Low), Emotion::Calm);
    }

    #[tokio::test]
    async fn test_elevated_risk_runs_every_stage() {
        let (orch, recorder) = orchestrator(AssessmentLevel::Medium, 0.55);
        let result = orch.run_assessment("V010");

        assert!(result.diagnosis.is_some());
        assert!(result.pattern_log.is_some());
        assert!(result.customer_engagement.is_some());

        let actions: Vec<String> = orch
            .monitor()
            .records()
            .into_iter()
            .map(|r| r.action)
            .collect();
        assert_eq!(
            actions,
            vec![
                "analyze_vehicle",
                "read_sensor_data",
                "predict_failure",
                "log_failure_pattern",
                "engage_customer"
            ]
        );

        orch.dispatcher().shutdown().await;
        let delivered = recorder.0.lock().unwrap().clone();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].1, Emotion::Professional);
    }

    #[tokio::test]
    async fn test_unknown_risk_skips_diagnosis() {
        let (orch, recorder) = orchestrator(AssessmentLevel::Unknown, 0.0);
        let result = orch.run_assessment("V404");
        assert!(result.diagnosis.is_none());
        assert_eq!(orch.monitor().len(), 2);

        orch.dispatcher().shutdown().await;
        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_does_not_fail_run() {
        let (orch, _recorder) = orchestrator(AssessmentLevel::High, 0.9);
        orch.dispatcher().shutdown().await;

        let result = orch.run_assessment("V001");
        assert!(result.customer_engagement.is_some());
        assert_eq!(orch.dispatcher().stats().submitted, 0);
    }

    #[tokio::test]
    async fn test_dashboard_and_schedule_are_audited() {
        let (orch, _recorder) = orchestrator(AssessmentLevel::Low, 0.1);

        let dashboard = orch.dashboard();
        assert_eq!(dashboard.active_agents, 7);
        assert_eq!(dashboard.system_status, "Operational");
        assert_eq!(dashboard.fleet_overview.total_vehicles, 3);

        let booking = orch.schedule_service("V002", Urgency::Critical);
        assert_eq!(booking.priority, BookingPriority::Emergency);

        let records = orch.monitor().records();
        assert_eq!(records[0].resource, "dashboard");
        assert_eq!(records[1].actor, "SchedulingAgent");
        assert_eq!(records[1].resource, "vehicle_V002");
        assert!(records.iter().all(|r| r.outcome == Outcome::Allowed));

        orch.dispatcher().shutdown().await;
    }

    #[tokio::test]
    async fn test_answer_query_is_spoken() {
        let (orch, recorder) = orchestrator(AssessmentLevel::Low, 0.1);
        let reply = orch.answer_query("how much does it cost");
        assert_eq!(reply.emotion, Emotion::Professional);

        let posture = orch.security_posture();
        assert_eq!(posture.total_events, 1);
        assert_eq!(posture.security_score, 100);

        orch.dispatcher().shutdown().await;
        let delivered = recorder.0.lock().unwrap().clone();
        assert_eq!(delivered, vec![(reply.answer, Emotion::Professional)]);
    }

    #[tokio::test]
    async fn test_manufacturer_alerts_are_audited_and_spoken() {
        use crate::agents::fleet::testing::{store_with, vehicle};
        use crate::agents::{CustomerAgent, ManufacturerAlertKind, ManufacturingAgent};

        let recorder = Arc::new(Recorder::default());
        let store = store_with(&[
            vehicle("V001", 0.9, "brake_system", "BATCH_A1"),
            vehicle("V002", 0.8, "brake_system", "BATCH_A1"),
            vehicle("V003", 0.6, "engine", "BATCH_B2"),
            vehicle("V004", 0.1, "engine", "BATCH_C3"),
        ]);
        let agents = LeafAgents {
            risk: Arc::new(FixedRisk(AssessmentLevel::Low, 0.1)),
            diagnosis: Arc::new(FixedDiagnosis(0.1)),
            manufacturing: Arc::new(ManufacturingAgent::new(store)),
            customer: Arc::new(CustomerAgent::new(Some(3))),
            scheduling: Arc::new(SchedulingAgent::new(Some(3))),
        };
        let orch = MasterOrchestrator::new(
            Arc::new(ActionMonitor::default()),
            agents,
            NotificationDispatcher::spawn(recorder.clone()),
        );

        let alerts = orch.manufacturer_alerts();
        let kinds: Vec<_> = alerts.iter().map(|a| (a.batch_id.as_str(), a.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("BATCH_A1", ManufacturerAlertKind::RecallAlert),
                ("BATCH_B2", ManufacturerAlertKind::QualityAlert),
            ]
        );

        let records = orch.monitor().records();
        let trail: Vec<_> = records
            .iter()
            .map(|r| (r.actor.as_str(), r.action.as_str(), r.resource.as_str()))
            .collect();
        assert_eq!(
            trail,
            vec![
                ("ManufacturingAgent", "generate_reports", "quality_insights"),
                ("CustomerAgent", "notify_manufacturer", "batch_BATCH_A1"),
                ("CustomerAgent", "notify_manufacturer", "batch_BATCH_B2"),
            ]
        );
        assert!(records.iter().all(|r| r.outcome == Outcome::Allowed));

        orch.dispatcher().shutdown().await;
        let delivered = recorder.0.lock().unwrap().clone();
        assert_eq!(delivered.len(), 2);
        assert_eq!(delivered[0], (alerts[0].voice_message.clone(), Emotion::Urgent));
        assert_eq!(delivered[1].1, Emotion::Urgent);
    }

    #[tokio::test]
    async fn test_blocked_step_does_not_halt_pipeline() {
        let recorder = Arc::new(Recorder::default());
        let registry = crate::governance::CapabilityRegistry::from_grants(vec![
            crate::governance::CapabilityGrant::all("MasterAgent"),
            crate::governance::CapabilityGrant::new("DataAgent", ["read_sensor_data"]),
        ])
        .unwrap();
        let monitor = ActionMonitor::new(
            registry,
            crate::governance::AnomalyRuleSet::empty(),
            Default::default(),
        );
        let agents = LeafAgents {
            risk: Arc::new(FixedRisk(AssessmentLevel::High, 0.9)),
            diagnosis: Arc::new(FixedDiagnosis(0.9)),
            manufacturing: Arc::new(NoBatches),
            customer: Arc::new(crate::agents::CustomerAgent::new(Some(1))),
            scheduling: Arc::new(SchedulingAgent::new(Some(1))),
        };
        let orch = MasterOrchestrator::new(
            Arc::new(monitor),
            agents,
            NotificationDispatcher::spawn(recorder.clone()),
        );

        let result = orch.run_assessment("V001");
        assert!(result.customer_engagement.is_some());

        let posture = orch.security_posture();
        assert_eq!(posture.total_events, 5);
        assert_eq!(posture.blocked_actions, 3);
        assert!(orch
            .monitor()
            .records()
            .iter()
            .filter(|r| r.is_blocked())
            .all(|r| r.risk_level == RiskLevel::High));

        orch.dispatcher().shutdown().await;
        assert_eq!(recorder.0.lock().unwrap().len(), 1);
    }
}
