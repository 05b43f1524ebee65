//! Customer engagement scripts, Q&A and manufacturer quality alerts

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

use super::manufacturing::{BatchSummary, QualityInsights};
use super::traits::CustomerEngager;
use super::types::{title_case, Component, Diagnosis, Urgency};
use crate::notify::Emotion;

/// Static text blocks of one conversation flow
struct ConversationFlow {
    alert: &'static str,
    explanation: &'static str,
    consequences: &'static str,
    solution: &'static str,
    urgency: &'static str,
    concerns: [&'static str; 3],
}

fn flow_for(component: Component) -> ConversationFlow {
    match component {
        Component::BrakeSystem => ConversationFlow {
            alert: "URGENT SAFETY ALERT: Your vehicle's brake system shows 78% failure probability within 7 days.",
            explanation: "Our AI detected excessive brake pad wear and reduced fluid pressure. This could lead to complete brake failure.",
            consequences: "Without immediate service, you risk accidents, injury, and costly emergency repairs up to $2000.",
            solution: "We can schedule emergency service today at our certified center. This 2-hour service costs only $300.",
            urgency: "Critical - Schedule within 24 hours",
            concerns: ["Safety for family", "Cost of repair", "Time without vehicle"],
        },
        Component::Engine => ConversationFlow {
            alert: "ENGINE WARNING: Overheating detected with 92% failure risk.",
            explanation: "Temperature sensors show your engine running 15 degrees above normal. Coolant system may be compromised.",
            consequences: "Engine seizure could occur, resulting in $5000-8000 replacement costs and roadside breakdown.",
            solution: "Immediate cooling system inspection and repair. Estimated cost $400-600.",
            urgency: "Critical - Stop driving, schedule today",
            concerns: ["Reliability", "Warranty coverage", "Towing costs"],
        },
        Component::Suspension => ConversationFlow {
            alert: "COMFORT AND SAFETY NOTICE: Suspension system degradation detected.",
            explanation: "Shock absorbers and springs show 85% wear. Vehicle stability and ride quality are compromised.",
            consequences: "Poor handling, tire wear, and potential loss of control in emergency situations.",
            solution: "Suspension service recommended within 2 weeks. Cost estimate $800-1200.",
            urgency: "High - Schedule within 14 days",
            concerns: ["Ride comfort", "Tire replacement", "Handling safety"],
        },
        Component::Transmission => ConversationFlow {
            alert: "TRANSMISSION ADVISORY: Performance degradation detected.",
            explanation: "Fluid analysis shows contamination. Gear shifting may become erratic.",
            consequences: "Complete transmission failure could cost $3000-5000 for replacement.",
            solution: "Transmission service and fluid replacement. Preventive cost $200-400.",
            urgency: "Medium - Schedule within 30 days",
            concerns: ["Repair vs replace", "Warranty options", "Alternative transportation"],
        },
        Component::Unknown => ConversationFlow {
            alert: "MAINTENANCE REQUIRED: Your vehicle needs attention.",
            explanation: "Our diagnostic systems detected component wear beyond normal parameters.",
            consequences: "Continued operation may result in unexpected breakdowns and higher repair costs.",
            solution: "Schedule preventive maintenance to avoid costly repairs.",
            urgency: "Medium - Schedule within 30 days",
            concerns: ["General maintenance", "Cost concerns", "Scheduling"],
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationScript {
    pub greeting: String,
    pub alert: String,
    pub explanation: String,
    pub consequences: String,
    pub solution: String,
    pub urgency: String,
    pub closing: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Engagement {
    pub vehicle_id: String,
    pub conversation: ConversationScript,
    pub accepted: bool,
    pub preferred_time: String,
    pub contact_method: String,
    pub customer_concerns: Vec<String>,
    pub follow_up_needed: bool,
    /// Spoken summary handed to the notification dispatcher
    pub voice_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    pub answer: String,
    pub emotion: Emotion,
}

struct QaEntry {
    key: &'static str,
    keywords: [&'static str; 2],
    question: &'static str,
    answer: &'static str,
    emotion: Emotion,
}

const QA_TABLE: [QaEntry; 6] = [
    QaEntry {
        key: "1",
        keywords: ["health", "status"],
        question: "What's my vehicle health?",
        answer: "Your vehicle V001 shows brake system failure risk of 78%. Immediate service recommended within 24 hours.",
        emotion: Emotion::Urgent,
    },
    QaEntry {
        key: "2",
        keywords: ["cost", "price"],
        question: "How much will repairs cost?",
        answer: "Brake service costs 300 dollars preventive, or up to 2000 dollars if emergency repairs are needed.",
        emotion: Emotion::Professional,
    },
    QaEntry {
        key: "3",
        keywords: ["schedule", "book"],
        question: "When can I schedule service?",
        answer: "Available today at Downtown Service Center: 9 AM, 11 AM, 2 PM, or 4 PM.",
        emotion: Emotion::Calm,
    },
    QaEntry {
        key: "4",
        keywords: ["safe", "drive"],
        question: "Is it safe to drive?",
        answer: "With 78% brake failure risk, limit driving to essential trips only. Schedule service immediately.",
        emotion: Emotion::Urgent,
    },
    QaEntry {
        key: "5",
        keywords: ["cause", "why"],
        question: "What caused the problem?",
        answer: "AI detected brake pad wear and fluid pressure issues from normal wear over 45,000 miles.",
        emotion: Emotion::Professional,
    },
    QaEntry {
        key: "6",
        keywords: ["warranty", "coverage"],
        question: "Is my vehicle under warranty?",
        answer: "Yes, your 3-year warranty is active until December 2025. This repair should be fully covered.",
        emotion: Emotion::Calm,
    },
];

const DEFAULT_ANSWER: &str =
    "I can help with vehicle health, repair costs, or scheduling. What do you need?";

/// Batch failure rate above which a recall is recommended
pub const RECALL_THRESHOLD: f64 = 0.7;
/// Batch failure rate above which the manufacturer gets a quality alert
pub const QUALITY_ALERT_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManufacturerAlertKind {
    RecallAlert,
    QualityAlert,
}

/// Quality feedback for the manufacturer about one production batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufacturerAlert {
    #[serde(rename = "type")]
    pub kind: ManufacturerAlertKind,
    pub priority: Urgency,
    pub batch_id: String,
    pub message: String,
    pub voice_message: String,
    pub timestamp: DateTime<Utc>,
}

impl ManufacturerAlert {
    fn for_batch(batch_id: &str, summary: &BatchSummary) -> Option<Self> {
        let rate = summary.avg_failure_risk;
        let (kind, priority, message) = if rate > RECALL_THRESHOLD {
            (
                ManufacturerAlertKind::RecallAlert,
                Urgency::Critical,
                format!(
                    "RECALL RECOMMENDED: Batch {}, {} vehicles affected. Immediate supplier investigation required.",
                    batch_id, summary.count
                ),
            )
        } else if rate > QUALITY_ALERT_THRESHOLD {
            (
                ManufacturerAlertKind::QualityAlert,
                Urgency::High,
                format!(
                    "Manufacturing Quality Alert: Batch {} shows {}% failure rate in {}.",
                    batch_id,
                    (rate * 100.0) as u32,
                    title_case(&summary.common_component)
                ),
            )
        } else {
            return None;
        };

        Some(Self {
            kind,
            priority,
            batch_id: batch_id.to_string(),
            message,
            voice_message: manufacturer_voice_message(kind, batch_id),
            timestamp: Utc::now(),
        })
    }
}

pub fn manufacturer_voice_message(kind: ManufacturerAlertKind, batch_id: &str) -> String {
    match kind {
        ManufacturerAlertKind::RecallAlert => format!(
            "URGENT: Batch {} requires immediate recall. Multiple vehicle failures detected. Initiate supplier investigation and customer notification protocol.",
            batch_id
        ),
        ManufacturerAlertKind::QualityAlert => format!(
            "Quality Alert: Batch {} showing elevated failure rates. Recommend enhanced quality control and supplier audit.",
            batch_id
        ),
    }
}

/// One alert per batch whose mean failure risk crosses a threshold, in
/// batch id order.
pub fn manufacturer_alerts(insights: &QualityInsights) -> Vec<ManufacturerAlert> {
    insights
        .batch_summary
        .iter()
        .filter_map(|(batch_id, summary)| ManufacturerAlert::for_batch(batch_id, summary))
        .collect()
}

pub struct CustomerAgent {
    rng: Mutex<StdRng>,
}

impl CustomerAgent {
    /// A fixed seed makes acceptance sampling reproducible
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Spoken summary of a diagnosis: the measured figures first, then the
    /// component's explanation and proposed fix.
    pub fn voice_message(vehicle_id: &str, diagnosis: &Diagnosis) -> String {
        let flow = flow_for(diagnosis.category);
        let subject = match diagnosis.category {
            Component::Unknown => "component",
            other => other.display_name(),
        };
        format!(
            "Vehicle {}: {:.0}% {} failure risk, {} urgency. {} {}",
            vehicle_id,
            diagnosis.probability * 100.0,
            subject.to_lowercase(),
            diagnosis.urgency,
            flow.explanation,
            flow.solution
        )
    }

    fn acceptance_probability(urgency: Urgency) -> f64 {
        match urgency {
            Urgency::Critical => 0.95,
            Urgency::High => 0.8,
            Urgency::Medium | Urgency::Low => 0.6,
        }
    }
}

impl CustomerEngager for CustomerAgent {
    fn engage(&self, vehicle_id: &str, diagnosis: &Diagnosis) -> Engagement {
        let flow = flow_for(diagnosis.category);
        let conversation = ConversationScript {
            greeting: format!(
                "Hello, this is RoadIQ AI calling about your vehicle {}.",
                vehicle_id
            ),
            alert: flow.alert.to_string(),
            explanation: flow.explanation.to_string(),
            consequences: flow.consequences.to_string(),
            solution: flow.solution.to_string(),
            urgency: flow.urgency.to_string(),
            closing: "Would you like me to schedule this service immediately? I can book the nearest available slot.".to_string(),
        };

        let roll: f64 = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen();
        let accepted = roll < Self::acceptance_probability(diagnosis.urgency);

        Engagement {
            vehicle_id: vehicle_id.to_string(),
            conversation,
            accepted,
            preferred_time: if accepted { "Morning" } else { "Afternoon" }.to_string(),
            contact_method: "voice_call".to_string(),
            customer_concerns: flow.concerns.iter().map(|c| c.to_string()).collect(),
            follow_up_needed: !accepted,
            voice_message: Self::voice_message(vehicle_id, diagnosis),
        }
    }

    /// Menu number or keyword lookup
    fn answer_query(&self, text: &str) -> QueryReply {
        let text = text.trim().to_lowercase();

        let entry = QA_TABLE
            .iter()
            .find(|e| e.key == text)
            .or_else(|| {
                QA_TABLE
                    .iter()
                    .find(|e| e.keywords.iter().any(|k| text.contains(k)))
            });

        match entry {
            Some(e) => QueryReply {
                question: Some(e.question.to_string()),
                answer: e.answer.to_string(),
                emotion: e.emotion,
            },
            None => QueryReply {
                question: None,
                answer: DEFAULT_ANSWER.to_string(),
                emotion: Emotion::Professional,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engagement_script() {
        let agent = CustomerAgent::new(Some(42));
        let diagnosis = Diagnosis::new(Component::BrakeSystem, 0.85);
        let e = agent.engage("V001", &diagnosis);

        assert_eq!(
            e.conversation.greeting,
            "Hello, this is RoadIQ AI calling about your vehicle V001."
        );
        assert!(e.conversation.alert.starts_with("URGENT SAFETY ALERT"));
        assert_eq!(e.follow_up_needed, !e.accepted);
        assert_eq!(e.customer_concerns.len(), 3);
        assert_eq!(e.voice_message, CustomerAgent::voice_message("V001", &diagnosis));
    }

    #[test]
    fn test_voice_message_summarizes_diagnosis() {
        let message = CustomerAgent::voice_message("V007", &Diagnosis::new(Component::Engine, 0.55));
        assert!(
            message.starts_with("Vehicle V007: 55% engine failure risk, MEDIUM urgency."),
            "{message}"
        );
        assert!(message.contains("Coolant system may be compromised"));
        assert!(!message.contains("92%"));
    }

    #[test]
    fn test_unknown_component_uses_default_flow() {
        let message = CustomerAgent::voice_message("V404", &Diagnosis::fallback());
        assert!(message.starts_with("Vehicle V404: 10% component failure risk, LOW urgency."), "{message}");
        assert!(message.contains("Schedule preventive maintenance"));
    }

    fn insights(batches: &[(&str, f64, usize, &str)]) -> QualityInsights {
        QualityInsights {
            batch_summary: batches
                .iter()
                .map(|(id, rate, count, component)| {
                    (
                        id.to_string(),
                        BatchSummary {
                            avg_failure_risk: *rate,
                            count: *count,
                            common_component: component.to_string(),
                        },
                    )
                })
                .collect(),
            total_batches: batches.len(),
            quality_trend: crate::agents::QualityTrend::Stable,
        }
    }

    #[test]
    fn test_manufacturer_alert_thresholds() {
        let alerts = manufacturer_alerts(&insights(&[
            ("BATCH_A1", 0.75, 4, "brake_system"),
            ("BATCH_B2", 0.57, 3, "engine"),
            ("BATCH_C3", 0.7, 2, "suspension"),
            ("BATCH_D4", 0.5, 5, "engine"),
        ]));

        let summary: Vec<_> = alerts
            .iter()
            .map(|a| (a.batch_id.as_str(), a.kind, a.priority))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("BATCH_A1", ManufacturerAlertKind::RecallAlert, Urgency::Critical),
                ("BATCH_B2", ManufacturerAlertKind::QualityAlert, Urgency::High),
                ("BATCH_C3", ManufacturerAlertKind::QualityAlert, Urgency::High),
            ]
        );

        assert_eq!(
            alerts[0].message,
            "RECALL RECOMMENDED: Batch BATCH_A1, 4 vehicles affected. Immediate supplier investigation required."
        );
        assert!(alerts[0].voice_message.starts_with("URGENT: Batch BATCH_A1 requires immediate recall."));
        assert_eq!(
            alerts[1].message,
            "Manufacturing Quality Alert: Batch BATCH_B2 shows 56% failure rate in Engine."
        );
        assert_eq!(
            alerts[1].voice_message,
            manufacturer_voice_message(ManufacturerAlertKind::QualityAlert, "BATCH_B2")
        );
    }

    #[test]
    fn test_healthy_fleet_has_no_manufacturer_alerts() {
        assert!(manufacturer_alerts(&insights(&[("BATCH_X", 0.2, 10, "engine")])).is_empty());
        assert!(manufacturer_alerts(&insights(&[])).is_empty());
    }

    #[test]
    fn test_manufacturer_alert_serializes_type_tag() {
        let alerts = manufacturer_alerts(&insights(&[("B1", 0.9, 1, "engine")]));
        let json = serde_json::to_value(&alerts[0]).unwrap();
        assert_eq!(json["type"], "recall_alert");
        assert_eq!(json["priority"], "CRITICAL");
    }

    #[test]
    fn test_seeded_acceptance_is_reproducible() {
        let diagnosis = Diagnosis::new(Component::Engine, 0.5);
        let a = CustomerAgent::new(Some(7));
        let b = CustomerAgent::new(Some(7));
        for _ in 0..20 {
            assert_eq!(
                a.engage("V1", &diagnosis).accepted,
                b.engage("V1", &diagnosis).accepted
            );
        }
    }

    #[test]
    fn test_acceptance_rate_tracks_urgency() {
        let agent = CustomerAgent::new(Some(1));
        let critical = Diagnosis::new(Component::Engine, 0.9);
        let accepted = (0..1000)
            .filter(|_| agent.engage("V1", &critical).accepted)
            .count();
        assert!(accepted > 900, "accepted {accepted} of 1000");
    }

    #[test]
    fn test_answer_query() {
        let agent = CustomerAgent::new(Some(1));

        let reply = agent.answer_query("3");
        assert_eq!(reply.question.as_deref(), Some("When can I schedule service?"));
        assert_eq!(reply.emotion, Emotion::Calm);

        let reply = agent.answer_query("  Is it SAFE to keep going? ");
        assert_eq!(reply.emotion, Emotion::Urgent);
        assert!(reply.answer.starts_with("With 78% brake failure risk"));

        let reply = agent.answer_query("what about the warranty");
        assert_eq!(reply.question.as_deref(), Some("Is my vehicle under warranty?"));

        let reply = agent.answer_query("hello");
        assert!(reply.question.is_none());
        assert_eq!(reply.answer, DEFAULT_ANSWER);
        assert_eq!(reply.emotion, Emotion::Professional);
    }
}
