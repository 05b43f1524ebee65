//! Human-readable command output

use crate::agents::{Booking, ManufacturerAlert, PatternLogOutcome, QueryReply};
use crate::governance::{AuditRecord, BehaviorAssessment, SecurityPosture};
use crate::orchestrator::{DashboardData, PipelineResult};

pub fn pipeline(result: &PipelineResult) {
    let risk = &result.risk_assessment;
    println!("Vehicle {}", result.vehicle_id);
    println!("  Risk:      {} (score {:.2})", risk.level, risk.score);
    if !risk.factors.is_empty() {
        println!("  Factors:   {}", risk.factors.join(", "));
    }

    if let Some(d) = &result.diagnosis {
        println!(
            "  Diagnosis: {} {:.0}% - {} urgency, service within {} days",
            d.category,
            d.probability * 100.0,
            d.urgency,
            d.estimated_days
        );
        println!("  Action:    {}", d.recommendation);
    }

    match &result.pattern_log {
        Some(PatternLogOutcome::Analyzed(q)) => {
            println!(
                "  Batch {}:  {} vehicles, {} high risk, mean risk {:.2}",
                q.batch_id, q.total_vehicles, q.high_risk_vehicles, q.avg_failure_risk
            );
            println!("  Batch rec: {}", q.recommendation);
        }
        Some(PatternLogOutcome::Error { message }) => println!("  Batch:     {}", message),
        None => {}
    }

    if let Some(e) = &result.customer_engagement {
        let answer = if e.accepted { "accepted" } else { "follow-up needed" };
        println!("  Customer:  {} ({})", e.conversation.alert, answer);
    }
    println!();
}

pub fn dashboard(data: &DashboardData) {
    let fleet = &data.fleet_overview;
    println!("System: {} ({} agents)", data.system_status, data.active_agents);
    println!(
        "Fleet:  {} vehicles - {} high / {} medium / {} low risk, health {:.0}%",
        fleet.total_vehicles,
        fleet.high_risk,
        fleet.medium_risk,
        fleet.low_risk,
        fleet.avg_health_score * 100.0
    );

    let quality = &data.manufacturing_quality;
    println!(
        "Quality: {} batches, trend {}",
        quality.total_batches, quality.quality_trend
    );
    for (batch_id, summary) in &quality.batch_summary {
        println!(
            "  {:<10} {:>3} vehicles  mean risk {:.2}  common: {}",
            batch_id, summary.count, summary.avg_failure_risk, summary.common_component
        );
    }
}

pub fn booking(b: &Booking) {
    println!("Booking {} ({})", b.booking_id, b.status);
    println!("  Vehicle:  {}", b.vehicle_id);
    println!("  Center:   {}", b.service_center);
    println!(
        "  When:     {} {} ({})",
        b.appointment_date, b.appointment_time, b.estimated_duration
    );
    println!("  Priority: {}", b.priority);
}

pub fn manufacturer_alerts(alerts: &[ManufacturerAlert]) {
    if alerts.is_empty() {
        println!("All batches within quality limits");
    }
    for a in alerts {
        println!("[{}] {}", a.priority, a.message);
    }
}

pub fn posture(p: &SecurityPosture) {
    println!(
        "Security score {} - {} events, {} blocked",
        p.security_score, p.total_events, p.blocked_actions
    );
    if p.active_alerts.is_empty() {
        println!("No active alerts");
        return;
    }
    for alert in &p.active_alerts {
        println!(
            "  [{}] {} {} on {}: {} ({})",
            alert.id, alert.severity, alert.actor, alert.resource, alert.description, alert.action_taken
        );
    }
}

pub fn record(r: &AuditRecord) {
    println!(
        "#{} {} {} {} -> {} / {}",
        r.sequence, r.actor, r.action, r.resource, r.outcome, r.risk_level
    );
    if let Some(alert) = &r.alert {
        println!("  alert: {}", alert);
    }
}

pub fn audit(records: &[AuditRecord], behavior: Option<&BehaviorAssessment>) {
    if records.is_empty() {
        println!("No audit records");
    }
    for r in records {
        println!(
            "{} #{:<5} {:<20} {:<22} {:<16} {:<8} {}",
            r.timestamp.format("%Y-%m-%d %H:%M:%S"),
            r.sequence,
            r.actor,
            r.action,
            r.resource,
            r.outcome.to_string(),
            r.risk_level
        );
    }
    if let Some(b) = behavior {
        println!(
            "{}: {} - {} ({} actions, {} blocked in trail)",
            b.actor, b.status, b.reason, b.total_actions, b.blocked_actions
        );
    }
}

pub fn reply(r: &QueryReply) {
    if let Some(q) = &r.question {
        println!("Q: {}", q);
    }
    println!("A: {}", r.answer);
}
