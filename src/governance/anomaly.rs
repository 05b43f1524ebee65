//! Anomaly Rule Set - ordered pattern overrides applied after the capability check

use serde::{Deserialize, Serialize};

use super::actors;
use super::audit::{Outcome, RiskLevel, Verdict};
use crate::error::{Result, RoadIqError};

/// Pattern override.
///
/// The predicate is the conjunction of the clauses that are set. `alert` may
/// reference `{actor}`, `{action}` and `{resource}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyRule {
    pub name: String,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub resource_contains: Option<String>,
    pub outcome: Outcome,
    pub risk_level: RiskLevel,
    pub alert: String,
}

impl AnomalyRule {
    pub fn new(name: &str, outcome: Outcome, risk_level: RiskLevel, alert: &str) -> Self {
        Self {
            name: name.to_string(),
            actor: None,
            action: None,
            resource_contains: None,
            outcome,
            risk_level,
            alert: alert.to_string(),
        }
    }

    pub fn for_actor(mut self, actor: &str) -> Self {
        self.actor = Some(actor.to_string());
        self
    }

    pub fn for_action(mut self, action: &str) -> Self {
        self.action = Some(action.to_string());
        self
    }

    pub fn on_resource_containing(mut self, fragment: &str) -> Self {
        self.resource_contains = Some(fragment.to_string());
        self
    }

    pub fn matches(&self, actor: &str, action: &str, resource: &str) -> bool {
        self.actor.as_deref().map_or(true, |a| a == actor)
            && self.action.as_deref().map_or(true, |a| a == action)
            && self
                .resource_contains
                .as_deref()
                .map_or(true, |frag| resource.contains(frag))
    }

    /// Placeholders are expanded in one pass, so substituted values are
    /// never expanded again.
    fn render_alert(&self, actor: &str, action: &str, resource: &str) -> String {
        let placeholders = [("{actor}", actor), ("{action}", action), ("{resource}", resource)];
        let mut out = String::with_capacity(self.alert.len());
        let mut rest = self.alert.as_str();

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            rest = &rest[start..];
            match placeholders.iter().find(|(key, _)| rest.starts_with(key)) {
                Some((key, value)) => {
                    out.push_str(value);
                    rest = &rest[key.len()..];
                }
                None => {
                    out.push('{');
                    rest = &rest[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| RoadIqError::InvalidRule {
            rule: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("rule name must not be empty"));
        }
        if self.actor.is_none() && self.action.is_none() && self.resource_contains.is_none() {
            return Err(invalid("at least one of actor, action, resource_contains is required"));
        }
        let blank = |v: &Option<String>| v.as_deref().is_some_and(|s| s.is_empty());
        if blank(&self.actor) || blank(&self.action) || blank(&self.resource_contains) {
            return Err(invalid("predicate clauses must not be empty strings"));
        }
        if self.alert.trim().is_empty() {
            return Err(invalid("alert text must not be empty"));
        }
        Ok(())
    }
}

/// Effect of one matching rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleEffect {
    pub rule: String,
    pub outcome: Outcome,
    pub risk_level: RiskLevel,
    pub alert: String,
}

impl RuleEffect {
    /// Last match wins: every field of the verdict is replaced.
    pub fn apply(self, verdict: &mut Verdict) {
        verdict.outcome = self.outcome;
        verdict.risk_level = self.risk_level;
        verdict.alert = Some(self.alert);
    }
}

/// Rules shipped with the platform
pub fn default_rules() -> Vec<AnomalyRule> {
    vec![
        AnomalyRule::new(
            "scheduling_sensor_access",
            Outcome::Blocked,
            RiskLevel::Medium,
            "Scheduling agent accessing sensor data - potential privilege escalation",
        )
        .for_actor(actors::SCHEDULING_AGENT)
        .on_resource_containing("sensor"),
        AnomalyRule::new(
            "customer_manufacturing_access",
            Outcome::Blocked,
            RiskLevel::High,
            "Customer agent accessing manufacturing data - data breach attempt",
        )
        .for_actor(actors::CUSTOMER_AGENT)
        .on_resource_containing("manufacturing"),
    ]
}

/// Ordered rule list
#[derive(Debug, Clone)]
pub struct AnomalyRuleSet {
    rules: Vec<AnomalyRule>,
}

impl AnomalyRuleSet {
    pub fn new(rules: Vec<AnomalyRule>) -> Result<Self> {
        for rule in &rules {
            rule.validate()?;
        }
        Ok(Self { rules })
    }

    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Effects of every matching rule, in declaration order
    pub fn evaluate(&self, actor: &str, action: &str, resource: &str) -> Vec<RuleEffect> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(actor, action, resource))
            .map(|rule| RuleEffect {
                rule: rule.name.clone(),
                outcome: rule.outcome,
                risk_level: rule.risk_level,
                alert: rule.render_alert(actor, action, resource),
            })
            .collect()
    }

    pub fn rules(&self) -> &[AnomalyRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for AnomalyRuleSet {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scheduling_rule() {
        let rules = AnomalyRuleSet::default();
        let effects = rules.evaluate("SchedulingAgent", "read_calendar", "sensor_data_V001");
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].outcome, Outcome::Blocked);
        assert_eq!(effects[0].risk_level, RiskLevel::Medium);
        assert!(effects[0].alert.contains("privilege escalation"));
    }

    #[test]
    fn test_no_match_for_other_actors() {
        let rules = AnomalyRuleSet::default();
        assert!(rules
            .evaluate("DataAgent", "read_sensor_data", "sensor_data_V001")
            .is_empty());
        assert!(rules
            .evaluate("CustomerAgent", "engage_customer", "vehicle_V001")
            .is_empty());
    }

    #[test]
    fn test_effects_in_declaration_order() {
        let rules = AnomalyRuleSet::new(vec![
            AnomalyRule::new("first", Outcome::Blocked, RiskLevel::High, "one")
                .on_resource_containing("vehicle"),
            AnomalyRule::new("second", Outcome::Allowed, RiskLevel::Medium, "two")
                .for_actor("DataAgent"),
        ])
        .unwrap();

        let effects = rules.evaluate("DataAgent", "read_sensor_data", "vehicle_V9");
        let names: Vec<_> = effects.iter().map(|e| e.rule.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);

        let mut verdict = Verdict::allowed();
        for effect in effects {
            effect.apply(&mut verdict);
        }
        assert_eq!(verdict.outcome, Outcome::Allowed);
        assert_eq!(verdict.risk_level, RiskLevel::Medium);
        assert_eq!(verdict.alert.as_deref(), Some("two"));
    }

    #[test]
    fn test_alert_template_placeholders() {
        let rules = AnomalyRuleSet::new(vec![AnomalyRule::new(
            "night_export",
            Outcome::Blocked,
            RiskLevel::High,
            "{actor} tried {action} on {resource}",
        )
        .for_action("export")])
        .unwrap();

        let effects = rules.evaluate("DataAgent", "export", "fleet");
        assert_eq!(effects[0].alert, "DataAgent tried export on fleet");
    }

    #[test]
    fn test_substituted_values_are_not_expanded_again() {
        let rules = AnomalyRuleSet::new(vec![AnomalyRule::new(
            "any_export",
            Outcome::Blocked,
            RiskLevel::High,
            "{actor} tried {action} on {resource} {unknown} {",
        )
        .for_action("export")])
        .unwrap();

        let effects = rules.evaluate("Agent{action}{resource}", "export", "fleet_{actor}");
        assert_eq!(
            effects[0].alert,
            "Agent{action}{resource} tried export on fleet_{actor} {unknown} {"
        );
    }

    #[test]
    fn test_rule_without_predicate_is_rejected() {
        let err = AnomalyRuleSet::new(vec![AnomalyRule::new(
            "catch_all",
            Outcome::Blocked,
            RiskLevel::High,
            "everything",
        )])
        .unwrap_err();
        assert!(matches!(err, RoadIqError::InvalidRule { .. }));
    }

    #[test]
    fn test_rule_deserializes_from_config_shape() {
        let rule: AnomalyRule = serde_json::from_value(serde_json::json!({
            "name": "customer_manufacturing_access",
            "actor": "CustomerAgent",
            "resource_contains": "manufacturing",
            "outcome": "blocked",
            "risk_level": "high",
            "alert": "breach"
        }))
        .unwrap();
        assert!(rule.matches("CustomerAgent", "any", "manufacturing_batch_7"));
        assert!(rule.action.is_none());
    }
}
