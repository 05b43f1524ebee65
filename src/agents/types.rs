//! Value types shared by the leaf agents and the pipeline

use serde::{Deserialize, Serialize};

/// Risk level reported by the risk assessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssessmentLevel {
    /// No telemetry could be evaluated
    Unknown,
    Low,
    Medium,
    High,
}

impl AssessmentLevel {
    /// Medium and high risk trigger the diagnosis stage
    pub fn is_elevated(&self) -> bool {
        matches!(self, AssessmentLevel::Medium | AssessmentLevel::High)
    }
}

impl std::fmt::Display for AssessmentLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssessmentLevel::Unknown => write!(f, "UNKNOWN"),
            AssessmentLevel::Low => write!(f, "LOW"),
            AssessmentLevel::Medium => write!(f, "MEDIUM"),
            AssessmentLevel::High => write!(f, "HIGH"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: AssessmentLevel,
    pub score: f64,
    pub factors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<f64>,
}

impl RiskAssessment {
    /// UNKNOWN assessment carrying the reason as its only factor
    pub fn fallback(reason: &str) -> Self {
        Self {
            level: AssessmentLevel::Unknown,
            score: 0.0,
            factors: vec![reason.to_string()],
            engine_temp: None,
            vibration: None,
            battery: None,
        }
    }
}

/// Vehicle component a diagnosis refers to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    BrakeSystem,
    Engine,
    Suspension,
    Transmission,
    #[default]
    Unknown,
}

impl Component {
    /// Parse a telemetry label such as `brake_system` or `Brake System`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().replace(' ', "_").as_str() {
            "brake_system" => Component::BrakeSystem,
            "engine" => Component::Engine,
            "suspension" => Component::Suspension,
            "transmission" => Component::Transmission,
            _ => Component::Unknown,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Component::BrakeSystem => "Brake System",
            Component::Engine => "Engine",
            Component::Suspension => "Suspension",
            Component::Transmission => "Transmission",
            Component::Unknown => "Unknown",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            Component::BrakeSystem => "Replace brake pads and check fluid levels",
            Component::Engine => "Engine diagnostic and oil change required",
            Component::Suspension => "Inspect shock absorbers and springs",
            Component::Transmission => "Transmission fluid check and service",
            Component::Unknown => "General inspection required",
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Service urgency derived from failure probability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub fn from_probability(probability: f64) -> Self {
        if probability > 0.8 {
            Urgency::Critical
        } else if probability > 0.6 {
            Urgency::High
        } else if probability > 0.4 {
            Urgency::Medium
        } else {
            Urgency::Low
        }
    }

    /// Days until service should happen
    pub fn estimated_days(&self) -> u32 {
        match self {
            Urgency::Critical => 7,
            Urgency::High => 14,
            Urgency::Medium | Urgency::Low => 30,
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Urgency::Low => write!(f, "LOW"),
            Urgency::Medium => write!(f, "MEDIUM"),
            Urgency::High => write!(f, "HIGH"),
            Urgency::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl std::str::FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Urgency::Low),
            "medium" => Ok(Urgency::Medium),
            "high" => Ok(Urgency::High),
            "critical" => Ok(Urgency::Critical),
            other => Err(format!("unknown urgency '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub category: Component,
    pub probability: f64,
    pub urgency: Urgency,
    pub recommendation: String,
    pub estimated_days: u32,
}

impl Diagnosis {
    pub fn new(category: Component, probability: f64) -> Self {
        let urgency = Urgency::from_probability(probability);
        Self {
            category,
            probability,
            urgency,
            recommendation: category.recommendation().to_string(),
            estimated_days: urgency.estimated_days(),
        }
    }

    /// Returned when the vehicle cannot be diagnosed
    pub fn fallback() -> Self {
        Self {
            category: Component::Unknown,
            probability: 0.1,
            urgency: Urgency::Low,
            recommendation: "Regular maintenance check".to_string(),
            estimated_days: 30,
        }
    }
}

/// `brake_system` -> `Brake System`
pub(crate) fn title_case(raw: &str) -> String {
    raw.replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_thresholds() {
        assert_eq!(Urgency::from_probability(0.85), Urgency::Critical);
        assert_eq!(Urgency::from_probability(0.8), Urgency::High);
        assert_eq!(Urgency::from_probability(0.61), Urgency::High);
        assert_eq!(Urgency::from_probability(0.6), Urgency::Medium);
        assert_eq!(Urgency::from_probability(0.4), Urgency::Low);
    }

    #[test]
    fn test_estimated_days() {
        assert_eq!(Urgency::Critical.estimated_days(), 7);
        assert_eq!(Urgency::High.estimated_days(), 14);
        assert_eq!(Urgency::Medium.estimated_days(), 30);
        assert_eq!(Urgency::Low.estimated_days(), 30);
    }

    #[test]
    fn test_component_parse() {
        assert_eq!(Component::parse("brake_system"), Component::BrakeSystem);
        assert_eq!(Component::parse("Brake System"), Component::BrakeSystem);
        assert_eq!(Component::parse("ENGINE"), Component::Engine);
        assert_eq!(Component::parse("exhaust"), Component::Unknown);
        assert_eq!(
            Component::Unknown.recommendation(),
            "General inspection required"
        );
    }

    #[test]
    fn test_diagnosis_from_probability() {
        let d = Diagnosis::new(Component::BrakeSystem, 0.85);
        assert_eq!(d.urgency, Urgency::Critical);
        assert_eq!(d.estimated_days, 7);
        assert_eq!(d.recommendation, "Replace brake pads and check fluid levels");

        let fallback = Diagnosis::fallback();
        assert_eq!(fallback.category, Component::Unknown);
        assert_eq!(fallback.urgency, Urgency::Low);
    }

    #[test]
    fn test_serialized_names() {
        let json = serde_json::to_value(Diagnosis::new(Component::Engine, 0.7)).unwrap();
        assert_eq!(json["category"], "engine");
        assert_eq!(json["urgency"], "HIGH");

        let json = serde_json::to_value(RiskAssessment::fallback("Vehicle not found")).unwrap();
        assert_eq!(json["level"], "UNKNOWN");
        assert!(json.get("engine_temp").is_none());
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("brake_system"), "Brake System");
        assert_eq!(title_case("exhaust_MANIFOLD"), "Exhaust Manifold");
        assert_eq!(title_case(""), "");
    }
}
