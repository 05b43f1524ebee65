use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery tone, also used as the notification priority tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Urgent,
    Calm,
    #[default]
    Professional,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Urgent => "urgent",
            Emotion::Calm => "calm",
            Emotion::Professional => "professional",
        }
    }

    /// Speech rate (words per minute) and volume for this tone
    pub fn voice_profile(&self) -> VoiceProfile {
        match self {
            Emotion::Urgent => VoiceProfile {
                rate: 200,
                volume: 1.0,
            },
            Emotion::Calm => VoiceProfile {
                rate: 150,
                volume: 0.7,
            },
            Emotion::Professional => VoiceProfile {
                rate: 175,
                volume: 0.9,
            },
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "urgent" => Ok(Emotion::Urgent),
            "calm" => Ok(Emotion::Calm),
            "professional" => Ok(Emotion::Professional),
            other => Err(format!("unknown emotion '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceProfile {
    pub rate: u32,
    /// 0.0 - 1.0
    pub volume: f32,
}

/// Human-facing message waiting for delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationTask {
    pub id: Uuid,
    pub text: String,
    pub emotion: Emotion,
    pub enqueued_at: DateTime<Utc>,
}

impl NotificationTask {
    pub fn new(text: &str, emotion: Emotion) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.to_string(),
            emotion,
            enqueued_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_profiles() {
        assert_eq!(Emotion::Urgent.voice_profile().rate, 200);
        assert_eq!(Emotion::Calm.voice_profile().volume, 0.7);
        assert_eq!(Emotion::default(), Emotion::Professional);
    }

    #[test]
    fn test_emotion_parse() {
        assert_eq!("URGENT".parse::<Emotion>().unwrap(), Emotion::Urgent);
        assert!("angry".parse::<Emotion>().is_err());
    }
}
