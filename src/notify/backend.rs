//! Notification backends
//!
//! A backend owns the physical output (speaker, terminal). The dispatcher
//! guarantees it is only ever called from one task at a time.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info};

use super::types::NotificationTask;
use crate::config::{BackendKind, NotificationConfig, SpeechCommandConfig};
use crate::error::{Result, RoadIqError};

#[async_trait]
pub trait NotificationBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Deliver one task. Errors are handled by the dispatcher.
    async fn deliver(&self, task: &NotificationTask) -> Result<()>;
}

/// Writes notifications to the log
pub struct ConsoleBackend;

#[async_trait]
impl NotificationBackend for ConsoleBackend {
    fn name(&self) -> &str {
        "console"
    }

    async fn deliver(&self, task: &NotificationTask) -> Result<()> {
        let profile = task.emotion.voice_profile();
        info!(
            emotion = %task.emotion,
            rate = profile.rate,
            volume = profile.volume,
            "RoadIQ output: {}",
            task.text
        );
        Ok(())
    }
}

/// Accepts and drops everything
pub struct DisabledBackend;

#[async_trait]
impl NotificationBackend for DisabledBackend {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn deliver(&self, task: &NotificationTask) -> Result<()> {
        debug!(id = %task.id, "notification dropped (backend disabled)");
        Ok(())
    }
}

/// Speaks through an external speech-synthesis program.
///
/// The program is invoked as `program [args..] -s <rate> -a <amplitude> <text>`
/// where amplitude is the volume scaled to 0-200 (espeak convention).
pub struct SpeechCommandBackend {
    program: String,
    args: Vec<String>,
}

impl SpeechCommandBackend {
    pub fn new(config: &SpeechCommandConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }

    fn command_args(&self, task: &NotificationTask) -> Vec<String> {
        let profile = task.emotion.voice_profile();
        let amplitude = (profile.volume.clamp(0.0, 1.0) * 200.0).round() as u32;

        let mut args = self.args.clone();
        args.extend([
            "-s".to_string(),
            profile.rate.to_string(),
            "-a".to_string(),
            amplitude.to_string(),
            task.text.clone(),
        ]);
        args
    }
}

#[async_trait]
impl NotificationBackend for SpeechCommandBackend {
    fn name(&self) -> &str {
        &self.program
    }

    async fn deliver(&self, task: &NotificationTask) -> Result<()> {
        let output = Command::new(&self.program)
            .args(self.command_args(task))
            .output()
            .await
            .map_err(|e| RoadIqError::Delivery(format!("failed to start {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RoadIqError::Delivery(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Backend selected by configuration
pub fn backend_from_config(config: &NotificationConfig) -> Arc<dyn NotificationBackend> {
    match config.backend {
        BackendKind::Console => Arc::new(ConsoleBackend),
        BackendKind::Command => Arc::new(SpeechCommandBackend::new(&config.command)),
        BackendKind::Disabled => Arc::new(DisabledBackend),
    }
}
