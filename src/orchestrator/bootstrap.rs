//! Bootstrap - wires governance, leaf agents and the dispatcher from config
//!
//! Must run inside a tokio runtime: the notification worker is spawned here.

use std::sync::Arc;
use tracing::info;

use super::master::{LeafAgents, MasterOrchestrator};
use crate::agents::{
    CustomerAgent, DataAgent, DiagnosisAgent, FleetStore, ManufacturingAgent, SchedulingAgent,
};
use crate::config::AppConfig;
use crate::error::{Result, RoadIqError};
use crate::notify::{backend_from_config, NotificationDispatcher};

impl LeafAgents {
    /// Reference leaf agents over a fleet telemetry file
    pub fn from_store(store: FleetStore, seed: Option<u64>) -> Self {
        Self {
            risk: Arc::new(DataAgent::new(store.clone())),
            diagnosis: Arc::new(DiagnosisAgent::new(store.clone())),
            manufacturing: Arc::new(ManufacturingAgent::new(store)),
            customer: Arc::new(CustomerAgent::new(seed)),
            scheduling: Arc::new(SchedulingAgent::new(seed)),
        }
    }
}

/// Validate the configuration and build a ready orchestrator.
///
/// Refuses to start on any configuration problem.
pub fn bootstrap(config: &AppConfig) -> Result<MasterOrchestrator> {
    config.validate().map_err(RoadIqError::InvalidConfig)?;

    let monitor = Arc::new(config.governance.build_monitor()?);
    let agents = LeafAgents::from_store(
        FleetStore::new(&config.data.fleet_path),
        config.engagement.seed,
    );
    let dispatcher = NotificationDispatcher::spawn(backend_from_config(&config.notifications));

    info!(
        actors = monitor.registry().len(),
        fleet = %config.data.fleet_path.display(),
        backend = ?config.notifications.backend,
        "orchestrator ready"
    );

    Ok(MasterOrchestrator::new(monitor, agents, dispatcher))
}
