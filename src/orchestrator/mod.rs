//! Decision pipeline orchestration

mod bootstrap;
mod master;

pub use bootstrap::bootstrap;
pub use master::{
    emotion_for, DashboardData, LeafAgents, MasterOrchestrator, PipelineResult, ACTIVE_AGENTS,
};
