//! Capability Registry - static actor → permitted action mapping

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use super::actors::{self, actions};
use crate::error::{Result, RoadIqError};

/// Grants every action when present in an actor's action list
pub const WILDCARD: &str = "*";

/// Actions an actor may perform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permissions {
    All,
    Only(BTreeSet<String>),
}

/// One actor's grant, loaded at startup and read-only afterwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityGrant {
    pub actor: String,
    pub permissions: Permissions,
}

impl CapabilityGrant {
    pub fn new<I, S>(actor: &str, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let actions: BTreeSet<String> = actions.into_iter().map(Into::into).collect();
        let permissions = if actions.contains(WILDCARD) {
            Permissions::All
        } else {
            Permissions::Only(actions)
        };
        Self {
            actor: actor.to_string(),
            permissions,
        }
    }

    pub fn all(actor: &str) -> Self {
        Self {
            actor: actor.to_string(),
            permissions: Permissions::All,
        }
    }

    pub fn allows(&self, action: &str) -> bool {
        match &self.permissions {
            Permissions::All => true,
            Permissions::Only(set) => set.contains(action),
        }
    }
}

/// Configuration form of a grant: `{ actor = "...", actions = [...] }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantEntry {
    pub actor: String,
    pub actions: Vec<String>,
}

impl From<&GrantEntry> for CapabilityGrant {
    fn from(entry: &GrantEntry) -> Self {
        CapabilityGrant::new(&entry.actor, entry.actions.iter().cloned())
    }
}

/// Default grants.
///
/// Each pipeline stage is granted the action it is reported under, on top of
/// its base data-access capabilities.
pub fn default_grants() -> Vec<GrantEntry> {
    let table: [(&str, &[&str]); 6] = [
        (
            actors::DATA_AGENT,
            &[actions::READ_SENSOR_DATA, "analyze_trends"],
        ),
        (
            actors::DIAGNOSIS_AGENT,
            &["read_sensor_data", "access_ml_model", actions::PREDICT_FAILURE],
        ),
        (
            actors::CUSTOMER_AGENT,
            &[
                "read_customer_data",
                "send_notifications",
                actions::ENGAGE_CUSTOMER,
                actions::ANSWER_QUERY,
                actions::NOTIFY_MANUFACTURER,
            ],
        ),
        (
            actors::SCHEDULING_AGENT,
            &["read_calendar", "book_appointments", actions::BOOK_SERVICE],
        ),
        (
            actors::MANUFACTURING_AGENT,
            &[
                "read_batch_data",
                actions::GENERATE_REPORTS,
                actions::LOG_FAILURE_PATTERN,
            ],
        ),
        (actors::MASTER_AGENT, &[WILDCARD]),
    ];

    table
        .iter()
        .map(|(actor, acts)| GrantEntry {
            actor: actor.to_string(),
            actions: acts.iter().map(|a| a.to_string()).collect(),
        })
        .collect()
}

/// Static capability registry
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    grants: HashMap<String, CapabilityGrant>,
}

impl CapabilityRegistry {
    /// Build a registry, rejecting incomplete grant data.
    pub fn from_grants<I>(grants: I) -> Result<Self>
    where
        I: IntoIterator<Item = CapabilityGrant>,
    {
        let mut map = HashMap::new();
        let mut errors = Vec::new();

        for grant in grants {
            if grant.actor.trim().is_empty() {
                errors.push("capability grant with empty actor name".to_string());
                continue;
            }
            if let Permissions::Only(set) = &grant.permissions {
                if set.is_empty() {
                    errors.push(format!("actor '{}' has an empty action list", grant.actor));
                }
                if set.iter().any(|a| a.trim().is_empty()) {
                    errors.push(format!("actor '{}' has an empty action name", grant.actor));
                }
            }
            if map.contains_key(&grant.actor) {
                errors.push(format!("duplicate grant for actor '{}'", grant.actor));
                continue;
            }
            map.insert(grant.actor.clone(), grant);
        }

        if map.is_empty() && errors.is_empty() {
            errors.push("capability registry has no grants".to_string());
        }

        if !errors.is_empty() {
            return Err(RoadIqError::InvalidConfig(errors));
        }

        Ok(Self { grants: map })
    }

    /// Build from configuration entries
    pub fn from_entries(entries: &[GrantEntry]) -> Result<Self> {
        Self::from_grants(entries.iter().map(CapabilityGrant::from))
    }

    /// Unknown actors have no grants.
    pub fn is_permitted(&self, actor: &str, action: &str) -> bool {
        self.grants
            .get(actor)
            .map(|g| g.allows(action))
            .unwrap_or(false)
    }

    pub fn grant(&self, actor: &str) -> Option<&CapabilityGrant> {
        self.grants.get(actor)
    }

    pub fn contains(&self, actor: &str) -> bool {
        self.grants.contains_key(actor)
    }

    pub fn actors(&self) -> impl Iterator<Item = &str> {
        self.grants.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        let grants = default_grants()
            .iter()
            .map(|entry| (entry.actor.clone(), CapabilityGrant::from(entry)))
            .collect();
        Self { grants }
    }
}
