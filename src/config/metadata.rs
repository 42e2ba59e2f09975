//! Simulation metadata for human-readable names and descriptions
//!
//! `EntityMetadata` provides optional names and descriptions for accounts
//! and spending categories. `SimulationMetadata` provides bidirectional
//! mappings between string names and ids, letting the builder DSL and
//! callers address entities by name (spec.md §3, §6).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{AccountId, CategoryId};

/// Metadata entry for any simulation entity.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EntityMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Holds human-readable names and descriptions for accounts and spending
/// categories, along with bidirectional mappings for name-based lookups.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SimulationMetadata {
    pub accounts: HashMap<AccountId, EntityMetadata>,
    pub spending_categories: HashMap<CategoryId, EntityMetadata>,

    #[serde(default)]
    pub account_names: HashMap<String, AccountId>,
    #[serde(default)]
    pub spending_category_names: HashMap<String, CategoryId>,
}

impl SimulationMetadata {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_account(&mut self, id: AccountId, name: Option<String>, description: Option<String>) {
        if let Some(ref n) = name {
            self.account_names.insert(n.clone(), id);
        }
        self.accounts.insert(id, EntityMetadata { name, description });
    }

    pub fn register_spending_category(&mut self, id: CategoryId, name: Option<String>, description: Option<String>) {
        if let Some(ref n) = name {
            self.spending_category_names.insert(n.clone(), id);
        }
        self.spending_categories.insert(id, EntityMetadata { name, description });
    }

    #[must_use]
    pub fn account_id(&self, name: &str) -> Option<AccountId> {
        self.account_names.get(name).copied()
    }

    #[must_use]
    pub fn spending_category_id(&self, name: &str) -> Option<CategoryId> {
        self.spending_category_names.get(name).copied()
    }

    #[must_use]
    pub fn account_name(&self, id: AccountId) -> Option<&str> {
        self.accounts.get(&id).and_then(|m| m.name.as_deref())
    }

    #[must_use]
    pub fn spending_category_name(&self, id: CategoryId) -> Option<&str> {
        self.spending_categories.get(&id).and_then(|m| m.name.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_lookup_account_by_name() {
        let mut metadata = SimulationMetadata::new();
        metadata.register_account(AccountId(1), Some("Checking".into()), None);
        assert_eq!(metadata.account_id("Checking"), Some(AccountId(1)));
        assert_eq!(metadata.account_name(AccountId(1)), Some("Checking"));
    }
}
