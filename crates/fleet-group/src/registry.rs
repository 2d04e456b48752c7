//! In-memory registry of watched groups
//!
//! Nothing here is persisted: a restarted process starts with an empty
//! registry, while the provider-side templates and managers remain.

use crate::validator::NormalizedSettings;
use fleet_core::{Allocation, GroupId, GroupSpec, InstanceProperties};
use std::collections::HashMap;

/// Template generation counter and naming history for one group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateHistory {
    current_version: u32,
    created: Vec<String>,
}

impl TemplateHistory {
    /// History of a group that has not created any template yet
    pub fn new() -> Self {
        Self {
            current_version: 1,
            created: Vec::new(),
        }
    }

    pub fn current_version(&self) -> u32 {
        self.current_version
    }

    /// Name of the current template: `<group>-<version>`
    pub fn template_name(&self, group: &GroupId) -> String {
        format!("{}-{}", group, self.current_version)
    }

    /// Move to the next template generation
    pub fn bump(&mut self) {
        self.current_version += 1;
    }

    /// Remember a template name for teardown; returns false if already known
    pub fn record(&mut self, name: String) -> bool {
        if self.created.contains(&name) {
            return false;
        }
        self.created.push(name);
        true
    }

    /// Every template name recorded, oldest first
    pub fn created(&self) -> &[String] {
        &self.created
    }
}

impl Default for TemplateHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// Last committed state of a watched group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSettings {
    pub settings: NormalizedSettings,
    pub templates: TemplateHistory,
}

impl GroupSettings {
    pub fn new(settings: NormalizedSettings, templates: TemplateHistory) -> Self {
        Self {
            settings,
            templates,
        }
    }

    pub fn declared_spec(&self) -> &GroupSpec {
        &self.settings.spec
    }

    pub fn allocation(&self) -> &Allocation {
        self.settings.allocation()
    }

    pub fn instance_properties(&self) -> &InstanceProperties {
        &self.settings.instance_properties
    }

    pub fn current_template_version(&self) -> u32 {
        self.templates.current_version()
    }

    pub fn created_template_names(&self) -> &[String] {
        self.templates.created()
    }
}

/// Mapping from group id to its committed settings
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    groups: HashMap<GroupId, GroupSettings>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &GroupId) -> Option<&GroupSettings> {
        self.groups.get(id)
    }

    pub fn contains(&self, id: &GroupId) -> bool {
        self.groups.contains_key(id)
    }

    /// Insert or replace the settings of a group
    pub fn insert(&mut self, id: GroupId, settings: GroupSettings) {
        self.groups.insert(id, settings);
    }

    pub fn remove(&mut self, id: &GroupId) -> Option<GroupSettings> {
        self.groups.remove(id)
    }

    /// Declared specs of all watched groups, in no particular order
    pub fn specs(&self) -> Vec<GroupSpec> {
        self.groups
            .values()
            .map(|settings| settings.declared_spec().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
