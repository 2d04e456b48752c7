//! Mock cloud provider driver for testing
//!
//! Keeps templates, managers and instances in memory, records every call in
//! order, and lets tests inject failures or drift the live member count of a
//! group away from its target size.

use fleet_core::{
    CloudDriver, Error, GroupMember, InstanceDriver, InstanceManagerSettings, InstanceRecord,
    InstanceSettings, ProviderConfig, Result,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// A call received by the mock driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    CreateInstanceTemplate { name: String },
    DeleteInstanceTemplate { name: String },
    CreateInstanceGroupManager { name: String, template: String, target_size: u64 },
    SetInstanceTemplate { group: String, template: String },
    ResizeInstanceGroupManager { name: String, target_size: u64 },
    DeleteInstanceGroupManager { name: String },
    ListInstanceGroupInstances { name: String },
    GetInstance { name: String },
    CreateInstance { name: String },
    DeleteInstance { name: String },
    ListInstances,
}

/// Call kinds, used to target failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    CreateInstanceTemplate,
    DeleteInstanceTemplate,
    CreateInstanceGroupManager,
    SetInstanceTemplate,
    ResizeInstanceGroupManager,
    DeleteInstanceGroupManager,
    ListInstanceGroupInstances,
    GetInstance,
    CreateInstance,
    DeleteInstance,
    ListInstances,
}

impl DriverCall {
    pub fn kind(&self) -> CallKind {
        match self {
            DriverCall::CreateInstanceTemplate { .. } => CallKind::CreateInstanceTemplate,
            DriverCall::DeleteInstanceTemplate { .. } => CallKind::DeleteInstanceTemplate,
            DriverCall::CreateInstanceGroupManager { .. } => CallKind::CreateInstanceGroupManager,
            DriverCall::SetInstanceTemplate { .. } => CallKind::SetInstanceTemplate,
            DriverCall::ResizeInstanceGroupManager { .. } => CallKind::ResizeInstanceGroupManager,
            DriverCall::DeleteInstanceGroupManager { .. } => CallKind::DeleteInstanceGroupManager,
            DriverCall::ListInstanceGroupInstances { .. } => CallKind::ListInstanceGroupInstances,
            DriverCall::GetInstance { .. } => CallKind::GetInstance,
            DriverCall::CreateInstance { .. } => CallKind::CreateInstance,
            DriverCall::DeleteInstance { .. } => CallKind::DeleteInstance,
            DriverCall::ListInstances => CallKind::ListInstances,
        }
    }

    /// True for calls that change provider state
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            DriverCall::ListInstanceGroupInstances { .. }
                | DriverCall::GetInstance { .. }
                | DriverCall::ListInstances
        )
    }
}

#[derive(Debug, Clone)]
enum Failure {
    Once(String),
    Always(String),
}

#[derive(Debug, Clone)]
struct MockManager {
    settings: InstanceManagerSettings,
    members: Vec<String>,
}

#[derive(Debug, Default)]
struct MockCloudState {
    calls: Vec<DriverCall>,
    templates: BTreeMap<String, InstanceSettings>,
    managers: BTreeMap<String, MockManager>,
    instances: BTreeMap<String, InstanceRecord>,
    failures: HashMap<CallKind, Failure>,
    next_instance: u64,
}

/// In-memory provider implementing both driver traits
#[derive(Debug, Clone)]
pub struct MockCloudDriver {
    inner: Arc<MockCloudDriverInner>,
}

#[derive(Debug)]
struct MockCloudDriverInner {
    state: Mutex<MockCloudState>,
    provider: ProviderConfig,
}

impl MockCloudDriver {
    /// Create a mock driver for the given project and zone
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            inner: Arc::new(MockCloudDriverInner {
                state: Mutex::new(MockCloudState::default()),
                provider,
            }),
        }
    }

    /// Create with the default provider location
    pub fn new_default() -> Self {
        Self::new(ProviderConfig::default())
    }

    /// Every call received so far, in order
    pub async fn calls(&self) -> Vec<DriverCall> {
        self.inner.state.lock().await.calls.clone()
    }

    /// Calls that changed provider state, in order
    pub async fn mutating_calls(&self) -> Vec<DriverCall> {
        self.calls()
            .await
            .into_iter()
            .filter(DriverCall::is_mutation)
            .collect()
    }

    /// Forget recorded calls without touching provider state
    pub async fn clear_calls(&self) {
        self.inner.state.lock().await.calls.clear();
    }

    /// Fail the next call of `kind` with a provider error
    pub async fn fail_once(&self, kind: CallKind, message: impl Into<String>) {
        let mut state = self.inner.state.lock().await;
        state.failures.insert(kind, Failure::Once(message.into()));
    }

    /// Fail every call of `kind` until cleared
    pub async fn fail_always(&self, kind: CallKind, message: impl Into<String>) {
        let mut state = self.inner.state.lock().await;
        state.failures.insert(kind, Failure::Always(message.into()));
    }

    pub async fn clear_failures(&self) {
        self.inner.state.lock().await.failures.clear();
    }

    /// Names of all existing templates
    pub async fn templates(&self) -> Vec<String> {
        self.inner.state.lock().await.templates.keys().cloned().collect()
    }

    /// Settings of an existing template
    pub async fn template(&self, name: &str) -> Option<InstanceSettings> {
        self.inner.state.lock().await.templates.get(name).cloned()
    }

    /// Settings of an existing manager
    pub async fn manager(&self, name: &str) -> Option<InstanceManagerSettings> {
        self.inner
            .state
            .lock()
            .await
            .managers
            .get(name)
            .map(|m| m.settings.clone())
    }

    /// Force the live member count of a group without changing its target size
    pub async fn set_live_members(&self, group: &str, count: usize) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        if !state.managers.contains_key(group) {
            return Err(Error::not_found(format!("instance group manager {}", group)));
        }
        sync_members(&mut state, group, count);
        Ok(())
    }

    fn instance_url(&self, name: &str) -> String {
        format!(
            "https://compute.mock/projects/{}/zones/{}/instances/{}",
            self.inner.provider.project, self.inner.provider.zone, name
        )
    }
}

impl Default for MockCloudDriver {
    fn default() -> Self {
        Self::new_default()
    }
}

/// Record `call` and apply any injected failure for it
fn record(state: &mut MockCloudState, call: DriverCall) -> Result<()> {
    debug!("mock driver call: {:?}", call);
    let kind = call.kind();
    state.calls.push(call);

    match state.failures.get(&kind).cloned() {
        Some(Failure::Once(message)) => {
            state.failures.remove(&kind);
            Err(Error::provider(message))
        }
        Some(Failure::Always(message)) => Err(Error::provider(message)),
        None => Ok(()),
    }
}

/// Grow or shrink the member list of `group` to `count` instances
fn sync_members(state: &mut MockCloudState, group: &str, count: usize) {
    let Some(manager) = state.managers.get(group) else {
        return;
    };
    let base = manager.settings.base_instance_name.clone();
    let metadata = state
        .templates
        .get(&manager.settings.template_name)
        .map(|t| t.metadata.clone())
        .unwrap_or_default();
    let mut members = manager.members.clone();

    while members.len() > count {
        if let Some(name) = members.pop() {
            state.instances.remove(&name);
        }
    }
    while members.len() < count {
        state.next_instance += 1;
        let name = format!("{}-{:04x}", base, state.next_instance);
        state.instances.insert(
            name.clone(),
            InstanceRecord {
                name: name.clone(),
                status: "RUNNING".to_string(),
                metadata: metadata.clone(),
            },
        );
        members.push(name);
    }

    if let Some(manager) = state.managers.get_mut(group) {
        manager.members = members;
    }
}

#[async_trait::async_trait]
impl CloudDriver for MockCloudDriver {
    async fn create_instance_template(&self, name: &str, settings: &InstanceSettings) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        record(&mut state, DriverCall::CreateInstanceTemplate { name: name.to_string() })?;

        if state.templates.contains_key(name) {
            return Err(Error::already_exists(format!("instance template {}", name)));
        }
        state.templates.insert(name.to_string(), settings.clone());
        Ok(())
    }

    async fn delete_instance_template(&self, name: &str) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        record(&mut state, DriverCall::DeleteInstanceTemplate { name: name.to_string() })?;

        state.templates.remove(name);
        Ok(())
    }

    async fn create_instance_group_manager(
        &self,
        name: &str,
        settings: &InstanceManagerSettings,
    ) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        record(
            &mut state,
            DriverCall::CreateInstanceGroupManager {
                name: name.to_string(),
                template: settings.template_name.clone(),
                target_size: settings.target_size,
            },
        )?;

        if state.managers.contains_key(name) {
            return Err(Error::already_exists(format!("instance group manager {}", name)));
        }
        if !state.templates.contains_key(&settings.template_name) {
            return Err(Error::not_found(format!(
                "instance template {}",
                settings.template_name
            )));
        }

        state.managers.insert(
            name.to_string(),
            MockManager {
                settings: settings.clone(),
                members: Vec::new(),
            },
        );
        sync_members(&mut state, name, settings.target_size as usize);
        Ok(())
    }

    async fn set_instance_template(&self, group_name: &str, template_name: &str) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        record(
            &mut state,
            DriverCall::SetInstanceTemplate {
                group: group_name.to_string(),
                template: template_name.to_string(),
            },
        )?;

        if !state.templates.contains_key(template_name) {
            return Err(Error::not_found(format!("instance template {}", template_name)));
        }
        let manager = state
            .managers
            .get_mut(group_name)
            .ok_or_else(|| Error::not_found(format!("instance group manager {}", group_name)))?;
        manager.settings.template_name = template_name.to_string();
        Ok(())
    }

    async fn resize_instance_group_manager(&self, name: &str, target_size: u64) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        record(
            &mut state,
            DriverCall::ResizeInstanceGroupManager {
                name: name.to_string(),
                target_size,
            },
        )?;

        let manager = state
            .managers
            .get_mut(name)
            .ok_or_else(|| Error::not_found(format!("instance group manager {}", name)))?;
        manager.settings.target_size = target_size;
        sync_members(&mut state, name, target_size as usize);
        Ok(())
    }

    async fn delete_instance_group_manager(&self, name: &str) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        record(&mut state, DriverCall::DeleteInstanceGroupManager { name: name.to_string() })?;

        if let Some(manager) = state.managers.remove(name) {
            for member in manager.members {
                state.instances.remove(&member);
            }
        }
        Ok(())
    }

    async fn list_instance_group_instances(&self, name: &str) -> Result<Vec<GroupMember>> {
        let mut state = self.inner.state.lock().await;
        record(&mut state, DriverCall::ListInstanceGroupInstances { name: name.to_string() })?;

        let manager = state
            .managers
            .get(name)
            .ok_or_else(|| Error::not_found(format!("instance group manager {}", name)))?;

        Ok(manager
            .members
            .iter()
            .map(|member| GroupMember {
                instance: self.instance_url(member),
                status: "RUNNING".to_string(),
            })
            .collect())
    }

    async fn get_instance(&self, name: &str) -> Result<InstanceRecord> {
        let mut state = self.inner.state.lock().await;
        record(&mut state, DriverCall::GetInstance { name: name.to_string() })?;

        state
            .instances
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("instance {}", name)))
    }
}

#[async_trait::async_trait]
impl InstanceDriver for MockCloudDriver {
    async fn create_instance(&self, name: &str, settings: &InstanceSettings) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        record(&mut state, DriverCall::CreateInstance { name: name.to_string() })?;

        if state.instances.contains_key(name) {
            return Err(Error::already_exists(format!("instance {}", name)));
        }
        state.instances.insert(
            name.to_string(),
            InstanceRecord {
                name: name.to_string(),
                status: "RUNNING".to_string(),
                metadata: settings.metadata.clone(),
            },
        );
        Ok(())
    }

    async fn delete_instance(&self, name: &str) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        record(&mut state, DriverCall::DeleteInstance { name: name.to_string() })?;

        state
            .instances
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("instance {}", name)))
    }

    async fn list_instances(&self) -> Result<Vec<InstanceRecord>> {
        let mut state = self.inner.state.lock().await;
        record(&mut state, DriverCall::ListInstances)?;

        Ok(state.instances.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::{InstanceProperties, MetadataItem};

    fn template_settings() -> InstanceSettings {
        InstanceSettings::from_properties(
            &InstanceProperties::default(),
            vec![MetadataItem::new("role", "worker")],
        )
    }

    fn manager_settings(template: &str, size: u64) -> InstanceManagerSettings {
        InstanceManagerSettings {
            template_name: template.to_string(),
            target_size: size,
            description: String::new(),
            target_pool: String::new(),
            base_instance_name: "worker".to_string(),
        }
    }

    #[tokio::test]
    async fn test_manager_materializes_members() {
        let driver = MockCloudDriver::new_default();
        driver.create_instance_template("g-1", &template_settings()).await.unwrap();
        driver
            .create_instance_group_manager("g", &manager_settings("g-1", 3))
            .await
            .unwrap();

        let members = driver.list_instance_group_instances("g").await.unwrap();
        assert_eq!(members.len(), 3);

        let instance = driver.get_instance(members[0].instance_name()).await.unwrap();
        assert_eq!(instance.metadata, vec![MetadataItem::new("role", "worker")]);

        driver.resize_instance_group_manager("g", 1).await.unwrap();
        assert_eq!(driver.list_instance_group_instances("g").await.unwrap().len(), 1);
        assert_eq!(driver.manager("g").await.unwrap().target_size, 1);
    }

    #[tokio::test]
    async fn test_manager_requires_template() {
        let driver = MockCloudDriver::new_default();
        let err = driver
            .create_instance_group_manager("g", &manager_settings("missing", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_template_rejected() {
        let driver = MockCloudDriver::new_default();
        driver.create_instance_template("t", &template_settings()).await.unwrap();
        let err = driver
            .create_instance_template("t", &template_settings())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_deletes_are_idempotent() {
        let driver = MockCloudDriver::new_default();
        driver.delete_instance_group_manager("absent").await.unwrap();
        driver.delete_instance_template("absent").await.unwrap();
        assert_eq!(driver.mutating_calls().await.len(), 2);
    }

    #[tokio::test]
    async fn test_fail_once_then_recover() {
        let driver = MockCloudDriver::new_default();
        driver.fail_once(CallKind::CreateInstanceTemplate, "quota exceeded").await;

        let err = driver
            .create_instance_template("t", &template_settings())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Provider error: quota exceeded");
        assert!(driver.templates().await.is_empty());

        driver.create_instance_template("t", &template_settings()).await.unwrap();
        assert_eq!(driver.templates().await, vec!["t"]);
        assert_eq!(driver.calls().await.len(), 2);
    }

    #[tokio::test]
    async fn test_fail_always_until_cleared() {
        let driver = MockCloudDriver::new_default();
        driver.fail_always(CallKind::ListInstances, "unavailable").await;
        assert!(driver.list_instances().await.is_err());
        assert!(driver.list_instances().await.is_err());

        driver.clear_failures().await;
        assert!(driver.list_instances().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_live_members_drifts_without_resizing() {
        let driver = MockCloudDriver::new_default();
        driver.create_instance_template("g-1", &template_settings()).await.unwrap();
        driver
            .create_instance_group_manager("g", &manager_settings("g-1", 2))
            .await
            .unwrap();

        driver.set_live_members("g", 5).await.unwrap();
        assert_eq!(driver.list_instance_group_instances("g").await.unwrap().len(), 5);
        assert_eq!(driver.manager("g").await.unwrap().target_size, 2);

        assert!(driver.set_live_members("other", 1).await.is_err());
    }

    #[tokio::test]
    async fn test_standalone_instances() {
        let driver = MockCloudDriver::new_default();
        driver.create_instance("vm-1", &template_settings()).await.unwrap();
        assert_eq!(driver.list_instances().await.unwrap().len(), 1);

        driver.delete_instance("vm-1").await.unwrap();
        assert!(matches!(
            driver.delete_instance("vm-1").await.unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[test]
    fn test_call_classification() {
        assert!(DriverCall::ResizeInstanceGroupManager { name: "g".into(), target_size: 1 }.is_mutation());
        assert!(!DriverCall::GetInstance { name: "i".into() }.is_mutation());
        assert_eq!(DriverCall::ListInstances.kind(), CallKind::ListInstances);
    }
}
