//! Mock flavor plugin for testing

use fleet_core::{Allocation, Error, Flavor, InstanceSpec, Result};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Scriptable flavor that counts calls and applies fixed augmentations
#[derive(Debug, Clone, Default)]
pub struct MockFlavor {
    inner: Arc<MockFlavorInner>,
}

#[derive(Debug, Default)]
struct MockFlavorInner {
    reject: Option<String>,
    tags: BTreeMap<String, String>,
    init: Option<String>,
    property_overrides: serde_json::Map<String, serde_json::Value>,
    validate_calls: AtomicUsize,
    prepare_calls: AtomicUsize,
}

impl MockFlavor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: reject every validation with this message
    pub fn rejecting(message: impl Into<String>) -> Self {
        Self::new().with(|inner| inner.reject = Some(message.into()))
    }

    /// Builder: add a tag in `prepare`
    pub fn with_tag(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let (key, value) = (key.into(), value.into());
        self.with(|inner| {
            inner.tags.insert(key, value);
        })
    }

    /// Builder: set the init script in `prepare`
    pub fn with_init(self, init: impl Into<String>) -> Self {
        let init = init.into();
        self.with(|inner| inner.init = Some(init))
    }

    /// Builder: overwrite an instance property in `prepare`
    pub fn with_property(self, key: impl Into<String>, value: serde_json::Value) -> Self {
        let key = key.into();
        self.with(|inner| {
            inner.property_overrides.insert(key, value);
        })
    }

    pub fn validate_calls(&self) -> usize {
        self.inner.validate_calls.load(Ordering::SeqCst)
    }

    pub fn prepare_calls(&self) -> usize {
        self.inner.prepare_calls.load(Ordering::SeqCst)
    }

    fn with(self, f: impl FnOnce(&mut MockFlavorInner)) -> Self {
        let mut inner = Arc::try_unwrap(self.inner).unwrap_or_else(|shared| MockFlavorInner {
            reject: shared.reject.clone(),
            tags: shared.tags.clone(),
            init: shared.init.clone(),
            property_overrides: shared.property_overrides.clone(),
            ..Default::default()
        });
        f(&mut inner);
        Self {
            inner: Arc::new(inner),
        }
    }
}

#[async_trait::async_trait]
impl Flavor for MockFlavor {
    async fn validate(&self, _properties: &serde_json::Value, _allocation: &Allocation) -> Result<()> {
        self.inner.validate_calls.fetch_add(1, Ordering::SeqCst);
        match &self.inner.reject {
            Some(message) => Err(Error::validation(message.clone())),
            None => Ok(()),
        }
    }

    async fn prepare(
        &self,
        _properties: &serde_json::Value,
        mut spec: InstanceSpec,
        _allocation: &Allocation,
    ) -> Result<InstanceSpec> {
        self.inner.prepare_calls.fetch_add(1, Ordering::SeqCst);

        for (key, value) in &self.inner.tags {
            spec.tags.insert(key.clone(), value.clone());
        }
        if let Some(init) = &self.inner.init {
            spec.init = Some(init.clone());
        }
        if !self.inner.property_overrides.is_empty() {
            if spec.properties.is_null() {
                spec.properties = serde_json::Value::Object(serde_json::Map::new());
            }
            if let Some(object) = spec.properties.as_object_mut() {
                for (key, value) in &self.inner.property_overrides {
                    object.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(spec)
    }
}
