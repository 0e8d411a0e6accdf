//! Device setting models: key-value settings with lock flags and templates.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A single device setting.
///
/// Locked settings were pinned by an administrator and keep their value when
/// a template is applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSetting {
    pub key: String,
    pub value: serde_json::Value,
    #[serde(default)]
    pub locked: bool,
}

impl DeviceSetting {
    pub fn new(key: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            value,
            locked: false,
        }
    }

    pub fn locked(key: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            value,
            locked: true,
        }
    }
}

/// A reusable bundle of settings an administrator can apply to a device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsTemplate {
    pub template_id: Uuid,
    pub name: String,
    pub settings: Vec<DeviceSetting>,
}

impl SettingsTemplate {
    /// Applies this template over the device's current settings.
    ///
    /// Locked current settings keep their value; everything else takes the
    /// template's value. Current keys absent from the template survive.
    pub fn apply(&self, current: &[DeviceSetting]) -> Vec<DeviceSetting> {
        let mut merged: HashMap<&str, DeviceSetting> = current
            .iter()
            .map(|s| (s.key.as_str(), s.clone()))
            .collect();

        for setting in &self.settings {
            match merged.get(setting.key.as_str()) {
                Some(existing) if existing.locked => {}
                _ => {
                    merged.insert(setting.key.as_str(), setting.clone());
                }
            }
        }

        let mut result: Vec<DeviceSetting> = merged.into_values().collect();
        result.sort_by(|a, b| a.key.cmp(&b.key));
        result
    }
}

/// Partitions settings into (locked, unlocked).
pub fn partition_locked(settings: &[DeviceSetting]) -> (Vec<&DeviceSetting>, Vec<&DeviceSetting>) {
    settings.iter().partition(|s| s.locked)
}
