use crate::entity::AVATAR_SELF_ID;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "ThresholdConfig::default_on_threshold")]
    pub on_threshold: f32,
    #[serde(default = "ThresholdConfig::default_off_threshold")]
    pub off_threshold: f32,
}

impl ThresholdConfig {
    pub const fn new(on_threshold: f32, off_threshold: f32) -> Self {
        Self { on_threshold, off_threshold }
    }

    const fn default_off_threshold() -> f32 {
        0.10
    }

    const fn default_on_threshold() -> f32 {
        0.15
    }

    pub fn is_valid(&self) -> bool {
        let in_range = |v: f32| v.is_finite() && (0.0..=1.0).contains(&v);
        in_range(self.on_threshold) && in_range(self.off_threshold) && self.on_threshold > self.off_threshold
    }

    /// Returns `self` when usable, otherwise the defaults (with a warning).
    pub fn validated(self, label: &str) -> Self {
        if self.is_valid() {
            self
        } else {
            tracing::warn!(
                on = self.on_threshold,
                off = self.off_threshold,
                "{label} thresholds need on > off within [0, 1]; using defaults"
            );
            Self::default()
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self { on_threshold: Self::default_on_threshold(), off_threshold: Self::default_off_threshold() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleOverride {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub sleep_ms_between_runs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    #[serde(default)]
    pub trigger: ThresholdConfig,
    #[serde(default)]
    pub grip: ThresholdConfig,
    #[serde(default = "DispatcherConfig::default_actor_id")]
    pub actor_id: Uuid,
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleOverride>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatcherConfigOverrides {
    pub trigger_on: Option<f32>,
    pub trigger_off: Option<f32>,
    pub disabled_modules: Vec<String>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            trigger: ThresholdConfig::default(),
            grip: ThresholdConfig::default(),
            actor_id: Self::default_actor_id(),
            modules: BTreeMap::new(),
        }
    }
}

impl DispatcherConfig {
    fn default_actor_id() -> Uuid {
        AVATAR_SELF_ID
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg.validated())
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!("Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn validated(mut self) -> Self {
        self.trigger = self.trigger.validated("trigger");
        self.grip = self.grip.validated("grip");
        self
    }

    pub fn module(&self, name: &str) -> Option<&ModuleOverride> {
        self.modules.get(name)
    }

    pub fn module_enabled(&self, name: &str) -> bool {
        self.module(name).map_or(true, |entry| entry.enabled)
    }

    pub fn apply_overrides(&mut self, overrides: &DispatcherConfigOverrides) {
        if let Some(on) = overrides.trigger_on {
            self.trigger.on_threshold = on;
        }
        if let Some(off) = overrides.trigger_off {
            self.trigger.off_threshold = off;
        }
        for name in &overrides.disabled_modules {
            self.modules.entry(name.clone()).or_insert_with(ModuleOverride::enabled_by_default).enabled = false;
        }
        self.trigger = self.trigger.validated("trigger");
    }
}

impl ModuleOverride {
    fn enabled_by_default() -> Self {
        Self { enabled: true, priority: None, sleep_ms_between_runs: None }
    }
}

impl DispatcherConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.trigger_on.is_none() && self.trigger_off.is_none() && self.disabled_modules.is_empty()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.trigger_on.is_some() {
            fields.push("trigger_on");
        }
        if self.trigger_off.is_some() {
            fields.push("trigger_off");
        }
        if !self.disabled_modules.is_empty() {
            fields.push("disable");
        }
        fields
    }
}

fn default_enabled() -> bool {
    true
}
