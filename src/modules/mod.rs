pub mod far_trigger;
pub mod near_grab;
pub mod near_trigger;

pub use far_trigger::{FarTriggerEntity, FAR_TRIGGER_PRIORITY};
pub use near_grab::{NearGrabEntity, NEAR_GRAB_PRIORITY, NEAR_GRAB_RADIUS};
pub use near_trigger::{NearTriggerEntity, NEAR_TRIGGER_PRIORITY};

use crate::config::DispatcherConfig;
use crate::dispatcher::{DispatcherModule, ModuleRegistry};
use crate::entity::EntityId;
use crate::hand::Hand;

/// Where a per-hand behaviour is in its start → continue → stop cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandState {
    #[default]
    Idle,
    Engaged { target: EntityId },
}

impl HandState {
    pub fn target(self) -> Option<EntityId> {
        match self {
            HandState::Idle => None,
            HandState::Engaged { target } => Some(target),
        }
    }
}

pub fn module_name(hand: Hand, base: &str) -> String {
    format!("{}{base}", hand.module_prefix())
}

/// Registers the left and right instance of every built-in behaviour.
pub fn register_core_modules(registry: &mut ModuleRegistry, config: &DispatcherConfig) {
    for hand in Hand::ALL {
        let modules: [(&str, Box<dyn DispatcherModule>); 3] = [
            ("FarTriggerEntity", Box::new(FarTriggerEntity::new(hand))),
            ("NearTriggerEntity", Box::new(NearTriggerEntity::new(hand))),
            ("NearGrabEntity", Box::new(NearGrabEntity::new(hand))),
        ];
        for (base, module) in modules {
            register_configured(registry, config, module_name(hand, base), module);
        }
    }
}

fn register_configured(
    registry: &mut ModuleRegistry,
    config: &DispatcherConfig,
    name: String,
    module: Box<dyn DispatcherModule>,
) {
    if !config.module_enabled(&name) {
        tracing::debug!(module = %name, "module disabled by config");
        return;
    }
    let mut parameters = module.parameters();
    if let Some(entry) = config.module(&name) {
        if let Some(priority) = entry.priority {
            parameters.priority = priority;
        }
        if let Some(sleep_ms) = entry.sleep_ms_between_runs {
            parameters.sleep_ms_between_runs = sleep_ms;
        }
    }
    registry.register_with_parameters(name, module, parameters);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModuleOverride;

    #[test]
    fn core_modules_register_per_hand() {
        let mut registry = ModuleRegistry::new();
        register_core_modules(&mut registry, &DispatcherConfig::default());
        assert_eq!(registry.len(), 6);
        assert!(registry.contains("LeftFarTriggerEntity"));
        assert!(registry.contains("RightNearGrabEntity"));
        let far = registry.get::<FarTriggerEntity>("RightFarTriggerEntity").expect("far trigger");
        assert_eq!(far.hand(), Hand::Right);
    }

    #[test]
    fn config_overrides_and_disables_modules() {
        let mut config = DispatcherConfig::default();
        config.modules.insert(
            "LeftFarTriggerEntity".into(),
            ModuleOverride { enabled: true, priority: Some(10), sleep_ms_between_runs: Some(100) },
        );
        config.modules.insert(
            "RightNearGrabEntity".into(),
            ModuleOverride { enabled: false, priority: None, sleep_ms_between_runs: None },
        );
        let mut registry = ModuleRegistry::new();
        register_core_modules(&mut registry, &config);

        assert!(!registry.contains("RightNearGrabEntity"));
        let params = registry.entry("LeftFarTriggerEntity").expect("entry").parameters();
        assert_eq!(params.priority, 10);
        assert_eq!(params.sleep_ms_between_runs, 100);
        let untouched = registry.entry("RightFarTriggerEntity").expect("entry").parameters();
        assert_eq!(untouched.priority, FAR_TRIGGER_PRIORITY);
    }
}
