use std::io::Write;

use hand_dispatch::config::{DispatcherConfig, DispatcherConfigOverrides, ThresholdConfig};
use hand_dispatch::entity::AVATAR_SELF_ID;
use tempfile::NamedTempFile;

#[test]
fn partial_config_keeps_defaults_for_missing_fields() {
    let mut temp = NamedTempFile::new().expect("temp dispatcher config");
    write!(
        temp,
        r#"{{"trigger":{{"on_threshold":0.4}},"modules":{{"LeftNearGrabEntity":{{"priority":90}}}}}}"#
    )
    .expect("write config");

    let config = DispatcherConfig::load(temp.path()).expect("load config");
    assert_eq!(config.trigger, ThresholdConfig::new(0.4, 0.10));
    assert_eq!(config.grip, ThresholdConfig::default());
    assert_eq!(config.actor_id, AVATAR_SELF_ID);
    let grab = config.module("LeftNearGrabEntity").expect("module override");
    assert!(grab.enabled, "modules stay enabled unless disabled explicitly");
    assert_eq!(grab.priority, Some(90));
    assert!(config.module_enabled("RightFarTriggerEntity"));
}

#[test]
fn inverted_thresholds_fall_back_to_defaults() {
    let mut temp = NamedTempFile::new().expect("temp dispatcher config");
    write!(temp, r#"{{"trigger":{{"on_threshold":0.05,"off_threshold":0.2}}}}"#).expect("write config");
    let config = DispatcherConfig::load(temp.path()).expect("load config");
    assert_eq!(config.trigger, ThresholdConfig::default());
}

#[test]
fn unreadable_config_uses_defaults() {
    let missing = DispatcherConfig::load_or_default("does/not/exist.json");
    assert_eq!(missing, DispatcherConfig::default());

    let mut temp = NamedTempFile::new().expect("temp dispatcher config");
    write!(temp, "{{ not json").expect("write config");
    assert!(DispatcherConfig::load(temp.path()).is_err());
    assert_eq!(DispatcherConfig::load_or_default(temp.path()), DispatcherConfig::default());
}

#[test]
fn overrides_apply_on_top_of_file_values() {
    let mut config = DispatcherConfig::default();
    let overrides = DispatcherConfigOverrides {
        trigger_on: Some(0.5),
        trigger_off: None,
        disabled_modules: vec!["RightNearTriggerEntity".to_string()],
    };
    assert!(!overrides.is_empty());
    assert_eq!(overrides.applied_fields(), vec!["trigger_on", "disable"]);

    config.apply_overrides(&overrides);
    assert_eq!(config.trigger.on_threshold, 0.5);
    assert!(!config.module_enabled("RightNearTriggerEntity"));
    assert!(config.module_enabled("LeftNearTriggerEntity"));
    assert!(DispatcherConfigOverrides::default().is_empty());
}
