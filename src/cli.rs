use crate::config::DispatcherConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HarnessArgs {
    pub fixture: Option<PathBuf>,
    pub golden: Option<PathBuf>,
    pub write_output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub help: bool,
    trigger_on: Option<f32>,
    trigger_off: Option<f32>,
    disabled_modules: Vec<String>,
}

impl HarnessArgs {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = HarnessArgs::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            if flag == "--help" || flag == "-h" {
                parsed.help = true;
                continue;
            }
            if !flag.starts_with('-') {
                bail!("Unexpected argument '{flag}'. Flags take the form --name <value>.");
            }
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match flag {
                "--fixture" | "-f" => parsed.fixture = Some(PathBuf::from(value)),
                "--golden" | "-g" => parsed.golden = Some(PathBuf::from(value)),
                "--write-output" | "-o" => parsed.write_output = Some(PathBuf::from(value)),
                "--config" | "-c" => parsed.config = Some(PathBuf::from(value)),
                "--trigger-on" => parsed.trigger_on = Some(parse_threshold("trigger-on", &value)?),
                "--trigger-off" => parsed.trigger_off = Some(parse_threshold("trigger-off", &value)?),
                "--disable" => parsed.disabled_modules.extend(
                    value.split(',').map(str::trim).filter(|name| !name.is_empty()).map(str::to_string),
                ),
                _ => bail!(
                    "Unknown flag '{flag}'. Supported flags: --fixture, --golden, --write-output, --config, \
                     --trigger-on, --trigger-off, --disable."
                ),
            }
        }
        Ok(parsed)
    }

    pub fn config_overrides(&self) -> DispatcherConfigOverrides {
        DispatcherConfigOverrides {
            trigger_on: self.trigger_on,
            trigger_off: self.trigger_off,
            disabled_modules: self.disabled_modules.clone(),
        }
    }
}

fn parse_threshold(flag: &str, value: &str) -> Result<f32> {
    let parsed = value.parse::<f32>().with_context(|| format!("Invalid {flag} value '{value}'"))?;
    if !(0.0..=1.0).contains(&parsed) {
        bail!("Invalid {flag} value '{value}'. Thresholds lie between 0 and 1.");
    }
    Ok(parsed)
}

pub fn print_harness_help() {
    println!("Usage: dispatch_harness --fixture <path> [--golden <path>] [--write-output <path>]");
    println!("  -f, --fixture        Path to a dispatch fixture JSON file");
    println!("  -g, --golden         Optional golden transcript to compare against");
    println!("  -o, --write-output   Optional path to write the actual transcript JSON");
    println!("  -c, --config         Dispatcher config JSON used instead of the fixture's own");
    println!("      --trigger-on     Trigger press threshold override (0..1)");
    println!("      --trigger-off    Trigger release threshold override (0..1)");
    println!("      --disable        Comma-separated module names to leave unregistered");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_paths_and_thresholds() {
        let args = ["harness", "-f", "ticks.json", "--golden", "ticks.golden.json", "--trigger-on", "0.3"];
        let parsed = HarnessArgs::parse(args).expect("parse args");
        assert_eq!(parsed.fixture, Some(PathBuf::from("ticks.json")));
        assert_eq!(parsed.golden, Some(PathBuf::from("ticks.golden.json")));
        let overrides = parsed.config_overrides();
        assert_eq!(overrides.trigger_on, Some(0.3));
        assert_eq!(overrides.applied_fields(), vec!["trigger_on"]);
    }

    #[test]
    fn disable_accumulates_module_names() {
        let args =
            ["harness", "--disable", "LeftNearGrabEntity, RightNearGrabEntity", "--disable", "LeftFarTriggerEntity"];
        let overrides = HarnessArgs::parse(args).expect("parse args").config_overrides();
        assert_eq!(
            overrides.disabled_modules,
            vec!["LeftNearGrabEntity", "RightNearGrabEntity", "LeftFarTriggerEntity"]
        );
    }

    #[test]
    fn missing_value_errors() {
        let err = HarnessArgs::parse(["harness", "--fixture"]).unwrap_err();
        assert!(err.to_string().contains("Expected a value"), "error should mention missing value");
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        let err = HarnessArgs::parse(["harness", "--trigger-off", "1.5"]).unwrap_err();
        assert!(err.to_string().contains("between 0 and 1"));
    }

    #[test]
    fn rejects_unknown_flags() {
        let err = HarnessArgs::parse(["harness", "--foo", "bar"]).unwrap_err();
        assert!(err.to_string().contains("Unknown flag"), "unknown flags should error");
        assert!(HarnessArgs::parse(["harness", "-h"]).expect("help").help);
    }
}
