use std::fs::{self, File};

use anyhow::{anyhow, bail, Context, Result};
use hand_dispatch::cli::{print_harness_help, HarnessArgs};
use hand_dispatch::config::DispatcherConfig;
use hand_dispatch::harness::{load_fixture, run_fixture, HarnessOutput};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    if let Err(err) = run_cli() {
        eprintln!("[dispatch-harness] error: {err:?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = HarnessArgs::parse_from_env()?;
    if args.help {
        print_harness_help();
        return Ok(());
    }
    let fixture_path = args.fixture.clone().ok_or_else(|| anyhow!("--fixture <path> is required"))?;
    let mut fixture = load_fixture(&fixture_path)?;
    if let Some(path) = &args.config {
        fixture.config = DispatcherConfig::load(path)?;
    }
    let overrides = args.config_overrides();
    if !overrides.is_empty() {
        fixture.config.apply_overrides(&overrides);
        tracing::info!(fields = ?overrides.applied_fields(), "applied command-line overrides");
    }
    let output = run_fixture(&fixture)?;

    if let Some(path) = &args.write_output {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating output directory '{}'", parent.display()))?;
            }
        }
        let file =
            File::create(path).with_context(|| format!("writing harness output to '{}'", path.display()))?;
        serde_json::to_writer_pretty(file, &output).with_context(|| "serializing harness output")?;
        println!("[dispatch-harness] wrote {}", path.display());
    }

    if let Some(path) = &args.golden {
        let file = File::open(path).with_context(|| format!("opening golden file '{}'", path.display()))?;
        let expected: HarnessOutput = serde_json::from_reader(file).with_context(|| "parsing golden JSON")?;
        if expected != output {
            bail!(
                "golden mismatch for {} (use --write-output to refresh):\nexpected: {}\nactual:   {}",
                fixture_path.display(),
                serde_json::to_string(&expected).unwrap_or_default(),
                serde_json::to_string(&output).unwrap_or_default(),
            );
        }
        println!("[dispatch-harness] matched golden {}", path.display());
    } else if args.write_output.is_none() {
        serde_json::to_writer_pretty(std::io::stdout(), &output)?;
        println!();
    }

    Ok(())
}
