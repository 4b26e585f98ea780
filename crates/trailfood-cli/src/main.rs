//! Trailfood plan reporter
//!
//! Loads a plan directory, prints a summary of every adventure and reports
//! any invariant violations.
//!
//! ```text
//! trailfood <plan-dir> [--snapshot <file>]
//! ```

use std::path::PathBuf;
use trailfood_core::serialize::serialize_registry;
use trailfood_core::validation::validate_registry;
use trailfood_data::load_plan_dir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct Args {
    plan_dir: PathBuf,
    snapshot: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut plan_dir = None;
    let mut snapshot = None;
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--snapshot" => {
                let path = args.next().ok_or("--snapshot needs a file path")?;
                snapshot = Some(PathBuf::from(path));
            }
            "-h" | "--help" => return Err(usage()),
            _ if plan_dir.is_none() => plan_dir = Some(PathBuf::from(arg)),
            _ => return Err(format!("unexpected argument '{arg}'\n{}", usage())),
        }
    }

    Ok(Args {
        plan_dir: plan_dir.ok_or_else(usage)?,
        snapshot,
    })
}

fn usage() -> String {
    "usage: trailfood <plan-dir> [--snapshot <file>]".to_string()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trailfood=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = parse_args()?;
    tracing::info!(dir = %args.plan_dir.display(), "loading plan");
    let loaded = load_plan_dir(&args.plan_dir)?;
    let registry = &loaded.plan.registry;

    let mut adventures = registry.adventures();
    adventures.sort_by_key(|node| (node.created_at(), node.id()));
    for adventure in adventures {
        println!("{}", registry.summary(adventure.id())?);
    }

    let violations = validate_registry(registry, loaded.config.invariant_tolerance);
    if violations.is_empty() {
        tracing::info!(nodes = registry.len(), "registry consistent");
    } else {
        for violation in &violations {
            tracing::warn!(node = %violation.node(), ?violation, "invariant violated");
        }
    }

    if let Some(path) = args.snapshot {
        let bytes = serialize_registry(registry)?;
        std::fs::write(&path, &bytes)?;
        tracing::info!(file = %path.display(), bytes = bytes.len(), "snapshot written");
    }

    Ok(())
}
