//! recflow CLI: run, validate and explain record pipelines.

use clap::{Parser, Subcommand};
use recflow_core::config::{mb_to_bytes, EngineConfig};
use recflow_core::record::{payloads_to_stream, stream_to_payloads, Stream};
use recflow_exec::Engine;
use recflow_planner::{lower_to_physical, parse_yaml_pipeline, plan_yaml, validate};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recflow")]
#[command(about = "recflow: iterate, batch and merge JSON record streams", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a pipeline from a YAML file
    Run {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,

        /// Named input stream, `name=path.json` (repeatable)
        #[arg(short, long = "input", value_parser = parse_input)]
        inputs: Vec<(String, PathBuf)>,

        /// Write the output stream here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the run manifest as JSON
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Default memory ceiling for iterations, in MB (overrides env)
        #[arg(long)]
        memory_limit_mb: Option<f64>,

        /// Global cap on records emitted per iteration (overrides env)
        #[arg(long)]
        max_iterations: Option<usize>,
    },

    /// Validate a pipeline YAML file (structure and config shape)
    Validate {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,
    },

    /// Show the lowered steps for a pipeline (EXPLAIN)
    Explain {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,
    },
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            pipeline,
            inputs,
            output,
            manifest,
            memory_limit_mb,
            max_iterations,
        } => {
            let overrides = Overrides {
                memory_limit_mb,
                max_iterations,
            };
            if let Err(e) = run_pipeline(&pipeline, &inputs, output.as_deref(), manifest.as_deref(), &overrides) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Validate { pipeline } => {
            if let Err(e) = validate_pipeline(&pipeline) {
                eprintln!("Validation failed: {}", e);
                std::process::exit(1);
            }
            println!("✓ Pipeline is valid");
        }
        Commands::Explain { pipeline } => {
            if let Err(e) = explain_pipeline(&pipeline) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

/// `RECFLOW_LOG` selects the filter; warnings only by default. Logs go to
/// stderr so stdout stays clean for the output stream.
fn init_logging() {
    let filter = EnvFilter::try_from_env("RECFLOW_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_input(s: &str) -> Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected name=path, got '{s}'")),
    }
}

#[derive(Debug, Default)]
struct Overrides {
    memory_limit_mb: Option<f64>,
    max_iterations: Option<usize>,
}

fn apply_overrides(cfg: &mut EngineConfig, o: &Overrides) -> Result<(), String> {
    if let Some(mb) = o.memory_limit_mb {
        let bytes = mb_to_bytes(mb);
        if bytes == 0 {
            return Err(format!("--memory-limit-mb must be positive, got {mb}"));
        }
        cfg.memory_limit_bytes = bytes;
    }
    if let Some(n) = o.max_iterations {
        cfg.max_iterations_cap = (n > 0).then_some(n);
    }
    Ok(())
}

/// A JSON array of payloads, or one payload.
fn load_stream(path: &Path) -> Result<Stream, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    let payloads = match value {
        serde_json::Value::Array(items) => items,
        other => vec![other],
    };
    Ok(payloads_to_stream(payloads))
}

fn run_pipeline(
    pipeline_path: &Path,
    inputs: &[(String, PathBuf)],
    output: Option<&Path>,
    manifest_path: Option<&Path>,
    overrides: &Overrides,
) -> Result<(), Box<dyn std::error::Error>> {
    let yaml_content = fs::read_to_string(pipeline_path)?;
    let program = plan_yaml(&yaml_content)?;

    let mut config = EngineConfig::from_env();
    apply_overrides(&mut config, overrides)?;

    let mut streams = BTreeMap::new();
    for (name, path) in inputs {
        let stream = load_stream(path).map_err(|e| format!("input '{name}' ({}): {e}", path.display()))?;
        streams.insert(name.clone(), stream);
    }

    let engine = Engine::new(config);
    let out = engine.run(&program, streams)?;

    let rendered = serde_json::to_string_pretty(&stream_to_payloads(&out.stream))?;
    match output {
        Some(path) => fs::write(path, rendered)?,
        None => println!("{rendered}"),
    }
    if let Some(path) = manifest_path {
        fs::write(path, serde_json::to_string_pretty(&out.manifest)?)?;
    }

    let m = &out.manifest;
    let errored = m.steps.iter().filter(|s| s.errored).count();
    eprintln!("✓ Pipeline executed successfully");
    eprintln!("  Records: {}", out.stream.len());
    eprintln!("  Steps: {} ({} degraded)", m.steps.len(), errored);
    eprintln!("  Duration: {}ms", m.finished_ms.saturating_sub(m.started_ms));
    eprintln!("  Plan hash: {}", m.plan_hash);
    if let Some(d) = &m.outputs_digest {
        eprintln!("  Output digest: {}", d);
    }

    Ok(())
}

fn validate_pipeline(pipeline_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let yaml_content = fs::read_to_string(pipeline_path)?;
    let pipeline = parse_yaml_pipeline(&yaml_content)?;
    let _ = validate(&pipeline)?;
    Ok(())
}

fn explain_pipeline(pipeline_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let yaml_content = fs::read_to_string(pipeline_path)?;
    let pipeline = parse_yaml_pipeline(&yaml_content)?;
    let logical = validate(&pipeline)?;
    let program = lower_to_physical(&logical);

    println!("Pipeline Execution Plan");
    println!("======================");
    println!();
    println!("Inputs: {}", program.inputs.join(", "));
    println!();
    println!("Steps:");
    for (i, line) in program.describe().iter().enumerate() {
        println!("  {}. {}", i + 1, line);
    }
    println!();
    println!("Configs:");
    for step in &program.steps {
        if let Some(b) = program.binding(step.op) {
            println!("  {}: {}", step.name, b.config);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_flag_needs_name_and_path() {
        assert_eq!(
            parse_input("orders=data/orders.json").unwrap(),
            ("orders".to_string(), PathBuf::from("data/orders.json"))
        );
        assert!(parse_input("orders").is_err());
        assert!(parse_input("=x.json").is_err());
    }

    #[test]
    fn cli_overrides_env_defaults() {
        let mut config = EngineConfig::default();
        let o = Overrides {
            memory_limit_mb: Some(2.0),
            max_iterations: Some(0),
        };
        apply_overrides(&mut config, &o).unwrap();
        assert_eq!(config.memory_limit_bytes, 2 * 1024 * 1024);
        assert_eq!(config.max_iterations_cap, None);

        let bad = Overrides {
            memory_limit_mb: Some(-1.0),
            ..Default::default()
        };
        assert!(apply_overrides(&mut config, &bad).is_err());
    }
}
