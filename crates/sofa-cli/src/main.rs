//! SOFA CLI: create, inspect and query SOFA datasets.
//!
//! # Usage
//!
//! ```bash
//! sofa conventions
//! sofa create hrtf.sofa --convention SimpleFreeFieldHRIR --measurements 72 --receivers 2 --samples 256
//! sofa info hrtf.sofa --json
//! sofa pose hrtf.sofa --object receiver --relative-to listener --system spherical
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ndarray::ArrayD;

use sofa::conventions::{Convention, ConventionRegistry};
use sofa::spatial::{Descriptor, ObjectKind, Query, System};
use sofa::{AccessMode, Database};

// ───────────────────────────── CLI definition ─────────────────────────────

#[derive(Parser)]
#[command(
    name = "sofa",
    about = "Create, inspect and query SOFA spatial acoustic datasets",
    version
)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a dataset with every spatial object at its default pose.
    Create {
        /// Output .sofa file path.
        output: PathBuf,

        /// Convention to follow (see `sofa conventions`).
        #[arg(short, long)]
        convention: String,

        /// Number of measurements (M).
        #[arg(short, long)]
        measurements: usize,

        /// Number of receivers (R). Defaults to the convention's count.
        #[arg(long)]
        receivers: Option<usize>,

        /// Number of emitters (E). Defaults to the convention's count.
        #[arg(long)]
        emitters: Option<usize>,

        /// Samples per measurement (N). Without it no data variables are created.
        #[arg(long)]
        samples: Option<usize>,
    },

    /// Display the convention, dimensions, variables and metadata of a dataset.
    Info {
        /// Input .sofa file path.
        input: PathBuf,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the pose of a spatial object.
    Pose {
        /// Input .sofa file path.
        input: PathBuf,

        /// Object to resolve: listener, source, receiver or emitter.
        #[arg(short, long)]
        object: String,

        /// Express values in the frame of this object instead of the global frame.
        #[arg(long)]
        relative_to: Option<String>,

        /// Output coordinate system (cartesian or spherical).
        #[arg(long)]
        system: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the built-in conventions.
    Conventions,
}

// ────────────────────────────── main ──────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let registry = ConventionRegistry::with_builtin();
    match cli.command {
        Commands::Create {
            output,
            convention,
            measurements,
            receivers,
            emitters,
            samples,
        } => cmd_create(
            &registry,
            &output,
            &convention,
            measurements,
            receivers,
            emitters,
            samples,
        ),

        Commands::Info { input, json } => cmd_info(&registry, &input, json),

        Commands::Pose {
            input,
            object,
            relative_to,
            system,
            json,
        } => cmd_pose(
            &registry,
            &input,
            &object,
            relative_to.as_deref(),
            system.as_deref(),
            json,
        ),

        Commands::Conventions => cmd_conventions(&registry),
    }
}

// ──────────────────────────── create ──────────────────────────────

/// Transducer count when neither the command line nor the convention fixes one.
fn transducer_count(convention: &Convention, kind: ObjectKind, given: Option<usize>) -> usize {
    let defaults = convention.defaults(kind);
    given.or(defaults.count).unwrap_or(match defaults.local_positions.len() {
        0 => 1,
        n => n,
    })
}

fn cmd_create(
    registry: &ConventionRegistry,
    output: &Path,
    convention: &str,
    measurements: usize,
    receivers: Option<usize>,
    emitters: Option<usize>,
    samples: Option<usize>,
) -> Result<()> {
    if measurements == 0 {
        bail!("--measurements must be at least 1");
    }
    let mut db = Database::create(output, registry, convention, measurements)
        .with_context(|| format!("Failed to create dataset with convention {convention}"))?;

    let all = Descriptor::ALL;
    db.initialize_object(ObjectKind::Listener, &all, &[], None)?;
    db.initialize_object(ObjectKind::Source, &all, &[], None)?;

    let receivers = transducer_count(db.convention(), ObjectKind::Receiver, receivers);
    db.initialize_object(ObjectKind::Receiver, &[Descriptor::Position], &[], Some(receivers))?;
    let emitters = transducer_count(db.convention(), ObjectKind::Emitter, emitters);
    db.initialize_object(ObjectKind::Emitter, &[Descriptor::Position], &[], Some(emitters))?;

    if let Some(samples) = samples {
        db.initialize_data(samples, &[], None)?;
    }
    db.initialize_room(&[], None)?;

    let name = db.convention().name().to_string();
    db.close()
        .with_context(|| format!("Failed to write SOFA file: {}", output.display()))?;

    println!("\n  SOFA Dataset");
    println!("  ============================================");
    println!("  Output:       {}", output.display());
    println!("  Convention:   {name}");
    println!("  Measurements: {measurements}");
    println!("  Receivers:    {receivers}");
    println!("  Emitters:     {emitters}");
    if let Some(samples) = samples {
        println!("  Samples:      {samples}");
    }
    println!("  Done!\n");
    Ok(())
}

// ───────────────────────────── info ───────────────────────────────

fn open(registry: &ConventionRegistry, input: &Path) -> Result<Database> {
    Database::open(input, registry, AccessMode::ReadOnly)
        .with_context(|| format!("Failed to open SOFA file: {}", input.display()))
}

fn cmd_info(registry: &ConventionRegistry, input: &Path, json: bool) -> Result<()> {
    let db = open(registry, input)?;
    let dataset = db.dataset();

    if json {
        let dimensions: serde_json::Map<String, serde_json::Value> = dataset
            .dimensions()
            .iter()
            .map(|(axis, size)| (axis.to_string(), serde_json::json!(size)))
            .collect();
        let variables: Vec<serde_json::Value> = dataset
            .variables()
            .map(|v| {
                serde_json::json!({
                    "name": v.name(),
                    "dimensions": v.dims().iter().map(|a| a.to_string()).collect::<Vec<_>>(),
                    "shape": v.shape(),
                    "attributes": v.attributes(),
                })
            })
            .collect();
        let metadata: serde_json::Map<String, serde_json::Value> = db
            .metadata()
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::json!(v)))
            .collect();
        let info = serde_json::json!({
            "path": input.display().to_string(),
            "convention": db.convention().name(),
            "convention_version": db.convention().version(),
            "data_type": db.convention().data_type().as_str(),
            "dimensions": dimensions,
            "variables": variables,
            "metadata": metadata,
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!();
    println!("  SOFA File Information");
    println!("  ============================================");
    println!("  File:       {}", input.display());
    println!(
        "  Convention: {} {}",
        db.convention().name(),
        db.convention().version()
    );
    println!("  Data type:  {}", db.convention().data_type());
    println!();
    println!("  Dimensions");
    println!("  --------------------------------------------");
    for (axis, size) in dataset.dimensions().iter() {
        println!("  {axis}  {size:>8}  {}", axis.description());
    }
    println!();
    println!("  Variables");
    println!("  --------------------------------------------");
    for variable in dataset.variables() {
        let dims: Vec<String> = variable.dims().iter().map(|a| a.to_string()).collect();
        println!(
            "  {:<22} ({}) {:?}",
            variable.name(),
            dims.join(", "),
            variable.shape()
        );
    }
    println!();
    println!("  Metadata");
    println!("  --------------------------------------------");
    for (key, value) in db.metadata().iter() {
        println!("  {key:<24} {value}");
    }
    println!();
    Ok(())
}

// ───────────────────────────── pose ───────────────────────────────

fn array_json(values: &ArrayD<f64>) -> serde_json::Value {
    serde_json::json!({
        "shape": values.shape(),
        "values": values.iter().copied().collect::<Vec<f64>>(),
    })
}

fn cmd_pose(
    registry: &ConventionRegistry,
    input: &Path,
    object: &str,
    relative_to: Option<&str>,
    system: Option<&str>,
    json: bool,
) -> Result<()> {
    let db = open(registry, input)?;
    let kind: ObjectKind = object.parse()?;
    let reference: Option<ObjectKind> = relative_to.map(str::parse).transpose()?;
    let mut query = Query::new();
    if let Some(system) = system {
        query = query.with_system(system.parse::<System>()?);
    }
    tracing::debug!(object = %kind, reference = ?reference, "Resolving pose");

    let mut resolved: Vec<(Descriptor, ArrayD<f64>)> = Vec::new();
    match reference {
        None => {
            let pose = db
                .pose(kind, &query)
                .with_context(|| format!("Failed to resolve the pose of {kind}"))?;
            for descriptor in Descriptor::ALL {
                resolved.push((descriptor, pose.get(descriptor).clone()));
            }
        }
        Some(reference) => {
            for descriptor in Descriptor::ALL {
                if !db.coordinates(kind, descriptor).exists(db.dataset()) {
                    continue;
                }
                let values = db
                    .relative_values(kind, descriptor, reference, &query)
                    .with_context(|| {
                        format!("Failed to express {kind}{} relative to {reference}", descriptor.as_str())
                    })?;
                resolved.push((descriptor, values));
            }
        }
    }

    let frame = reference.map_or_else(|| "global".to_string(), |r| r.to_string());
    if json {
        let mut out = serde_json::json!({ "object": kind.as_str(), "frame": frame });
        for (descriptor, values) in &resolved {
            out[descriptor.as_str().to_lowercase()] = array_json(values);
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("  {kind} pose ({frame} frame)");
    println!("  ============================================");
    for (descriptor, values) in &resolved {
        println!("  {} {:?}", descriptor.as_str(), values.shape());
        println!("{values:.4}");
    }
    println!();
    Ok(())
}

// ────────────────────────── conventions ───────────────────────────

fn cmd_conventions(registry: &ConventionRegistry) -> Result<()> {
    println!();
    println!("  Built-in conventions");
    println!("  ============================================");
    for convention in registry.iter() {
        println!(
            "  {:<22} {:<5} {:<5} {}",
            convention.name(),
            convention.version(),
            convention.data_type(),
            convention.room_type()
        );
        for rule in convention.rules().names() {
            println!("      - {rule}");
        }
    }
    println!();
    Ok(())
}
