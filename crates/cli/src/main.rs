//! volalg CLI - voxelwise arithmetic on scalar image volumes

mod io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use volalg_algorithms::algebra::{ExpParams, MultiplyParams, OverflowPolicy, VolumeOp};
use volalg_algorithms::threshold::{threshold, ThresholdMode, ThresholdParams};
use volalg_core::{DataType, VolumeGeometry, VolumeStatistics};

use crate::io::{read_volume, with_volume, write_volume, TypedVolume};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "volalg")]
#[command(author, version, about = "Voxelwise arithmetic on scalar image volumes", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a volume file
    Info {
        /// Input volume (TIFF stack)
        input: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Voxelwise arithmetic between volumes
    Algebra {
        #[command(subcommand)]
        operation: AlgebraCommands,
    },
    /// Replace voxels above, below or outside a threshold
    Threshold {
        /// Input volume
        input: PathBuf,
        /// Output file
        output: PathBuf,
        /// Which voxels to replace: above, below, outside
        #[arg(short, long, default_value = "above")]
        mode: String,
        /// Threshold for above/below
        #[arg(long, default_value = "0.5")]
        value: f64,
        /// Lower bound for outside
        #[arg(long)]
        lower: Option<f64>,
        /// Upper bound for outside
        #[arg(long)]
        upper: Option<f64>,
        /// Value written into replaced voxels
        #[arg(long, default_value = "0")]
        outside_value: f64,
        /// Replace the voxels that would otherwise be kept
        #[arg(long)]
        negate: bool,
        /// Output sample type (defaults to the input's)
        #[arg(long)]
        dtype: Option<String>,
    },
}

// ─── Algebra subcommands ────────────────────────────────────────────────

#[derive(Subcommand)]
enum AlgebraCommands {
    /// A + B
    Add {
        /// First input volume
        #[arg(short)]
        a: PathBuf,
        /// Second input volume
        #[arg(short)]
        b: PathBuf,
        /// Output file
        output: PathBuf,
        /// Output sample type
        #[arg(long, default_value = "f64")]
        dtype: String,
    },
    /// (scale_a * A) * (scale_b * B)
    Multiply {
        /// First input volume
        #[arg(short)]
        a: PathBuf,
        /// Second input volume
        #[arg(short)]
        b: PathBuf,
        /// Output file
        output: PathBuf,
        /// Factor applied to A
        #[arg(long, default_value = "1.0")]
        scale_a: f64,
        /// Factor applied to B
        #[arg(long, default_value = "1.0")]
        scale_b: f64,
        /// Output sample type
        #[arg(long, default_value = "f64")]
        dtype: String,
    },
    /// A / (B + 0.1)
    Divide {
        /// Dividend volume
        #[arg(short)]
        a: PathBuf,
        /// Divisor volume
        #[arg(short)]
        b: PathBuf,
        /// Output file
        output: PathBuf,
        /// Output sample type
        #[arg(long, default_value = "f64")]
        dtype: String,
    },
    /// A ^ exponent
    Power {
        /// Input volume
        input: PathBuf,
        /// Output file
        output: PathBuf,
        /// Exponent
        #[arg(short, long, allow_negative_numbers = true)]
        exponent: f64,
        /// Output sample type
        #[arg(long, default_value = "f64")]
        dtype: String,
    },
    /// e ^ A
    Exp {
        /// Input volume
        input: PathBuf,
        /// Output file
        output: PathBuf,
        /// Clamp overflowing voxels to the largest finite value instead of +inf
        #[arg(long)]
        saturate: bool,
        /// Output sample type
        #[arg(long, default_value = "f64")]
        dtype: String,
    },
    /// ln(A); fails on voxels <= 0
    Log {
        /// Input volume
        input: PathBuf,
        /// Output file
        output: PathBuf,
        /// Output sample type
        #[arg(long, default_value = "f64")]
        dtype: String,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Load an input volume, refusing files without image data
fn read_input(path: &Path) -> Result<TypedVolume> {
    if !path.exists() {
        debug!("input check failed: {} does not exist", path.display());
        anyhow::bail!("Input volume not found: {}", path.display());
    }

    let pb = spinner("Reading volume...");
    let volume = read_volume(path)
        .with_context(|| format!("Failed to read volume {}", path.display()))?;
    pb.finish_and_clear();

    if !volume.has_data() {
        debug!("input check failed: no image data in {}", path.display());
        anyhow::bail!("Volume has no image data: {}", path.display());
    }

    info!(
        "Input: {} shape {:?} ({})",
        path.display(),
        volume.shape(),
        volume.dtype()
    );
    Ok(volume)
}

/// Refuse to write the output over one of the inputs
fn check_output(inputs: &[&Path], output: &Path) -> Result<()> {
    let out = output.canonicalize().unwrap_or_else(|_| output.to_path_buf());
    for input in inputs {
        let inp = input.canonicalize().unwrap_or_else(|_| input.to_path_buf());
        if inp == out {
            debug!(
                "output check failed: {} is also an input. Choose a new file for the output",
                output.display()
            );
            anyhow::bail!(
                "Output {} would overwrite an input volume",
                output.display()
            );
        }
    }
    Ok(())
}

fn parse_dtype(s: &str) -> Result<DataType> {
    s.parse::<DataType>().with_context(|| {
        format!(
            "Unknown dtype: {}. Use u8, i8, u16, i16, u32, i32, u64, i64, f32 or f64.",
            s
        )
    })
}

fn parse_threshold_mode(
    mode: &str,
    value: f64,
    lower: Option<f64>,
    upper: Option<f64>,
) -> Result<ThresholdMode> {
    match mode.to_lowercase().as_str() {
        "above" | "a" => Ok(ThresholdMode::Above(value)),
        "below" | "b" => Ok(ThresholdMode::Below(value)),
        "outside" | "o" => match (lower, upper) {
            (Some(lower), Some(upper)) => Ok(ThresholdMode::Outside { lower, upper }),
            _ => anyhow::bail!("Mode outside needs both --lower and --upper"),
        },
        _ => anyhow::bail!("Unknown mode: {}. Use above, below, or outside.", mode),
    }
}

fn write_result(volume: &TypedVolume, dtype: DataType, path: &Path) -> Result<()> {
    let pb = spinner("Writing output...");
    write_volume(volume, dtype, path)
        .with_context(|| format!("Failed to write output as {}", dtype))?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

/// Load operands, run one algebra operator and write the result
fn run_algebra(op: VolumeOp, a: &Path, b: Option<&Path>, output: &Path, dtype: &str) -> Result<()> {
    let dtype = parse_dtype(dtype)?;

    let mut inputs = vec![a];
    inputs.extend(b);
    check_output(&inputs, output)?;

    let a_vol = read_input(a)?.cast::<f64>()?;
    let b_vol = match b {
        Some(path) => Some(read_input(path)?.cast::<f64>()?),
        None => None,
    };

    info!("Processing started: {}", op.name());
    let pb = spinner("Computing...");
    let start = Instant::now();
    let result = op
        .apply(&a_vol, b_vol.as_ref())
        .with_context(|| format!("Failed to compute {}", op.name()));
    pb.finish_and_clear();
    let result = result?;
    let elapsed = start.elapsed();
    info!("Processing completed: {}", op.name());

    write_result(&result.into(), dtype, output)?;
    done(op.name(), output, elapsed);
    Ok(())
}

#[derive(Serialize)]
struct VolumeReport<'a> {
    file: String,
    shape: &'a [usize],
    dtype: DataType,
    voxels: usize,
    geometry: &'a VolumeGeometry,
    statistics: VolumeStatistics,
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input, json } => {
            let volume = read_volume(&input)
                .with_context(|| format!("Failed to read volume {}", input.display()))?;
            let report = VolumeReport {
                file: input.display().to_string(),
                shape: volume.shape(),
                dtype: volume.dtype(),
                voxels: volume.len(),
                geometry: volume.geometry(),
                statistics: volume.statistics(),
            };

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("Failed to encode report")?
                );
                return Ok(());
            }

            let stats = &report.statistics;
            println!("File: {}", report.file);
            println!("Shape: {:?} ({} voxels)", report.shape, report.voxels);
            println!("Type: {}", report.dtype);
            println!("Origin: {:?}", report.geometry.origin);
            println!("Spacing: {:?}", report.geometry.spacing);
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            if report.voxels > 0 {
                println!(
                    "  Valid voxels: {} ({:.1}%)",
                    stats.valid_count,
                    100.0 * stats.valid_count as f64 / report.voxels as f64
                );
            }
        }

        // ── Algebra ──────────────────────────────────────────────────
        Commands::Algebra { operation } => match operation {
            AlgebraCommands::Add {
                a,
                b,
                output,
                dtype,
            } => run_algebra(VolumeOp::Add, &a, Some(b.as_path()), &output, &dtype)?,

            AlgebraCommands::Multiply {
                a,
                b,
                output,
                scale_a,
                scale_b,
                dtype,
            } => {
                let op = VolumeOp::Multiply(MultiplyParams { scale_a, scale_b });
                run_algebra(op, &a, Some(b.as_path()), &output, &dtype)?
            }

            AlgebraCommands::Divide {
                a,
                b,
                output,
                dtype,
            } => run_algebra(VolumeOp::Divide, &a, Some(b.as_path()), &output, &dtype)?,

            AlgebraCommands::Power {
                input,
                output,
                exponent,
                dtype,
            } => run_algebra(VolumeOp::Power { exponent }, &input, None, &output, &dtype)?,

            AlgebraCommands::Exp {
                input,
                output,
                saturate,
                dtype,
            } => {
                let overflow = if saturate {
                    OverflowPolicy::Saturate
                } else {
                    OverflowPolicy::Propagate
                };
                run_algebra(VolumeOp::Exp(ExpParams { overflow }), &input, None, &output, &dtype)?
            }

            AlgebraCommands::Log {
                input,
                output,
                dtype,
            } => run_algebra(VolumeOp::Log, &input, None, &output, &dtype)?,
        },

        // ── Threshold ────────────────────────────────────────────────
        Commands::Threshold {
            input,
            output,
            mode,
            value,
            lower,
            upper,
            outside_value,
            negate,
            dtype,
        } => {
            let mode = parse_threshold_mode(&mode, value, lower, upper)?;
            check_output(&[input.as_path()], &output)?;
            let volume = read_input(&input)?;
            let dtype = match dtype {
                Some(s) => parse_dtype(&s)?,
                None => volume.dtype(),
            };

            let params = ThresholdParams {
                mode,
                outside_value,
                negate,
            };
            info!("Processing started: threshold {:?}", params.mode);
            let start = Instant::now();
            let result: TypedVolume =
                with_volume!(&volume, v => threshold(v, &params).map(TypedVolume::from))
                    .context("Failed to threshold")?;
            let elapsed = start.elapsed();
            info!("Processing completed: threshold");

            write_result(&result, dtype, &output)?;
            done("Threshold", &output, elapsed);
        }
    }

    Ok(())
}
