//! # Indoor Scene Generator
//!
//! Composes one indoor scene headlessly and writes its state and stage
//! records to the output folder.
//!
//! ## Usage
//!
//! ```bash
//! generate_indoors --output_folder out/scene_0 -s 0x2a -t coarse -g base fast_solve -p topview=true
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use hearth::{compose_indoors, ComposeConfig, HeadlessCollaborators};
use hearth_pipeline::SceneSeed;
use hearth_state::ProxyGeometry;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Tasks understood on the command line. Only `coarse` runs here.
const TASKS: [&str; 7] = [
    "coarse",
    "populate",
    "fine_terrain",
    "ground_truth",
    "render",
    "mesh_save",
    "export",
];

const DEBUG_FILTER: &str = "info,hearth=debug,hearth_solver=debug,hearth_pipeline=debug";

fn print_help() {
    println!("Usage: generate_indoors [OPTIONS]");
    println!();
    println!("Options:");
    println!("      --output_folder <DIR>    Where scene files are written (default: outputs)");
    println!("      --input_folder <DIR>     Results of an earlier task");
    println!("  -s, --seed <SEED>            Scene seed, decimal or 0x hex (default: clock)");
    println!("  -t, --task <TASK>...         {}", TASKS.join(", "));
    println!("  -g, --configs <NAME>...      Config files in the configs folder (default: base)");
    println!("  -p, --overrides <K=V>...     Config overrides, applied last");
    println!("      --configs_folder <DIR>   Folder holding config files");
    println!("      --task_uniqname <NAME>   Name of this task's record file");
    println!("  -d, --debug                  Debug logging for the hearth crates");
    println!("  -h, --help                   Show this help");
}

/// Collects the values following a multi-value flag, up to the next flag.
fn take_values(args: &[String], i: &mut usize) -> Vec<String> {
    let mut out = Vec::new();
    while *i + 1 < args.len() && !args[*i + 1].starts_with('-') {
        out.push(args[*i + 1].clone());
        *i += 1;
    }
    out
}

#[allow(clippy::too_many_lines)]
fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let mut output_folder = PathBuf::from("outputs");
    let mut input_folder: Option<PathBuf> = None;
    let mut configs_folder = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("configs");
    let mut seed: Option<String> = None;
    let mut tasks: Vec<String> = Vec::new();
    let mut configs: Vec<String> = Vec::new();
    let mut overrides: Vec<String> = Vec::new();
    let mut task_uniqname: Option<String> = None;
    let mut debug = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--output_folder" => {
                if i + 1 < args.len() {
                    output_folder = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "--input_folder" => {
                if i + 1 < args.len() {
                    input_folder = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--configs_folder" => {
                if i + 1 < args.len() {
                    configs_folder = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "--seed" | "-s" => {
                if i + 1 < args.len() {
                    seed = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--task" | "-t" => tasks.extend(take_values(&args, &mut i)),
            "--configs" | "-g" => configs.extend(take_values(&args, &mut i)),
            "--overrides" | "-p" => overrides.extend(take_values(&args, &mut i)),
            "--task_uniqname" => {
                if i + 1 < args.len() {
                    task_uniqname = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--debug" | "-d" => debug = true,
            "--help" | "-h" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            other => {
                eprintln!("unknown argument `{other}`, see --help");
                return ExitCode::FAILURE;
            }
        }
        i += 1;
    }

    let filter = if debug {
        EnvFilter::new(DEBUG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if tasks.is_empty() {
        tasks.push("coarse".to_string());
    }
    if configs.is_empty() {
        configs.push("base".to_string());
    }
    if let Some(unknown) = tasks.iter().find(|t| !TASKS.contains(&t.as_str())) {
        error!(task = %unknown, "unknown task");
        return ExitCode::FAILURE;
    }

    let seed = match seed.as_deref().map(SceneSeed::parse) {
        Some(Ok(seed)) => seed,
        Some(Err(err)) => {
            error!(error = %err, "bad seed");
            return ExitCode::FAILURE;
        }
        None => {
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.subsec_nanos())
                .unwrap_or_default();
            SceneSeed::new(u64::from(nanos))
        }
    };

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         HEARTH INDOOR SCENE GENERATOR                            ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();
    println!("┌─ CONFIGURATION ─────────────────────────────────────────────────┐");
    println!("│ Seed:               {:#x}", seed.value());
    println!("│ Output Folder:      {}", output_folder.display());
    println!("│ Tasks:              {}", tasks.join(" "));
    println!("│ Configs:            {}", configs.join(" "));
    println!("│ Overrides:          {}", overrides.join(" "));
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    let config = match ComposeConfig::load(&configs_folder, &configs, &overrides) {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "cannot load configuration");
            return ExitCode::FAILURE;
        }
    };

    for task in &tasks {
        if task != "coarse" {
            info!(
                task = %task,
                input = ?input_folder,
                uniqname = ?task_uniqname,
                "task is handled by an external tool"
            );
            continue;
        }

        let mut collab = HeadlessCollaborators::new();
        match compose_indoors(&output_folder, seed, &config, ProxyGeometry::new(), &mut collab) {
            Ok(out) => {
                println!("┌─ RESULT ────────────────────────────────────────────────────────┐");
                println!("│ Entities:           {}", out.state.len());
                println!("│ Meshes:             {}", out.backend.len());
                println!("│ Height Offset:      {:.3}", out.height_offset);
                if let Some(b) = out.whole_bbox {
                    let [x, y, z] = b.size();
                    println!("│ House Size:         {x:.2} x {y:.2} x {z:.2} m");
                }
                println!("└──────────────────────────────────────────────────────────────────┘");
            }
            Err(err) => {
                error!(error = %err, "composition failed");
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}
