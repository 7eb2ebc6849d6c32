#![deny(unsafe_code)]
//! CLI binary for inspecting shader packs without a GPU.
//!
//! Subcommands:
//! - `plan [pack]` -- print the pass chain a scene would build
//! - `inspect [pack]` -- print pack directives and per-scene program counts
//!
//! Without a pack path, the pack selected in the config file is used.

mod error;

use clap::{Parser, Subcommand};
use composite_core::plan::cleared_buffers;
use composite_core::{plan_program_set, PackSource, SceneKey, ShaderPack};
use composite_packs::config::DEFAULT_CONFIG_FILE;
use composite_packs::{load_pack_dir, DirectoryPackLoader};
use error::CliError;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "composite", about = "Shader pack composite pipeline CLI")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Pack selection file, used when no pack path is given.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the composite pass chain for one scene.
    Plan {
        /// Pack directory. Defaults to the pack named in the config file.
        pack: Option<PathBuf>,

        /// Scene key (overworld, nether, end).
        #[arg(short, long, default_value = "overworld")]
        scene: String,
    },
    /// Print pack directives and per-scene program counts.
    Inspect {
        /// Pack directory. Defaults to the pack named in the config file.
        pack: Option<PathBuf>,
    },
}

fn load(pack: Option<&Path>, config: &Path) -> Result<ShaderPack, CliError> {
    match pack {
        Some(root) => Ok(load_pack_dir(root)?),
        None => Ok(DirectoryPackLoader::new(config).load()?),
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Plan { pack, scene } => {
            let key = SceneKey::from_name(&scene)
                .ok_or_else(|| CliError::Input(format!("unknown scene '{scene}'")))?;
            let pack = load(pack.as_deref(), &cli.config)?;
            let plan = plan_program_set(pack.program_set(key))?;
            let unpersisted = plan.unpersisted_buffers(&cleared_buffers(&pack.directives)?);

            if cli.json {
                let info = serde_json::json!({
                    "pack": pack.name,
                    "scene": key,
                    "passes": plan.passes,
                    "final_reads_from_alt": plan.final_reads_from_alt,
                    "unpersisted_buffers": unpersisted,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("{} ({key}): {} passes", pack.name, plan.passes.len());
                for pass in &plan.passes {
                    let writes: Vec<String> =
                        pass.draw_buffers.iter().map(ToString::to_string).collect();
                    println!(
                        "  {:<16} scale {:<5} reads {} writes [{}]{}",
                        pass.name,
                        pass.viewport_scale,
                        pass.stage_reads_from_alt,
                        writes.join(", "),
                        if pass.is_last_pass { " -> output" } else { "" }
                    );
                }
                for slot in unpersisted {
                    eprintln!("warning: buffer {slot} needs to be persisted across frames");
                }
            }
        }
        Command::Inspect { pack } => {
            let pack = load(pack.as_deref(), &cli.config)?;
            let scenes: Vec<serde_json::Value> = SceneKey::ALL
                .iter()
                .map(|&key| {
                    let set = pack.program_set(key);
                    serde_json::json!({
                        "scene": key,
                        "override": pack.scene_overrides.contains_key(&key),
                        "composite": set.composite.len(),
                        "runnable": set.ordered_programs().len(),
                        "final": set.final_pass.as_ref().is_some_and(|p| p.is_valid()),
                    })
                })
                .collect();

            if cli.json {
                let info = serde_json::json!({
                    "pack": pack.name,
                    "internal": pack.is_internal(),
                    "directives": pack.directives,
                    "scenes": scenes,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                let directives = &pack.directives;
                println!("Pack: {}", pack.name);
                println!("  buffers cleared: {:?}", directives.buffers_to_clear);
                println!("  formats: {:?}", directives.formats);
                println!("  noise resolution: {}", directives.noise_texture_resolution);
                println!("Scenes:");
                for key in SceneKey::ALL {
                    let set = pack.program_set(key);
                    println!(
                        "  {:<10} {} composite, {} runnable{}",
                        key.name(),
                        set.composite.len(),
                        set.ordered_programs().len(),
                        if pack.scene_overrides.contains_key(&key) {
                            " (override)"
                        } else {
                            ""
                        }
                    );
                }
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
