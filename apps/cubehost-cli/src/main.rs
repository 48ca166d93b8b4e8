mod script;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use cubehost_common::{ContractKind, FaceLayout, HostConfig};
use cubehost_input::KeyMap;
use cubehost_render::{RenderModule, SolidFillModule};
use cubehost_session::{Session, SessionConfig};
use cubehost_wasm::{LoadOptions, WasmModule};
use script::{FrameSink, run_script};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cubehost", about = "Inspect render modules and drive them headlessly")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe a module's exports and which call contracts it fits
    Info {
        /// Module file (.wasm or .wat)
        module: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a key script through the render loop and save the last frame
    Render(RenderArgs),
    /// List the key bindings
    Keys {
        /// Face layout: 7 or 8
        #[arg(long, default_value = "seven")]
        faces: FaceLayout,
    },
}

#[derive(Args)]
struct RenderArgs {
    /// Module file (overrides the config file; default out.wasm)
    module: Option<PathBuf>,

    /// Keys to replay, one action per character; whitespace is ignored
    #[arg(short, long, default_value = "")]
    keys: String,

    /// PNG file for the last frame
    #[arg(short, long, default_value = "frame.png")]
    out: PathBuf,

    /// Also write every frame into this directory
    #[arg(long)]
    dump_dir: Option<PathBuf>,

    /// Aux mode passed with one extra final frame
    #[arg(long, allow_hyphen_values = true)]
    mode: Option<i32>,

    /// YAML host configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Call contract of the module's render export: canonical or legacy
    #[arg(long)]
    contract: Option<ContractKind>,

    /// Face layout: 7 or 8
    #[arg(long)]
    faces: Option<FaceLayout>,

    /// Use a built-in solid-fill module instead of loading one
    #[arg(long)]
    dry_run: bool,
}

impl RenderArgs {
    fn host_config(&self) -> Result<HostConfig> {
        let mut config = match &self.config {
            Some(path) => HostConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => HostConfig::default(),
        };
        if let Some(module) = &self.module {
            config.module_path = module.clone();
        }
        if let Some(contract) = self.contract {
            config.contract = contract;
        }
        if let Some(faces) = self.faces {
            config.faces = faces;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info { module, json } => info(&module, json),
        Commands::Render(args) => render(&args),
        Commands::Keys { faces } => {
            for line in key_table(&KeyMap::new(faces)) {
                println!("{line}");
            }
            Ok(())
        }
    }
}

fn key_table(keymap: &KeyMap) -> Vec<String> {
    keymap
        .bindings()
        .map(|(key, action)| format!("{key}  {action:?}"))
        .collect()
}

fn info(path: &Path, json: bool) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let summary = cubehost_wasm::inspect(&bytes)
        .with_context(|| format!("inspecting {}", path.display()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{summary}");
        if !summary.is_loadable() {
            println!("  note: this module cannot be loaded by the host as-is");
        }
    }
    Ok(())
}

fn render(args: &RenderArgs) -> Result<()> {
    let host = args.host_config()?;
    let keymap = KeyMap::new(host.faces);
    let actions = keymap.parse_script(&args.keys);
    let mut session = Session::new(SessionConfig::from(&host));
    let mut sink = FrameSink::new(args.dump_dir.clone());

    let mut module: Box<dyn RenderModule> = if args.dry_run {
        Box::new(SolidFillModule::new(host.surface))
    } else {
        let module = WasmModule::load(&host.module_path, LoadOptions::from(&host))
            .with_context(|| format!("loading module {}", host.module_path.display()))?;
        tracing::info!(
            contract = %module.contract(),
            params = ?module.params(),
            sha256 = module.digest(),
            "module bound"
        );
        Box::new(module)
    };

    let report = run_script(&mut session, module.as_mut(), &actions, args.mode, &mut sink)?;
    sink.save_latest(&args.out)?;

    let o = session.orientation();
    println!(
        "rendered {} frames for {} actions -> {}",
        report.frames,
        report.actions,
        args.out.display()
    );
    println!(
        "state: dt={} orientation=({:.2}, {:.2}, {:.2}) selection={} (face {}, sub {})",
        session.frame(),
        o.x,
        o.y,
        o.z,
        session.selection().composite(),
        session.selection().face(),
        session.selection().sub_index()
    );
    if let Some(dir) = &args.dump_dir {
        println!("wrote {} frames to {}", sink.written(), dir.display());
    }
    Ok(())
}
