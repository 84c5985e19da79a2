use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use rastermill::{
    Artifact, EditorConfig, EnginePolicy, EngineSwitch, ImageArtifact, ImageListArtifact,
    JsonFileStore, KeyValueStore, MemoryStore, ParamValue, PipelineSession, StepOutcome,
    TracingSink,
    kernels::fill::{FillSettings, apply_fill, parse_hex_color, preview_from_click},
    pipeline::typing::{resolve_enabled_linear, validate_linear_chain_types},
    tuning::{
        model::ComponentConfig,
        presets::{apply_preset, builtin_presets, find_preset},
    },
};

#[derive(Parser, Debug)]
#[command(name = "rastermill", version)]
struct Cli {
    /// Editor config JSON.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON file backing persisted tuning, recipes and user pipelines.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Report the alternate engine as ready.
    #[arg(long, global = true)]
    alternate_engine: bool,

    /// Debug-level logging.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List pipelines with their chain typing.
    Pipelines,
    /// List catalogue operations.
    Ops,
    /// Run a pipeline on one or more images.
    Run(RunArgs),
    /// Paint the region enclosed by outlines around a point.
    Fill(FillArgs),
    /// Inspect or edit tuning overrides.
    #[command(subcommand)]
    Tuning(TuningCommand),
    /// Write user pipelines and recipes to a bundle file.
    Export {
        /// Output JSON path.
        #[arg(long)]
        out: PathBuf,
    },
    /// Merge a bundle file into the store.
    Import {
        /// Input JSON path.
        #[arg(long = "in")]
        in_path: PathBuf,
    },
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Pipeline id.
    #[arg(long)]
    pipeline: String,

    /// Input image(s). More than one feeds an image list.
    #[arg(long = "in", required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Output path for the final artifact.
    #[arg(long)]
    out: PathBuf,

    /// Recipe id (`default` for none). Defaults to the stored selection.
    #[arg(long)]
    recipe: Option<String>,

    /// Run only the first N steps.
    #[arg(long)]
    steps: Option<usize>,
}

#[derive(Parser, Debug)]
struct FillArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Point inside the region, as `x,y`.
    #[arg(long, value_parser = parse_point)]
    at: (u32, u32),

    /// Fill color (`#rrggbb`).
    #[arg(long, default_value = "#ff0000")]
    color: String,

    /// Outlines are light on a dark background.
    #[arg(long)]
    light_edges: bool,

    /// Luminance distance still counted as an outline.
    #[arg(long, default_value_t = 80)]
    edge_threshold: u8,

    /// Outline dilation passes (0..=6).
    #[arg(long, default_value_t = 2)]
    edge_dilate: u32,

    /// Refuse regions larger than this many pixels.
    #[arg(long, default_value_t = 200_000)]
    max_region: usize,
}

fn parse_point(s: &str) -> Result<(u32, u32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y, got '{s}'"))?;
    let coord = |v: &str| v.trim().parse::<u32>().map_err(|e| format!("'{v}': {e}"));
    Ok((coord(x)?, coord(y)?))
}

#[derive(Subcommand, Debug)]
enum TuningCommand {
    /// Show a component subtree with effective engines and params.
    Show {
        /// Component id.
        #[arg(default_value = "app")]
        component: String,
    },
    /// Store an engine policy and/or parameter overrides.
    Set {
        /// Component id.
        component: String,
        /// Engine policy (inherit|native|opencv|auto).
        #[arg(long)]
        policy: Option<EnginePolicy>,
        /// Parameter assignments as key=value.
        params: Vec<String>,
    },
    /// Drop stored overrides of a component (or a single param).
    Reset {
        /// Component id.
        component: String,
        /// Only this parameter.
        #[arg(long)]
        param: Option<String>,
    },
    /// Apply a built-in preset; without an id, list presets.
    Preset {
        /// Preset id.
        id: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config, cli.verbose);

    let session = open_session(&config)?;
    match cli.cmd {
        Command::Pipelines => cmd_pipelines(&session),
        Command::Ops => cmd_ops(&session),
        Command::Run(args) => cmd_run(session, args),
        Command::Fill(args) => cmd_fill(&args),
        Command::Tuning(cmd) => cmd_tuning(&session, cmd),
        Command::Export { out } => cmd_export(&session, &out),
        Command::Import { in_path } => cmd_import(&session, &in_path),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<EditorConfig> {
    let mut config = match &cli.config {
        Some(path) => EditorConfig::from_path(path)?,
        None => EditorConfig::default(),
    };
    if cli.store.is_some() {
        config.store_path.clone_from(&cli.store);
    }
    config.alternate_engine_ready |= cli.alternate_engine;
    Ok(config)
}

fn init_tracing(config: &EditorConfig, verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        config.log_level.as_tracing()
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn open_session(config: &EditorConfig) -> anyhow::Result<PipelineSession> {
    let kv: Arc<dyn KeyValueStore> = match &config.store_path {
        Some(path) => Arc::new(JsonFileStore::new(path)),
        None => {
            tracing::info!("no store configured, state is kept in memory");
            Arc::new(MemoryStore::new())
        }
    };
    let probe = Arc::new(EngineSwitch::new(config.alternate_engine_ready));
    Ok(PipelineSession::open(kv, probe, Arc::new(TracingSink))?)
}

fn cmd_pipelines(session: &PipelineSession) -> anyhow::Result<()> {
    let catalogue = session.catalogue();
    for p in catalogue.list_pipelines() {
        let origin = if catalogue.is_user(&p.id) { "user" } else { "builtin" };
        let typing = if !p.implemented {
            "not implemented".to_string()
        } else {
            let plan = resolve_enabled_linear(p, catalogue)?;
            match plan.specs.first() {
                None => "no ops".to_string(),
                Some(first) => {
                    let start = first.io.input;
                    let t = validate_linear_chain_types(&plan.specs, &plan.instances, start);
                    match (t.error, t.end_type) {
                        (Some(e), _) => e,
                        (None, Some(end)) => format!("{} -> {end}", t.start_type),
                        (None, None) => "no ops".to_string(),
                    }
                }
            }
        };
        println!("{:<16} {:<8} {:<28} {typing}", p.id, origin, p.title);
    }
    Ok(())
}

fn cmd_ops(session: &PipelineSession) -> anyhow::Result<()> {
    for op in session.catalogue().list_ops() {
        println!(
            "{:<34} {:<12} {:<10} {:<24} {}",
            op.id,
            op.group.as_str(),
            op.kind_label(),
            op.io.to_string(),
            op.title
        );
    }
    Ok(())
}

fn read_image(path: &Path) -> anyhow::Result<ImageArtifact> {
    let bytes = std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    rastermill::decode_image(&bytes).with_context(|| format!("decode image '{}'", path.display()))
}

fn write_output(out: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(out, bytes).with_context(|| format!("write output '{}'", out.display()))
}

fn read_input(paths: &[PathBuf]) -> anyhow::Result<Artifact> {
    let items = paths
        .iter()
        .map(|path| read_image(path))
        .collect::<anyhow::Result<Vec<_>>>()?;
    match <[_; 1]>::try_from(items) {
        Ok([single]) => Ok(single.into()),
        Err(items) => Ok(ImageListArtifact { items }.into()),
    }
}

fn cmd_run(mut session: PipelineSession, args: RunArgs) -> anyhow::Result<()> {
    session.set_active_pipeline(&args.pipeline)?;
    if let Some(recipe) = &args.recipe {
        session.set_active_recipe(recipe)?;
    }
    session.set_input(read_input(&args.inputs)?);

    match args.steps {
        Some(n) => {
            for _ in 0..n {
                match session.run_next()? {
                    StepOutcome::Advanced { index } => eprintln!("step {} ok", index + 1),
                    StepOutcome::Failed { .. } | StepOutcome::NotImplemented => {
                        anyhow::bail!("{}", session.status())
                    }
                    StepOutcome::Done => break,
                }
            }
        }
        None => {
            let ok = session.run_all()?.is_some_and(|r| r.is_ok());
            if !ok {
                anyhow::bail!("{}", session.status());
            }
        }
    }

    let published = session.channel().subscribe();
    let artifact = published
        .artifact()
        .context("pipeline produced no artifact")?;
    let (bytes, ext) = rastermill::encode_artifact(artifact)?;
    if args.out.extension().and_then(|e| e.to_str()) != Some(ext) {
        tracing::warn!(out = %args.out.display(), ext, "output extension differs from artifact");
    }
    write_output(&args.out, &bytes)?;

    eprintln!("{} ({})", session.status(), artifact.kind());
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_fill(args: &FillArgs) -> anyhow::Result<()> {
    let image = read_image(&args.in_path)?;
    let settings = FillSettings {
        edges_dark: !args.light_edges,
        edge_threshold: args.edge_threshold,
        edge_dilate: args.edge_dilate,
        max_region_px: args.max_region,
    }
    .clamped();
    let (x, y) = args.at;
    let preview = preview_from_click(&image, x, y, &settings)?;
    let filled = apply_fill(&image, &preview.region, parse_hex_color(&args.color)?)?;
    let (bytes, _) = rastermill::encode_artifact(&filled.into())?;
    write_output(&args.out, &bytes)?;
    eprintln!(
        "filled {} px ({} outline)",
        preview.region.count_set(),
        preview.outline.count_set()
    );
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_tuning(session: &PipelineSession, cmd: TuningCommand) -> anyhow::Result<()> {
    let resolver = session.runner().dispatcher().resolver();
    match cmd {
        TuningCommand::Show { component } => {
            for row in resolver.describe(&component)? {
                let r = &row.resolved;
                let marker = if row.stored.is_some() { "*" } else { " " };
                let mut line = format!(
                    "{}{marker}{} [{}] policy={} engine={}",
                    "  ".repeat(row.depth),
                    r.id,
                    row.title,
                    r.policy,
                    r.engine
                );
                if let Some(reason) = &r.fallback_reason {
                    line.push_str(&format!(" ({reason})"));
                }
                println!("{line}");
                let indent = "  ".repeat(row.depth);
                for (key, value) in &r.params {
                    println!("{indent}    {key} = {}", serde_json::to_string(value)?);
                }
            }
        }
        TuningCommand::Set {
            component,
            policy,
            params,
        } => {
            resolver.registry().require(&component)?;
            let mut patch = ComponentConfig {
                engine_policy: policy,
                ..ComponentConfig::default()
            };
            for kv in &params {
                let (key, value) = kv
                    .split_once('=')
                    .with_context(|| format!("expected key=value, got '{kv}'"))?;
                patch
                    .params
                    .insert(key.trim().to_string(), ParamValue::parse_literal(value));
            }
            resolver.store().set_component_config(&component, patch);
            eprintln!("updated {component}");
        }
        TuningCommand::Reset { component, param } => {
            resolver.registry().require(&component)?;
            match param {
                Some(key) => resolver.store().reset_param(&component, &key),
                None => resolver.store().clear_component_config(&component),
            }
            eprintln!("reset {component}");
        }
        TuningCommand::Preset { id: None } => {
            for p in builtin_presets() {
                println!("{:<28} {:<16} {}", p.id, p.target, p.title);
            }
        }
        TuningCommand::Preset { id: Some(id) } => {
            let preset = find_preset(&id).with_context(|| format!("unknown preset '{id}'"))?;
            apply_preset(resolver.store(), resolver.registry(), &preset, &TracingSink)?;
            eprintln!("applied preset {id}");
        }
    }
    Ok(())
}

fn cmd_export(session: &PipelineSession, out: &Path) -> anyhow::Result<()> {
    let text = session.library().export_json()?;
    std::fs::write(out, text).with_context(|| format!("write bundle '{}'", out.display()))?;
    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_import(session: &PipelineSession, in_path: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(in_path)
        .with_context(|| format!("read bundle '{}'", in_path.display()))?;
    let report = session.library().import_json(&text)?;
    eprintln!(
        "imported {} of {} pipeline(s), skipped {}",
        report.imported, report.total_in_file, report.skipped
    );
    Ok(())
}
