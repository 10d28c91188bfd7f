use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use spritebunch_core::prelude::*;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

mod settings;

use settings::{DEFAULT_OUT_DIR, LegacySettings, RunConfig, SETTINGS_FILE};

#[derive(Parser, Debug)]
#[command(
    name = "spritebunch",
    about = "Pack a folder of images onto one sprite sheet",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show a progress bar while loading images
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Lay out every image of a folder on one sheet and export it
    Pack(PackArgs),
    /// List the supported metadata and sheet pixel formats
    Formats,
}

#[derive(Parser, Debug, Clone, Default)]
struct PackArgs {
    // Input/Output
    /// Input directory
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory [default: <input>/buncher]
    #[arg(short, long, help_heading = "Input/Output")]
    out_dir: Option<PathBuf>,
    /// Base name of the exported files (name.png plus metadata)
    #[arg(short, long, help_heading = "Input/Output")]
    name: Option<String>,
    /// YAML config file; overrides buncher.data, overridden by flags
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Do not read buncher.data from the output directory
    #[arg(long, default_value_t = false, help_heading = "Input/Output")]
    ignore_settings: bool,
    /// Descend into subdirectories
    #[arg(short, long, default_value_t = false, help_heading = "Input/Output")]
    recursive: bool,
    /// Include patterns (glob, relative to input). If set, only matching files are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob, relative to input)
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    // Sheet
    /// Sheet width
    #[arg(long, help_heading = "Sheet")]
    width: Option<u32>,
    /// Sheet height
    #[arg(long, help_heading = "Sheet")]
    height: Option<u32>,
    /// Gap reserved with every sprite
    #[arg(long, help_heading = "Sheet")]
    padding: Option<u32>,
    /// Margin around the whole sheet
    #[arg(long, help_heading = "Sheet")]
    border: Option<u32>,

    // Layout
    /// Packing method: maxrects | rows
    #[arg(long, help_heading = "Layout")]
    method: Option<String>,
    /// MaxRects heuristic: baf|bssf|blsf|bl|cp
    #[arg(long, help_heading = "Layout")]
    heuristic: Option<String>,
    /// Input order: area_desc|name_asc|width_desc|height_desc|none
    #[arg(long, help_heading = "Layout")]
    sort_order: Option<String>,
    /// Allow 90 degree rotation (MaxRects only)
    #[arg(long, help_heading = "Layout")]
    allow_rotation: Option<bool>,

    // Image Processing
    /// Crop sprites to their opaque bounds
    #[arg(long, help_heading = "Image Processing")]
    crop: Option<bool>,
    /// Transparent pixels added around each sprite
    #[arg(long, help_heading = "Image Processing")]
    expand: Option<u32>,
    /// Edge pixels repeated outward on the sheet (at most padding / 2)
    #[arg(long, help_heading = "Image Processing")]
    extrude: Option<u32>,
    /// Sprite scale factor
    #[arg(long, help_heading = "Image Processing")]
    scale: Option<f32>,

    // Export
    /// Metadata format (see `spritebunch formats`)
    #[arg(short, long, help_heading = "Export")]
    format: Option<String>,
    /// Sheet pixel format: rgba8888|rgba8888_pm|rgba4444_pm|rgb888|rgb565|rgb565_pm|rgb555
    #[arg(long, help_heading = "Export")]
    pixel_format: Option<String>,
    /// Export even when some sprites did not fit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    allow_partial: bool,
    /// Compute the layout and report, but write nothing
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
    /// Write buncher.data even when nothing is exported
    #[arg(long, default_value_t = false, help_heading = "Export")]
    save_settings: bool,
    /// Print the merged configuration and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args, cli.progress && !cli.quiet),
        Commands::Formats => {
            for format in AtlasFormat::ALL {
                println!(
                    "{:<8} {:<7} {}",
                    format.id(),
                    format.extension(),
                    format.display_name()
                );
            }
            println!();
            for pixel in SheetPixelFormat::ALL {
                println!("{:<12} {}", pixel.id(), pixel.display_name());
            }
            Ok(())
        }
    }
}

fn run_pack(args: &PackArgs, show_progress: bool) -> anyhow::Result<()> {
    check_input_dir(&args.input)?;
    let out_dir = args
        .out_dir
        .clone()
        .unwrap_or_else(|| args.input.join(DEFAULT_OUT_DIR));

    let cfg = resolve_config(args, &out_dir)?;
    if args.print_config {
        match args.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    let paths = gather_paths(&args.input, args.recursive, &args.include, &args.exclude, &out_dir)?;
    let mut sprites = load_sprites_with_progress(&args.input, &paths, show_progress)?;
    info!(count = sprites.len(), "loaded input images");
    if sprites.is_empty() {
        anyhow::bail!("no images found in {}", args.input.display());
    }

    sort_sprites(&mut sprites, cfg.effective_sort());
    let report = run_layout(&cfg.sheet, &mut sprites, &cfg.layout).context("layout")?;
    println!("{}", report.summary());
    for s in sprites.iter().filter(|s| !s.is_packed() && !s.is_empty()) {
        warn!(file = s.file_name(), "did not fit");
    }

    let exporting = !args.dry_run;
    if exporting && !report.all_placed() && !args.allow_partial {
        anyhow::bail!(
            "{} sprite(s) did not fit on the {}x{} sheet; enlarge it or pass --allow-partial",
            report.failed,
            cfg.sheet.width,
            cfg.sheet.height
        );
    }
    if exporting || args.save_settings {
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("create out_dir {}", out_dir.display()))?;
        LegacySettings::from_run_config(&cfg).save(&out_dir)?;
    }
    if !exporting {
        info!("dry run: nothing exported");
        return Ok(());
    }

    let sheet_img = render_sheet(&cfg.sheet, &sprites, cfg.layout.extrude);
    let png = out_dir.join(format!("{}.png", cfg.name));
    cfg.pixel_format
        .convert(sheet_img)
        .save(&png)
        .with_context(|| format!("write sheet {}", png.display()))?;
    info!(path = ?png, pixel_format = cfg.pixel_format.id(), "sheet written");

    let meta = export_atlas(cfg.format, &cfg.sheet, &out_dir, &cfg.name, &sprites)
        .with_context(|| format!("export {} metadata", cfg.format.display_name()))?;
    println!("wrote {} and {}", png.display(), meta.display());
    Ok(())
}

/// Refuses missing inputs and an output folder opened as input.
fn check_input_dir(input: &Path) -> anyhow::Result<()> {
    if !input.is_dir() {
        anyhow::bail!("input {} is not a directory", input.display());
    }
    let is_output = input.file_name().and_then(|n| n.to_str()) == Some(DEFAULT_OUT_DIR)
        && input.join(SETTINGS_FILE).is_file();
    if is_output {
        anyhow::bail!(
            "{} looks like a spritebunch output folder; pass its parent instead",
            input.display()
        );
    }
    Ok(())
}

fn resolve_config(args: &PackArgs, out_dir: &Path) -> anyhow::Result<RunConfig> {
    let mut cfg = RunConfig::default();
    if !args.ignore_settings {
        if let Some(saved) = LegacySettings::load(out_dir)? {
            saved.apply(&mut cfg);
        }
    }
    if let Some(path) = &args.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg = y.into_run_config(cfg)?;
    }
    apply_flags(args, &mut cfg)?;
    debug!(?cfg, "resolved configuration");
    Ok(cfg)
}

fn apply_flags(args: &PackArgs, cfg: &mut RunConfig) -> anyhow::Result<()> {
    if let Some(v) = args.width {
        cfg.sheet.width = v;
    }
    if let Some(v) = args.height {
        cfg.sheet.height = v;
    }
    if let Some(v) = args.padding {
        cfg.sheet.padding = v;
    }
    if let Some(v) = args.border {
        cfg.sheet.border = v;
    }
    if let Some(v) = &args.method {
        cfg.layout.method = parse_method(v)?;
    }
    if let Some(v) = &args.heuristic {
        cfg.layout.heuristic = parse_heuristic(v)?;
    }
    if let Some(v) = &args.sort_order {
        cfg.sort_order = Some(parse_sort_order(v)?);
    }
    if let Some(v) = args.allow_rotation {
        cfg.layout.allow_rotation = v;
    }
    if let Some(v) = args.crop {
        cfg.layout.crop = v;
    }
    if let Some(v) = args.expand {
        cfg.layout.expand = v;
    }
    if let Some(v) = args.extrude {
        cfg.layout.extrude = v;
    }
    if let Some(v) = args.scale {
        cfg.layout.scale = v;
    }
    if let Some(v) = &args.format {
        cfg.format = v.parse()?;
    }
    if let Some(v) = &args.pixel_format {
        cfg.pixel_format = v.parse()?;
    }
    if let Some(v) = &args.name {
        cfg.name = v.clone();
    }
    Ok(())
}

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("invalid glob {pat}"))?);
    }
    Ok(Some(b.build()?))
}

fn gather_paths(
    root: &Path,
    recursive: bool,
    include: &[String],
    exclude: &[String],
    out_dir: &Path,
) -> anyhow::Result<Vec<PathBuf>> {
    let inc_set = build_globset(include)?;
    let exc_set = build_globset(exclude)?;
    let mut list: Vec<PathBuf> = Vec::new();
    let walker = WalkDir::new(root)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by_file_name()
        .into_iter()
        // never pack our own output
        .filter_entry(|e| e.path() != out_dir);
    for entry in walker.filter_map(|e| e.ok()) {
        let p = entry.path();
        if !entry.file_type().is_file() || !is_image(p) {
            continue;
        }
        let rel = relative_key(root, p);
        if should_skip(&rel, inc_set.as_ref(), exc_set.as_ref()) {
            debug!(path = %rel, "filtered out");
            continue;
        }
        list.push(p.to_path_buf());
    }
    Ok(list)
}

/// Path relative to the input folder with `/` separators; the plain file name for
/// files directly inside it.
fn relative_key(root: &Path, p: &Path) -> String {
    p.strip_prefix(root)
        .unwrap_or(p)
        .to_string_lossy()
        .replace('\\', "/")
}

fn should_skip(rel: &str, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    if let Some(ex) = exclude {
        if ex.is_match(rel) {
            return true;
        }
    }
    if let Some(inc) = include {
        if !inc.is_match(rel) {
            return true;
        }
    }
    false
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "bmp" | "tga" | "gif")
    )
}

fn load_sprites_with_progress(
    root: &Path,
    paths: &[PathBuf],
    progress: bool,
) -> anyhow::Result<Vec<SpriteRecord>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let key = relative_key(root, p);
        if let Some(b) = &bar {
            b.set_message(key.clone());
        }
        match SpriteRecord::open(p, key) {
            Ok(sprite) => list.push(sprite),
            Err(e) => {
                warn!(?p, error = %e, "skip image");
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(list)
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    // RUST_LOG wins unless a level was asked for on the command line
    let filter = match EnvFilter::try_from_default_env() {
        Ok(env) if !quiet && verbose == 0 => env,
        _ => EnvFilter::new(level),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct YamlConfig {
    width: Option<u32>,
    height: Option<u32>,
    padding: Option<u32>,
    border: Option<u32>,
    method: Option<String>,
    heuristic: Option<String>,
    sort_order: Option<String>,
    allow_rotation: Option<bool>,
    crop: Option<bool>,
    expand: Option<u32>,
    extrude: Option<u32>,
    scale: Option<f32>,
    format: Option<String>,
    pixel_format: Option<String>,
    name: Option<String>,
}

impl YamlConfig {
    fn into_run_config(self, mut cfg: RunConfig) -> anyhow::Result<RunConfig> {
        if let Some(v) = self.width {
            cfg.sheet.width = v;
        }
        if let Some(v) = self.height {
            cfg.sheet.height = v;
        }
        if let Some(v) = self.padding {
            cfg.sheet.padding = v;
        }
        if let Some(v) = self.border {
            cfg.sheet.border = v;
        }
        if let Some(v) = self.method {
            cfg.layout.method = parse_method(&v)?;
        }
        if let Some(v) = self.heuristic {
            cfg.layout.heuristic = parse_heuristic(&v)?;
        }
        if let Some(v) = self.sort_order {
            cfg.sort_order = Some(parse_sort_order(&v)?);
        }
        if let Some(v) = self.allow_rotation {
            cfg.layout.allow_rotation = v;
        }
        if let Some(v) = self.crop {
            cfg.layout.crop = v;
        }
        if let Some(v) = self.expand {
            cfg.layout.expand = v;
        }
        if let Some(v) = self.extrude {
            cfg.layout.extrude = v;
        }
        if let Some(v) = self.scale {
            cfg.layout.scale = v;
        }
        if let Some(v) = self.format {
            cfg.format = v.parse()?;
        }
        if let Some(v) = self.pixel_format {
            cfg.pixel_format = v.parse()?;
        }
        if let Some(v) = self.name {
            cfg.name = v;
        }
        Ok(cfg)
    }
}

fn parse_method(s: &str) -> anyhow::Result<PackMethod> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown packing method: {}", s))
}

fn parse_heuristic(s: &str) -> anyhow::Result<MaxRectsHeuristic> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown MaxRects heuristic: {}", s))
}

fn parse_sort_order(s: &str) -> anyhow::Result<SortOrder> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown sort order: {}", s))
}
