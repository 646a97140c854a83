use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::{Context, anyhow};
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use image::ImageFormat;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use spritesheet_core::config::{
    MaxRectsHeuristic, PixelFormat, SortMode, TransparentPolicy, TrimMode,
};
use spritesheet_core::{AtlasConfig, PackOutput, SourceFile, pack_files};
use tracing::{info, warn};
use walkdir::WalkDir;

mod output;

#[derive(Parser, Debug)]
#[command(
    name = "spritesheet",
    about = "Pack a folder of sprites into one atlas image plus a manifest",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show a progress spinner while packing (disable with --progress false or --quiet)
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
    /// Pack images into an atlas
    Pack(PackArgs),
    /// Simple timing bench (packs once per heuristic, prints time + occupancy)
    Bench(BenchArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    // Input/Output
    /// Input directory (or a single image file)
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output image path; the extension picks the encoder
    #[arg(short, long, default_value = "atlas.png", help_heading = "Input/Output")]
    output: PathBuf,
    /// Output manifest path (defaults to the image path with the manifest suffix)
    #[arg(short, long, help_heading = "Input/Output")]
    manifest: Option<PathBuf>,
    /// Manifest filename suffix used when --manifest is not given (e.g. ".atlas.json")
    #[arg(long, help_heading = "Input/Output")]
    manifest_suffix: Option<String>,
    /// YAML config file path (values override the flags below)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob, matched against the path relative to the input root)
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    // Layout
    /// Max width
    #[arg(long, default_value_t = 2048, help_heading = "Layout")]
    max_width: u32,
    /// Max height
    #[arg(long, default_value_t = 2048, help_heading = "Layout")]
    max_height: u32,
    /// Round canvas dimensions up to powers of two
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    pow2: bool,
    /// Force a square canvas
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    square: bool,
    /// Sort order: maxside|area|height|width
    #[arg(long, default_value = "maxside", help_heading = "Layout")]
    sort: String,
    /// MaxRects heuristic: blsf|bssf
    #[arg(long, default_value = "blsf", help_heading = "Layout")]
    heuristic: String,

    // Image Processing
    /// Downscale factor applied before trimming (values >= 1.0 keep sizes)
    #[arg(long, default_value_t = 1.0, help_heading = "Image Processing")]
    scale: f32,
    /// Trim mode: none|lenient|strict
    #[arg(long, default_value = "lenient", help_heading = "Image Processing")]
    trim: String,
    /// Policy for fully transparent images: keep|one_by_one
    #[arg(long, default_value = "keep", help_heading = "Image Processing")]
    transparent_policy: String,
    /// Padding around each sprite
    #[arg(long, default_value_t = 0, help_heading = "Image Processing")]
    padding: u32,
    /// Extra padding between neighbouring sprites
    #[arg(long, default_value_t = 0, help_heading = "Image Processing")]
    inner_padding: u32,
    /// Allow rotation (90deg)
    #[arg(long, default_value_t = true, action=ArgAction::Set, help_heading = "Image Processing")]
    allow_rotation: bool,
    /// Pack pixel-identical sprites separately instead of sharing one slot
    #[arg(long, default_value_t = false, help_heading = "Image Processing")]
    no_dedup: bool,

    // Export
    /// Output pixel format: rgba8|rgb8|la8|l8
    #[arg(long, default_value = "rgba8", help_heading = "Export")]
    format: String,
    /// Manifest format: json-hash | json-array | plist
    #[arg(long, default_value = "json-hash", value_parser = ["json-hash", "json-array", "json", "plist"], help_heading = "Export")]
    manifest_format: String,
    /// Export packing stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: compute layout and stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct BenchArgs {
    /// Input directory
    input: PathBuf,
    /// MaxRects heuristic: blsf|bssf (both when omitted)
    #[arg(long)]
    heuristic: Option<String>,
    /// Max width
    #[arg(long, default_value_t = 4096)]
    max_width: u32,
    /// Max height
    #[arg(long, default_value_t = 4096)]
    max_height: u32,
    /// Round canvas dimensions up to powers of two
    #[arg(long, default_value_t = false)]
    pow2: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args, cli.progress && !cli.quiet),
        Commands::Bench(b) => run_bench(b),
    }
}

fn run_pack(cli: &PackArgs, show_progress: bool) -> anyhow::Result<()> {
    let mut cfg = atlas_config_from_args(cli)?;
    if let Some(path) = &cli.config {
        let file =
            fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg = y.into_atlas_config(cfg)?;
    }

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    let image_format = if cli.dry_run {
        None
    } else {
        Some(output_encoder(&cli.output, cfg.output_format)?)
    };

    let sources = gather_sources(&cli.input, &cli.include, &cli.exclude)?;
    info!(count = sources.len(), input = %cli.input.display(), "collected input images");

    let out = pack_with_progress(&sources, cfg, show_progress)?;
    let stats = out.stats();
    info!(
        width = stats.width,
        height = stats.height,
        frames = stats.num_frames,
        duplicates = stats.num_duplicates,
        occupancy = format!("{:.2}%", stats.occupancy * 100.0),
        "stats"
    );

    let Some(image_format) = image_format else {
        println!("{}", stats.summary());
        return Ok(());
    };
    let manifest_path = manifest_path(cli);
    let manifest = render_manifest(&out, &cli.manifest_format, &cli.output)?;

    let mut staged = Vec::with_capacity(3);
    let img = out.image();
    staged.push(output::stage(&cli.output, |f| {
        img.write_to(f, image_format)?;
        Ok(())
    })?);
    staged.push(output::stage(&manifest_path, |f| {
        use std::io::Write;
        f.write_all(manifest.as_bytes())?;
        Ok(())
    })?);
    if let Some(stats_path) = &cli.export_stats {
        let json = serde_json::to_string_pretty(&stats)?;
        staged.push(output::stage(stats_path, |f| {
            use std::io::Write;
            f.write_all(json.as_bytes())?;
            Ok(())
        })?);
    }
    for s in &staged {
        info!(path = %s.target().display(), "writing");
    }
    let written = output::commit(staged)?;
    info!(files = written.len(), "atlas written");
    Ok(())
}

fn pack_with_progress(
    sources: &[SourceFile],
    cfg: AtlasConfig,
    show_progress: bool,
) -> anyhow::Result<PackOutput> {
    let bar = if show_progress {
        let b = ProgressBar::new_spinner();
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} {msg} [{elapsed_precise}]",
        )?);
        b.set_message(format!("packing {} sprites", sources.len()));
        b.enable_steady_tick(Duration::from_millis(100));
        Some(b)
    } else {
        None
    };
    let result = pack_files(sources, cfg);
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(result?)
}

/// Encoder picked from the output extension; JPEG cannot carry an alpha channel.
fn output_encoder(path: &Path, pixels: PixelFormat) -> anyhow::Result<ImageFormat> {
    let format = ImageFormat::from_path(path)
        .with_context(|| format!("unsupported image extension: {}", path.display()))?;
    if format == ImageFormat::Jpeg && pixels.has_alpha() {
        anyhow::bail!(
            "{} cannot store {} pixels; use --format rgb8 or l8",
            path.display(),
            pixels.as_str()
        );
    }
    Ok(format)
}

fn run_bench(b: &BenchArgs) -> anyhow::Result<()> {
    let sources = gather_sources(&b.input, &[], &[])?;
    let heuristics = match &b.heuristic {
        Some(h) => vec![parse_enum::<MaxRectsHeuristic>("heuristic", h)?],
        None => vec![
            MaxRectsHeuristic::BestLongSideFit,
            MaxRectsHeuristic::BestShortSideFit,
        ],
    };
    for heuristic in heuristics {
        let cfg = AtlasConfig::builder()
            .with_max_dimensions(b.max_width, b.max_height)
            .pow2(b.pow2)
            .heuristic(heuristic)
            .build();
        let start = Instant::now();
        let out = pack_files(&sources, cfg)?;
        let dur = start.elapsed();
        let stats = out.stats();
        println!(
            "heuristic={:?} size={}x{} frames={} occupancy={:.2}% time={}",
            heuristic,
            stats.width,
            stats.height,
            stats.num_frames,
            stats.occupancy * 100.0,
            bench_fmt_dur(dur)
        );
    }
    Ok(())
}

fn bench_fmt_dur(d: Duration) -> String {
    let ms = d.as_secs_f64() * 1000.0;
    if ms >= 1.0 {
        format!("{:.1}ms", ms)
    } else {
        format!("{}us", d.as_micros())
    }
}

fn parse_enum<T: FromStr>(what: &str, s: &str) -> anyhow::Result<T> {
    s.parse().map_err(|_| anyhow!("unknown {}: {}", what, s))
}

fn atlas_config_from_args(cli: &PackArgs) -> anyhow::Result<AtlasConfig> {
    Ok(AtlasConfig::builder()
        .with_max_dimensions(cli.max_width, cli.max_height)
        .scale(cli.scale)
        .trim_mode(parse_enum::<TrimMode>("trim mode", &cli.trim)?)
        .transparent_policy(parse_enum::<TransparentPolicy>(
            "transparent policy",
            &cli.transparent_policy,
        )?)
        .border_padding(cli.padding)
        .texture_padding(cli.inner_padding)
        .square(cli.square)
        .pow2(cli.pow2)
        .output_format(parse_enum::<PixelFormat>("pixel format", &cli.format)?)
        .allow_rotation(cli.allow_rotation)
        .detect_duplicates(!cli.no_dedup)
        .sort_mode(parse_enum::<SortMode>("sort mode", &cli.sort)?)
        .heuristic(parse_enum::<MaxRectsHeuristic>("heuristic", &cli.heuristic)?)
        .build())
}

fn manifest_suffix(cli: &PackArgs) -> String {
    if let Some(s) = &cli.manifest_suffix {
        return s.clone();
    }
    match cli.manifest_format.as_str() {
        "plist" => ".plist".into(),
        _ => ".json".into(),
    }
}

/// `--manifest` if given, otherwise the image path with its extension swapped for the suffix.
fn manifest_path(cli: &PackArgs) -> PathBuf {
    if let Some(p) = &cli.manifest {
        return p.clone();
    }
    let stem = cli
        .output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "atlas".into());
    cli.output
        .with_file_name(format!("{}{}", stem, manifest_suffix(cli)))
}

fn render_manifest(out: &PackOutput, format: &str, image_path: &Path) -> anyhow::Result<String> {
    let texture = image_path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(match format {
        // "json" is accepted as an alias of "json-hash"
        "json-hash" | "json" => {
            let mut value = spritesheet_core::to_json_hash(&out.atlas);
            value["meta"]["image"] = serde_json::Value::String(texture);
            serde_json::to_string_pretty(&value)?
        }
        "json-array" => {
            let mut value = spritesheet_core::to_json_array(&out.atlas);
            value["meta"]["image"] = serde_json::Value::String(texture);
            serde_json::to_string_pretty(&value)?
        }
        "plist" => spritesheet_core::to_plist(&out.atlas, &texture),
        other => anyhow::bail!("unknown manifest format: {}", other),
    })
}

/// Image files under `root`, sorted by path, keyed by their path relative to
/// `root` with `/` separators. A file `root` yields one source keyed by its name.
fn gather_sources(
    root: &Path,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<Vec<SourceFile>> {
    if !root.exists() {
        anyhow::bail!("input not found: {}", root.display());
    }
    let inc_set = build_globset(include)?;
    let exc_set = build_globset(exclude)?;

    let mut list: Vec<SourceFile> = Vec::new();
    if root.is_file() {
        let key = root
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if is_image(root) && !should_skip(&key, inc_set.as_ref(), exc_set.as_ref()) {
            list.push(SourceFile {
                key,
                path: root.to_path_buf(),
            });
        }
        return Ok(list);
    }

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "skip unreadable entry");
                continue;
            }
        };
        let p = entry.path();
        if !entry.file_type().is_file() || !is_image(p) {
            continue;
        }
        let key = frame_key(root, p);
        if should_skip(&key, inc_set.as_ref(), exc_set.as_ref()) {
            continue;
        }
        list.push(SourceFile {
            key,
            path: p.to_path_buf(),
        });
    }
    Ok(list)
}

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("invalid glob: {}", pat))?);
    }
    Ok(Some(b.build()?))
}

fn frame_key(root: &Path, p: &Path) -> String {
    let rel = p.strip_prefix(root).unwrap_or(p);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn should_skip(key: &str, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    if let Some(ex) = exclude {
        if ex.is_match(key) {
            return true;
        }
    }
    if let Some(inc) = include {
        if !inc.is_match(key) {
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

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct YamlConfig {
    max_width: Option<u32>,
    max_height: Option<u32>,
    scale: Option<f32>,
    trim_mode: Option<String>,
    transparent_policy: Option<String>,
    border_padding: Option<u32>,
    texture_padding: Option<u32>,
    square: Option<bool>,
    power_of_two: Option<bool>,
    output_format: Option<String>,
    allow_rotation: Option<bool>,
    detect_duplicates: Option<bool>,
    sort_mode: Option<String>,
    heuristic: Option<String>,
    initial_slack: Option<f64>,
    slack_step: Option<f64>,
}

impl YamlConfig {
    fn into_atlas_config(self, mut cfg: AtlasConfig) -> anyhow::Result<AtlasConfig> {
        if let Some(v) = self.max_width {
            cfg.max_width = v;
        }
        if let Some(v) = self.max_height {
            cfg.max_height = v;
        }
        if let Some(v) = self.scale {
            cfg.scale = v;
        }
        if let Some(v) = self.trim_mode {
            cfg.trim_mode = parse_enum("trim mode", &v)?;
        }
        if let Some(v) = self.transparent_policy {
            cfg.transparent_policy = parse_enum("transparent policy", &v)?;
        }
        if let Some(v) = self.border_padding {
            cfg.border_padding = v;
        }
        if let Some(v) = self.texture_padding {
            cfg.texture_padding = v;
        }
        if let Some(v) = self.square {
            cfg.square = v;
        }
        if let Some(v) = self.power_of_two {
            cfg.power_of_two = v;
        }
        if let Some(v) = self.output_format {
            cfg.output_format = parse_enum("pixel format", &v)?;
        }
        if let Some(v) = self.allow_rotation {
            cfg.allow_rotation = v;
        }
        if let Some(v) = self.detect_duplicates {
            cfg.detect_duplicates = v;
        }
        if let Some(v) = self.sort_mode {
            cfg.sort_mode = parse_enum("sort mode", &v)?;
        }
        if let Some(v) = self.heuristic {
            cfg.heuristic = parse_enum("heuristic", &v)?;
        }
        if let Some(v) = self.initial_slack {
            cfg.initial_slack = v;
        }
        if let Some(v) = self.slack_step {
            cfg.slack_step = v;
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn pack_args(args: &[&str]) -> PackArgs {
        let mut argv = vec!["spritesheet", "pack"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).expect("parse").command {
            Commands::Pack(a) => a,
            Commands::Bench(_) => panic!("Expected pack"),
        }
    }

    fn write_png(path: &Path, w: u32, h: u32, c: u8) {
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        RgbaImage::from_pixel(w, h, Rgba([c, c, c, 255]))
            .save(path)
            .expect("png");
    }

    #[test]
    fn keys_are_relative_and_sorted() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_png(&dir.path().join("b.png"), 4, 4, 1);
        write_png(&dir.path().join("a/z.png"), 4, 4, 2);
        write_png(&dir.path().join("a/y.png"), 4, 4, 3);
        fs::write(dir.path().join("notes.txt"), "x").expect("txt");

        let keys: Vec<String> = gather_sources(dir.path(), &[], &[])
            .expect("gather")
            .into_iter()
            .map(|s| s.key)
            .collect();
        assert_eq!(keys, vec!["a/y.png", "a/z.png", "b.png"]);

        let keys: Vec<String> = gather_sources(dir.path(), &["a/**".into()], &["**/z.png".into()])
            .expect("gather")
            .into_iter()
            .map(|s| s.key)
            .collect();
        assert_eq!(keys, vec!["a/y.png"]);
    }

    #[test]
    fn manifest_defaults_next_to_the_image() {
        let a = pack_args(&["in", "-o", "out/hero.png"]);
        assert_eq!(manifest_path(&a), PathBuf::from("out/hero.json"));

        let a = pack_args(&["in", "-o", "out/hero.png", "--manifest-format", "plist"]);
        assert_eq!(manifest_path(&a), PathBuf::from("out/hero.plist"));

        let a = pack_args(&["in", "-o", "hero.png", "--manifest-suffix", ".atlas.json"]);
        assert_eq!(manifest_path(&a), PathBuf::from("hero.atlas.json"));

        let a = pack_args(&["in", "--manifest", "meta/m.json"]);
        assert_eq!(manifest_path(&a), PathBuf::from("meta/m.json"));
    }

    #[test]
    fn flags_map_onto_the_config() {
        let a = pack_args(&[
            "in",
            "--trim",
            "strict",
            "--padding",
            "2",
            "--inner-padding",
            "1",
            "--pow2",
            "--format",
            "rgb8",
            "--allow-rotation",
            "false",
            "--no-dedup",
            "--sort",
            "area",
            "--heuristic",
            "bssf",
        ]);
        let cfg = atlas_config_from_args(&a).expect("config");
        assert_eq!(cfg.trim_mode, TrimMode::Strict);
        assert_eq!((cfg.border_padding, cfg.texture_padding), (2, 1));
        assert!(cfg.power_of_two);
        assert_eq!(cfg.output_format, PixelFormat::Rgb8);
        assert!(!cfg.allow_rotation);
        assert!(!cfg.detect_duplicates);
        assert_eq!(cfg.sort_mode, SortMode::Area);
        assert_eq!(cfg.heuristic, MaxRectsHeuristic::BestShortSideFit);

        let bad = pack_args(&["in", "--trim", "sometimes"]);
        assert!(atlas_config_from_args(&bad).is_err());
    }

    #[test]
    fn yaml_overrides_flags() {
        let y: YamlConfig =
            serde_yaml::from_str("max_width: 512\ntrim_mode: none\npower_of_two: true\n")
                .expect("yaml");
        let cfg = y
            .into_atlas_config(AtlasConfig::default())
            .expect("merge");
        assert_eq!(cfg.max_width, 512);
        assert_eq!(cfg.max_height, 2048);
        assert_eq!(cfg.trim_mode, TrimMode::None);
        assert!(cfg.power_of_two);

        assert!(serde_yaml::from_str::<YamlConfig>("max_widht: 5\n").is_err());
    }

    #[test]
    fn pack_writes_image_and_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("sprites");
        write_png(&input.join("a.png"), 16, 16, 10);
        write_png(&input.join("b.png"), 8, 24, 20);
        let out_png = dir.path().join("out/atlas.png");

        let a = pack_args(&[
            input.to_str().expect("utf8"),
            "-o",
            out_png.to_str().expect("utf8"),
        ]);
        run_pack(&a, false).expect("pack");

        let manifest: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("out/atlas.json")).expect("manifest"),
        )
        .expect("json");
        assert!(manifest["frames"]["a.png"].is_object());
        assert_eq!(manifest["meta"]["image"], "atlas.png");
        let img = image::open(&out_png).expect("decode");
        assert_eq!(img.width() as u64, manifest["meta"]["size"]["w"].as_u64().expect("w"));
    }

    #[test]
    fn infeasible_pack_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("sprites");
        for i in 0..5u8 {
            write_png(&input.join(format!("tile{i}.png")), 100, 100, i);
        }
        let out_dir = dir.path().join("out");
        let out_png = out_dir.join("atlas.png");

        let a = pack_args(&[
            input.to_str().expect("utf8"),
            "-o",
            out_png.to_str().expect("utf8"),
            "--max-width",
            "200",
            "--max-height",
            "200",
            "--export-stats",
            out_dir.join("stats.json").to_str().expect("utf8"),
        ]);
        let err = run_pack(&a, false).expect_err("must not fit");
        assert!(err.to_string().contains("200x200"), "{err}");
        assert!(!out_dir.exists() || fs::read_dir(&out_dir).expect("dir").next().is_none());
    }

    #[test]
    fn jpeg_output_needs_an_opaque_format() {
        let err = output_encoder(Path::new("atlas.jpg"), PixelFormat::Rgba8).expect_err("alpha");
        assert!(err.to_string().contains("RGBA8888"), "{err}");
        assert!(output_encoder(Path::new("atlas.jpg"), PixelFormat::La8).is_err());
        assert_eq!(
            output_encoder(Path::new("atlas.jpeg"), PixelFormat::Rgb8).expect("rgb"),
            ImageFormat::Jpeg
        );
        assert_eq!(
            output_encoder(Path::new("atlas.png"), PixelFormat::Rgba8).expect("png"),
            ImageFormat::Png
        );
        assert!(output_encoder(Path::new("atlas.unknown"), PixelFormat::Rgb8).is_err());

        // rejected before anything is packed or written
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("sprites");
        write_png(&input.join("a.png"), 8, 8, 10);
        let out_jpg = dir.path().join("out/atlas.jpg");
        let a = pack_args(&[
            input.to_str().expect("utf8"),
            "-o",
            out_jpg.to_str().expect("utf8"),
        ]);
        assert!(run_pack(&a, false).is_err());
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("sprites");
        write_png(&input.join("a.png"), 16, 16, 10);
        let out_png = dir.path().join("out/atlas.png");
        let a = pack_args(&[
            input.to_str().expect("utf8"),
            "-o",
            out_png.to_str().expect("utf8"),
            "--dry-run",
        ]);
        run_pack(&a, false).expect("pack");
        assert!(!dir.path().join("out").exists());
    }
}
