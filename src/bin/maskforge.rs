use std::{
    collections::BTreeMap,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use maskforge::{
    ColorId, DrawingSurface, EditDefinitions, EncodedImage, Point, ReferenceImages,
    SurfaceConfig, SurfaceHandle,
};

#[derive(Parser, Debug)]
#[command(name = "maskforge", version)]
struct Cli {
    /// Enable debug logging (`RUST_LOG` overrides the level).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the annotation palette as JSON.
    Palette(PaletteArgs),
    /// Replay a session and write the base image, one mask per color and a manifest.
    Extract(ExtractArgs),
    /// Replay a session and save the annotated canvas as a PNG.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct PaletteArgs {
    /// Surface config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ExtractArgs {
    /// Input session JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory receiving `base.png`, `mask-<color>.png` and `bundle.json`.
    #[arg(long)]
    out_dir: PathBuf,

    /// Surface config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input session JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Surface config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// A recorded editing session. Paths are relative to the session file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Session {
    background: Option<String>,
    primitives: Vec<Primitive>,
    strokes: Vec<SessionStroke>,
    definitions: EditDefinitions,
    references: BTreeMap<ColorId, String>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Primitive {
    Rectangle,
    Circle,
    Text,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SessionStroke {
    color: ColorId,
    points: Vec<[f64; 2]>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    base_image: String,
    masks: Vec<ManifestMask>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ManifestMask {
    color_id: ColorId,
    prompt: String,
    file: String,
    has_reference: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Palette(args) => cmd_palette(args),
        Command::Extract(args) => cmd_extract(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("warn")
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SurfaceConfig> {
    match path {
        Some(p) => Ok(SurfaceConfig::load(p)?),
        None => Ok(SurfaceConfig::default()),
    }
}

fn read_session(path: &Path) -> anyhow::Result<Session> {
    let f = File::open(path).with_context(|| format!("open session '{}'", path.display()))?;
    let session: Session = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse session '{}'", path.display()))?;
    Ok(session)
}

fn session_root(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Rebuild the canvas a session describes.
fn replay(
    session: &Session,
    config: SurfaceConfig,
    root: &Path,
    handle: &SurfaceHandle,
) -> anyhow::Result<DrawingSurface> {
    let mut surface =
        DrawingSurface::new(config)?.with_loader(Box::new(maskforge::FsImageLoader::new(root)));
    surface.initialize(handle, session.background.as_deref(), || {});

    for p in &session.primitives {
        match p {
            Primitive::Rectangle => surface.add_rectangle(),
            Primitive::Circle => surface.add_circle(),
            Primitive::Text => surface.add_text(),
        };
    }

    for (i, stroke) in session.strokes.iter().enumerate() {
        let color = surface
            .palette()
            .get(stroke.color.as_str())
            .cloned()
            .with_context(|| format!("stroke {i}: unknown color '{}'", stroke.color))?;
        if surface.annotation_mode() {
            surface.update_brush_color(&color);
        } else {
            surface.set_annotation_mode(true, Some(&color));
        }
        let points: Vec<Point> = stroke.points.iter().map(|&[x, y]| Point::new(x, y)).collect();
        if surface.draw_stroke(&points).is_none() {
            tracing::warn!(stroke = i, "stroke without points skipped");
        }
    }
    Ok(surface)
}

fn read_references(session: &Session, root: &Path) -> anyhow::Result<ReferenceImages> {
    let mut out = ReferenceImages::new();
    for (id, source) in &session.references {
        let image = if source.starts_with("data:") {
            let (mime, bytes) = maskforge::decode_data_url(source)?;
            EncodedImage::from_bytes(mime, &bytes)
        } else {
            let path = root.join(source);
            let bytes = std::fs::read(&path)
                .with_context(|| format!("read reference '{}'", path.display()))?;
            let mime = image::guess_format(&bytes)
                .map(|f| f.to_mime_type())
                .unwrap_or("application/octet-stream");
            EncodedImage::from_bytes(mime, &bytes)
        };
        out.insert(id.clone(), image);
    }
    Ok(out)
}

fn cmd_palette(args: PaletteArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let json = serde_json::to_string_pretty(&config.palette()).context("serialize palette")?;
    println!("{json}");
    Ok(())
}

fn cmd_extract(args: ExtractArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let session = read_session(&args.in_path)?;
    let root = session_root(&args.in_path);
    let handle = SurfaceHandle::new("maskforge-extract");

    let mut surface = replay(&session, config, root, &handle)?;
    let references = read_references(&session, root)?;
    let bundle = surface
        .prepare_masks_for_edit(&session.definitions, &references)?
        .ok_or(maskforge::MaskError::NothingToEdit)?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    let write = |name: &str, image: &EncodedImage| -> anyhow::Result<()> {
        let path = args.out_dir.join(name);
        std::fs::write(&path, image.to_bytes()?)
            .with_context(|| format!("write png '{}'", path.display()))
    };

    let base_name = "base.png".to_owned();
    write(&base_name, &bundle.base_image)?;

    let mut masks = Vec::with_capacity(bundle.masks.len());
    for mask in &bundle.masks {
        let file = format!("mask-{}.png", mask.color_id);
        write(&file, &mask.to_encoded())?;
        masks.push(ManifestMask {
            color_id: mask.color_id.clone(),
            prompt: mask.prompt.clone(),
            file,
            has_reference: mask.reference_image.is_some(),
        });
    }

    let manifest = Manifest {
        base_image: base_name,
        masks,
    };
    let manifest_path = args.out_dir.join("bundle.json");
    let f = File::create(&manifest_path)
        .with_context(|| format!("create '{}'", manifest_path.display()))?;
    serde_json::to_writer_pretty(f, &manifest).context("write bundle manifest")?;

    eprintln!(
        "wrote {} mask(s) to {}",
        manifest.masks.len(),
        args.out_dir.display()
    );
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let session = read_session(&args.in_path)?;
    let root = session_root(&args.in_path);
    let handle = SurfaceHandle::new("maskforge-render");

    let mut surface = replay(&session, config, root, &handle)?;
    surface.save_canvas(&args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
