use std::{
    path::{Path, PathBuf},
    sync::{Arc, mpsc},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use memegen::FrameSource as _;

#[derive(Parser, Debug)]
#[command(name = "memegen", version)]
struct Cli {
    /// Log pipeline events to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the templates in `<root>/templateList.json`.
    List(ListArgs),
    /// Render a meme from a template.
    Generate(GenerateArgs),
    /// Print canvas size and per-frame timing of an image.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct ListArgs {
    /// Template root directory.
    #[arg(long)]
    root: PathBuf,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Template root directory (`<root>/<id>/template.{json,gif,...}`).
    #[arg(long)]
    root: PathBuf,

    /// Template id from the catalog.
    #[arg(long)]
    template: String,

    /// Font file(s); the first one is the default family.
    #[arg(long = "font", required = true)]
    fonts: Vec<PathBuf>,

    /// Text for each slot, in slot order. Missing entries keep the slot's default text.
    #[arg(long = "text")]
    texts: Vec<String>,

    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Outline slot bounding boxes.
    #[arg(long)]
    debug_outline: bool,

    /// Output path.
    #[arg(long)]
    out: PathBuf,

    /// Write a `data:` URL text file instead of the raw image.
    #[arg(long)]
    data_url: bool,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Image to inspect.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    match cli.cmd {
        Command::List(args) => cmd_list(args),
        Command::Generate(args) => cmd_generate(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn read_catalog(root: &Path) -> anyhow::Result<memegen::TemplateCatalog> {
    let path = root.join("templateList.json");
    memegen::TemplateCatalog::from_path(&path)
        .with_context(|| format!("load catalog '{}'", path.display()))
}

fn cmd_list(args: ListArgs) -> anyhow::Result<()> {
    let catalog = read_catalog(&args.root)?;
    for d in catalog.descriptors() {
        println!("{}\t{:?}\t{}", d.id, d.kind(), d.display_name);
    }
    Ok(())
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let catalog = read_catalog(&args.root)?;
    let descriptor = catalog.get(&args.template)?;

    let mut config = match &args.config {
        Some(path) => memegen::MemegenConfig::from_json_path(path)?,
        None => memegen::MemegenConfig::default(),
    };
    config.debug_outline |= args.debug_outline;

    let mut fonts = memegen::FontBook::new();
    for path in &args.fonts {
        let family = fonts.add_font_file(path)?;
        tracing::debug!(path = %path.display(), family = %family, "font loaded");
    }

    let transport = memegen::FsTransport::new(&args.root);
    let mut template = memegen::Template::load(
        descriptor,
        &transport,
        config,
        Arc::new(fonts),
        |p| eprint!("\rloading {:>3.0}%", p * 100.0),
    )?;
    eprintln!();
    let load = template.load_state();
    tracing::debug!(
        schedule_bytes = load.stream(memegen::AssetKind::Schedule).loaded,
        image_bytes = load.stream(memegen::AssetKind::Image).loaded,
        "template loaded"
    );

    let slots = template.text_slots().len();
    if args.texts.len() > slots {
        anyhow::bail!(
            "{} texts given but template '{}' has {slots} slot(s)",
            args.texts.len(),
            args.template
        );
    }
    for (i, text) in args.texts.iter().enumerate() {
        template.set_text(i, text.as_str())?;
    }

    let (tx, rx) = mpsc::channel();
    let artifact = std::thread::scope(|scope| -> anyhow::Result<memegen::Artifact> {
        scope.spawn(move || {
            for event in rx {
                if let memegen::GenerateEvent::Progress(p) = event {
                    eprint!("\rgenerating {:>3.0}%", p * 100.0);
                }
            }
            eprintln!();
        });
        let generated = template.generate(&tx);
        drop(tx);
        generated?.context("template is not ready to generate")
    })?;

    if args.data_url {
        std::fs::write(&args.out, artifact.to_data_url())
            .with_context(|| format!("write '{}'", args.out.display()))?;
    } else {
        artifact.write_to(&args.out)?;
    }
    eprintln!(
        "wrote {} ({}, {} frame(s), {} bytes)",
        args.out.display(),
        artifact.mime_type(),
        artifact.frame_count(),
        artifact.bytes().len()
    );
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.in_path)
        .with_context(|| format!("read '{}'", args.in_path.display()))?;
    let ext = args
        .in_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    match memegen::ImageKind::from_extension(ext) {
        memegen::ImageKind::Animated => {
            let source = memegen::GifFrameSource::from_bytes(&bytes)?;
            let (w, h) = source.canvas_size();
            println!("canvas: {w}x{h}");
            println!("frames: {}", source.frame_count());
            for i in 0..source.frame_count() {
                let info = source.frame_info(i)?;
                println!(
                    "  #{i}: delay={}cs disposal={:?} rect=({}, {}, {}, {})",
                    info.duration_ticks,
                    info.disposal,
                    info.rect.x0,
                    info.rect.y0,
                    info.rect.width(),
                    info.rect.height()
                );
            }
        }
        memegen::ImageKind::Static => {
            let img = memegen::assets::decode::decode_still(&bytes)?;
            println!("canvas: {}x{}", img.width, img.height);
            println!("frames: 1");
        }
    }
    Ok(())
}
