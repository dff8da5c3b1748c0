use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "storygrid", version)]
struct Cli {
    /// Log resolved layouts and font lookups to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single story or post frame as a PNG.
    Render(RenderArgs),
    /// Render a carousel as numbered PNG slides.
    Carousel(CarouselArgs),
    /// Print the preset template for a format as JSON.
    Template(TemplateArgs),
}

#[derive(Parser, Debug)]
struct ContentArgs {
    /// Template JSON. Takes precedence over `--format`.
    #[arg(long)]
    template: Option<PathBuf>,

    /// Preset format used when no template is given (story, post, carousel).
    #[arg(long, default_value = "story")]
    format: String,

    /// Style hints JSON merged over the template.
    #[arg(long)]
    hints: Option<PathBuf>,

    /// Primary image.
    #[arg(long)]
    image: PathBuf,

    /// UTF-8 text file holding the body copy.
    #[arg(long)]
    text: PathBuf,

    /// Optional title.
    #[arg(long)]
    title: Option<String>,

    /// Phrase to underline; repeatable.
    #[arg(long = "highlight")]
    highlights: Vec<String>,

    /// Secondary graphic (PNG/JPEG or SVG).
    #[arg(long)]
    graphic: Option<PathBuf>,

    /// Directory searched first for font files.
    #[arg(long, default_value = "./fonts")]
    font_dir: PathBuf,

    /// Skip installed system fonts.
    #[arg(long, default_value_t = false)]
    no_system_fonts: bool,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    content: ContentArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct CarouselArgs {
    #[command(flatten)]
    content: ContentArgs,

    /// Output directory for the slides.
    #[arg(long)]
    out_dir: PathBuf,

    /// File name prefix; slides are written as `<prefix>_NN.png`.
    #[arg(long, default_value = "slide")]
    prefix: String,
}

#[derive(Parser, Debug)]
struct TemplateArgs {
    /// story, post or carousel.
    #[arg(long, default_value = "story")]
    format: String,

    /// Write to a file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Carousel(args) => cmd_carousel(args),
        Command::Template(args) => cmd_template(args),
    }
}

/// Decoded inputs shared by both render commands.
struct Loaded {
    composer: storygrid::StoryComposer,
    image: storygrid::PreparedImage,
    text: String,
    graphic: Option<storygrid::GraphicSource>,
}

fn load(args: &ContentArgs) -> anyhow::Result<Loaded> {
    let mut template = match &args.template {
        Some(path) => storygrid::StoryTemplate::from_path(path)?,
        None => storygrid::StoryTemplate::for_format(args.format.parse()?),
    };
    if let Some(path) = &args.hints {
        let f = std::fs::File::open(path)
            .with_context(|| format!("open hints JSON '{}'", path.display()))?;
        let hints: storygrid::StyleHints = serde_json::from_reader(std::io::BufReader::new(f))
            .with_context(|| format!("parse hints JSON '{}'", path.display()))?;
        template.apply_style_hints(&hints);
    }

    let fonts = storygrid::FontResolver::new(storygrid::FontResolverOpts {
        cache_dir: Some(args.font_dir.clone()),
        use_system_fonts: !args.no_system_fonts,
        ..storygrid::FontResolverOpts::default()
    });
    let composer = storygrid::StoryComposer::with_fonts(template, Arc::new(fonts))?;

    let image_bytes = std::fs::read(&args.image)
        .with_context(|| format!("read image '{}'", args.image.display()))?;
    let image = storygrid::decode_image(&image_bytes)
        .with_context(|| format!("decode image '{}'", args.image.display()))?;

    let text = std::fs::read_to_string(&args.text)
        .with_context(|| format!("read text '{}'", args.text.display()))?;

    let graphic = args.graphic.as_deref().map(load_graphic).transpose()?;

    Ok(Loaded {
        composer,
        image,
        text,
        graphic,
    })
}

fn load_graphic(path: &Path) -> anyhow::Result<storygrid::GraphicSource> {
    let bytes = std::fs::read(path).with_context(|| format!("read graphic '{}'", path.display()))?;
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
    let graphic = if is_svg {
        storygrid::GraphicSource::Svg(storygrid::parse_svg(&bytes)?)
    } else {
        storygrid::GraphicSource::Raster(storygrid::decode_image(&bytes)?)
    };
    Ok(graphic)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let Loaded {
        mut composer,
        image,
        text,
        graphic,
    } = load(&args.content)?;

    let frame = composer.compose(
        &image,
        &text,
        args.content.title.as_deref(),
        &args.content.highlights,
        graphic.as_ref(),
    )?;
    write_png(&args.out, &frame)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_carousel(args: CarouselArgs) -> anyhow::Result<()> {
    let Loaded {
        mut composer,
        image,
        text,
        graphic,
    } = load(&args.content)?;

    let slides = composer.compose_carousel(
        &image,
        &text,
        args.content.title.as_deref(),
        &args.content.highlights,
        graphic.as_ref(),
    )?;
    for (i, frame) in slides.iter().enumerate() {
        let path = args.out_dir.join(format!("{}_{:02}.png", args.prefix, i + 1));
        write_png(&path, frame)?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn cmd_template(args: TemplateArgs) -> anyhow::Result<()> {
    let template = storygrid::StoryTemplate::for_format(args.format.parse()?);
    let json = template.to_json_pretty()?;
    match args.out {
        Some(path) => {
            std::fs::write(&path, json + "\n")
                .with_context(|| format!("write template '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn write_png(path: &Path, frame: &storygrid::FrameRgba) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let png = frame.encode_png()?;
    std::fs::write(path, png).with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}
