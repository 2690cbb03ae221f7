use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "remixel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a halftone overlay onto a background image.
    Compose(ComposeArgs),
    /// List assets from a gallery service (or a local fixture).
    Gallery(GalleryArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Background image file (png/jpg).
    #[arg(long)]
    background: PathBuf,

    /// Foreground image driving per-cell halftone sizes.
    #[arg(long)]
    foreground: Option<PathBuf>,

    /// Tessellation pattern.
    #[arg(long, default_value = "hexagons")]
    shape: String,

    /// Shape fill color (hex RGB).
    #[arg(long, default_value = remixel::state::DEFAULT_SHAPE_COLOR)]
    color: String,

    /// Cell spacing in output pixels.
    #[arg(long, default_value_t = remixel::state::DEFAULT_SHAPE_DISTANCE)]
    distance: f64,

    /// Blend mode applied to the overlay layer (CSS name).
    #[arg(long, default_value = "normal")]
    blend: String,

    /// Output directory; the file name is fixed.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Output encoding.
    #[arg(long, value_enum, default_value_t = FormatChoice::Png)]
    format: FormatChoice,
}

#[derive(Parser, Debug)]
struct GalleryArgs {
    /// Gallery service base URL.
    #[arg(long)]
    base_url: String,

    /// Asset category to list.
    #[arg(long, default_value = "backgrounds")]
    category: String,

    /// Number of entries to request.
    #[arg(long, default_value_t = 10)]
    count: u32,

    /// Request a random selection.
    #[arg(long)]
    random: bool,

    /// Local JSON fixture standing in for the list endpoint.
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// CORS-proxy prefix prepended to request URLs.
    #[arg(long)]
    proxy: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Png,
    Jpg,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Gallery(args) => cmd_gallery(args),
    }
}

fn read_surface(path: &PathBuf) -> anyhow::Result<remixel::RasterSurface> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    Ok(remixel::assets::decode::decode_image(&bytes)?)
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let background = read_surface(&args.background)?;
    let foreground = args.foreground.as_ref().map(read_surface).transpose()?;

    let shape: remixel::ShapeType = args.shape.parse()?;
    let blend: remixel::BlendMode = args.blend.parse()?;

    let overlay = remixel::halftone::generate(
        &remixel::HalftoneParams {
            shape,
            fill: args.color,
            distance: args.distance,
            width: f64::from(background.width()),
            height: f64::from(background.height()),
        },
        foreground.as_ref(),
    )?;

    let raster = remixel::composite_to_raster(&overlay, &background, blend)?;

    let format = match args.format {
        FormatChoice::Png => remixel::ExportFormat::Png,
        FormatChoice::Jpg => remixel::ExportFormat::Jpg,
    };
    let path = remixel::encode_for_download(&raster, format, &args.out_dir)?;

    eprintln!("wrote {}", path.display());
    Ok(())
}

fn cmd_gallery(args: GalleryArgs) -> anyhow::Result<()> {
    let mut client = remixel::assets::gallery::GalleryClient::new(&args.base_url);
    if let Some(fixture) = args.fixture {
        client = client.with_fixture(fixture);
    }
    if let Some(proxy) = args.proxy {
        client = client.with_proxy(proxy);
    }

    let list = client.list(&args.category, args.count, args.random)?;
    for entry in &list.assets {
        println!("{}", client.image_url(entry));
    }
    eprintln!("{} asset(s)", list.assets.len());
    Ok(())
}
