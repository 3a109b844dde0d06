use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use image::{Rgba, RgbaImage};
use rgbmatrix::playback::transform::{fill, rotate};
use rgbmatrix::{
    AnimationFrame, BackendKind, Matrix, MatrixConfig, MatrixResult, MatrixServer, PreviewStyle,
    Rotation, SimulatedMatrix, SimulatorView, ToolKit, Transform, create_matrix,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rgbmatrix", version)]
struct Cli {
    #[command(flatten)]
    matrix: MatrixArgs,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve a local backend to remote clients.
    Serve(ServeArgs),
    /// Show a single image.
    Image(ImageArgs),
    /// Play an animated GIF.
    Gif(GifArgs),
    /// Bounce a ball around the matrix.
    Bounce(BounceArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendArg {
    Native,
    Simulated,
    Remote,
}

impl From<BackendArg> for BackendKind {
    fn from(b: BackendArg) -> Self {
        match b {
            BackendArg::Native => BackendKind::Native,
            BackendArg::Simulated => BackendKind::Simulated,
            BackendArg::Remote => BackendKind::Remote,
        }
    }
}

#[derive(clap::Args, Debug)]
struct MatrixArgs {
    /// Matrix configuration JSON. Flags below override its fields.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend to drive.
    #[arg(long, value_enum, global = true)]
    backend: Option<BackendArg>,

    /// Matrix server address (remote backend).
    #[arg(long, global = true)]
    remote_addr: Option<String>,

    /// Rows per panel.
    #[arg(long, global = true)]
    led_rows: Option<usize>,

    /// Columns per panel.
    #[arg(long, global = true)]
    led_cols: Option<usize>,

    /// Daisy-chained panels.
    #[arg(long, global = true)]
    led_chain: Option<usize>,

    /// Parallel chains.
    #[arg(long, global = true)]
    led_parallel: Option<usize>,

    /// Brightness percent (1-100).
    #[arg(long, global = true)]
    brightness: Option<u8>,

    /// Write the last shown frame as a PNG panel preview (simulated backend only).
    #[arg(long, global = true)]
    preview: Option<PathBuf>,
}

impl MatrixArgs {
    fn config(&self) -> anyhow::Result<MatrixConfig> {
        let mut cfg = match &self.config {
            Some(path) => MatrixConfig::from_path(path)?,
            None => MatrixConfig::default(),
        };
        if let Some(b) = self.backend {
            cfg.backend = b.into();
        }
        if let Some(addr) = &self.remote_addr {
            cfg.remote_addr = addr.clone();
        }
        if let Some(v) = self.led_rows {
            cfg.rows = v;
        }
        if let Some(v) = self.led_cols {
            cfg.cols = v;
        }
        if let Some(v) = self.led_chain {
            cfg.chain_length = v;
        }
        if let Some(v) = self.led_parallel {
            cfg.parallel = v;
        }
        if let Some(v) = self.brightness {
            cfg.brightness = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build the backend. The simulated one also hands back a view for `--preview`.
    fn open(&self) -> anyhow::Result<(Box<dyn Matrix>, Option<SimulatorView>)> {
        let cfg = self.config()?;
        if cfg.backend == BackendKind::Simulated {
            let sim = SimulatedMatrix::from_config(&cfg);
            let view = sim.view();
            return Ok((Box::new(sim), Some(view)));
        }
        if self.preview.is_some() {
            anyhow::bail!("--preview needs the simulated backend");
        }
        Ok((create_matrix(&cfg)?, None))
    }
}

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, default_value = rgbmatrix::matrix::config::DEFAULT_REMOTE_ADDR)]
    listen: String,
}

#[derive(Parser, Debug)]
struct ImageArgs {
    /// Image file (any format the `image` crate reads).
    #[arg(long)]
    path: PathBuf,

    /// How long to keep the image up.
    #[arg(long, default_value_t = 1000)]
    delay_ms: u64,

    /// Clockwise rotation in degrees (90, 180, 270).
    #[arg(long)]
    rotate: Option<u32>,

    /// Scale to cover the whole matrix before drawing.
    #[arg(long, default_value_t = false)]
    fill: bool,
}

#[derive(Parser, Debug)]
struct GifArgs {
    /// GIF file.
    #[arg(long)]
    path: PathBuf,

    /// Stop after this many seconds instead of waiting for the GIF's own loop count.
    #[arg(long)]
    seconds: Option<f64>,

    /// Clockwise rotation in degrees (90, 180, 270).
    #[arg(long)]
    rotate: Option<u32>,

    /// Scale to cover the whole matrix before drawing.
    #[arg(long, default_value_t = false)]
    fill: bool,
}

#[derive(Parser, Debug)]
struct BounceArgs {
    /// Frames to play; 0 bounces until killed.
    #[arg(long, default_value_t = 200)]
    frames: u64,

    /// Milliseconds per frame.
    #[arg(long, default_value_t = 50)]
    frame_ms: u64,

    /// Ball radius in pixels.
    #[arg(long, default_value_t = 5)]
    radius: i64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Serve(args) => cmd_serve(&cli.matrix, args),
        Command::Image(args) => cmd_image(&cli.matrix, args),
        Command::Gif(args) => cmd_gif(&cli.matrix, args),
        Command::Bounce(args) => cmd_bounce(&cli.matrix, args),
    }
}

fn cmd_serve(m: &MatrixArgs, args: ServeArgs) -> anyhow::Result<()> {
    let (matrix, _) = m.open()?;
    let server = MatrixServer::bind(args.listen.as_str(), matrix)?;
    eprintln!("serving on {}", server.local_addr()?);
    server.serve()?;
    Ok(())
}

fn cmd_image(m: &MatrixArgs, args: ImageArgs) -> anyhow::Result<()> {
    let img = image::open(&args.path)
        .with_context(|| format!("open image '{}'", args.path.display()))?
        .to_rgba8();

    let (matrix, view) = m.open()?;
    let mut tk = ToolKit::new(matrix)?;
    if let Some(t) = frame_transform(&tk, args.rotate, args.fill)? {
        tk.set_transform(t);
    }
    let shown = tk.play_image(&img, Duration::from_millis(args.delay_ms));
    finish(&tk, m, view.as_ref())?;
    shown?;
    Ok(())
}

fn cmd_gif(m: &MatrixArgs, args: GifArgs) -> anyhow::Result<()> {
    let file = std::fs::File::open(&args.path)
        .with_context(|| format!("open gif '{}'", args.path.display()))?;
    let mut reader = BufReader::new(file);

    let (matrix, view) = m.open()?;
    let mut tk = ToolKit::new(matrix)?;
    if let Some(t) = frame_transform(&tk, args.rotate, args.fill)? {
        tk.set_transform(t);
    }

    let handle = tk.play_gif(&mut reader)?;
    let report = match args.seconds {
        Some(secs) => {
            let deadline = Instant::now() + Duration::from_secs_f64(secs.max(0.0));
            while !handle.is_finished() && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(20));
            }
            handle.stop()
        }
        None => handle.wait(),
    };
    finish(&tk, m, view.as_ref())?;
    let report = report?;
    eprintln!(
        "{:?} after {} frames ({} full passes)",
        report.outcome, report.frames_played, report.passes_completed
    );
    Ok(())
}

fn cmd_bounce(m: &MatrixArgs, args: BounceArgs) -> anyhow::Result<()> {
    let (matrix, view) = m.open()?;
    let tk = ToolKit::new(matrix)?;
    let (width, height) = tk.with_canvas(|c| (c.width(), c.height()))?;

    let mut ball = Bounce::new(width as i64, height as i64, args.radius);
    let mut left = args.frames;
    let frame_time = Duration::from_millis(args.frame_ms);
    let mut anim = || -> MatrixResult<Option<AnimationFrame>> {
        if args.frames != 0 {
            if left == 0 {
                return Ok(None);
            }
            left -= 1;
        }
        Ok(Some(AnimationFrame::for_duration(ball.next_image(), frame_time)))
    };
    let played = tk.play_animation(&mut anim);
    finish(&tk, m, view.as_ref())?;
    played?;
    Ok(())
}

/// Rotation and/or cover-scaling, composed in that order.
fn frame_transform(
    tk: &ToolKit,
    degrees: Option<u32>,
    cover: bool,
) -> anyhow::Result<Option<Transform>> {
    let rot = degrees.map(Rotation::from_degrees).transpose()?.map(rotate);
    let scale = if cover {
        let (w, h) = tk.with_canvas(|c| (c.width() as u32, c.height() as u32))?;
        Some(fill(w, h))
    } else {
        None
    };
    Ok(match (rot, scale) {
        (Some(r), Some(s)) => Some(Arc::new(move |img: &RgbaImage| s(&r(img))) as Transform),
        (r, s) => r.or(s),
    })
}

/// Write the preview (if asked for) and close the matrix.
fn finish(
    tk: &ToolKit,
    m: &MatrixArgs,
    view: Option<&SimulatorView>,
) -> anyhow::Result<()> {
    if let (Some(path), Some(view)) = (&m.preview, view) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create preview dir '{}'", parent.display()))?;
        }
        view.save_preview(path, &PreviewStyle::default())?;
        eprintln!("wrote {}", path.display());
    }
    tk.close()?;
    Ok(())
}

/// A red ball bouncing off the matrix edges, one pixel per frame on each axis.
struct Bounce {
    width: i64,
    height: i64,
    radius: i64,
    x: i64,
    y: i64,
    dx: i64,
    dy: i64,
}

impl Bounce {
    fn new(width: i64, height: i64, radius: i64) -> Self {
        Self {
            width,
            height,
            radius,
            x: 0,
            y: 0,
            dx: 1,
            dy: 1,
        }
    }

    fn next_image(&mut self) -> RgbaImage {
        let mut img = RgbaImage::from_pixel(
            self.width as u32,
            self.height as u32,
            Rgba([0, 0, 0, 255]),
        );
        let r2 = self.radius * self.radius;
        for py in (self.y - self.radius).max(0)..=(self.y + self.radius).min(self.height - 1) {
            for px in (self.x - self.radius).max(0)..=(self.x + self.radius).min(self.width - 1) {
                let (ox, oy) = (px - self.x, py - self.y);
                if ox * ox + oy * oy <= r2 {
                    img.put_pixel(px as u32, py as u32, Rgba([255, 0, 0, 255]));
                }
            }
        }
        self.step();
        img
    }

    fn step(&mut self) {
        self.x += self.dx;
        self.y += self.dy;

        if self.y + self.radius > self.height {
            self.dy = -1;
        } else if self.y - self.radius < 0 {
            self.dy = 1;
        }

        if self.x + self.radius > self.width {
            self.dx = -1;
        } else if self.x - self.radius < 0 {
            self.dx = 1;
        }
    }
}
