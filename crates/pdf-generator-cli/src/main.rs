//! PDF Generator CLI - Merge PNG and JPEG images into one PDF.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use pdf_generator_core::{AppConfig, DecodePolicy, PdfGenerator, UploadedImage};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DecodeErrorOption {
    /// Report the file and leave it out
    Skip,
    /// Stop at the first file that cannot be decoded
    Abort,
}

impl From<DecodeErrorOption> for DecodePolicy {
    fn from(opt: DecodeErrorOption) -> Self {
        match opt {
            DecodeErrorOption::Skip => Self::Skip,
            DecodeErrorOption::Abort => Self::Abort,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "pdf-generate")]
#[command(author, version, about = "Merge PNG and JPEG images into one PDF", long_about = None)]
struct Args {
    /// Input images, one page each, in order
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Output PDF file (default: the configured download name, name.pdf)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file path
    #[arg(short, long, env = "PDF_GENERATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Largest accepted image in bytes
    #[arg(long, env = "PDF_GENERATOR_MAX_FILE_SIZE")]
    max_file_size: Option<u64>,

    /// Page resolution in dpi (pixels per inch)
    #[arg(long)]
    resolution: Option<f32>,

    /// What to do with images that cannot be decoded
    #[arg(long, value_enum)]
    on_decode_error: Option<DecodeErrorOption>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// Configuration file (or defaults) with command line overrides applied.
    fn config(&self) -> Result<AppConfig> {
        let mut config = if let Some(config_path) = &self.config {
            AppConfig::from_file(config_path).context("Failed to load config file")?
        } else {
            AppConfig::load()
        };

        if let Some(max_file_size) = self.max_file_size {
            config.max_file_size = max_file_size;
        }
        if let Some(resolution) = self.resolution {
            config.resolution = resolution;
        }
        if let Some(policy) = self.on_decode_error {
            config.on_decode_error = policy.into();
        }

        Ok(config)
    }
}

/// Read one input; names outside the allow-list come back as `Err` so they
/// are reported like any other rejected file.
fn read_image(path: &Path) -> Result<pdf_generator_core::Result<UploadedImage>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    Ok(UploadedImage::new(name, bytes))
}

/// Build the PDF and write it. Returns the output path and the page count.
fn run(args: &Args) -> Result<(PathBuf, usize)> {
    let generator = PdfGenerator::new(args.config()?).context("Invalid configuration")?;
    let mut session = generator.new_session::<()>();

    info!("Processing {} images", args.images.len());

    #[allow(clippy::cast_possible_truncation)]
    let pb = ProgressBar::new(args.images.len() as u64);
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    // One pass per file keeps the progress bar moving during decoding
    for path in &args.images {
        pb.set_message(path.display().to_string());

        let upload = read_image(path)?;
        let batch = generator
            .prepare_uploads([upload])
            .with_context(|| format!("Failed to decode {}", path.display()))?;
        let report = session.commit(batch);

        for position in &report.placed {
            debug!("{} -> {}", path.display(), position);
        }
        for notice in &report.notices {
            warn!("{}", notice.message);
            pb.println(format!("Skipped: {}", notice.message));
        }
        pb.inc(1);
    }

    pb.finish_and_clear();

    if session.is_empty() {
        anyhow::bail!("No images were accepted, nothing to write");
    }

    let pdf = generator
        .generate(&session)
        .context("Failed to assemble PDF")?;

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&generator.config().download_filename));

    std::fs::write(&output_path, pdf)
        .with_context(|| format!("Failed to write output: {}", output_path.display()))?;

    Ok((output_path, session.accepted().len()))
}

fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging; RUST_LOG takes precedence over -v
    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let (output_path, pages) = run(&args)?;

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        println!("Wrote {} pages to: {}", pages, output_path.display());
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_png(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        DynamicImage::ImageRgb8(RgbImage::from_pixel(6, 4, Rgb([1, 2, 3])))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path
    }

    fn args(extra: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("pdf-generate").chain(extra.iter().copied())).unwrap()
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let args = args(&[
            "a.png",
            "--max-file-size",
            "1024",
            "--resolution",
            "300",
            "--on-decode-error",
            "abort",
        ]);
        let config = args.config().unwrap();
        assert_eq!(config.max_file_size, 1024);
        assert!((config.resolution - 300.0).abs() < f32::EPSILON);
        assert_eq!(config.on_decode_error, DecodePolicy::Abort);
    }

    #[test]
    fn test_config_file_then_overrides() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "max_columns = 2\nresolution = 150.0\n").unwrap();

        let args = args(&["a.png", "-c", config_path.to_str().unwrap(), "--resolution", "72"]);
        let config = args.config().unwrap();
        assert_eq!(config.max_columns, 2);
        assert!((config.resolution - 72.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_requires_images() {
        assert!(Args::try_parse_from(["pdf-generate"]).is_err());
    }

    #[test]
    fn test_run_skips_rejected_files() {
        let dir = TempDir::new().unwrap();
        let first = write_png(&dir, "first.png");
        let gif = dir.path().join("clip.gif");
        std::fs::write(&gif, b"GIF89a").unwrap();
        let broken = dir.path().join("broken.jpg");
        std::fs::write(&broken, b"\xFF\xD8 not a jpeg").unwrap();
        let last = write_png(&dir, "last.png");
        let output = dir.path().join("out.pdf");

        let args = args(&[
            first.to_str().unwrap(),
            gif.to_str().unwrap(),
            broken.to_str().unwrap(),
            last.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ]);
        let (path, pages) = run(&args).unwrap();

        assert_eq!(path, output);
        assert_eq!(pages, 2);
        assert!(std::fs::read(&output).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_run_abort_policy_fails() {
        let dir = TempDir::new().unwrap();
        let broken = dir.path().join("broken.png");
        std::fs::write(&broken, b"not a png").unwrap();
        let output = dir.path().join("out.pdf");

        let args = args(&[
            broken.to_str().unwrap(),
            "--on-decode-error",
            "abort",
            "-o",
            output.to_str().unwrap(),
        ]);
        assert!(run(&args).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_run_fails_when_nothing_accepted() {
        let dir = TempDir::new().unwrap();
        let big = write_png(&dir, "big.png");
        let output = dir.path().join("out.pdf");

        let args = args(&[
            big.to_str().unwrap(),
            "--max-file-size",
            "1",
            "-o",
            output.to_str().unwrap(),
        ]);
        assert!(run(&args).is_err());
        assert!(!output.exists());
    }
}
