// crates/metawipe-cli/src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use metawipe_core::{CleanedImage, ContainerFormat, OutputFormat};
use std::path::{Path, PathBuf};

/// A tool to view and remove privacy-sensitive metadata from images.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Show the metadata report for an image
    View {
        /// The path to the image
        #[arg(required = true)]
        file_path: PathBuf,

        /// Also dump every decoded EXIF tag
        #[arg(short, long)]
        raw: bool,
    },
    /// Strip metadata and write a cleaned copy
    Clean {
        /// The path to the image
        #[arg(required = true)]
        file_path: PathBuf,

        /// Where to write the cleaned image; the extension picks the format
        /// (defaults to `<name>_clean.jpg` or `.png` beside the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::View { file_path, raw } => {
            let handle = load_image(&file_path).await?;
            let report = metawipe_core::analyze(&handle);

            println!("Metadata for {}:", file_path.display());
            for entry in report.entries() {
                println!("  {}", entry.text);
            }

            if raw {
                for line in metawipe_core::report::render_raw_tags(&handle) {
                    println!("{line}");
                }
            }
        }

        Commands::Clean { file_path, output } => {
            let handle = load_image(&file_path).await?;
            let cleaned = metawipe_core::strip(&handle)
                .with_context(|| format!("Failed to strip metadata from {}", file_path.display()))?;

            let output_path =
                output.unwrap_or_else(|| default_output_path(&file_path, &cleaned));
            let target = format_for_path(&output_path);
            let encoded = metawipe_core::encode(&cleaned, target)
                .with_context(|| format!("Failed to encode the cleaned image as {target}"))?;

            tokio::fs::write(&output_path, encoded)
                .await
                .with_context(|| {
                    format!("Failed to write cleaned file to {}", output_path.display())
                })?;

            println!("Cleaned image saved to: {}", output_path.display());
        }
    }

    Ok(())
}

async fn load_image(path: &Path) -> Result<metawipe_core::ImageHandle> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    metawipe_core::load(bytes).with_context(|| format!("Failed to load image: {}", path.display()))
}

/// The encode format follows the chosen output extension, JPEG by default.
fn format_for_path(path: &Path) -> OutputFormat {
    match path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => OutputFormat::Png,
        _ => OutputFormat::Jpeg,
    }
}

fn default_output_path(input: &Path, cleaned: &CleanedImage) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("image");
    let extension = match cleaned.format() {
        ContainerFormat::Png => "png",
        _ => "jpg",
    };
    input.with_file_name(format!("{stem}_clean.{extension}"))
}
