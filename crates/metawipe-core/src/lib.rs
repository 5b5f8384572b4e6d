// crates/metawipe-core/src/lib.rs

pub mod jpeg;
pub mod metadata;
pub mod png;
pub mod report;
pub mod tags;
#[cfg(test)]
pub(crate) mod testutil;

use image::{DynamicImage, ImageFormat, ImageReader};
use std::fmt;
use std::io::Cursor;
use thiserror::Error;

pub use metadata::{GpsCoordinate, MetadataTagTree, PrivacySummary, Segment, TagValue};
pub use report::{MetadataReport, ReportCategory, ReportEntry};

/// Upper bound on decoded pixel count. Inputs above this are rejected at load
/// time instead of stalling the whole pipeline on a decompression bomb.
pub const MAX_PIXELS: u64 = 100_000_000;

/// Quality used for every JPEG re-encode. High enough that the cleaned image
/// is visually indistinguishable from the source.
pub const JPEG_QUALITY: u8 = 95;

/// Error returned by [`load`]. A load failure aborts the whole pipeline;
/// there is never a partial [`ImageHandle`].
#[derive(Debug, Error)]
pub enum LoadError {
    /// The bytes could not be decoded as any recognized raster format.
    #[error("unsupported or corrupt image data: {0}")]
    UnsupportedOrCorrupt(#[from] image::ImageError),

    /// The container decoded, but its dimensions exceed [`MAX_PIXELS`].
    #[error("image is {width}x{height} pixels, exceeding the supported size")]
    TooLarge { width: u32, height: u32 },
}

/// Non-fatal error for a metadata segment that exists but cannot be parsed.
/// [`analyze`] downgrades this to a diagnostic line in the report.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("embedded metadata segment is corrupt: {0}")]
    Corrupt(#[from] exif::Error),
}

/// Error returned by [`strip`]. The input handle is never affected; either a
/// complete [`CleanedImage`] is produced or nothing changes.
#[derive(Debug, Error)]
pub enum StripError {
    #[error("re-encoding the cleaned image failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("container structure is invalid: {0}")]
    Container(&'static str),
}

/// Error returned by [`encode`] when the final byte stream cannot be produced.
#[derive(Debug, Error)]
#[error("encoding to {format} failed: {source}")]
pub struct EncodeError {
    pub format: OutputFormat,
    #[source]
    pub source: image::ImageError,
}

/// Container format of the input bytes, determined from the decoded header,
/// never from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    Jpeg,
    Png,
    /// Any other format the image decoder recognizes. These have no native
    /// strip path and get normalized to PNG or JPEG by [`strip`].
    Other,
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContainerFormat::Jpeg => "JPEG",
            ContainerFormat::Png => "PNG",
            ContainerFormat::Other => "other",
        })
    }
}

/// Target format for [`encode`], chosen by the caller (for example from the
/// output file extension).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Jpeg => "JPEG",
            OutputFormat::Png => "PNG",
        })
    }
}

/// Ancillary container data that is not part of the structured EXIF block:
/// PNG text entries, the color profile, and a raw EXIF payload when the
/// container embeds one outside a JPEG APP1 segment.
#[derive(Debug, Clone, Default)]
pub struct AncillaryInfo {
    pub software: Option<String>,
    pub source: Option<String>,
    pub icc_profile: Option<Vec<u8>>,
    /// Raw TIFF payload of a PNG eXIf chunk, fed through the same decoder as
    /// the JPEG EXIF segment.
    pub exif: Option<Vec<u8>>,
}

/// A successfully decoded input image. Immutable once created; both the
/// decoder and the stripper only read from it.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    bytes: Vec<u8>,
    image: DynamicImage,
    format: ContainerFormat,
    ancillary: AncillaryInfo,
}

impl ImageHandle {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn format(&self) -> ContainerFormat {
        self.format
    }

    /// The original, untouched input bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn ancillary(&self) -> &AncillaryInfo {
        &self.ancillary
    }

    pub(crate) fn image(&self) -> &DynamicImage {
        &self.image
    }
}

/// The result of a successful strip: a new byte buffer with the metadata
/// removed. The source [`ImageHandle`] stays untouched.
#[derive(Debug, Clone)]
pub struct CleanedImage {
    bytes: Vec<u8>,
    format: ContainerFormat,
}

impl CleanedImage {
    pub(crate) fn new(bytes: Vec<u8>, format: ContainerFormat) -> Self {
        Self { bytes, format }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn format(&self) -> ContainerFormat {
        self.format
    }
}

/// Decodes raw input bytes into an [`ImageHandle`].
///
/// The container format is identified from the byte stream itself. Failure
/// here is a hard error; metadata problems inside an otherwise valid image
/// are not (see [`analyze`]).
pub fn load(bytes: Vec<u8>) -> Result<ImageHandle, LoadError> {
    let guessed = image::guess_format(&bytes)?;

    // Cheap header-only dimension read before committing to a full decode.
    let (width, height) = ImageReader::with_format(Cursor::new(&bytes), guessed).into_dimensions()?;
    if u64::from(width) * u64::from(height) > MAX_PIXELS {
        return Err(LoadError::TooLarge { width, height });
    }

    let image = image::load_from_memory_with_format(&bytes, guessed)?;

    let format = match guessed {
        ImageFormat::Jpeg => ContainerFormat::Jpeg,
        ImageFormat::Png => ContainerFormat::Png,
        _ => ContainerFormat::Other,
    };
    let ancillary = match format {
        ContainerFormat::Png => png::read_ancillary(&bytes),
        _ => AncillaryInfo::default(),
    };

    Ok(ImageHandle {
        bytes,
        image,
        format,
        ancillary,
    })
}

/// Produces the human-readable metadata report for an image.
///
/// Never fails: a corrupt metadata segment becomes a diagnostic line while
/// dimensions and independently readable fields are still reported.
pub fn analyze(handle: &ImageHandle) -> MetadataReport {
    match metadata::decode_tags(handle) {
        Ok(tree) => {
            let summary = metadata::summarize(&tree);
            report::render(handle, &summary)
        }
        Err(error) => {
            log::warn!("metadata decode failed: {error}");
            report::render_decode_failure(handle, &error)
        }
    }
}

/// Produces a cleaned byte stream with the privacy-sensitive metadata removed.
///
/// Per-format policy:
/// - JPEG: re-encoded at [`JPEG_QUALITY`], which leaves no EXIF segment.
/// - PNG: rewritten chunk by chunk, keeping only what is needed to render the
///   image plus the ICC color profile.
/// - anything else: normalized to PNG when the image carries alpha, otherwise
///   to RGB JPEG. A deliberate conversion, not a silent failure.
pub fn strip(handle: &ImageHandle) -> Result<CleanedImage, StripError> {
    match handle.format {
        ContainerFormat::Jpeg => jpeg::strip(handle),
        ContainerFormat::Png => png::strip(handle),
        ContainerFormat::Other => {
            if handle.image.color().has_alpha() {
                log::debug!("normalizing foreign container to PNG (alpha channel present)");
                let bytes = png::encode_png(&handle.image)?;
                Ok(CleanedImage::new(bytes, ContainerFormat::Png))
            } else {
                log::debug!("normalizing foreign container to JPEG");
                let bytes = jpeg::encode_jpeg(&handle.image)?;
                Ok(CleanedImage::new(bytes, ContainerFormat::Jpeg))
            }
        }
    }
}

/// Encodes a cleaned image into the caller-chosen target format.
///
/// When the cleaned bytes are already in the target format they are passed
/// through unchanged; otherwise the cleaned image is transcoded. The cleaned
/// input carries no metadata, so neither does the transcoded output.
pub fn encode(cleaned: &CleanedImage, target: OutputFormat) -> Result<Vec<u8>, EncodeError> {
    match (cleaned.format, target) {
        (ContainerFormat::Jpeg, OutputFormat::Jpeg) | (ContainerFormat::Png, OutputFormat::Png) => {
            Ok(cleaned.bytes.clone())
        }
        _ => {
            let image = image::load_from_memory(&cleaned.bytes).map_err(|source| EncodeError {
                format: target,
                source,
            })?;
            let result = match target {
                OutputFormat::Jpeg => jpeg::encode_jpeg(&image),
                OutputFormat::Png => png::encode_png(&image),
            };
            result.map_err(|source| EncodeError {
                format: target,
                source,
            })
        }
    }
}
