//! JPEG metadata stripping: a plain re-encode of the decoded pixels, which by
//! construction carries no APP1/EXIF segment.

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage};

use crate::{CleanedImage, ContainerFormat, ImageHandle, JPEG_QUALITY, StripError};

pub(crate) fn strip(handle: &ImageHandle) -> Result<CleanedImage, StripError> {
    let bytes = encode_jpeg(handle.image())?;
    Ok(CleanedImage::new(bytes, ContainerFormat::Jpeg))
}

/// Encodes pixels as JPEG at [`JPEG_QUALITY`]. Alpha and exotic sample
/// formats are flattened to 8-bit RGB first; JPEG cannot carry them.
pub(crate) fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Vec::new();
    let flattened;
    let source = match image.color() {
        ColorType::L8 | ColorType::Rgb8 => image,
        _ => {
            flattened = DynamicImage::ImageRgb8(image.to_rgb8());
            &flattened
        }
    };
    source.write_with_encoder(JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY))?;
    Ok(out)
}
