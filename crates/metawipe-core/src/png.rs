//! PNG ancillary chunk access and metadata stripping.
//!
//! Stripping works at the chunk level: the file is rewritten keeping only the
//! chunks needed to render it, so the pixel data and the ICC profile stay
//! byte-identical while every text, time, and EXIF chunk disappears.

use image::codecs::png::PngEncoder;
use image::{ColorType, DynamicImage};
use std::io::Cursor;

use crate::{AncillaryInfo, CleanedImage, ContainerFormat, ImageHandle, StripError};

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Chunk types carried over into the cleaned file. The ICC profile is the
/// one ancillary chunk deliberately preserved; it affects color fidelity and
/// carries no personal data.
const KEEP_CHUNKS: [[u8; 4]; 6] = [*b"IHDR", *b"PLTE", *b"tRNS", *b"iCCP", *b"IDAT", *b"IEND"];

/// Reads the text entries, color profile, and embedded EXIF payload of a PNG.
/// Never fails; a chunk that cannot be read is skipped with a warning.
pub(crate) fn read_ancillary(bytes: &[u8]) -> AncillaryInfo {
    let mut ancillary = AncillaryInfo::default();
    ancillary.exif = exif_chunk(bytes);

    let decoder = png::Decoder::new(Cursor::new(bytes));
    let Ok(reader) = decoder.read_info() else {
        return ancillary;
    };
    let info = reader.info();

    for chunk in &info.uncompressed_latin1_text {
        store_text(&mut ancillary, &chunk.keyword, chunk.text.clone());
    }
    for chunk in &info.compressed_latin1_text {
        match chunk.get_text() {
            Ok(text) => store_text(&mut ancillary, &chunk.keyword, text),
            Err(error) => log::warn!("skipping unreadable zTXt chunk {:?}: {error}", chunk.keyword),
        }
    }
    for chunk in &info.utf8_text {
        match chunk.get_text() {
            Ok(text) => store_text(&mut ancillary, &chunk.keyword, text),
            Err(error) => log::warn!("skipping unreadable iTXt chunk {:?}: {error}", chunk.keyword),
        }
    }
    ancillary.icc_profile = info.icc_profile.as_ref().map(|profile| profile.to_vec());
    ancillary
}

fn store_text(ancillary: &mut AncillaryInfo, keyword: &str, text: String) {
    match keyword {
        "Software" => ancillary.software = Some(text),
        "Source" => ancillary.source = Some(text),
        _ => {}
    }
}

/// Raw payload of the eXIf chunk, if any: a TIFF structure identical to the
/// body of a JPEG EXIF segment.
pub(crate) fn exif_chunk(bytes: &[u8]) -> Option<Vec<u8>> {
    if !bytes.starts_with(&SIGNATURE) {
        return None;
    }
    let mut offset = SIGNATURE.len();
    while offset + 8 <= bytes.len() {
        let length = chunk_length(bytes, offset);
        let chunk_type = chunk_type(bytes, offset);
        let end = offset.checked_add(length.checked_add(12)?)?;
        if end > bytes.len() {
            return None;
        }
        if chunk_type == *b"eXIf" {
            return Some(bytes[offset + 8..end - 4].to_vec());
        }
        if chunk_type == *b"IEND" {
            break;
        }
        offset = end;
    }
    None
}

pub(crate) fn strip(handle: &ImageHandle) -> Result<CleanedImage, StripError> {
    let bytes = handle.bytes();
    if !bytes.starts_with(&SIGNATURE) {
        return Err(StripError::Container("missing PNG signature"));
    }

    let mut cleaned = Vec::with_capacity(bytes.len());
    cleaned.extend_from_slice(&SIGNATURE);

    let mut offset = SIGNATURE.len();
    loop {
        if offset + 8 > bytes.len() {
            return Err(StripError::Container("truncated chunk header"));
        }
        let length = chunk_length(bytes, offset);
        let chunk_type = chunk_type(bytes, offset);
        let end = length
            .checked_add(12)
            .and_then(|total| offset.checked_add(total))
            .filter(|end| *end <= bytes.len())
            .ok_or(StripError::Container("truncated chunk"))?;

        if KEEP_CHUNKS.contains(&chunk_type) {
            cleaned.extend_from_slice(&bytes[offset..end]);
        } else {
            log::debug!(
                "dropping {} chunk ({length} bytes)",
                String::from_utf8_lossy(&chunk_type)
            );
        }
        if chunk_type == *b"IEND" {
            break;
        }
        offset = end;
    }
    Ok(CleanedImage::new(cleaned, ContainerFormat::Png))
}

fn chunk_length(bytes: &[u8], offset: usize) -> usize {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ]) as usize
}

fn chunk_type(bytes: &[u8], offset: usize) -> [u8; 4] {
    [
        bytes[offset + 4],
        bytes[offset + 5],
        bytes[offset + 6],
        bytes[offset + 7],
    ]
}

/// Encodes pixels as PNG. Sample formats the PNG encoder cannot take
/// (for example float HDR buffers) are converted to 8-bit RGBA first.
pub(crate) fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Vec::new();
    let converted;
    let source = match image.color() {
        ColorType::L8
        | ColorType::La8
        | ColorType::Rgb8
        | ColorType::Rgba8
        | ColorType::L16
        | ColorType::La16
        | ColorType::Rgb16
        | ColorType::Rgba16 => image,
        _ => {
            converted = DynamicImage::ImageRgba8(image.to_rgba8());
            &converted
        }
    };
    source.write_with_encoder(PngEncoder::new(&mut out))?;
    Ok(out)
}
