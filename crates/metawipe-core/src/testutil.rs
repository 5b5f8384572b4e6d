//! Shared test fixtures: tiny in-memory JPEG and PNG images, with helpers to
//! splice hand-assembled EXIF segments and PNG chunks into them.

use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

/// A 4x3 JPEG with no EXIF segment.
pub(crate) fn tiny_jpeg() -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 3, Rgb([120, 80, 40])));
    crate::jpeg::encode_jpeg(&image).unwrap()
}

/// A 4x3 RGBA PNG carrying the given tEXt chunks.
pub(crate) fn png_with_text(text_chunks: &[(&str, &str)]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(4, 3, Rgba([10, 200, 30, 255]));
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, 4, 3);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        for (keyword, text) in text_chunks {
            encoder
                .add_text_chunk((*keyword).to_string(), (*text).to_string())
                .unwrap();
        }
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(image.as_raw()).unwrap();
    }
    out
}

/// A PNG whose iCCP chunk holds the given profile bytes.
pub(crate) fn png_with_icc(profile: &[u8]) -> Vec<u8> {
    let mut data = b"icc".to_vec();
    data.push(0); // keyword terminator
    data.push(0); // compression method: deflate
    data.extend_from_slice(&zlib_stored(profile));
    insert_chunk(&png_with_text(&[]), *b"iCCP", &data)
}

/// A valid PNG whose IHDR claims the given dimensions. Only the header and
/// its CRC are patched; header-only reads see the claimed size while the
/// pixel data still describes a 4x3 image.
pub(crate) fn png_claiming_dimensions(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = png_with_text(&[]);
    bytes[16..20].copy_from_slice(&width.to_be_bytes());
    bytes[20..24].copy_from_slice(&height.to_be_bytes());
    let crc = png_crc(b"IHDR", &bytes[16..29]);
    bytes[29..33].copy_from_slice(&crc.to_be_bytes());
    bytes
}

/// A PNG with an eXIf chunk holding the given raw TIFF payload.
pub(crate) fn png_with_exif(tiff: &[u8]) -> Vec<u8> {
    insert_chunk(&png_with_text(&[]), *b"eXIf", tiff)
}

/// Inserts a chunk immediately before the first IDAT chunk.
pub(crate) fn insert_chunk(png_bytes: &[u8], chunk_type: [u8; 4], data: &[u8]) -> Vec<u8> {
    let mut offset = 8;
    while offset + 8 <= png_bytes.len() {
        let length = u32::from_be_bytes([
            png_bytes[offset],
            png_bytes[offset + 1],
            png_bytes[offset + 2],
            png_bytes[offset + 3],
        ]) as usize;
        if &png_bytes[offset + 4..offset + 8] == b"IDAT" {
            break;
        }
        offset += length + 12;
    }

    let mut out = Vec::with_capacity(png_bytes.len() + data.len() + 12);
    out.extend_from_slice(&png_bytes[..offset]);
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(&chunk_type);
    out.extend_from_slice(data);
    out.extend_from_slice(&png_crc(&chunk_type, data).to_be_bytes());
    out.extend_from_slice(&png_bytes[offset..]);
    out
}

fn png_crc(chunk_type: &[u8; 4], data: &[u8]) -> u32 {
    let mut crc = 0xffff_ffff_u32;
    for &byte in chunk_type.iter().chain(data) {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xedb8_8320 & mask);
        }
    }
    !crc
}

/// Wraps bytes in a zlib stream of stored (uncompressed) deflate blocks.
fn zlib_stored(data: &[u8]) -> Vec<u8> {
    assert!(data.len() <= usize::from(u16::MAX));
    let len = data.len() as u16;
    let mut out = vec![0x78, 0x01, 0x01];
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&(!len).to_le_bytes());
    out.extend_from_slice(data);
    out.extend_from_slice(&adler32(data).to_be_bytes());
    out
}

fn adler32(data: &[u8]) -> u32 {
    let mut a = 1_u32;
    let mut b = 0_u32;
    for &byte in data {
        a = (a + u32::from(byte)) % 65521;
        b = (b + a) % 65521;
    }
    (b << 16) | a
}

/// Builds a minimal little-endian TIFF structure with a 0th IFD and optional
/// Exif and GPS sub-directories, like a camera would write it.
#[derive(Debug, Default)]
pub(crate) struct ExifBuilder {
    make: Option<String>,
    model: Option<String>,
    taken_at: Option<String>,
    latitude: Option<([(u32, u32); 3], Option<String>)>,
    longitude: Option<([(u32, u32); 3], Option<String>)>,
}

impl ExifBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn make(mut self, make: &str) -> Self {
        self.make = Some(make.to_string());
        self
    }

    pub(crate) fn model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    pub(crate) fn taken_at(mut self, taken_at: &str) -> Self {
        self.taken_at = Some(taken_at.to_string());
        self
    }

    pub(crate) fn latitude(mut self, dms: [(u32, u32); 3], reference: Option<&str>) -> Self {
        self.latitude = Some((dms, reference.map(str::to_string)));
        self
    }

    pub(crate) fn longitude(mut self, dms: [(u32, u32); 3], reference: Option<&str>) -> Self {
        self.longitude = Some((dms, reference.map(str::to_string)));
        self
    }

    /// The raw TIFF bytes (what a PNG eXIf chunk holds).
    pub(crate) fn tiff(&self) -> Vec<u8> {
        const EXIF_IFD_POINTER: u16 = 0x8769;
        const GPS_IFD_POINTER: u16 = 0x8825;

        let mut zeroth = Vec::new();
        if let Some(make) = &self.make {
            zeroth.push(ascii_entry(crate::tags::MAKE, make));
        }
        if let Some(model) = &self.model {
            zeroth.push(ascii_entry(crate::tags::MODEL, model));
        }

        let mut exif_ifd = Vec::new();
        if let Some(taken_at) = &self.taken_at {
            exif_ifd.push(ascii_entry(crate::tags::DATE_TIME_ORIGINAL, taken_at));
        }

        let mut gps = Vec::new();
        if let Some((dms, reference)) = &self.latitude {
            if let Some(reference) = reference {
                gps.push(ascii_entry(crate::tags::GPS_LATITUDE_REF, reference));
            }
            gps.push(rational_entry(crate::tags::GPS_LATITUDE, dms));
        }
        if let Some((dms, reference)) = &self.longitude {
            if let Some(reference) = reference {
                gps.push(ascii_entry(crate::tags::GPS_LONGITUDE_REF, reference));
            }
            gps.push(rational_entry(crate::tags::GPS_LONGITUDE, dms));
        }

        let ifd_len = |count: usize| 2 + 12 * count + 4;
        let zeroth_count =
            zeroth.len() + usize::from(!exif_ifd.is_empty()) + usize::from(!gps.is_empty());
        let zeroth_offset = 8_u32;
        let exif_offset = zeroth_offset + ifd_len(zeroth_count) as u32;
        let gps_offset = exif_offset
            + if exif_ifd.is_empty() {
                0
            } else {
                ifd_len(exif_ifd.len()) as u32
            };
        let data_offset = gps_offset
            + if gps.is_empty() {
                0
            } else {
                ifd_len(gps.len()) as u32
            };

        if !exif_ifd.is_empty() {
            zeroth.push(long_entry(EXIF_IFD_POINTER, exif_offset));
        }
        if !gps.is_empty() {
            zeroth.push(long_entry(GPS_IFD_POINTER, gps_offset));
        }
        zeroth.sort_by_key(|entry| entry.tag);
        gps.sort_by_key(|entry| entry.tag);

        let mut out = Vec::new();
        out.extend_from_slice(b"II");
        out.extend_from_slice(&42_u16.to_le_bytes());
        out.extend_from_slice(&zeroth_offset.to_le_bytes());

        let mut data = Vec::new();
        write_ifd(&mut out, &zeroth, data_offset, &mut data);
        if !exif_ifd.is_empty() {
            write_ifd(&mut out, &exif_ifd, data_offset, &mut data);
        }
        if !gps.is_empty() {
            write_ifd(&mut out, &gps, data_offset, &mut data);
        }
        out.extend_from_slice(&data);
        out
    }

    /// The full APP1 payload: `Exif\0\0` marker plus the TIFF structure.
    pub(crate) fn app1(&self) -> Vec<u8> {
        let mut payload = b"Exif\0\0".to_vec();
        payload.extend_from_slice(&self.tiff());
        payload
    }
}

struct IfdEntry {
    tag: u16,
    kind: u16,
    count: u32,
    payload: Vec<u8>,
}

fn ascii_entry(tag: u16, text: &str) -> IfdEntry {
    let mut payload = text.as_bytes().to_vec();
    payload.push(0);
    IfdEntry {
        tag,
        kind: 2, // ASCII
        count: payload.len() as u32,
        payload,
    }
}

fn rational_entry(tag: u16, parts: &[(u32, u32)]) -> IfdEntry {
    let mut payload = Vec::with_capacity(parts.len() * 8);
    for (num, denom) in parts {
        payload.extend_from_slice(&num.to_le_bytes());
        payload.extend_from_slice(&denom.to_le_bytes());
    }
    IfdEntry {
        tag,
        kind: 5, // RATIONAL
        count: parts.len() as u32,
        payload,
    }
}

fn long_entry(tag: u16, value: u32) -> IfdEntry {
    IfdEntry {
        tag,
        kind: 4, // LONG
        count: 1,
        payload: value.to_le_bytes().to_vec(),
    }
}

/// Serializes one IFD; values wider than four bytes go to the shared data
/// area that starts at `data_offset`.
fn write_ifd(out: &mut Vec<u8>, entries: &[IfdEntry], data_offset: u32, data: &mut Vec<u8>) {
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for entry in entries {
        out.extend_from_slice(&entry.tag.to_le_bytes());
        out.extend_from_slice(&entry.kind.to_le_bytes());
        out.extend_from_slice(&entry.count.to_le_bytes());
        if entry.payload.len() <= 4 {
            let mut inline = [0_u8; 4];
            inline[..entry.payload.len()].copy_from_slice(&entry.payload);
            out.extend_from_slice(&inline);
        } else {
            out.extend_from_slice(&(data_offset + data.len() as u32).to_le_bytes());
            data.extend_from_slice(&entry.payload);
            if data.len() % 2 == 1 {
                data.push(0);
            }
        }
    }
    out.extend_from_slice(&0_u32.to_le_bytes()); // no next IFD
}

/// Splices an APP1 segment right after the SOI marker of a JPEG.
pub(crate) fn splice_app1(jpeg: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 4);
    out.extend_from_slice(&jpeg[..2]); // SOI
    out.extend_from_slice(&[0xff, 0xe1]);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// A 4x3 JPEG with the given EXIF content embedded.
pub(crate) fn jpeg_with_exif(builder: &ExifBuilder) -> Vec<u8> {
    splice_app1(&tiny_jpeg(), &builder.app1())
}
