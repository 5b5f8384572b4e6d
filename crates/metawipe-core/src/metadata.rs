//! Decoding of the embedded metadata block into a structured tag tree, and
//! extraction of the privacy-relevant subset (GPS position, capture time,
//! device name) in display-ready form.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Cursor;

use crate::{ContainerFormat, ImageHandle, MetadataError, tags};

/// Metadata segment a tag lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Segment {
    /// The 0th image file directory (camera make/model, software, ...).
    Zeroth,
    /// The Exif sub-directory (capture timestamps, exposure, ...).
    Exif,
    /// The GPS sub-directory.
    Gps,
}

impl Segment {
    pub fn as_str(self) -> &'static str {
        match self {
            Segment::Zeroth => "0th",
            Segment::Exif => "Exif",
            Segment::Gps => "GPS",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw tagged value as stored in the container.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Text(String),
    /// Integer fractions, for example a degrees/minutes/seconds triple.
    Rationals(Vec<(u32, u32)>),
    Integers(Vec<u64>),
    Bytes(Vec<u8>),
    /// Anything the decoder has no dedicated representation for.
    Other(String),
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Text(text) => f.write_str(text),
            TagValue::Rationals(parts) => {
                let rendered: Vec<String> = parts
                    .iter()
                    .map(|(num, denom)| format!("{num}/{denom}"))
                    .collect();
                f.write_str(&rendered.join(" "))
            }
            TagValue::Integers(values) => {
                let rendered: Vec<String> = values.iter().map(u64::to_string).collect();
                f.write_str(&rendered.join(" "))
            }
            TagValue::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
            TagValue::Other(rendered) => f.write_str(rendered),
        }
    }
}

/// The structured tag tree of one image: segment -> tag code -> raw value.
/// Built once per load and only ever read afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataTagTree {
    segments: BTreeMap<Segment, BTreeMap<u16, TagValue>>,
}

impl MetadataTagTree {
    pub fn is_empty(&self) -> bool {
        self.segments.values().all(BTreeMap::is_empty)
    }

    pub fn get(&self, segment: Segment, code: u16) -> Option<&TagValue> {
        self.segments.get(&segment)?.get(&code)
    }

    /// All entries in segment order, then tag-code order.
    pub fn iter(&self) -> impl Iterator<Item = (Segment, u16, &TagValue)> {
        self.segments.iter().flat_map(|(segment, entries)| {
            entries
                .iter()
                .map(move |(code, value)| (*segment, *code, value))
        })
    }

    fn insert(&mut self, segment: Segment, code: u16, value: TagValue) {
        self.segments.entry(segment).or_default().insert(code, value);
    }
}

/// A geographic position in signed decimal degrees, rounded to six fraction
/// digits (roughly 0.11 m) before display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for GpsCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// The privacy-relevant subset of a tag tree, already converted for display.
#[derive(Debug, Clone, Default)]
pub struct PrivacySummary {
    pub gps: Option<GpsCoordinate>,
    pub taken_at: Option<String>,
    pub device: Option<String>,
    /// Value-level problems (for example an invalid rational) that did not
    /// prevent the rest of the tree from being read.
    pub diagnostics: Vec<String>,
}

/// Parses the embedded metadata block of an image into a tag tree.
///
/// An image without any metadata segment yields an empty tree; only a
/// segment that exists but cannot be parsed is an error, and [`crate::analyze`]
/// downgrades that to a report diagnostic.
pub fn decode_tags(handle: &ImageHandle) -> Result<MetadataTagTree, MetadataError> {
    match handle.format() {
        ContainerFormat::Jpeg => {
            let mut cursor = Cursor::new(handle.bytes());
            build_tree(exif::Reader::new().read_from_container(&mut cursor))
        }
        ContainerFormat::Png => match &handle.ancillary().exif {
            Some(raw) => build_tree(exif::Reader::new().read_raw(raw.clone())),
            None => Ok(MetadataTagTree::default()),
        },
        ContainerFormat::Other => Ok(MetadataTagTree::default()),
    }
}

fn build_tree(parsed: Result<exif::Exif, exif::Error>) -> Result<MetadataTagTree, MetadataError> {
    let data = match parsed {
        Ok(data) => data,
        // No segment at all is a perfectly normal image.
        Err(exif::Error::NotFound(_)) | Err(exif::Error::BlankValue(_)) => {
            return Ok(MetadataTagTree::default());
        }
        Err(error) => return Err(MetadataError::Corrupt(error)),
    };

    let mut tree = MetadataTagTree::default();
    for field in data.fields() {
        // The thumbnail directory duplicates the primary image's tags.
        if field.ifd_num != exif::In::PRIMARY {
            continue;
        }
        let Some(segment) = segment_for(field.tag.context()) else {
            continue;
        };
        tree.insert(segment, field.tag.number(), convert_value(&field.value));
    }
    Ok(tree)
}

fn segment_for(context: exif::Context) -> Option<Segment> {
    match context {
        exif::Context::Tiff => Some(Segment::Zeroth),
        exif::Context::Exif => Some(Segment::Exif),
        exif::Context::Gps => Some(Segment::Gps),
        _ => None,
    }
}

fn convert_value(value: &exif::Value) -> TagValue {
    match value {
        exif::Value::Ascii(lines) => TagValue::Text(
            lines
                .iter()
                .map(|line| String::from_utf8_lossy(line).into_owned())
                .collect::<Vec<_>>()
                .join(" "),
        ),
        exif::Value::Rational(rationals) => TagValue::Rationals(
            rationals
                .iter()
                .map(|rational| (rational.num, rational.denom))
                .collect(),
        ),
        exif::Value::Byte(bytes) => TagValue::Bytes(bytes.clone()),
        exif::Value::Undefined(bytes, _) => TagValue::Bytes(bytes.clone()),
        exif::Value::Short(values) => {
            TagValue::Integers(values.iter().copied().map(u64::from).collect())
        }
        exif::Value::Long(values) => {
            TagValue::Integers(values.iter().copied().map(u64::from).collect())
        }
        other => TagValue::Other(format!("{other:?}")),
    }
}

/// Extracts and converts the privacy-relevant subset of a tag tree.
pub fn summarize(tree: &MetadataTagTree) -> PrivacySummary {
    let mut summary = PrivacySummary::default();
    match gps_coordinate(tree) {
        Ok(gps) => summary.gps = gps,
        Err(problem) => summary.diagnostics.push(problem),
    }
    summary.taken_at = capture_datetime(tree);
    summary.device = device_name(tree);
    summary
}

/// Converts the GPS rational triples into a signed decimal coordinate.
///
/// Both latitude and longitude tags must be present; a missing pair is not an
/// error, the image simply has no position. A present but malformed rational
/// is reported as a diagnostic instead.
fn gps_coordinate(tree: &MetadataTagTree) -> Result<Option<GpsCoordinate>, String> {
    let (Some(lat), Some(lon)) = (
        tree.get(Segment::Gps, tags::GPS_LATITUDE),
        tree.get(Segment::Gps, tags::GPS_LONGITUDE),
    ) else {
        return Ok(None);
    };

    let latitude = decimal_degrees(lat)
        .ok_or_else(|| "GPS latitude is not a valid degrees/minutes/seconds triple".to_string())?;
    let longitude = decimal_degrees(lon)
        .ok_or_else(|| "GPS longitude is not a valid degrees/minutes/seconds triple".to_string())?;

    let latitude = latitude * hemisphere_sign(tree.get(Segment::Gps, tags::GPS_LATITUDE_REF), 'S');
    let longitude =
        longitude * hemisphere_sign(tree.get(Segment::Gps, tags::GPS_LONGITUDE_REF), 'W');

    Ok(Some(GpsCoordinate {
        latitude: round_six(latitude),
        longitude: round_six(longitude),
    }))
}

fn decimal_degrees(value: &TagValue) -> Option<f64> {
    let TagValue::Rationals(parts) = value else {
        return None;
    };
    if parts.len() < 3 {
        return None;
    }
    let mut components = [0.0_f64; 3];
    for (slot, (num, denom)) in components.iter_mut().zip(parts) {
        if *denom == 0 {
            return None;
        }
        *slot = f64::from(*num) / f64::from(*denom);
    }
    Some(components[0] + components[1] / 60.0 + components[2] / 3600.0)
}

/// A missing reference tag means northern/eastern hemisphere, so positive.
fn hemisphere_sign(reference: Option<&TagValue>, negative: char) -> f64 {
    match reference {
        Some(TagValue::Text(text)) if text.contains(negative) => -1.0,
        _ => 1.0,
    }
}

fn round_six(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

/// Reads the capture timestamp and reformats `YYYY:MM:DD HH:MM:SS` into the
/// `DD.MM.YYYY HH:MM:SS` display form. A timestamp that does not match the
/// fixed pattern is shown verbatim rather than dropped.
fn capture_datetime(tree: &MetadataTagTree) -> Option<String> {
    let TagValue::Text(raw) = tree.get(Segment::Exif, tags::DATE_TIME_ORIGINAL)? else {
        return None;
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Some(
        match NaiveDateTime::parse_from_str(raw, "%Y:%m:%d %H:%M:%S") {
            Ok(stamp) => stamp.format("%d.%m.%Y %H:%M:%S").to_string(),
            Err(_) => raw.to_string(),
        },
    )
}

/// Joins the Make and Model tags into one device string, skipping the
/// duplicate when a vendor writes the same text into both.
fn device_name(tree: &MetadataTagTree) -> Option<String> {
    let text_of = |code: u16| match tree.get(Segment::Zeroth, code) {
        Some(TagValue::Text(text)) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    };

    match (text_of(tags::MAKE), text_of(tags::MODEL)) {
        (Some(make), Some(model)) if make == model => Some(make),
        (Some(make), Some(model)) => Some(format!("{make} {model}")),
        (Some(single), None) | (None, Some(single)) => Some(single),
        (None, None) => None,
    }
}
