//! Static dictionary of the EXIF tag identifiers the engine understands.
//!
//! Keeping the numeric codes and their display names in one table means the
//! decoder and the raw dump never carry magic constants, and adding a tag is
//! a one-line change here.

use crate::metadata::Segment;

// 0th image file directory
pub const MAKE: u16 = 0x010f;
pub const MODEL: u16 = 0x0110;
pub const ORIENTATION: u16 = 0x0112;
pub const SOFTWARE: u16 = 0x0131;
pub const DATE_TIME: u16 = 0x0132;

// Exif sub-directory
pub const DATE_TIME_ORIGINAL: u16 = 0x9003;
pub const DATE_TIME_DIGITIZED: u16 = 0x9004;

// GPS sub-directory
pub const GPS_VERSION_ID: u16 = 0x0000;
pub const GPS_LATITUDE_REF: u16 = 0x0001;
pub const GPS_LATITUDE: u16 = 0x0002;
pub const GPS_LONGITUDE_REF: u16 = 0x0003;
pub const GPS_LONGITUDE: u16 = 0x0004;
pub const GPS_ALTITUDE_REF: u16 = 0x0005;
pub const GPS_ALTITUDE: u16 = 0x0006;

#[derive(Debug, Clone, Copy)]
pub struct TagInfo {
    pub segment: Segment,
    pub code: u16,
    pub name: &'static str,
}

#[rustfmt::skip]
pub const KNOWN_TAGS: &[TagInfo] = &[
    TagInfo { segment: Segment::Zeroth, code: MAKE,                name: "Make" },
    TagInfo { segment: Segment::Zeroth, code: MODEL,               name: "Model" },
    TagInfo { segment: Segment::Zeroth, code: ORIENTATION,         name: "Orientation" },
    TagInfo { segment: Segment::Zeroth, code: SOFTWARE,            name: "Software" },
    TagInfo { segment: Segment::Zeroth, code: DATE_TIME,           name: "DateTime" },
    TagInfo { segment: Segment::Exif,   code: DATE_TIME_ORIGINAL,  name: "DateTimeOriginal" },
    TagInfo { segment: Segment::Exif,   code: DATE_TIME_DIGITIZED, name: "DateTimeDigitized" },
    TagInfo { segment: Segment::Gps,    code: GPS_VERSION_ID,      name: "GPSVersionID" },
    TagInfo { segment: Segment::Gps,    code: GPS_LATITUDE_REF,    name: "GPSLatitudeRef" },
    TagInfo { segment: Segment::Gps,    code: GPS_LATITUDE,        name: "GPSLatitude" },
    TagInfo { segment: Segment::Gps,    code: GPS_LONGITUDE_REF,   name: "GPSLongitudeRef" },
    TagInfo { segment: Segment::Gps,    code: GPS_LONGITUDE,       name: "GPSLongitude" },
    TagInfo { segment: Segment::Gps,    code: GPS_ALTITUDE_REF,    name: "GPSAltitudeRef" },
    TagInfo { segment: Segment::Gps,    code: GPS_ALTITUDE,        name: "GPSAltitude" },
];

/// Looks up a tag in the dictionary. Unknown tags return `None`; they are
/// still carried in the tag tree, just without a friendly name.
pub fn lookup(segment: Segment, code: u16) -> Option<&'static TagInfo> {
    KNOWN_TAGS
        .iter()
        .find(|info| info.segment == segment && info.code == code)
}
