//! Rendering of the decoded metadata subset as an ordered, human-readable
//! report. Render order is fixed: GPS, capture time, device, dimensions,
//! then format-specific ancillary entries.

use std::fmt;

use crate::metadata::PrivacySummary;
use crate::{ImageHandle, MetadataError};

/// The fixed reassurance line appended when no privacy-relevant metadata
/// (GPS, capture time, device) was found.
pub const NOTHING_FOUND_NOTE: &str = "No sensitive metadata was found in this image.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportCategory {
    Gps,
    CaptureDateTime,
    Device,
    Dimensions,
    Software,
    Source,
    /// A decode problem reported in place of the data it hid.
    Diagnostic,
    /// The [`NOTHING_FOUND_NOTE`] reassurance line.
    Note,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub category: ReportCategory,
    pub text: String,
}

/// Ordered sequence of report lines. Regenerated from the handle and tag
/// tree on every analysis; never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataReport {
    entries: Vec<ReportEntry>,
}

impl MetadataReport {
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    /// Text of the first entry in the given category.
    pub fn get(&self, category: ReportCategory) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.category == category)
            .map(|entry| entry.text.as_str())
    }

    /// Whether any privacy-relevant category made it into the report.
    pub fn has_sensitive_data(&self) -> bool {
        self.entries.iter().any(|entry| {
            matches!(
                entry.category,
                ReportCategory::Gps | ReportCategory::CaptureDateTime | ReportCategory::Device
            )
        })
    }

    fn push(&mut self, category: ReportCategory, text: impl Into<String>) {
        self.entries.push(ReportEntry {
            category,
            text: text.into(),
        });
    }
}

impl fmt::Display for MetadataReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, entry) in self.entries.iter().enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            f.write_str(&entry.text)?;
        }
        Ok(())
    }
}

/// Renders the report for a successfully decoded image.
pub fn render(handle: &ImageHandle, summary: &PrivacySummary) -> MetadataReport {
    let mut report = MetadataReport::default();

    for problem in &summary.diagnostics {
        report.push(
            ReportCategory::Diagnostic,
            format!("Metadata could not be fully read: {problem}"),
        );
    }
    if let Some(gps) = summary.gps {
        report.push(ReportCategory::Gps, format!("GPS coordinates: {gps}"));
    }
    if let Some(taken_at) = &summary.taken_at {
        report.push(
            ReportCategory::CaptureDateTime,
            format!("Capture date/time: {taken_at}"),
        );
    }
    if let Some(device) = &summary.device {
        report.push(ReportCategory::Device, format!("Device: {device}"));
    }

    push_shared_trailer(&mut report, handle);

    if !report.has_sensitive_data() && summary.diagnostics.is_empty() {
        report.push(ReportCategory::Note, NOTHING_FOUND_NOTE);
    }
    report
}

/// Renders the report when the metadata segment itself could not be decoded:
/// a single diagnostic line, followed by the fields that do not depend on
/// that segment.
pub fn render_decode_failure(handle: &ImageHandle, error: &MetadataError) -> MetadataReport {
    let mut report = MetadataReport::default();
    report.push(
        ReportCategory::Diagnostic,
        format!("Metadata could not be analyzed: {error}"),
    );
    push_shared_trailer(&mut report, handle);
    report
}

/// Lines of the raw tag listing: one per decoded tree entry, carrying the
/// dictionary name where one exists. A corrupt metadata segment degrades to
/// a single explanatory line, the same way [`render_decode_failure`] does
/// for the main report.
pub fn render_raw_tags(handle: &ImageHandle) -> Vec<String> {
    let tree = match crate::metadata::decode_tags(handle) {
        Ok(tree) => tree,
        Err(error) => return vec![format!("Raw EXIF tags unavailable: {error}")],
    };
    if tree.is_empty() {
        return vec!["No EXIF tags present.".to_string()];
    }

    let mut lines = vec!["Raw EXIF tags:".to_string()];
    for (segment, code, value) in tree.iter() {
        let name = crate::tags::lookup(segment, code)
            .map(|info| info.name)
            .unwrap_or("(unknown)");
        lines.push(format!("  {segment}/{code:#06x} {name} = {value}"));
    }
    lines
}

/// Dimensions come from the decoded pixels, not from metadata, so they are
/// always present. PNG ancillary text entries follow when available.
fn push_shared_trailer(report: &mut MetadataReport, handle: &ImageHandle) {
    report.push(
        ReportCategory::Dimensions,
        format!(
            "Image size: {}\u{d7}{} pixels",
            handle.width(),
            handle.height()
        ),
    );

    let ancillary = handle.ancillary();
    if let Some(software) = &ancillary.software {
        report.push(ReportCategory::Software, format!("Software: {software}"));
    }
    if let Some(source) = &ancillary.source {
        report.push(ReportCategory::Source, format!("Source: {source}"));
    }
}
