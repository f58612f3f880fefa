use std::io::Cursor;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use exif::{In, Tag, Value};
use tracing::debug;

/// Reads the moment a photo was taken from its embedded metadata.
pub trait CaptureTimestampReader: Send + Sync {
    /// `None` when the image carries no usable timestamp, never an error.
    fn read_capture_timestamp(&self, image: &[u8]) -> Option<DateTime<Utc>>;
}

/// EXIF `DateTimeOriginal`, falling back to `DateTime`.
///
/// Camera timestamps usually have no zone; those are taken as UTC.
#[derive(Debug, Clone, Default)]
pub struct ExifTimestampReader;

impl ExifTimestampReader {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureTimestampReader for ExifTimestampReader {
    fn read_capture_timestamp(&self, image: &[u8]) -> Option<DateTime<Utc>> {
        let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(image)) {
            Ok(exif) => exif,
            Err(e) => {
                debug!("No EXIF data in upload: {}", e);
                return None;
            }
        };

        let field = exif
            .get_field(Tag::DateTimeOriginal, In::PRIMARY)
            .or_else(|| exif.get_field(Tag::DateTime, In::PRIMARY))?;

        match &field.value {
            Value::Ascii(values) => values.first().and_then(|raw| parse_exif_datetime(raw)),
            _ => None,
        }
    }
}

fn parse_exif_datetime(raw: &[u8]) -> Option<DateTime<Utc>> {
    let parsed = exif::DateTime::from_ascii(raw).ok()?;

    let naive = NaiveDate::from_ymd_opt(
        i32::from(parsed.year),
        u32::from(parsed.month),
        u32::from(parsed.day),
    )?
    .and_hms_opt(
        u32::from(parsed.hour),
        u32::from(parsed.minute),
        u32::from(parsed.second),
    )?;

    match parsed.offset {
        Some(minutes) => FixedOffset::east_opt(i32::from(minutes) * 60)?
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc)),
        None => Some(Utc.from_utc_datetime(&naive)),
    }
}
