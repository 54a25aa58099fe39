//! Rendering of a waypoint into a YotReps position report mail.
//!
//! Every renderer here is a pure function of its input; times are always shown
//! in the offset the timestamp was recorded with.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};

use crate::gpx_types::Waypoint;
use crate::options::Identity;

/// One rendered report, numbered within the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub ordinal: u64,
    pub body: String,
}

impl Message {
    pub fn render(ordinal: u64, waypoint: &Waypoint, identity: &Identity) -> Self {
        Self {
            ordinal,
            body: render_message(waypoint, identity),
        }
    }

    /// File name without extension, as listed in the index.
    pub fn file_stem(&self, identity: &Identity) -> String {
        format!("{}_{}", self.ordinal, identity.station_id)
    }

    pub fn file_name(&self, identity: &Identity) -> String {
        format!("{}.msg", self.file_stem(identity))
    }
}

/// Render the full mail text for one waypoint.
pub fn render_message(waypoint: &Waypoint, identity: &Identity) -> String {
    let time = waypoint.time.unwrap_or_else(zero_time);
    format!(
        "To: {recipient}\n\
         Subject: YotReps: {subject}\n\
         Date: {date}\n\
         \n\
         AIRMAIL YOTREPS\n\
         IDENT: {station}\n\
         TIME: {time}\n\
         LATITUDE: {lat}\n\
         LONGITUDE: {lon}\n\
         COMMENT: {comment}\n",
        recipient = identity.recipient,
        subject = subject_time(&time),
        date = header_date(&time),
        station = identity.station_id,
        time = body_time(&time),
        lat = format_latitude(waypoint.lat),
        lon = format_longitude(waypoint.lon),
        comment = waypoint.cmt.as_deref().unwrap_or(""),
    )
}

/// `YYYY/MM/DD HH:MM:SS`
pub fn subject_time(time: &DateTime<FixedOffset>) -> String {
    time.format("%Y/%m/%d %H:%M:%S").to_string()
}

/// RFC 850 date for the `Date:` header, e.g. `Monday, 15-Jan-24 10:30:00 UTC`.
pub fn header_date(time: &DateTime<FixedOffset>) -> String {
    format!(
        "{} {}",
        time.format("%A, %d-%b-%y %H:%M:%S"),
        zone_abbreviation(time.offset())
    )
}

/// `YYYY/MM/DD HH:MM`
pub fn body_time(time: &DateTime<FixedOffset>) -> String {
    time.format("%Y/%m/%d %H:%M").to_string()
}

pub fn format_latitude(lat: f64) -> String {
    format_coordinate(lat, 'N', 'S')
}

pub fn format_longitude(lon: f64) -> String {
    format_coordinate(lon, 'E', 'W')
}

/// `{degrees}-{minutes:.2}{hemisphere}` from the magnitude of `value`.
/// Minutes that round up to 60.00 carry into the next degree.
fn format_coordinate(value: f64, positive: char, negative: char) -> String {
    let hemisphere = if value < 0.0 { negative } else { positive };
    let magnitude = value.abs();
    let mut degrees = magnitude.trunc() as u32;
    let mut minutes = format!("{:.2}", (magnitude - magnitude.trunc()) * 60.0);
    if minutes == "60.00" {
        degrees += 1;
        minutes = "0.00".to_string();
    }
    format!("{degrees}-{minutes}{hemisphere}")
}

fn zone_abbreviation(offset: &FixedOffset) -> String {
    let seconds = offset.local_minus_utc();
    if seconds == 0 {
        return "UTC".to_string();
    }
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.abs() / 60;
    format!("{sign}{:02}{:02}", minutes / 60, minutes % 60)
}

/// Timestamp shown for points that carry no `<time>`: 0001-01-01T00:00:00Z.
fn zero_time() -> DateTime<FixedOffset> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN)
        .and_utc()
        .fixed_offset()
}
