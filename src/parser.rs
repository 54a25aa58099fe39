use std::fs;
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use crate::error::{Error, ParseError};
use crate::gpx_types::*;

type Result<T> = std::result::Result<T, ParseError>;

/// Read and decode the route file at `path`, returning its points in document order.
///
/// The whole file is decoded before anything is returned; a failure anywhere
/// yields no waypoints at all.
pub fn parse_file(path: &Path) -> crate::error::Result<Vec<Waypoint>> {
    let xml = fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = parse_route_document(&xml).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        path = %path.display(),
        route = doc.route.name.as_deref().unwrap_or(""),
        points = doc.route.waypoints.len(),
        "decoded route"
    );
    Ok(doc.route.waypoints)
}

/// Decode a GPX string into a RouteDocument.
///
/// Only `<rte>` children of the `<gpx>` root are read. Anything after the
/// root element closes is ignored.
pub fn parse_route_document(xml: &str) -> Result<RouteDocument> {
    let mut reader = Reader::from_str(xml);
    let mut doc = RouteDocument::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                expect_gpx_root(&e)?;
                parse_gpx_body(&mut reader, &mut doc)?;
                return Ok(doc);
            }
            Event::Empty(e) => {
                expect_gpx_root(&e)?;
                return Ok(doc);
            }
            Event::Eof => return Err(ParseError::MissingRoot),
            _ => {}
        }
    }
}

fn expect_gpx_root(e: &BytesStart<'_>) -> Result<()> {
    if e.local_name().as_ref() == b"gpx" {
        Ok(())
    } else {
        Err(ParseError::UnexpectedRoot {
            found: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
        })
    }
}

/// Walk the children of <gpx>, collecting every <rte> into the single route.
fn parse_gpx_body<'a>(reader: &mut Reader<&'a [u8]>, doc: &mut RouteDocument) -> Result<()> {
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"rte" => parse_route(reader, &mut doc.route)?,
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::End(_) => return Ok(()),
            Event::Eof => return Err(ParseError::UnexpectedEof { element: "gpx" }),
            _ => {}
        }
    }
}

/// Parse a <rte> element. Points are appended to `route`, so a document with
/// several routes yields one concatenated sequence.
fn parse_route<'a>(reader: &mut Reader<&'a [u8]>, route: &mut Route) -> Result<()> {
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"name" => route.name = Some(read_text(reader, "name")?),
                b"rtept" => route.waypoints.push(parse_point(&e, reader)?),
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"name" => route.name = Some(String::new()),
                b"rtept" => {
                    let (lat, lon) = parse_lat_lon(&e)?;
                    route.waypoints.push(Waypoint::new(lat, lon));
                }
                _ => {}
            },
            Event::End(_) => return Ok(()),
            Event::Eof => return Err(ParseError::UnexpectedEof { element: "rte" }),
            _ => {}
        }
    }
}

/// Parse a <rtept> element and its children.
/// Called after receiving Event::Start for the point element.
fn parse_point<'a>(start: &BytesStart<'a>, reader: &mut Reader<&'a [u8]>) -> Result<Waypoint> {
    let (lat, lon) = parse_lat_lon(start)?;
    let mut point = Waypoint::new(lat, lon);

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"name" => point.name = Some(read_text(reader, "name")?),
                b"cmt" => point.cmt = Some(read_text(reader, "cmt")?),
                b"time" => point.time = Some(parse_timestamp(&read_text(reader, "time")?)?),
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"name" => point.name = Some(String::new()),
                b"cmt" => point.cmt = Some(String::new()),
                b"time" => point.time = Some(parse_timestamp("")?),
                _ => {}
            },
            Event::End(_) => return Ok(point),
            Event::Eof => return Err(ParseError::UnexpectedEof { element: "rtept" }),
            _ => {}
        }
    }
}

/// Parse the required lat/lon attributes of a point's start tag.
fn parse_lat_lon(e: &BytesStart<'_>) -> Result<(f64, f64)> {
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        match attr.key.local_name().as_ref() {
            b"lat" => lat = Some(parse_coordinate(&attr.value, "lat", 90.0)?),
            b"lon" => lon = Some(parse_coordinate(&attr.value, "lon", 180.0)?),
            _ => {}
        }
    }

    let lat = lat.ok_or(ParseError::MissingAttribute {
        element: "rtept",
        attribute: "lat",
    })?;
    let lon = lon.ok_or(ParseError::MissingAttribute {
        element: "rtept",
        attribute: "lon",
    })?;

    Ok((lat, lon))
}

fn parse_coordinate(raw: &[u8], attribute: &'static str, limit: f64) -> Result<f64> {
    let text = std::str::from_utf8(raw)?;
    let value = text
        .trim()
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidAttribute {
            element: "rtept",
            attribute,
            value: text.to_string(),
        })?;
    if !value.is_finite() || value.abs() > limit {
        return Err(ParseError::OutOfRange {
            attribute,
            value,
            limit,
        });
    }
    Ok(value)
}

fn parse_timestamp(text: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(text.trim()).map_err(|source| ParseError::InvalidTimestamp {
        value: text.to_string(),
        source,
    })
}

/// Collect the character data of the element just opened.
/// Resolves CDATA sections and entity references, and normalizes line endings
/// to `\n`. Nested elements are skipped; undefined entities are an error.
fn read_text<'a>(reader: &mut Reader<&'a [u8]>, element: &'static str) -> Result<String> {
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Text(e) => push_normalized(&mut text, std::str::from_utf8(e.as_ref())?),
            Event::CData(e) => push_normalized(&mut text, std::str::from_utf8(e.as_ref())?),
            Event::GeneralRef(e) => {
                if let Some(ch) = e.resolve_char_ref()? {
                    text.push(ch);
                } else {
                    match std::str::from_utf8(e.as_ref())? {
                        "amp" => text.push('&'),
                        "lt" => text.push('<'),
                        "gt" => text.push('>'),
                        "quot" => text.push('"'),
                        "apos" => text.push('\''),
                        name => {
                            return Err(ParseError::UnknownEntity {
                                name: name.to_string(),
                            });
                        }
                    }
                }
            }
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(_) => return Ok(text),
            Event::Eof => return Err(ParseError::UnexpectedEof { element }),
            _ => {}
        }
    }
}

/// Append `raw` with `\r\n` and lone `\r` turned into `\n`.
fn push_normalized(text: &mut String, raw: &str) {
    if raw.contains('\r') {
        text.push_str(&raw.replace("\r\n", "\n").replace('\r', "\n"));
    } else {
        text.push_str(raw);
    }
}
