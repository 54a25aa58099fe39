use chrono::{DateTime, FixedOffset};

/// Parsed route document: the single `<rte>` of a `<gpx>` file.
#[derive(Debug, Default)]
pub struct RouteDocument {
    pub route: Route,
}

/// A GPX route (<rte>).
#[derive(Debug, Default)]
pub struct Route {
    pub name: Option<String>,
    pub waypoints: Vec<Waypoint>,
}

/// A single route point (<rtept>), the unit that becomes one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub lat: f64,
    pub lon: f64,
    pub name: Option<String>,
    pub cmt: Option<String>,
    pub time: Option<DateTime<FixedOffset>>,
}

impl Waypoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            name: None,
            cmt: None,
            time: None,
        }
    }
}
