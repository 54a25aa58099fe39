//! Convert GPX route points into YotReps position report mails.
//!
//! Each `<rtept>` of each input file becomes one `{n}_{station}.msg` file in
//! the output directory, and one line in `MsgList.txt`. Numbering runs across
//! all inputs of a run.

pub mod cli;
pub mod emitter;
pub mod error;
pub mod formatter;
pub mod gpx_types;
pub mod options;
pub mod parser;

use std::path::Path;

use tracing::info;

pub use crate::emitter::{Emitter, INDEX_FILE_NAME, emit};
pub use crate::error::{Error, ParseError, Result};
pub use crate::formatter::{Message, render_message};
pub use crate::gpx_types::{Route, RouteDocument, Waypoint};
pub use crate::options::Identity;
pub use crate::parser::{parse_file, parse_route_document};

/// Parse each input in order and write its messages into `out_dir`.
///
/// Stops at the first failure. Messages and index lines already written stay
/// on disk.
pub fn convert_files<P: AsRef<Path>>(
    inputs: &[P],
    out_dir: &Path,
    identity: Identity,
) -> Result<u64> {
    identity.validate()?;
    let mut emitter = Emitter::create(out_dir, identity)?;

    for input in inputs {
        let input = input.as_ref();
        let waypoints = parse_file(input)?;
        info!(path = %input.display(), points = waypoints.len(), "converting route");
        emitter.emit_route(input, &waypoints)?;
    }

    let count = emitter.finish()?;
    info!("Wrote {count} message(s) to {}", out_dir.display());
    Ok(count)
}
