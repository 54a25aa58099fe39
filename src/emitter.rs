use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::formatter::Message;
use crate::gpx_types::Waypoint;
use crate::options::Identity;

/// Name of the run-wide index file inside the output directory.
pub const INDEX_FILE_NAME: &str = "MsgList.txt";

/// Writes one message file per waypoint plus the index listing them.
///
/// Owns the run's message counter, so numbering continues across every
/// route handed to the same emitter.
pub struct Emitter {
    out_dir: PathBuf,
    identity: Identity,
    index_path: PathBuf,
    index: BufWriter<File>,
    next_ordinal: u64,
}

impl Emitter {
    /// Create the output directory (and parents) and open a fresh index.
    pub fn create(out_dir: &Path, identity: Identity) -> Result<Self> {
        fs::create_dir_all(out_dir).map_err(|source| Error::io(out_dir, source))?;
        let index_path = out_dir.join(INDEX_FILE_NAME);
        let index = File::create(&index_path).map_err(|source| Error::io(&index_path, source))?;

        Ok(Self {
            out_dir: out_dir.to_path_buf(),
            identity,
            index_path,
            index: BufWriter::new(index),
            next_ordinal: 0,
        })
    }

    /// Number of messages written so far.
    pub fn count(&self) -> u64 {
        self.next_ordinal
    }

    /// Render and write one waypoint, then record it in the index.
    pub fn emit_waypoint(&mut self, source: &Path, waypoint: &Waypoint) -> Result<()> {
        let message = Message::render(self.next_ordinal, waypoint, &self.identity);
        let path = self.out_dir.join(message.file_name(&self.identity));
        write_message(&path, &message.body)?;

        let stem = message.file_stem(&self.identity);
        writeln!(self.index, "a;Posted;{stem};rest")
            .map_err(|source| Error::io(&self.index_path, source))?;

        debug!(
            source = %source.display(),
            message = %path.display(),
            "wrote message"
        );
        self.next_ordinal += 1;
        Ok(())
    }

    /// Emit every waypoint of one route in order. Returns how many were written.
    pub fn emit_route(&mut self, source: &Path, waypoints: &[Waypoint]) -> Result<u64> {
        for waypoint in waypoints {
            self.emit_waypoint(source, waypoint)?;
        }
        Ok(waypoints.len() as u64)
    }

    /// Flush and close the index, returning the total number of messages.
    pub fn finish(self) -> Result<u64> {
        let Self {
            index,
            index_path,
            next_ordinal,
            ..
        } = self;
        let file = index
            .into_inner()
            .map_err(|e| Error::io(&index_path, e.into_error()))?;
        file.sync_all()
            .map_err(|source| Error::io(&index_path, source))?;
        Ok(next_ordinal)
    }
}

fn write_message(path: &Path, body: &str) -> Result<()> {
    let mut file = File::create(path).map_err(|source| Error::io(path, source))?;
    file.write_all(body.as_bytes())
        .map_err(|source| Error::io(path, source))
}

/// Emit a sequence of `(source file, waypoint)` pairs into `out_dir`.
pub fn emit<'a, I>(waypoints: I, out_dir: &Path, identity: Identity) -> Result<u64>
where
    I: IntoIterator<Item = (&'a Path, &'a Waypoint)>,
{
    let mut emitter = Emitter::create(out_dir, identity)?;
    for (source, waypoint) in waypoints {
        emitter.emit_waypoint(source, waypoint)?;
    }
    emitter.finish()
}
