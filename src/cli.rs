use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::options::Identity;

/// Long flags that may also be written with a single dash (`-outdir msgs`).
const LONG_FLAGS: &[&str] = &[
    "outdir", "identity", "recipient", "station", "verbose", "quiet", "help", "version",
];

#[derive(Parser, Debug)]
#[command(
    name = "gpx2yotreps",
    version,
    about = "Convert GPX route points into YotReps position report messages"
)]
pub struct Cli {
    /// Directory to store email messages
    #[arg(long = "outdir", value_name = "DIR", default_value = "msgs")]
    pub outdir: PathBuf,

    /// JSON file with "recipient" and/or "stationId"
    #[arg(long = "identity", value_name = "FILE")]
    pub identity: Option<PathBuf>,

    /// Recipient mail address (overrides the identity file)
    #[arg(long = "recipient", value_name = "ADDR")]
    pub recipient: Option<String>,

    /// Station identifier (overrides the identity file)
    #[arg(long = "station", value_name = "ID")]
    pub station: Option<String>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// GPX route files, processed in the order given
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

impl Cli {
    /// Parse process arguments, accepting single-dash long flags.
    pub fn from_env() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    /// Defaults, then the identity file, then explicit flags.
    pub fn identity(&self) -> crate::Result<Identity> {
        let mut identity = match &self.identity {
            Some(path) => Identity::from_json_file(path)?,
            None => Identity::default(),
        };
        if let Some(recipient) = &self.recipient {
            identity.recipient = recipient.clone();
        }
        if let Some(station) = &self.station {
            identity.station_id = station.clone();
        }
        Ok(identity)
    }

    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Rewrite `-flag` / `-flag=value` into `--flag` / `--flag=value` for known
/// long flags. Everything after a bare `--` is left alone.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut passthrough = false;
    args.into_iter()
        .enumerate()
        .map(|(i, arg)| {
            if i == 0 || passthrough {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                passthrough = true;
                return arg;
            }
            match text.strip_prefix('-') {
                Some(rest) if !rest.starts_with('-') => {
                    let name = rest.split_once('=').map_or(rest, |(name, _)| name);
                    if LONG_FLAGS.contains(&name) {
                        OsString::from(format!("-{text}"))
                    } else {
                        arg
                    }
                }
                _ => arg,
            }
        })
        .collect()
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `level`.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gpx2yotreps={level}")));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init();
}

/// Convert every file named on the command line. Returns the message count.
pub fn run(cli: &Cli) -> anyhow::Result<u64> {
    let identity = cli.identity().context("failed to load station identity")?;
    let count = crate::convert_files(cli.files.as_slice(), &cli.outdir, identity)?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_single_dash_long_flags() {
        let normalized = normalize_args(args(&[
            "gpx2yotreps",
            "-outdir",
            "out",
            "-station=DK1AB",
            "-v",
            "--recipient",
            "x@example.org",
            "a.gpx",
            "--",
            "-outdir",
        ]));
        assert_eq!(
            normalized,
            args(&[
                "gpx2yotreps",
                "--outdir",
                "out",
                "--station=DK1AB",
                "-v",
                "--recipient",
                "x@example.org",
                "a.gpx",
                "--",
                "-outdir",
            ])
        );
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(args(&["gpx2yotreps"]));
        assert_eq!(cli.outdir, PathBuf::from("msgs"));
        assert!(cli.files.is_empty());
        assert_eq!(cli.log_level(), "info");
        assert_eq!(cli.identity().unwrap(), Identity::default());
    }

    #[test]
    fn test_files_keep_order() {
        let cli = Cli::parse_from(normalize_args(args(&[
            "gpx2yotreps",
            "-outdir",
            "reports",
            "b.gpx",
            "a.gpx",
        ])));
        assert_eq!(cli.outdir, PathBuf::from("reports"));
        assert_eq!(
            cli.files,
            vec![PathBuf::from("b.gpx"), PathBuf::from("a.gpx")]
        );
    }

    #[test]
    fn test_flags_override_identity() {
        let cli = Cli::parse_from(args(&[
            "gpx2yotreps",
            "--station",
            "DK1AB",
            "--recipient",
            "reports@example.org",
        ]));
        let identity = cli.identity().unwrap();
        assert_eq!(identity.station_id, "DK1AB");
        assert_eq!(identity.recipient, "reports@example.org");
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(Cli::parse_from(args(&["x", "-vv"])).log_level(), "trace");
        assert_eq!(Cli::parse_from(args(&["x", "-v"])).log_level(), "debug");
        assert_eq!(Cli::parse_from(args(&["x", "-q"])).log_level(), "error");
        assert!(Cli::try_parse_from(args(&["x", "-q", "-v"])).is_err());
    }
}
