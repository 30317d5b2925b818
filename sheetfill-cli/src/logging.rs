//! Logger setup: `<timestamp> | <LEVEL> | <message>` to stderr and, for
//! update runs, a log file in the output directory.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use env_logger::{Builder, Target};
use log::LevelFilter;

/// Writes every buffer to both sinks
struct Tee<A, B> {
    first: A,
    second: B,
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.first.write_all(buf)?;
        self.second.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.first.flush()?;
        self.second.flush()
    }
}

/// Install the global logger
///
/// Level defaults to `info`; `RUST_LOG` overrides it.
pub fn init(log_file: Option<&Path>) -> Result<()> {
    let mut builder = Builder::new();
    builder
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} | {} | {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        });

    if let Some(path) = log_file {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;

        builder.target(Target::Pipe(Box::new(Tee {
            first: io::stderr(),
            second: file,
        })));
    } else {
        builder.target(Target::Stderr);
    }

    builder.try_init().context("Logger already initialized")?;

    if let Some(path) = log_file {
        log::info!("Log file: {}", path.display());
    }
    Ok(())
}
