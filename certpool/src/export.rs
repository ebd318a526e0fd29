//! Writes certificates to individual PEM files.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use pem::ToPem;
use tracing::{debug, warn};

use crate::certificate::Certificate;
use crate::error::{Error, Result};
use crate::pool::Pool;

/// File name for a certificate with the given display name.
///
/// Every run of characters outside `[A-Za-z0-9.]` becomes a single `_`.
pub fn file_name(display_name: &str) -> String {
    let mut name = String::with_capacity(display_name.len() + 4);
    let mut in_run = false;
    for c in display_name.chars() {
        if c.is_ascii_alphanumeric() || c == '.' {
            name.push(c);
            in_run = false;
        } else if !in_run {
            name.push('_');
            in_run = true;
        }
    }
    name.push_str(".pem");
    name
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exported {
    Written(PathBuf),
    /// Expired and no directory for expired certificates was configured.
    Skipped,
}

#[derive(Debug)]
pub struct Exporter {
    output_dir: PathBuf,
    expired_dir: Option<PathBuf>,
    // path -> display name of the certificate written there
    written: HashMap<PathBuf, String>,
}

impl Exporter {
    /// Both directories must already exist.
    pub fn new(output_dir: impl Into<PathBuf>, expired_dir: Option<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        require_dir(&output_dir)?;
        if let Some(dir) = &expired_dir {
            require_dir(dir)?;
        }
        Ok(Self {
            output_dir,
            expired_dir,
            written: HashMap::new(),
        })
    }

    pub fn export(&mut self, cert: &Certificate, now: DateTime<Utc>) -> Result<Exported> {
        let dir = if cert.expired_at(now) {
            match &self.expired_dir {
                Some(dir) => dir,
                None => {
                    debug!(name = cert.display_name(), "expired certificate not exported");
                    return Ok(Exported::Skipped);
                }
            }
        } else {
            &self.output_dir
        };
        let path = dir.join(file_name(cert.display_name()));

        if let Some(previous) = self.written.get(&path) {
            warn!(
                path = %path.display(),
                previous = previous.as_str(),
                name = cert.display_name(),
                "file name collision, overwriting"
            );
        }

        let pem = cert.to_pem()?;
        fs::write(&path, format!("{pem}\n")).map_err(|e| Error::io(&path, e))?;
        debug!(path = %path.display(), "certificate written");

        self.written
            .insert(path.clone(), cert.display_name().to_string());
        Ok(Exported::Written(path))
    }

    /// Export every certificate of `pool` in pool order.
    pub fn export_all(&mut self, pool: &Pool, now: DateTime<Utc>) -> Result<Vec<Exported>> {
        pool.iter()
            .map(|(_, cert)| self.export(cert, now))
            .collect()
    }
}

fn require_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(Error::MissingDirectory(dir.to_path_buf()))
    }
}
