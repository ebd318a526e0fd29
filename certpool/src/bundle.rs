//! Bundle loader
//!
//! Reads a stream of PEM blocks into a [`Pool`], keeping stream order.

use std::path::Path;

use pem::{FromPem, Label};
use tracing::{debug, info, warn};

use crate::certificate::Certificate;
use crate::error::{Error, Result};
use crate::pool::{AddOutcome, Pool};

/// Load every certificate of `bytes` into a new pool.
pub fn load(bytes: &[u8]) -> Pool {
    let mut pool = Pool::new();
    load_into(&mut pool, bytes);
    pool
}

/// Append every certificate of `bytes` to `pool`.
///
/// Blocks with another label, blocks carrying encapsulated headers and
/// malformed PEM framing are skipped and not counted. A `CERTIFICATE` block
/// whose payload does not decode counts as a parse error.
pub fn load_into(pool: &mut Pool, bytes: &[u8]) {
    let text = String::from_utf8_lossy(bytes);
    let before = pool.total();

    for (index, block) in pem::blocks(&text).enumerate() {
        let block = match block {
            Ok(block) => block,
            Err(e) => {
                warn!(block = index, error = %e, "skipping malformed PEM block");
                continue;
            }
        };
        if block.label() != Label::Certificate {
            debug!(block = index, label = %block.label(), "skipping non-certificate block");
            continue;
        }
        if block.has_headers() {
            debug!(block = index, "skipping certificate block with headers");
            continue;
        }

        match Certificate::from_pem(&block) {
            Ok(cert) => {
                if let AddOutcome::Duplicate(existing) = pool.add_cert(cert) {
                    debug!(block = index, existing = existing.index(), "duplicate certificate");
                }
            }
            Err(e) => {
                warn!(block = index, error = %e, "skipping undecodable certificate");
                pool.record_parse_error();
            }
        }
    }

    info!(
        records = pool.total() - before,
        accepted = pool.len(),
        duplicates = pool.duplicates(),
        parse_errors = pool.parse_errors(),
        "bundle loaded"
    );
}

/// Load the bundle stored at `path`.
pub fn load_file(path: impl AsRef<Path>) -> Result<Pool> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    Ok(load(&bytes))
}
