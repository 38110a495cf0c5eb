use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::Error;

/// One entry from the host list. Loaded once, never mutated afterwards;
/// shared as `Arc<HostRecord>` with worker threads.
#[derive(Debug, Clone, Deserialize)]
pub struct HostRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

impl HostRecord {
    /// `host:port` as passed to the dialer.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
struct HostsFile {
    #[serde(default)]
    hosts: Vec<HostRecord>,
}

/// Read and validate the host list document.
pub fn load(path: &Path) -> Result<Vec<Arc<HostRecord>>, Error> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("failed to read {}: {e}", path.display())))?;
    parse(&data)
}

/// Parse and validate a host list from JSON text.
pub fn parse(data: &str) -> Result<Vec<Arc<HostRecord>>, Error> {
    let file: HostsFile =
        serde_json::from_str(data).map_err(|e| Error::config(format!("invalid host list: {e}")))?;

    let mut seen = HashSet::new();
    for (i, host) in file.hosts.iter().enumerate() {
        validate(i, host)?;
        // Ids key the connection map; two entries sharing one would silently
        // alias onto the same managed connection.
        if !seen.insert(host.id.as_str()) {
            return Err(Error::config(format!("duplicate host id '{}'", host.id)));
        }
    }

    Ok(file.hosts.into_iter().map(Arc::new).collect())
}

/// Every field is required; the error names the offending host and field so
/// the operator can fix the document without guessing.
fn validate(index: usize, host: &HostRecord) -> Result<(), Error> {
    if host.id.trim().is_empty() {
        return Err(Error::config(format!("host entry {index} is missing id")));
    }
    if host.name.trim().is_empty() {
        return Err(Error::config(format!("host '{}' is missing name", host.id)));
    }
    if host.host.trim().is_empty() {
        return Err(Error::config(format!("host '{}' is missing host address", host.id)));
    }
    if host.port == 0 {
        return Err(Error::config(format!("host '{}' has invalid port: 0", host.id)));
    }
    if host.user.trim().is_empty() {
        return Err(Error::config(format!("host '{}' is missing user", host.id)));
    }
    if host.password.trim().is_empty() {
        return Err(Error::config(format!("host '{}' is missing password", host.id)));
    }
    Ok(())
}
