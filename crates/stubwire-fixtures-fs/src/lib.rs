// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filesystem-backed `FixtureStore` for stubwire (one JSON file per set).

use std::fs;
use std::path::{Path, PathBuf};
use stubwire_core::{FixtureError, FixtureStore};
use tracing::debug;

/// Environment variable naming the default fixture directory.
pub const FIXTURE_DIR_ENV: &str = "STUBWIRE_FIXTURE_DIR";

/// Store fixture sets as `<name>.json` files under a root directory.
pub struct FsFixtureStore {
    base: PathBuf,
}

impl FsFixtureStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, FixtureError> {
        let base = root.into();
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    /// Create a store rooted at `$STUBWIRE_FIXTURE_DIR`.
    pub fn from_env() -> Result<Self, FixtureError> {
        let root = std::env::var_os(FIXTURE_DIR_ENV)
            .ok_or_else(|| FixtureError::Other(format!("{FIXTURE_DIR_ENV} is not set")))?;
        Self::new(root)
    }

    /// Root directory of this store.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn path_for(&self, name: &str) -> PathBuf {
        let filename = format!("{name}.json");
        self.base.join(filename)
    }
}

impl FixtureStore for FsFixtureStore {
    fn load_raw(&self, name: &str) -> Result<Vec<u8>, FixtureError> {
        let path = self.path_for(name);
        debug!(path = %path.display(), "loading fixture");
        match fs::read(path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(FixtureError::NotFound),
            Err(err) => Err(FixtureError::Io(err)),
        }
    }

    fn save_raw(&self, name: &str, data: &[u8]) -> Result<(), FixtureError> {
        let path = self.path_for(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!(path = %path.display(), bytes = data.len(), "saving fixture");
        fs::write(path, data)?;
        Ok(())
    }
}
