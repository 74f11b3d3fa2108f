//! Traits for serializing and deserializing types to/from files and strings.
//!
//! Every serde type gets JSON (de)serialization through [JsonFile]; settings, genomes and whole
//! populations are persisted with it.

use crate::error::NeatError;
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, io::ErrorKind, path::Path};

pub trait JsonFile: Serialize + DeserializeOwned {
    /// Serialize this value to a JSON string.
    fn to_string(&self) -> Result<String, NeatError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize this value from a JSON string.
    #[allow(clippy::should_implement_trait)]
    fn from_str(s: &str) -> Result<Self, NeatError> {
        serde_json::from_str(s).map_err(|op| op.into())
    }

    /// Serialize this value to a file at the given path.
    fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), NeatError> {
        fs::write(path, self.to_string()?)?;
        Ok(())
    }

    /// Deserialize this value from a file at the given path. A missing file is reported as
    /// [NeatError::NotFound], a file that fails to parse as [NeatError::Malformed].
    fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, NeatError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => NeatError::NotFound(path.to_path_buf()),
            _ => err.into(),
        })?;

        serde_json::from_str(&contents).map_err(|source| NeatError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl<T> JsonFile for T where T: Serialize + DeserializeOwned {}
