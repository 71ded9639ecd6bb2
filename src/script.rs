use std::path::Path;

use crate::error::SqlGateError;

/// Read a whole SQL script into memory.
///
/// # Errors
/// Returns [`SqlGateError::ScriptIoError`] with the offending path if the file cannot be read.
pub fn read_script(path: impl AsRef<Path>) -> Result<String, SqlGateError> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|source| SqlGateError::ScriptIoError {
        path: path.to_path_buf(),
        source,
    })
}
