//! Load engine settings from disk.

use std::{fs, path::Path};

use crate::{Error, Settings};

/// Load [`Settings`] from a `.json` or `.ron` file. Missing fields take defaults.
pub fn load_settings(path: &Path) -> Result<Settings, Error> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let text = fs::read_to_string(path).map_err(|e| Error::Read {
        path: Some(path.to_path_buf()),
        message: e.to_string(),
    })?;
    let parse_err = |message: String| Error::Parse {
        path: Some(path.to_path_buf()),
        message,
    };
    match ext.as_deref() {
        Some("json") => serde_json::from_str(&text).map_err(|e| parse_err(e.to_string())),
        Some("ron") => ron::from_str(&text).map_err(|e| parse_err(e.to_string())),
        _ => Err(Error::Read {
            path: Some(path.to_path_buf()),
            message: "Unsupported settings format (expected a .json or .ron file)".to_string(),
        }),
    }
}
