//! Host platform utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::env;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Environment variable pointing at the root of the software tree, which
/// contains the `params` and `sessions` directories.
pub const SW_ROOT_ENV_VAR: &str = "HWY_PLANNER_SW_ROOT";

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the root directory of the software tree.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}

/// Resolve a path relative to the software root.
///
/// Absolute paths are returned unchanged.
pub fn resolve_sw_path(path: &str) -> Result<PathBuf, env::VarError> {
    let path_buf = PathBuf::from(path);

    if path_buf.is_absolute() {
        return Ok(path_buf);
    }

    let mut root = get_sw_root()?;
    root.push(path_buf);
    Ok(root)
}

/// Get a short description of the host this executable is running on.
pub fn get_host_info() -> String {
    format!(
        "{} ({}), {} v{}",
        env::consts::OS,
        env::consts::ARCH,
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_absolute_path_unchanged() {
        let p = resolve_sw_path("/tmp/highway_map.csv").unwrap();
        assert_eq!(p, PathBuf::from("/tmp/highway_map.csv"));
    }
}
