/// The current version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Schema version of the CLI's JSON output.
/// Bump when a field is renamed or removed.
pub const OUTPUT_SCHEMA_VERSION: u32 = 1;

#[must_use]
pub fn version_string() -> String {
    format!("esdev {VERSION}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string_contains_version() {
        let vs = version_string();
        assert!(vs.contains(VERSION));
        assert!(vs.starts_with("esdev "));
    }
}
