//! Workspace-wide constants.

/// Separator joining nested keys when named values are flattened from JSON.
pub const DEFAULT_VALUE_SEPARATOR: &str = ".";

/// Environment variable naming a JSON file of named values, read by the demo.
pub const VALUES_FILE_ENV: &str = "WEFT_VALUES_FILE";
