use anyhow::Result;
use std::collections::HashSet;
use std::path::Path;

/// Tracks which configuration fields are recognized
pub struct ConfigValidator {
    /// Set of valid configuration fields that are recognized by hashguard
    known_fields: HashSet<&'static str>,
}

impl ConfigValidator {
    /// Create a new validator with known configuration fields
    #[must_use]
    pub fn new() -> Self {
        let known_fields = [
            "scan.algorithm",
            "scan.follow_symlinks",
            "scan.ignore_patterns",
            "scan.parallel_threads",
            "scan.read_timeout",
            "storage.manifest_path",
        ]
        .into_iter()
        .collect();

        Self { known_fields }
    }

    /// Validate a configuration file and return human-readable warnings
    ///
    /// A missing file produces no warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub fn validate_config_file(&self, config_path: &Path) -> Result<Vec<String>> {
        if !config_path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(config_path)?;
        let parsed: toml::Value = toml::from_str(&content)?;

        let mut unknown_fields = Vec::new();
        self.check_table(&parsed, "", &mut unknown_fields);

        Ok(unknown_fields
            .into_iter()
            .map(|field| format!("Unknown configuration field: {field}"))
            .collect())
    }

    /// Recursively checks a TOML table for unknown fields
    ///
    /// # Arguments
    ///
    /// * `table` - The TOML value to validate (expected to be a table)
    /// * `prefix` - The current path prefix (e.g., "scan")
    /// * `unknown` - Vector to collect unknown field paths
    fn check_table(&self, table: &toml::Value, prefix: &str, unknown: &mut Vec<String>) {
        let toml::Value::Table(map) = table else {
            return;
        };

        for (key, value) in map {
            let full_key = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };

            if self.known_fields.contains(full_key.as_str()) {
                continue;
            }

            if let toml::Value::Table(_) = value {
                // Section headers are only valid if some known field lives under them
                let section = format!("{full_key}.");
                if self.known_fields.iter().any(|f| f.starts_with(&section)) {
                    self.check_table(value, &full_key, unknown);
                } else {
                    unknown.push(full_key);
                }
            } else {
                unknown.push(full_key);
            }
        }
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}
