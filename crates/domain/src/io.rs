use serde::{Deserialize, Serialize};

use crate::error::DomainError;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Yaml,
}

/// Serializes a read-only snapshot for inspection. Nothing reads these back.
pub fn export_snapshot<T: Serialize>(
    value: &T,
    format: ExportFormat,
) -> Result<Vec<u8>, DomainError> {
    match format {
        ExportFormat::Json => serde_json::to_vec_pretty(value)
            .map_err(|err| DomainError::Serialization(err.to_string())),
        ExportFormat::Yaml => serde_yaml::to_string(value)
            .map(String::into_bytes)
            .map_err(|err| DomainError::Serialization(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::IntervalCatalog;

    #[test]
    fn exports_json() {
        let catalog = IntervalCatalog::standard().unwrap();
        let bytes = export_snapshot(&catalog, ExportFormat::Json).unwrap();
        let output = String::from_utf8(bytes).unwrap();
        assert!(output.contains("\"name\": \"Tritone\""));
        assert!(output.contains("\"D#4\""));
    }

    #[test]
    fn exports_yaml() {
        let catalog = IntervalCatalog::standard().unwrap();
        let bytes = export_snapshot(&catalog, ExportFormat::Yaml).unwrap();
        let output = String::from_utf8(bytes).unwrap();
        assert!(output.contains("name: Octave"));
    }
}
