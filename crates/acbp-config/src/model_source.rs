//! Model documents in JSON, TOML or YAML.

use std::path::Path;

use acbp_core::ModelDeclaration;

use crate::ConfigError;

/// Document format of a model source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Json,
    Toml,
    Yaml,
}

impl ModelFormat {
    /// Picks the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(ModelFormat::Json),
            "toml" => Some(ModelFormat::Toml),
            "yaml" | "yml" => Some(ModelFormat::Yaml),
            _ => None,
        }
    }
}

/// Parsing entry points for model declarations.
///
/// ```
/// use acbp_config::{ModelDeclaration, ModelSource};
///
/// let decl = ModelDeclaration::from_yaml_str(r#"
/// name: clinic
/// bits: [booked, checked_in]
/// categories:
///   ward: [Medical, ICU]
/// rules:
///   - type: implies
///     when_bits: [checked_in]
///     require_bits: [booked]
/// "#).unwrap();
///
/// assert_eq!(decl.bits.len(), 2);
/// assert_eq!(decl.categories[0].name, "ward");
/// ```
pub trait ModelSource: Sized {
    fn from_json_str(s: &str) -> Result<Self, ConfigError>;

    fn from_toml_str(s: &str) -> Result<Self, ConfigError>;

    fn from_yaml_str(s: &str) -> Result<Self, ConfigError>;

    fn from_str_as(s: &str, format: ModelFormat) -> Result<Self, ConfigError> {
        match format {
            ModelFormat::Json => Self::from_json_str(s),
            ModelFormat::Toml => Self::from_toml_str(s),
            ModelFormat::Yaml => Self::from_yaml_str(s),
        }
    }

    /// Loads a model document, choosing the format by extension.
    ///
    /// # Errors
    ///
    /// Returns error if the extension is unknown, the file can't be read,
    /// or the document doesn't parse.
    fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ModelFormat::from_path(path).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "unrecognized model document extension: {}",
                path.display()
            ))
        })?;
        let contents = std::fs::read_to_string(path)?;
        Self::from_str_as(&contents, format)
    }
}

impl ModelSource for ModelDeclaration {
    fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }
}
