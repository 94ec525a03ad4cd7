//! Configuration JSON parsing

use crate::{Config, Result, TemplateError};
use std::path::Path;
use tracing::debug;

/// Parse a configuration from a JSON string
pub fn parse_config(json: &str) -> Result<Config> {
    let config: Config =
        serde_json::from_str(json).map_err(|e| TemplateError::ParseError(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

/// Load a configuration file
///
/// # Arguments
/// * `path` - Path to the JSON configuration file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| TemplateError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    let config = parse_config(&json)?;
    debug!(
        path = %path.display(),
        presets = config.presets.len(),
        "loaded configuration"
    );
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.presets.is_empty() {
        return Err(TemplateError::Invalid(
            "at least one preset is required".to_string(),
        ));
    }
    if config.batch.workers == 0 {
        return Err(TemplateError::Invalid(
            "batch.workers must be at least 1".to_string(),
        ));
    }

    let layout = &config.pdf;
    let lengths = [
        ("paper_width", layout.paper_width),
        ("paper_height", layout.paper_height),
        ("badge_width", layout.badge_width),
    ];
    for (name, value) in lengths {
        if !(value.is_finite() && value > 0.0) {
            return Err(TemplateError::Invalid(format!(
                "pdf.{name} must be a positive length, got {value}"
            )));
        }
    }

    for (name, preset) in config.presets.iter() {
        for side in [&preset.front, &preset.back] {
            if side.name_char_limit == 0 {
                return Err(TemplateError::Invalid(format!(
                    "preset '{name}': name_char_limit must be at least 1"
                )));
            }
            if let Some(field) = side.fields.iter().find(|(_, f)| f.size <= 0.0) {
                return Err(TemplateError::Invalid(format!(
                    "preset '{name}': field '{}' has a non-positive font size",
                    field.0
                )));
            }
        }
    }

    Ok(())
}
