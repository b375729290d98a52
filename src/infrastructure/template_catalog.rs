//! Loads and hands out preset template documents.
//!
//! The catalog keeps each template twice: the parsed form the loader seeds
//! from, and the raw JSON value the load endpoint echoes back on a fresh
//! journey (the template and the just-seeded store are equivalent at that
//! instant, so re-serializing would only lose fidelity).

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::domain::errors::DomainError;
use crate::domain::template::TemplateDocument;

const BUILTIN_TEMPLATE: &str = include_str!("../../templates/core_journey.json");

#[derive(Debug, Clone)]
pub struct Template {
    pub raw: Value,
    pub document: TemplateDocument,
}

#[derive(Debug)]
pub struct TemplateCatalog {
    default: Template,
    by_preset: HashMap<String, Template>,
}

impl TemplateCatalog {
    /// Catalog backed only by the template compiled into the binary.
    pub fn builtin() -> Result<Self, DomainError> {
        Ok(Self {
            default: parse_template(BUILTIN_TEMPLATE, "builtin")?,
            by_preset: HashMap::new(),
        })
    }

    /// Catalog from a directory of `<preset>.json` files. `default.json`
    /// (when present) replaces the builtin fallback.
    pub fn from_dir(dir: &Path) -> Result<Self, DomainError> {
        let mut catalog = Self::builtin()?;

        let entries = std::fs::read_dir(dir).map_err(|err| {
            DomainError::internal(format!("cannot read template dir {}: {err}", dir.display()))
        })?;
        for entry in entries {
            let path = entry
                .map_err(|err| DomainError::internal(format!("template dir entry: {err}")))?
                .path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            let contents = std::fs::read_to_string(&path).map_err(|err| {
                DomainError::internal(format!("cannot read {}: {err}", path.display()))
            })?;
            let template = parse_template(&contents, stem)?;

            if stem == "default" {
                catalog.default = template;
            } else {
                catalog.by_preset.insert(stem.to_string(), template);
            }
        }

        info!(
            dir = %dir.display(),
            presets = catalog.by_preset.len(),
            "template catalog loaded"
        );
        Ok(catalog)
    }

    /// Template for the preset, falling back to the default document.
    pub fn select(&self, preset: Option<&str>) -> &Template {
        preset
            .and_then(|preset| self.by_preset.get(preset))
            .unwrap_or(&self.default)
    }
}

fn parse_template(contents: &str, name: &str) -> Result<Template, DomainError> {
    let raw: Value = serde_json::from_str(contents)
        .map_err(|err| DomainError::internal(format!("template '{name}' is not JSON: {err}")))?;
    let document: TemplateDocument = serde_json::from_value(raw.clone())
        .map_err(|err| DomainError::internal(format!("template '{name}' is malformed: {err}")))?;
    Ok(Template { raw, document })
}
