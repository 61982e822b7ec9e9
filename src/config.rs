//! Configuration document loading and block parsing
//!
//! The document is a YAML mapping from block name (resource type) to a
//! sequence of items. Structure is validated fully at load time so a
//! malformed document aborts the run before any command is issued.

use std::fs;
use std::path::Path;

use log::{error, warn};
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};
use crate::resource::{mapper, CommandSpec, ResourceType};

/// A loaded, structurally validated configuration document.
#[derive(Debug)]
pub struct Document {
    root: Mapping,
}

impl Document {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::ConfigParse(format!("could not read {}: {e}", path.display())))?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigParse(e.to_string()))?;
        let root = match value {
            Value::Mapping(root) => root,
            Value::Null => Mapping::new(),
            _ => {
                return Err(Error::ConfigParse(
                    "top level must be a mapping of block name to items".to_string(),
                ))
            }
        };

        for (block, items) in &root {
            let block = block.as_str().unwrap_or_default();
            let Some(items) = items.as_sequence() else {
                return Err(Error::ConfigParse(format!(
                    "block `{block}` must be a sequence of items"
                )));
            };
            if items.iter().any(|item| !item.is_mapping()) {
                return Err(Error::ConfigParse(format!(
                    "block `{block}` contains a non-mapping item"
                )));
            }
        }
        Ok(Self { root })
    }

    /// Block names present in the document, in document order.
    pub fn block_names(&self) -> Vec<String> {
        self.root
            .keys()
            .filter_map(Value::as_str)
            .map(ToString::to_string)
            .collect()
    }

    /// Map every item under the named block into command specs, preserving
    /// item order. An absent block yields a single bare spec, declaring
    /// "run this subcommand with no arguments". Items whose mapping fails
    /// are reported and skipped; the rest of the block still runs.
    pub fn parse_block(&self, resource_type: &ResourceType) -> Vec<CommandSpec> {
        let Some(items) = self
            .root
            .get(resource_type.as_str())
            .and_then(Value::as_sequence)
        else {
            warn!("no arguments supplied for `{resource_type}`");
            return vec![CommandSpec::default()];
        };

        let mut specs = Vec::with_capacity(items.len());
        for item in items {
            // Validated as a mapping at load time.
            let Some(item) = item.as_mapping() else { continue };
            let mut item = item.clone();
            let overwrite = item
                .remove("overwrite")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);

            match mapper::map(resource_type, &item) {
                Ok(mut spec) => {
                    spec.overwrite = overwrite;
                    specs.push(spec);
                }
                Err(e) => error!("skipping {resource_type} item: {e}"),
            }
        }
        specs
    }
}
