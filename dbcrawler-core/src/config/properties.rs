//! Layered string-keyed configuration.
//!
//! Three layers are merged in order (defaults, vendor pack, user overrides);
//! the later layer wins on a key collision. The defaults and vendor layers
//! ship with the crate next to the SQL resource packs. Values may contain `${var}`
//! placeholders which are resolved against the merged bag and, at the lowest
//! priority, the process environment.

use crate::resources::Vendor;
use crate::template::substitute_with_pool;
use crate::{Result, error::DbCrawlerError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const DEFAULT_PROPERTIES: &str = include_str!("../../sql/defaults.toml");

/// Source layer of a property, lowest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PropertyLayer {
    /// Built-in defaults
    Defaults,
    /// Defaults shipped with the vendor pack
    Vendor,
    /// Configuration file and command line
    User,
}

/// Flat property bag assembled from layered sources.
#[derive(Debug, Clone, Default)]
pub struct PropertyBag {
    layers: BTreeMap<PropertyLayer, BTreeMap<String, String>>,
}

impl PropertyBag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bag with the built-in defaults layer loaded.
    pub fn with_defaults() -> Result<Self> {
        let mut bag = Self::new();
        bag.load_toml(PropertyLayer::Defaults, DEFAULT_PROPERTIES)?;
        Ok(bag)
    }

    /// Loads the property defaults of `vendor` into the vendor layer,
    /// replacing any vendor defaults loaded before.
    pub fn load_vendor_defaults(&mut self, vendor: Vendor) -> Result<()> {
        self.layers.remove(&PropertyLayer::Vendor);
        match vendor.default_properties() {
            Some(document) => self.load_toml(PropertyLayer::Vendor, document),
            None => Ok(()),
        }
    }

    /// Sets one property in `layer`.
    pub fn set(&mut self, layer: PropertyLayer, key: impl Into<String>, value: impl Into<String>) {
        self.layers
            .entry(layer)
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Builder form of [`PropertyBag::set`].
    pub fn with(mut self, layer: PropertyLayer, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(layer, key, value);
        self
    }

    /// Adds many properties to `layer`.
    pub fn extend_layer<I, K, V>(&mut self, layer: PropertyLayer, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let target = self.layers.entry(layer).or_default();
        for (key, value) in entries {
            target.insert(key.into(), value.into());
        }
    }

    /// Loads a TOML document into `layer`.
    ///
    /// Nested tables become dotted keys, so `[connection] url = "..."` is
    /// stored as `connection.url`. Arrays are joined with commas.
    ///
    /// # Errors
    /// Returns a configuration error if the document is not valid TOML.
    pub fn load_toml(&mut self, layer: PropertyLayer, document: &str) -> Result<()> {
        let table: toml::Table = toml::from_str(document)
            .map_err(|e| DbCrawlerError::config(format!("Invalid TOML configuration: {}", e)))?;
        let mut flat = BTreeMap::new();
        flatten_table("", &table, &mut flat);
        self.extend_layer(layer, flat);
        Ok(())
    }

    /// Reads and loads a TOML file into `layer`.
    pub fn load_toml_file(&mut self, layer: PropertyLayer, path: &Path) -> Result<()> {
        let document = std::fs::read_to_string(path).map_err(|e| DbCrawlerError::Io {
            context: format!("Failed to read configuration {}", path.display()),
            source: e,
        })?;
        self.load_toml(layer, &document)
    }

    /// Raw (unsubstituted) value from the highest layer that has `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.layers
            .values()
            .rev()
            .find_map(|layer| layer.get(key))
            .map(String::as_str)
    }

    /// Which layer supplied the effective value of `key`.
    pub fn provenance(&self, key: &str) -> Option<PropertyLayer> {
        self.layers
            .iter()
            .rev()
            .find(|(_, entries)| entries.contains_key(key))
            .map(|(layer, _)| *layer)
    }

    /// All layers merged, later layers winning.
    pub fn merged(&self) -> BTreeMap<String, String> {
        let mut merged = BTreeMap::new();
        for entries in self.layers.values() {
            merged.extend(entries.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }

    /// Merged properties with `${var}` substitution applied.
    ///
    /// Environment variables are available as the lowest-priority pool.
    pub fn resolved(&self) -> BTreeMap<String, String> {
        let environment: BTreeMap<String, String> = std::env::vars().collect();
        self.resolved_with(&environment)
    }

    /// Merged properties substituted against `pool` and the bag itself.
    pub fn resolved_with(&self, pool: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        substitute_with_pool(&self.merged(), pool)
    }

    /// Resolved properties under `prefix.`, with the prefix removed.
    pub fn section(&self, prefix: &str) -> BTreeMap<String, String> {
        let wanted = format!("{}.", prefix);
        self.resolved()
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(&wanted)
                    .map(|rest| (rest.to_string(), value))
            })
            .collect()
    }
}

fn flatten_table(prefix: &str, table: &toml::Table, out: &mut BTreeMap<String, String>) {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            toml::Value::Table(nested) => flatten_table(&full_key, nested, out),
            other => {
                out.insert(full_key, scalar_to_string(other));
            }
        }
    }
}

fn scalar_to_string(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(d) => d.to_string(),
        toml::Value::Array(items) => items
            .iter()
            .map(scalar_to_string)
            .collect::<Vec<_>>()
            .join(","),
        toml::Value::Table(_) => String::new(),
    }
}
