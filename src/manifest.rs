//! # Module Manifests
//!
//! Each module directory carries a manifest (`info.yaml`, `info.yml` or
//! `info.toml`) describing the metadata to inject into its script and the
//! external scripts it depends on:
//!
//! ```yaml
//! name: My Script
//! version: "1.0"          # version prefix
//! description: Does things
//! extra:
//!   grant: none
//!   description_en: English description
//! require:
//!   - https://example.com/lib.js
//! jquery: true
//! ```
//!
//! [`Manifest::into_parts`] turns the raw manifest into a [`BuildInfo`] (the
//! configured metadata plus its default table) and a [`Requires`] list.

use crate::config::Defaults;
use crate::defaults::{JQUERY_URL, MANIFEST_NAMES};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const NAME_KEY: &str = "@name";
pub const NAMESPACE_KEY: &str = "@namespace";
pub const DESCRIPTION_KEY: &str = "@description";
pub const AUTHOR_KEY: &str = "@author";

/// Keys that appear at most once in a built script.
pub const FIXED_KEYS: [&str; 5] = [
    NAME_KEY,
    NAMESPACE_KEY,
    crate::script::VERSION_KEY,
    DESCRIPTION_KEY,
    AUTHOR_KEY,
];

/// Raw manifest as written by the module author.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    /// Version prefix; the build appends a timestamp to it.
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    /// Additional metadata, in declaration order.
    #[serde(default)]
    pub extra: IndexMap<String, String>,
    #[serde(default)]
    pub require: Vec<String>,
    #[serde(default)]
    pub jquery: bool,
}

/// Normalise an extra metadata key: `description_en` becomes
/// `@description:en`.
pub fn normalize_key(key: &str) -> String {
    let key = if key.starts_with('@') {
        key.to_string()
    } else {
        format!("@{}", key)
    };
    key.replace('_', ":")
}

/// Configured metadata for one module.
///
/// `info` keeps the fixed fields first (name, namespace, version,
/// description, author) followed by the extras in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    info: IndexMap<String, String>,
    default_info: IndexMap<String, String>,
}

impl BuildInfo {
    /// Build info with the given fixed fields and empty defaults.
    pub fn new(
        name: &str,
        namespace: &str,
        version: &str,
        description: &str,
        author: &str,
    ) -> Self {
        let info = [
            (NAME_KEY, name),
            (NAMESPACE_KEY, namespace),
            (crate::script::VERSION_KEY, version),
            (DESCRIPTION_KEY, description),
            (AUTHOR_KEY, author),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self {
            info,
            default_info: IndexMap::new(),
        }
    }

    /// Add an extra metadata entry; the key is normalised.
    pub fn with_extra(mut self, key: &str, value: &str) -> Self {
        self.info.insert(normalize_key(key), value.to_string());
        self
    }

    /// Set a default-table entry.
    pub fn with_default(mut self, key: &str, value: &str) -> Self {
        self.default_info.insert(key.to_string(), value.to_string());
        self
    }

    /// Configured entries in insertion order.
    pub fn fields(&self) -> impl DoubleEndedIterator<Item = (&str, &str)> {
        self.info.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn default_for(&self, key: &str) -> Option<&str> {
        self.default_info.get(key).map(String::as_str)
    }

    /// The configured version prefix, possibly empty.
    pub fn version_prefix(&self) -> &str {
        self.info
            .get(crate::script::VERSION_KEY)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Look up `tag`, trying `tag:locale` first when a locale is given, then
    /// the configured value, then the default table.
    pub fn get(&self, tag: &str, locale: Option<&str>) -> String {
        if let Some(locale) = locale.filter(|l| !l.is_empty()) {
            let localized = self.get(&format!("{}:{}", tag, locale), None);
            if !localized.is_empty() {
                return localized;
            }
        }
        self.info
            .get(tag)
            .filter(|v| !v.is_empty())
            .or_else(|| self.default_info.get(tag).filter(|v| !v.is_empty()))
            .cloned()
            .unwrap_or_default()
    }
}

/// Ordered dependency URLs of a module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requires {
    urls: Vec<String>,
}

impl Requires {
    pub fn new(urls: Vec<String>) -> Self {
        Self { urls }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl Manifest {
    /// Parse a manifest; `.toml` files use TOML, everything else YAML.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        if path.extension().is_some_and(|e| e == "toml") {
            Ok(toml::from_str(content)?)
        } else if content.trim().is_empty() {
            Ok(Self::default())
        } else {
            Ok(serde_yaml::from_str(content)?)
        }
    }

    /// Split into configured metadata and dependency list.
    ///
    /// `module` seeds the default `@name`; `defaults` seeds the default
    /// namespace and author. Every dependency must be a valid URL.
    pub fn into_parts(self, module: &str, defaults: &Defaults) -> Result<(BuildInfo, Requires)> {
        let mut urls = Vec::with_capacity(self.require.len() + 1);
        if self.jquery {
            urls.push(JQUERY_URL.to_string());
        }
        for url in self.require {
            url::Url::parse(&url).map_err(|e| Error::ModuleConfig {
                module: module.to_string(),
                message: format!("invalid require URL '{}': {}", url, e),
            })?;
            urls.push(url);
        }

        let mut info = BuildInfo::new(
            &self.name,
            &self.namespace,
            &self.version,
            &self.description,
            &self.author,
        )
        .with_default(NAME_KEY, module)
        .with_default(NAMESPACE_KEY, &defaults.namespace)
        .with_default(AUTHOR_KEY, &defaults.author);
        for (key, value) in &self.extra {
            info = info.with_extra(key, value);
        }

        Ok((info, Requires::new(urls)))
    }
}

/// Find the manifest file of a module directory.
pub fn find_manifest(module_dir: &Path) -> Option<PathBuf> {
    MANIFEST_NAMES
        .iter()
        .map(|name| module_dir.join(name))
        .find(|p| p.is_file())
}

/// Locate, read and split the manifest of `module`.
pub fn load(module: &str, module_dir: &Path, defaults: &Defaults) -> Result<(BuildInfo, Requires)> {
    let path = find_manifest(module_dir).ok_or_else(|| Error::ModuleConfig {
        module: module.to_string(),
        message: format!(
            "missing build info: expected one of {} in {}",
            MANIFEST_NAMES.join(", "),
            module_dir.display()
        ),
    })?;
    log::debug!("Loading manifest {}", path.display());
    let content = std::fs::read_to_string(&path)?;
    let manifest = Manifest::parse(&content, &path).map_err(|e| Error::ModuleConfig {
        module: module.to_string(),
        message: format!("invalid {}: {}", path.display(), e),
    })?;
    manifest.into_parts(module, defaults)
}
