//! Parameter input and package descriptors.
//!
//! [`ParameterInput`] holds the `<block>` / `key = value` pairs read from
//! an input file (or set programmatically). Packages turn the raw strings
//! into typed [`StateDescriptor`] parameters once at initialisation; the
//! task builder reads them per block through [`Packages`].
//!
//! ```text
//! <hydro>
//! eos = adiabatic     # required
//! cfl = 0.4           # desired
//! use_scratch = true
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::ConfigError;
use crate::Real;

// ── ParameterInput ────────────────────────────────────────────────

/// Raw parameter input grouped by block name.
///
/// Block and key order follows insertion order so that dumps are stable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterInput {
    blocks: IndexMap<String, IndexMap<String, String>>,
}

impl ParameterInput {
    /// Create an empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the `<block>` / `key = value` input format.
    ///
    /// `#` starts a comment. Blank lines are ignored. A key outside any
    /// block, an unterminated block header, or a line without `=` is a
    /// [`ConfigError::Parse`].
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut input = Self::new();
        let mut current: Option<String> = None;
        for (n, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if let Some(rest) = line.strip_prefix('<') {
                let name = rest.strip_suffix('>').ok_or_else(|| ConfigError::Parse {
                    line: n + 1,
                    reason: format!("unterminated block header '{line}'"),
                })?;
                let name = name.trim();
                if name.is_empty() {
                    return Err(ConfigError::Parse {
                        line: n + 1,
                        reason: "empty block name".into(),
                    });
                }
                input.blocks.entry(name.to_string()).or_default();
                current = Some(name.to_string());
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::Parse {
                line: n + 1,
                reason: format!("expected 'key = value', got '{line}'"),
            })?;
            let block = current.as_deref().ok_or_else(|| ConfigError::Parse {
                line: n + 1,
                reason: format!("key '{}' appears before any <block>", key.trim()),
            })?;
            input.set(block, key.trim(), value.trim());
        }
        Ok(input)
    }

    /// Set (or overwrite) a parameter.
    pub fn set(&mut self, block: &str, key: &str, value: impl fmt::Display) -> &mut Self {
        self.blocks
            .entry(block.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, block: &str, key: &str, value: impl fmt::Display) -> Self {
        self.set(block, key, value);
        self
    }

    /// Raw string value, if present.
    pub fn get(&self, block: &str, key: &str) -> Option<&str> {
        self.blocks
            .get(block)
            .and_then(|b| b.get(key))
            .map(String::as_str)
    }

    /// Whether `<block>/key` is present.
    pub fn contains(&self, block: &str, key: &str) -> bool {
        self.get(block, key).is_some()
    }

    /// Fail if a parameter the caller cannot run without is absent.
    pub fn check_required(&self, block: &str, key: &str) -> Result<(), ConfigError> {
        if self.contains(block, key) {
            Ok(())
        } else {
            Err(ConfigError::MissingRequired {
                block: block.to_string(),
                key: key.to_string(),
            })
        }
    }

    /// Warn if a parameter that should be set explicitly is absent.
    ///
    /// Returns whether the parameter is present.
    pub fn check_desired(&self, block: &str, key: &str) -> bool {
        let present = self.contains(block, key);
        if !present {
            tracing::warn!(block, key, "desired parameter not set, using default");
        }
        present
    }

    /// Parse `<block>/key` as `T`, or return `default` when absent.
    pub fn get_or<T>(&self, block: &str, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(block, key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
                block: block.to_string(),
                key: key.to_string(),
                value: raw.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Parse a required `<block>/key` as `T`.
    pub fn get_required<T>(&self, block: &str, key: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.check_required(block, key)?;
        let raw = self.get(block, key).unwrap_or_default();
        raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            block: block.to_string(),
            key: key.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
    }

    /// Real-valued parameter with a default.
    pub fn get_real_or(&self, block: &str, key: &str, default: Real) -> Result<Real, ConfigError> {
        self.get_or(block, key, default)
    }

    /// Boolean parameter with a default. Accepts `true/false`, `yes/no`, `1/0`.
    pub fn get_bool_or(&self, block: &str, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.get(block, key) {
            None => Ok(default),
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(true),
                "false" | "no" | "0" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    block: block.to_string(),
                    key: key.to_string(),
                    value: raw.to_string(),
                    reason: "expected a boolean".into(),
                }),
            },
        }
    }

    /// Block names in input order.
    pub fn block_names(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }
}

// ── Packages ──────────────────────────────────────────────────────

/// A typed package parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Real number.
    Real(Real),
    /// Free-form string.
    Str(String),
}

/// Typed parameters of one physics package (e.g. `"Hydro"`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateDescriptor {
    label: String,
    params: IndexMap<String, ParamValue>,
}

impl StateDescriptor {
    /// Create an empty descriptor.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            params: IndexMap::new(),
        }
    }

    /// Package label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Add or replace a parameter.
    pub fn add_param(&mut self, key: impl Into<String>, value: ParamValue) {
        self.params.insert(key.into(), value);
    }

    /// Raw parameter lookup.
    pub fn param(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    /// Boolean parameter, `None` if absent or not a boolean.
    pub fn param_bool(&self, key: &str) -> Option<bool> {
        match self.params.get(key) {
            Some(ParamValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Real parameter, `None` if absent or not numeric.
    pub fn param_real(&self, key: &str) -> Option<Real> {
        match self.params.get(key) {
            Some(ParamValue::Real(r)) => Some(*r),
            Some(ParamValue::Int(i)) => Some(*i as Real),
            _ => None,
        }
    }

    /// String parameter, `None` if absent or not a string.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        match self.params.get(key) {
            Some(ParamValue::Str(s)) => Some(s),
            _ => None,
        }
    }
}

/// Package table shared by every block of a mesh.
#[derive(Clone, Debug, Default)]
pub struct Packages {
    packages: IndexMap<String, Arc<StateDescriptor>>,
}

impl Packages {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a package under its label.
    pub fn add(&mut self, descriptor: StateDescriptor) {
        self.packages
            .insert(descriptor.label().to_string(), Arc::new(descriptor));
    }

    /// Look up a package by label.
    pub fn get(&self, label: &str) -> Option<&StateDescriptor> {
        self.packages.get(label).map(Arc::as_ref)
    }

    /// Number of registered packages.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether no packages are registered.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
