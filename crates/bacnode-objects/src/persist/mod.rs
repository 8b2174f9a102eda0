//! Configuration persistence.
//!
//! Objects never touch storage themselves: a successful write reports the
//! [`ConfigChange`]s it made and the device pushes them into a
//! [`ConfigStore`]. Stores are keyed UCI-style by package (`bacnet_ao`),
//! section (the instance number) and option.

pub mod uci;

pub use uci::UciStore;

use crate::ConfigError;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Single(String),
    List(Vec<String>),
}

/// One option an object write wants persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigChange {
    pub option: &'static str,
    pub value: ConfigValue,
}

impl ConfigChange {
    pub fn single(option: &'static str, value: impl Display) -> Self {
        Self {
            option,
            value: ConfigValue::Single(value.to_string()),
        }
    }

    pub fn flag(option: &'static str, value: bool) -> Self {
        Self::single(option, if value { "1" } else { "0" })
    }

    pub fn list(option: &'static str, values: Vec<String>) -> Self {
        Self {
            option,
            value: ConfigValue::List(values),
        }
    }
}

pub trait ConfigStore {
    fn get(&self, package: &str, section: &str, option: &str) -> Option<String>;

    fn get_list(&self, package: &str, section: &str, option: &str) -> Vec<String>;

    fn set(
        &mut self,
        package: &str,
        section: &str,
        option: &str,
        value: &str,
    ) -> Result<(), ConfigError>;

    fn set_list(
        &mut self,
        package: &str,
        section: &str,
        option: &str,
        values: &[String],
    ) -> Result<(), ConfigError>;

    /// Section names of `package`; an unknown package has none.
    fn sections(&self, package: &str) -> Vec<String>;

    /// Drops a section with all its options. Removing a missing section is
    /// not an error.
    fn delete_section(&mut self, package: &str, section: &str) -> Result<(), ConfigError>;

    fn commit(&mut self, package: &str) -> Result<(), ConfigError>;

    fn apply(
        &mut self,
        package: &str,
        section: &str,
        change: &ConfigChange,
    ) -> Result<(), ConfigError> {
        match &change.value {
            ConfigValue::Single(value) => self.set(package, section, change.option, value),
            ConfigValue::List(values) => self.set_list(package, section, change.option, values),
        }
    }
}

/// Typed read access to one section of a store.
pub struct ConfigSection<'a> {
    store: &'a dyn ConfigStore,
    package: &'a str,
    section: &'a str,
}

impl<'a> ConfigSection<'a> {
    pub fn new(store: &'a dyn ConfigStore, package: &'a str, section: &'a str) -> Self {
        Self {
            store,
            package,
            section,
        }
    }

    pub fn package(&self) -> &str {
        self.package
    }

    pub fn name(&self) -> &str {
        self.section
    }

    pub fn string(&self, option: &str) -> Option<String> {
        self.store.get(self.package, self.section, option)
    }

    pub fn string_or(&self, option: &str, default: &str) -> String {
        self.string(option).unwrap_or_else(|| default.to_string())
    }

    pub fn list(&self, option: &str) -> Vec<String> {
        self.store.get_list(self.package, self.section, option)
    }

    pub fn parse<T: FromStr>(&self, option: &str) -> Result<Option<T>, ConfigError> {
        self.string(option)
            .map(|raw| {
                raw.trim()
                    .parse()
                    .map_err(|_| self.invalid(option, &raw))
            })
            .transpose()
    }

    pub fn parse_or<T: FromStr>(&self, option: &str, default: T) -> Result<T, ConfigError> {
        Ok(self.parse(option)?.unwrap_or(default))
    }

    /// UCI boolean: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off`.
    pub fn flag(&self, option: &str) -> Result<bool, ConfigError> {
        let Some(raw) = self.string(option) else {
            return Ok(false);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(self.invalid(option, &raw)),
        }
    }

    pub fn invalid(&self, option: &str, value: &str) -> ConfigError {
        ConfigError::InvalidValue {
            package: self.package.to_string(),
            section: self.section.to_string(),
            option: option.to_string(),
            value: value.to_string(),
        }
    }
}

type Section = BTreeMap<String, ConfigValue>;

/// In-memory store for tests and embedding; commits only count.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    packages: BTreeMap<String, BTreeMap<String, Section>>,
    commits: usize,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commits(&self) -> usize {
        self.commits
    }

    fn option(&self, package: &str, section: &str, option: &str) -> Option<&ConfigValue> {
        self.packages.get(package)?.get(section)?.get(option)
    }

    fn section_mut(&mut self, package: &str, section: &str) -> &mut Section {
        self.packages
            .entry(package.to_string())
            .or_default()
            .entry(section.to_string())
            .or_default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, package: &str, section: &str, option: &str) -> Option<String> {
        match self.option(package, section, option)? {
            ConfigValue::Single(value) => Some(value.clone()),
            ConfigValue::List(values) => values.first().cloned(),
        }
    }

    fn get_list(&self, package: &str, section: &str, option: &str) -> Vec<String> {
        match self.option(package, section, option) {
            Some(ConfigValue::List(values)) => values.clone(),
            Some(ConfigValue::Single(value)) => vec![value.clone()],
            None => Vec::new(),
        }
    }

    fn set(
        &mut self,
        package: &str,
        section: &str,
        option: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        self.section_mut(package, section)
            .insert(option.to_string(), ConfigValue::Single(value.to_string()));
        Ok(())
    }

    fn set_list(
        &mut self,
        package: &str,
        section: &str,
        option: &str,
        values: &[String],
    ) -> Result<(), ConfigError> {
        self.section_mut(package, section)
            .insert(option.to_string(), ConfigValue::List(values.to_vec()));
        Ok(())
    }

    fn sections(&self, package: &str) -> Vec<String> {
        self.packages
            .get(package)
            .map(|sections| sections.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn delete_section(&mut self, package: &str, section: &str) -> Result<(), ConfigError> {
        if let Some(sections) = self.packages.get_mut(package) {
            sections.remove(section);
        }
        Ok(())
    }

    fn commit(&mut self, _package: &str) -> Result<(), ConfigError> {
        self.commits += 1;
        Ok(())
    }
}
