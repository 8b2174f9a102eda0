//! OpenWrt UCI configuration directory.
//!
//! Each package is a file in the directory:
//!
//! ```text
//! config ao '1'
//!     option name 'Supply fan speed'
//!     option max_value '100'
//!     list ref '1,3,85'
//! ```
//!
//! Sections are addressed by name; anonymous sections get `@<type>[<n>]`.

use super::{ConfigStore, ConfigValue};
use crate::ConfigError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
struct UciSection {
    kind: String,
    name: String,
    options: Vec<(String, ConfigValue)>,
}

impl UciSection {
    fn option(&self, option: &str) -> Option<&ConfigValue> {
        self.options
            .iter()
            .find(|(name, _)| name == option)
            .map(|(_, value)| value)
    }

    fn set(&mut self, option: &str, value: ConfigValue) {
        match self.options.iter_mut().find(|(name, _)| name == option) {
            Some(slot) => slot.1 = value,
            None => self.options.push((option.to_string(), value)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct UciPackage {
    sections: Vec<UciSection>,
}

impl UciPackage {
    fn section(&self, name: &str) -> Option<&UciSection> {
        self.sections.iter().find(|s| s.name == name)
    }
}

/// A directory of UCI package files, loaded eagerly and written back per
/// package on commit.
#[derive(Debug, Clone)]
pub struct UciStore {
    dir: PathBuf,
    packages: BTreeMap<String, UciPackage>,
}

impl UciStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let dir = dir.into();
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| ConfigError::Io { path, source }
        };

        let mut packages = BTreeMap::new();
        for entry in fs::read_dir(&dir).map_err(io_err(&dir))? {
            let entry = entry.map_err(io_err(&dir))?;
            let path = entry.path();
            let Some(package) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if package.starts_with('.') || !path.is_file() {
                continue;
            }
            let text = fs::read_to_string(&path).map_err(io_err(&path))?;
            packages.insert(package.to_string(), parse_package(package, &text)?);
        }
        log::debug!("loaded {} uci packages from {}", packages.len(), dir.display());
        Ok(Self { dir, packages })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn option(&self, package: &str, section: &str, option: &str) -> Option<&ConfigValue> {
        self.packages.get(package)?.section(section)?.option(option)
    }

    fn section_mut(&mut self, package: &str, section: &str) -> &mut UciSection {
        let pkg = self.packages.entry(package.to_string()).or_default();
        let index = match pkg.sections.iter().position(|s| s.name == section) {
            Some(index) => index,
            None => {
                pkg.sections.push(UciSection {
                    kind: section_kind(package).to_string(),
                    name: section.to_string(),
                    options: Vec::new(),
                });
                pkg.sections.len() - 1
            }
        };
        &mut pkg.sections[index]
    }
}

/// Section type used for sections created in `package`: `bacnet_ao` holds
/// `ao` sections.
fn section_kind(package: &str) -> &str {
    package.strip_prefix("bacnet_").unwrap_or(package)
}

impl ConfigStore for UciStore {
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
            .set(option, ConfigValue::Single(value.to_string()));
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
            .set(option, ConfigValue::List(values.to_vec()));
        Ok(())
    }

    fn sections(&self, package: &str) -> Vec<String> {
        match self.packages.get(package) {
            Some(pkg) => pkg.sections.iter().map(|s| s.name.clone()).collect(),
            None => {
                log::warn!("uci package {package} not found in {}", self.dir.display());
                Vec::new()
            }
        }
    }

    fn delete_section(&mut self, package: &str, section: &str) -> Result<(), ConfigError> {
        if let Some(pkg) = self.packages.get_mut(package) {
            pkg.sections.retain(|s| s.name != section);
        }
        Ok(())
    }

    fn commit(&mut self, package: &str) -> Result<(), ConfigError> {
        let Some(pkg) = self.packages.get(package) else {
            return Ok(());
        };
        let path = self.dir.join(package);
        let tmp = self.dir.join(format!(".{package}.tmp"));
        fs::write(&tmp, render_package(pkg)).map_err(|source| ConfigError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| ConfigError::Io { path, source })
    }
}

fn parse_package(package: &str, text: &str) -> Result<UciPackage, ConfigError> {
    let mut pkg = UciPackage::default();
    for (index, raw) in text.lines().enumerate() {
        let error = |message: &str| ConfigError::Parse {
            package: package.to_string(),
            line: index + 1,
            message: message.to_string(),
        };
        let words = tokenize(raw).map_err(error)?;
        match words.as_slice() {
            [] => {}
            [keyword, ..] if keyword == "package" => {}
            [keyword, kind] if keyword == "config" => {
                let n = pkg.sections.iter().filter(|s| &s.kind == kind).count();
                pkg.sections.push(UciSection {
                    kind: kind.clone(),
                    name: format!("@{kind}[{n}]"),
                    options: Vec::new(),
                });
            }
            [keyword, kind, name] if keyword == "config" => pkg.sections.push(UciSection {
                kind: kind.clone(),
                name: name.clone(),
                options: Vec::new(),
            }),
            [keyword, option, value] if keyword == "option" => {
                let section = pkg
                    .sections
                    .last_mut()
                    .ok_or_else(|| error("option outside of a section"))?;
                section.set(option, ConfigValue::Single(value.clone()));
            }
            [keyword, option, value] if keyword == "list" => {
                let section = pkg
                    .sections
                    .last_mut()
                    .ok_or_else(|| error("list outside of a section"))?;
                match section.options.iter_mut().find(|(name, _)| name == option) {
                    Some((_, ConfigValue::List(values))) => values.push(value.clone()),
                    Some(slot) => slot.1 = ConfigValue::List(vec![value.clone()]),
                    None => section
                        .options
                        .push((option.clone(), ConfigValue::List(vec![value.clone()]))),
                }
            }
            _ => return Err(error("unrecognised statement")),
        }
    }
    Ok(pkg)
}

/// Splits one line into shell-style words. Single quotes are literal,
/// double quotes honour backslash escapes, `#` starts a comment.
fn tokenize(line: &str) -> Result<Vec<String>, &'static str> {
    let mut words = Vec::new();
    let mut chars = line.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.peek() {
            None | Some('#') => break,
            Some(_) => {}
        }
        let mut word = String::new();
        while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
            match c {
                '\'' => loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => word.push(ch),
                        None => return Err("unterminated quote"),
                    }
                },
                '"' => loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => word.push(chars.next().ok_or("unterminated quote")?),
                        Some(ch) => word.push(ch),
                        None => return Err("unterminated quote"),
                    }
                },
                '\\' => word.push(chars.next().ok_or("dangling escape")?),
                _ => word.push(c),
            }
        }
        words.push(word);
    }
    Ok(words)
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

fn render_package(pkg: &UciPackage) -> String {
    let mut out = String::new();
    for section in &pkg.sections {
        if section.name.starts_with('@') {
            out.push_str(&format!("config {}\n", section.kind));
        } else {
            out.push_str(&format!("config {} {}\n", section.kind, quote(&section.name)));
        }
        for (option, value) in &section.options {
            match value {
                ConfigValue::Single(v) => {
                    out.push_str(&format!("\toption {option} {}\n", quote(v)));
                }
                ConfigValue::List(values) => {
                    for v in values {
                        out.push_str(&format!("\tlist {option} {}\n", quote(v)));
                    }
                }
            }
        }
        out.push('\n');
    }
    out
}
