use std::fs;
use std::path::PathBuf;

use ahash::AHashMap;
use tracing::debug;

use crate::DeviceError;

#[cfg(test)]
mod test;

/// Key and unevaluated value, in file order.
pub type Props = Vec<(String, String)>;

/// Supplies the symbols loaded by `.device`.
pub trait DeviceSource {
    /// `name` is lower-cased.
    fn load(&self, name: &str) -> Result<Props, DeviceError>;
}

const ATTINY10: &str = include_str!("../devices/attiny10.props");

fn builtin(name: &str) -> Option<&'static str> {
    match name {
        "attiny4" | "attiny5" | "attiny9" | "attiny10" => Some(ATTINY10),
        _ => None,
    }
}

/// Reads `<name>.props` from the first directory that has one, falling back
/// to the built-in ATtiny4/5/9/10 table.
#[derive(Debug, Default, Clone)]
pub struct Devices {
    dirs: Vec<PathBuf>,
}

impl Devices {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }
}

impl DeviceSource for Devices {
    fn load(&self, name: &str) -> Result<Props, DeviceError> {
        for dir in &self.dirs {
            let path = dir.join(format!("{name}.props"));
            if path.is_file() {
                debug!(path = %path.display(), "loading device file");
                let text =
                    fs::read_to_string(&path).map_err(|source| DeviceError::Io { path, source })?;
                return Ok(parse_props(&text));
            }
        }
        builtin(name)
            .map(parse_props)
            .ok_or_else(|| DeviceError::Unknown(name.to_owned()))
    }
}

/// Device name to property text, mostly for tests and embedding.
impl DeviceSource for AHashMap<String, String> {
    fn load(&self, name: &str) -> Result<Props, DeviceError> {
        self.get(name)
            .map(|text| parse_props(text))
            .ok_or_else(|| DeviceError::Unknown(name.to_owned()))
    }
}

/// The `key=value`, `key: value` and `key value` lines of a properties
/// file. `#` and `!` start comment lines.
pub fn parse_props(text: &str) -> Props {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with(|c: char| c == '#' || c == '!'))
        .map(|l| {
            let end = l
                .find(|c: char| c == '=' || c == ':' || c.is_whitespace())
                .unwrap_or(l.len());
            let (key, rest) = l.split_at(end);
            let rest = rest.trim_start();
            let value = rest
                .strip_prefix(|c: char| c == '=' || c == ':')
                .unwrap_or(rest)
                .trim_start();
            (key.to_owned(), value.to_owned())
        })
        .collect()
}
