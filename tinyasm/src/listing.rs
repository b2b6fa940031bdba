use std::collections::{BTreeMap, BTreeSet};

/// Encoded lines and annotations, both keyed by word address.
#[derive(Debug, Default)]
pub struct Listing {
    lines: BTreeMap<u32, String>,
    notes: BTreeMap<u32, Vec<String>>,
}

const COMMENT_COLUMN: usize = 32;

impl Listing {
    pub fn note(&mut self, addr: u32, text: impl Into<String>) {
        self.notes.entry(addr).or_default().push(text.into());
    }

    pub fn line(&mut self, addr: u32, word: u16, parts: &[String], comment: Option<&str>) {
        let mut text = format!("{addr:04X}: {word:04X}  {}", parts.join(" "));
        match comment {
            Some(comment) => {
                while text.len() < COMMENT_COLUMN {
                    text.push(' ');
                }
                text.push_str(comment);
            }
            None => text.truncate(text.trim_end().len()),
        }
        self.lines.insert(addr, text);
    }

    pub fn notes(&self, addr: u32) -> &[String] {
        self.notes.get(&addr).map(Vec::as_slice).unwrap_or_default()
    }

    /// Annotations at each address come before the encoded line.
    pub fn render(&self, fuses: u8) -> String {
        let mut out = format!("Fuses: 0x{fuses:02X}\n");
        let addrs: BTreeSet<u32> = self.lines.keys().chain(self.notes.keys()).copied().collect();
        for addr in addrs {
            for note in self.notes(addr) {
                out.push_str(note);
                out.push('\n');
            }
            if let Some(line) = self.lines.get(&addr) {
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}
