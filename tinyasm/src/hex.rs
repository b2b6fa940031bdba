//! Intel-HEX with the programmer's `*<fuse>` extension line.

use crate::HexError;


const RECORD_LEN: usize = 16;
const ORIGIN: &str = ":020000020000FC\n";
const EOF: &str = ":00000001FF\n";

/// Renders `data` as 16 byte records, after the origin record and the fuse
/// line. Only the low nibble of `fuses` fits on the fuse line.
pub fn write(data: &[u8], fuses: u8) -> String {
    let mut out = String::with_capacity(ORIGIN.len() + data.len() * 3 + 32);
    out.push_str(ORIGIN);
    out.push_str(&format!("*{:X}\n", fuses & 0x0F));
    for (i, chunk) in data.chunks(RECORD_LEN).enumerate() {
        let addr = (i * RECORD_LEN) as u16;
        let [hi, lo] = addr.to_be_bytes();
        let mut sum = (chunk.len() as u8).wrapping_add(hi).wrapping_add(lo);
        out.push_str(&format!(":{:02X}{addr:04X}00", chunk.len()));
        for &byte in chunk {
            out.push_str(&format!("{byte:02X}"));
            sum = sum.wrapping_add(byte);
        }
        out.push_str(&format!("{:02X}\n", (!sum).wrapping_add(1)));
    }
    out.push_str(EOF);
    out
}

/// A loaded program, ready to be sent to a programmer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeImage {
    pub data: Vec<u8>,
    pub fuses: u8,
}

impl CodeImage {
    /// C array initializer body, 16 bytes per row.
    pub fn c_array(&self) -> String {
        let rows: Vec<String> = self
            .data
            .chunks(RECORD_LEN)
            .map(|row| {
                let bytes: Vec<String> = row.iter().map(|b| format!("0x{b:02X}")).collect();
                format!("  {}", bytes.join(", "))
            })
            .collect();
        rows.join(",\n")
    }
}

/// Loads the data records of `text`. Records of other types are skipped,
/// a data record whose bytes do not sum to zero aborts the load.
pub fn read(text: &str) -> Result<CodeImage, HexError> {
    let mut image = CodeImage {
        data: Vec::new(),
        fuses: 0x0F,
    };
    for (record, line) in text.split_whitespace().enumerate() {
        let record = record + 1;
        if let Some(fuse) = line.strip_prefix('*') {
            if let [digit] = fuse.as_bytes() {
                image.fuses = nibble(*digit).ok_or(HexError::Digit { record })?;
            }
            continue;
        }
        if !line.starts_with(':') || line.len() <= 11 {
            continue;
        }
        let bytes = decode(&line[1..]).ok_or(HexError::Digit { record })?;
        let &[count, hi, lo, kind, ..] = bytes.as_slice() else {
            return Err(HexError::Truncated { record });
        };
        if bytes.len() != count as usize + 5 {
            return Err(HexError::Truncated { record });
        }
        if kind != 0 {
            continue;
        }
        if bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b)) != 0 {
            return Err(HexError::Checksum { record });
        }
        let addr = usize::from(u16::from_be_bytes([hi, lo]));
        let data = &bytes[4..4 + count as usize];
        if image.data.len() < addr + data.len() {
            image.data.resize(addr + data.len(), 0xFF);
        }
        image.data[addr..addr + data.len()].copy_from_slice(data);
    }
    Ok(image)
}

fn nibble(digit: u8) -> Option<u8> {
    (digit as char).to_digit(16).map(|d| d as u8)
}

fn decode(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    hex.as_bytes()
        .chunks(2)
        .map(|pair| Some(nibble(pair[0])? << 4 | nibble(pair[1])?))
        .collect()
}
