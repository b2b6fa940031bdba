use crate::AsmError;

/// Program memory as bytes, grown on demand and filled with `0xFF` like
/// erased flash.
#[derive(Debug)]
pub struct Image {
    bytes: Vec<u8>,
    capacity: usize,
}

impl Image {
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: Vec::new(),
            capacity,
        }
    }

    /// Stores `word` little-endian at word address `addr`.
    pub fn write_word(&mut self, addr: u32, word: u16) -> Result<(), AsmError> {
        let at = self.cover(addr)?;
        self.bytes[at..at + 2].copy_from_slice(&word.to_le_bytes());
        Ok(())
    }

    /// Extends the image over word address `addr` without writing to it.
    pub fn touch(&mut self, addr: u32) -> Result<(), AsmError> {
        self.cover(addr).map(drop)
    }

    fn cover(&mut self, addr: u32) -> Result<usize, AsmError> {
        let at = addr as usize * 2;
        let needed = at + 2;
        if needed > self.capacity {
            return Err(AsmError::Capacity {
                needed,
                capacity: self.capacity,
            });
        }
        if needed > self.bytes.len() {
            self.bytes.resize(needed, 0xFF);
        }
        Ok(at)
    }

    /// Everything up to the highest byte written.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn word(&self, addr: u32) -> Option<u16> {
        let at = addr as usize * 2;
        let pair = self.bytes.get(at..at + 2)?;
        Some(u16::from_le_bytes([pair[0], pair[1]]))
    }
}
