use std::path::PathBuf;

/// Bytes addressable by the 16 bit address of an Intel-HEX data record.
pub const MAX_CAPACITY: usize = 0x10000;

#[derive(Debug, Clone)]
pub struct Config {
    /// Hard cap on the output image in bytes. Values above [`MAX_CAPACITY`]
    /// are lowered to it by [`Assembler::new`](crate::Assembler::new).
    ///
    /// default = `0x10000`
    pub capacity: usize,
    /// Searched in order for `<device>.props` before the built-in table.
    ///
    /// default = `[]`
    pub device_dirs: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: MAX_CAPACITY,
            device_dirs: Vec::new(),
        }
    }
}
