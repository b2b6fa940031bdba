//! Two pass assembler for the ATtiny4/5/9/10.
//!
//! Lines are scanned once, encoding what can be encoded immediately and
//! queueing branches and two-operand instructions until every label is
//! known. Errors in a line or a queued instruction are written into the
//! listing and assembly carries on.

use ahash::AHashMap;
use tiny_expr::{Evaluator, Value};
use tracing::{debug, trace, warn};

pub mod config;
pub mod device;
mod error;
pub mod hex;
mod image;
pub mod line;
mod listing;
pub mod opcode;
mod resolve;
mod scan;

#[cfg(test)]
mod test;

pub use config::Config;
pub use device::{DeviceSource, Devices};
pub use error::{AsmError, DeviceError, HexError, InputError};
pub use hex::CodeImage;

use image::Image;
use listing::Listing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Segment {
    Code,
    #[default]
    Data,
}

/// An instruction waiting for pass 2.
#[derive(Debug, Clone)]
pub(crate) struct Pending {
    pub parts: Vec<String>,
    pub addr: u32,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) enum Deferred {
    Branch(Pending),
    Operands(Pending),
}

impl Deferred {
    fn pending(&self) -> &Pending {
        match self {
            Self::Branch(p) | Self::Operands(p) => p,
        }
    }
}

type SymbolMap = AHashMap<String, Value>;

pub struct Assembler {
    devices: Box<dyn DeviceSource>,
    evaluator: Evaluator,
    symbols: SymbolMap,
    image: Image,
    listing: Listing,
    deferred: Vec<Deferred>,
    segment: Segment,
    code_add: u32,
    data_add: u32,
    fuses: u8,
    errors: usize,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Assembler {
    pub fn new(config: Config) -> Self {
        let mut capacity = config.capacity;
        if capacity > config::MAX_CAPACITY {
            warn!(capacity, "image capacity lowered to {:#X}", config::MAX_CAPACITY);
            capacity = config::MAX_CAPACITY;
        }
        Self {
            devices: Box::new(Devices::new(config.device_dirs)),
            evaluator: Evaluator::new(),
            symbols: SymbolMap::default(),
            image: Image::new(capacity),
            listing: Listing::default(),
            deferred: Vec::new(),
            segment: Segment::default(),
            code_add: 0,
            data_add: 0x40,
            fuses: 0xFF,
            errors: 0,
        }
    }

    pub fn with_devices(mut self, devices: impl DeviceSource + 'static) -> Self {
        self.devices = Box::new(devices);
        self
    }

    /// Scans every line of `src`, then encodes the deferred instructions.
    /// Only running out of image capacity stops assembly, every other
    /// problem is annotated in the listing and counted by
    /// [`Assembler::error_count`].
    pub fn assemble(&mut self, src: &str) -> Result<(), AsmError> {
        for (n, text) in src.lines().enumerate() {
            trace!(line = n + 1, text, "scan");
            match self.scan_line(text) {
                Ok(()) => (),
                Err(AsmError::Input(e)) => {
                    let addr = self.code_add;
                    self.error(addr, format!("* * * Err: {} - {e}", text.trim()));
                    self.code_add += 1;
                    self.image.touch(addr)?;
                }
                Err(e) => return Err(e),
            }
        }
        debug!(
            deferred = self.deferred.len(),
            code = self.code_add,
            "scan finished"
        );
        self.resolve_all()
    }

    pub fn hex(&self) -> String {
        hex::write(self.image.bytes(), self.fuses)
    }

    pub fn listing(&self) -> String {
        self.listing.render(self.fuses)
    }

    /// The assembled bytes, up to the highest address written.
    pub fn bytes(&self) -> &[u8] {
        self.image.bytes()
    }

    pub fn word(&self, addr: u32) -> Option<u16> {
        self.image.word(addr)
    }

    pub fn fuses(&self) -> u8 {
        self.fuses
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// Annotations recorded at word address `addr`.
    pub fn notes(&self, addr: u32) -> &[String] {
        self.listing.notes(addr)
    }

    pub fn symbol(&self, name: &str) -> Option<&Value> {
        self.symbols.get(&name.to_lowercase())
    }

    pub fn segment(&self) -> Segment {
        self.segment
    }

    fn emit(
        &mut self,
        addr: u32,
        word: u16,
        parts: &[String],
        comment: Option<&str>,
    ) -> Result<(), AsmError> {
        self.image.write_word(addr, word)?;
        self.listing.line(addr, word, parts, comment);
        Ok(())
    }

    fn note(&mut self, addr: u32, text: impl Into<String>) {
        self.listing.note(addr, text);
    }

    fn error(&mut self, addr: u32, text: String) {
        warn!(addr, "{text}");
        self.errors += 1;
        self.listing.note(addr, text);
    }
}
