use tiny_expr::Value;
use tracing::{debug, trace};

use crate::line::{self, Line};
use crate::opcode::{self, Opcode};
use crate::{AsmError, Assembler, Deferred, InputError, Pending, Segment};

impl Assembler {
    /// The first pass over one line.
    pub(crate) fn scan_line(&mut self, src: &str) -> Result<(), AsmError> {
        let Line {
            label,
            parts,
            comment,
        } = line::split(src);
        if let Some(label) = label {
            self.define_label(&label);
        }
        let Some(op) = parts.first().map(|op| op.to_lowercase()) else {
            if let Some(comment) = comment {
                self.note(self.code_add, comment);
            }
            return Ok(());
        };
        let args = &parts[1..];
        match (op.as_str(), args) {
            (".fuses", _) => self.set_fuses(args)?,
            (".db", _) => self.data_bytes(&parts, comment.as_deref())?,
            (".dw", _) => self.data_words(&parts, comment.as_deref())?,
            (".equ" | ".eq" | ".def", [_, ..]) => self.equate(&args.join(","))?,
            (".cseg", []) => self.switch(Segment::Code),
            (".dseg", []) => self.switch(Segment::Data),
            (".org", [arg]) => self.origin(arg)?,
            (".byte", [arg]) => {
                let n = self.value(arg)?;
                self.data_add = self.data_add.wrapping_add_signed(n);
            }
            (".device", [name]) => self.device(name),
            (_, [_, _]) => self.defer(Deferred::Operands, parts, comment),
            _ => self.instruction(&op, parts, comment)?,
        }
        Ok(())
    }

    fn instruction(
        &mut self,
        op: &str,
        parts: Vec<String>,
        comment: Option<String>,
    ) -> Result<(), AsmError> {
        let args = &parts[1..];
        let opcode = match op.parse::<Opcode>() {
            Ok(opcode) if opcode.family.operands() == args.len() => opcode,
            Ok(opcode) => {
                let e = InputError::InvalidArgCount {
                    exp: opcode.family.operands(),
                    got: args.len(),
                };
                self.reject(&parts, e);
                return Ok(());
            }
            Err(()) => {
                self.reject(&parts, InputError::InvalidInstruction(parts.join(" ")));
                return Ok(());
            }
        };
        let family = opcode.family;
        if family.is_relative() {
            self.defer(Deferred::Branch, parts, comment);
            return Ok(());
        }
        let word = match args {
            [arg] => opcode.single(self.value(arg)?)?,
            _ => opcode.base,
        };
        let addr = self.next_word();
        self.emit(addr, word, &parts, comment.as_deref())
    }

    // unrecognized lines are annotated without taking a word
    fn reject(&mut self, parts: &[String], e: InputError) {
        self.error(self.code_add, format!("* * * Err: {} - {e}", parts.join(" ")));
    }

    fn defer(
        &mut self,
        kind: fn(Pending) -> Deferred,
        parts: Vec<String>,
        comment: Option<String>,
    ) {
        let addr = self.next_word();
        trace!(addr, ?parts, "deferred");
        self.deferred.push(kind(Pending {
            parts,
            addr,
            comment,
        }));
    }

    fn next_word(&mut self) -> u32 {
        let addr = self.code_add;
        self.code_add += 1;
        addr
    }

    fn define_label(&mut self, label: &str) {
        let addr = match self.segment {
            Segment::Code => {
                self.note(self.code_add, format!("{label}:"));
                self.code_add
            }
            Segment::Data => self.data_add,
        };
        trace!(label, addr, "label");
        self.symbols.insert(label.to_lowercase(), Value::int(addr));
    }

    fn switch(&mut self, segment: Segment) {
        debug!(?segment, "segment");
        self.segment = segment;
    }

    fn origin(&mut self, arg: &str) -> Result<(), AsmError> {
        let v = self.value(arg)?;
        let addr = u32::try_from(v).map_err(|_| InputError::OutOfRange(arg.to_owned()))?;
        match self.segment {
            Segment::Code => self.code_add = addr,
            Segment::Data => self.data_add = addr,
        }
        self.note(self.code_add, format!(".org {arg}"));
        Ok(())
    }

    fn set_fuses(&mut self, names: &[String]) -> Result<(), AsmError> {
        let mut bits = 0;
        for name in names {
            bits |= opcode::fuse(&name.to_lowercase())
                .ok_or_else(|| InputError::UnknownFuse(name.clone()))?;
        }
        self.fuses = !bits;
        debug!(fuses = self.fuses, "fuses");
        Ok(())
    }

    fn equate(&mut self, arg: &str) -> Result<(), AsmError> {
        let arg = arg.to_lowercase();
        let Some((name, value)) = arg.split_once('=') else {
            return Err(InputError::Equate(arg.clone()).into());
        };
        let (name, value) = (name.trim(), value.trim());
        if name.is_empty() || value.is_empty() || value.contains('=') {
            return Err(InputError::Equate(arg.clone()).into());
        }
        let v = self.value(value)?;
        trace!(name, v, "equate");
        self.symbols.insert(name.to_owned(), Value::int(v));
        Ok(())
    }

    fn device(&mut self, name: &str) {
        let name = name.to_lowercase();
        let props = match self.devices.load(&name) {
            Ok(props) => props,
            Err(e) => {
                self.error(self.code_add, e.to_string());
                return;
            }
        };
        debug!(device = %name, symbols = props.len(), "device");
        for (key, val) in props {
            match self.evaluate(&val.to_lowercase()) {
                Ok(v) => {
                    self.symbols.insert(key.to_lowercase(), Value::int(v));
                }
                Err(_) => self.error(self.code_add, format!("Bad device symbol: {key}: {val}")),
            }
        }
    }

    fn data_bytes(&mut self, parts: &[String], comment: Option<&str>) -> Result<(), AsmError> {
        if self.segment == Segment::Data {
            self.error(self.code_add, ".db directive doesn't work in DSEG".to_owned());
            return Ok(());
        }
        let mut bytes = Vec::new();
        for arg in &parts[1..] {
            match arg.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
                Some(text) => bytes.extend(text.bytes()),
                None => bytes.push(self.value(arg)? as u8),
            }
        }
        for (i, pair) in bytes.chunks(2).enumerate() {
            let word = u16::from_le_bytes([pair[0], pair.get(1).copied().unwrap_or(0)]);
            self.emit_data(i == 0, word, parts, comment)?;
        }
        Ok(())
    }

    fn data_words(&mut self, parts: &[String], comment: Option<&str>) -> Result<(), AsmError> {
        if self.segment == Segment::Data {
            self.error(self.code_add, ".dw directive doesn't work in DSEG".to_owned());
            return Ok(());
        }
        let mut words = Vec::with_capacity(parts.len() - 1);
        for arg in &parts[1..] {
            words.push(self.value(arg)? as u16);
        }
        for (i, word) in words.into_iter().enumerate() {
            self.emit_data(i == 0, word, parts, comment)?;
        }
        Ok(())
    }

    // only the first word of a directive is listed with its source
    fn emit_data(
        &mut self,
        first: bool,
        word: u16,
        parts: &[String],
        comment: Option<&str>,
    ) -> Result<(), AsmError> {
        let addr = self.next_word();
        if first {
            self.emit(addr, word, parts, comment)
        } else {
            self.emit(addr, word, &[], None)
        }
    }
}
