use num_traits::ToPrimitive;
use tiny_expr::Value;
use tracing::{debug, trace};

use crate::opcode::{self, Family, Opcode};
use crate::{AsmError, Assembler, Deferred, InputError, Pending};


impl Assembler {
    /// Pass 2, in the order the instructions were queued.
    pub(crate) fn resolve_all(&mut self) -> Result<(), AsmError> {
        let deferred = std::mem::take(&mut self.deferred);
        debug!(count = deferred.len(), "resolving deferred instructions");
        for item in &deferred {
            let Pending { parts, addr, .. } = item.pending();
            trace!(addr, ?parts, "resolve");
            match self.resolve(item) {
                Ok(()) => (),
                Err(AsmError::Input(e)) => {
                    self.error(*addr, format!("* * * Err: {} - {e}", parts.join(" ")));
                    self.image.touch(*addr)?;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn resolve(&mut self, item: &Deferred) -> Result<(), AsmError> {
        let (p, word) = match item {
            Deferred::Branch(p) => (p, self.branch(p)?),
            Deferred::Operands(p) => (p, self.operands(p)?),
        };
        self.emit(p.addr, word, &p.parts, p.comment.as_deref())
    }

    fn branch(&self, p: &Pending) -> Result<u16, InputError> {
        let opcode = mnemonic(p)?;
        let arg = p.parts[1].to_lowercase();
        let here = i64::from(p.addr);
        let target = match arg.strip_prefix("pc").map(str::trim_start) {
            Some("") => here,
            Some(rest) if rest.starts_with(|c: char| c == '+' || c == '-') => {
                here + i64::from(self.evaluate(&format!("0{rest}"))?)
            }
            _ => i64::from(self.value(&arg)?),
        };
        opcode.branch(target - here - 1)
    }

    fn operands(&self, p: &Pending) -> Result<u16, InputError> {
        let opcode = mnemonic(p)?;
        let (first, second) = (&p.parts[1], &p.parts[2]);
        match opcode.family {
            Family::Ld => opcode.indexed(self.value(first)?, &second.to_lowercase()),
            Family::St => opcode.indexed(self.value(second)?, &first.to_lowercase()),
            _ => opcode.pair(self.value(first)?, self.value(second)?),
        }
    }

    /// Resolves an operand: symbols first, then register names, then the
    /// `ld`/`st` addressing modes (as 0), then as an expression.
    pub(crate) fn value(&self, operand: &str) -> Result<i32, InputError> {
        let name = operand.to_lowercase();
        if let Some(v) = self.symbols.get(&name) {
            return match v {
                Value::Int(i) => i.to_i32().ok_or(InputError::OutOfRange(name)),
                _ => Err(InputError::NotANumber(name)),
            };
        }
        if let Some(r) = opcode::register(&name) {
            return Ok(r);
        }
        if opcode::ld_mode(&name).is_some() {
            return Ok(0);
        }
        self.evaluate(&name)
    }

    /// Evaluates `expr` against the symbol table.
    pub(crate) fn evaluate(&self, expr: &str) -> Result<i32, InputError> {
        match self.evaluator.eval_str(expr, &self.symbols)? {
            Value::Int(i) => i
                .to_i32()
                .ok_or_else(|| InputError::OutOfRange(expr.to_owned())),
            Value::Null => Err(InputError::UnknownSymbol(expr.to_owned())),
            _ => Err(InputError::NotANumber(expr.to_owned())),
        }
    }
}

fn mnemonic(p: &Pending) -> Result<Opcode, InputError> {
    p.parts[0]
        .to_lowercase()
        .parse()
        .map_err(|()| InputError::InvalidInstruction(p.parts.join(" ")))
}
