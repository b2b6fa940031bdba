use std::str::FromStr;

use crate::InputError;

/// Bit layout shared by a group of mnemonics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    NoOperand,
    /// `---- ---r rrrr ----`
    OneReg,
    /// `rol`, `clr`, `tst` and `lsl`: a register-to-register op with the
    /// register given twice.
    SameReg,
    /// `---- ---- rrrr ----`, r16..r31 only
    UpperReg,
    /// `bset`/`bclr`: `---- ---- -bbb ----`
    Status,
    /// `---- --kk kkkk k---`
    Branch,
    /// `---- kkkk kkkk kkkk`
    Jump,
    /// `---- --sd dddd ssss`
    RegToReg,
    /// `---- ---- aaaa abbb`
    IoBit,
    /// `---- ---r rrrr 0bbb`
    RegBit,
    /// `---- ---r rrrr ----` with `z` as the first operand
    ZReg,
    /// `---- ---- kkdd kkkk`
    Imm6,
    /// `---- kkkk dddd kkkk`
    Imm8,
    /// `cbr`, an `andi` with the complemented mask
    Imm8Inverted,
    In,
    Out,
    Lds,
    Sts,
    Ld,
    St,
}

impl Family {
    pub const fn operands(self) -> usize {
        use Family::*;
        match self {
            NoOperand => 0,
            OneReg | SameReg | UpperReg | Status | Branch | Jump => 1,
            _ => 2,
        }
    }

    /// Whether encoding needs the final address layout.
    pub const fn is_relative(self) -> bool {
        matches!(self, Family::Branch | Family::Jump)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub family: Family,
    pub base: u16,
}

impl FromStr for Opcode {
    type Err = ();

    /// Expects a lower-cased mnemonic.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Family::*;
        let (family, base) = match s {
            "adc" => (RegToReg, 0x1C00),
            "add" => (RegToReg, 0x0C00),
            "and" => (RegToReg, 0x2000),
            "cp" => (RegToReg, 0x1400),
            "cpc" => (RegToReg, 0x0400),
            "cpse" => (RegToReg, 0x1000),
            "eor" => (RegToReg, 0x2400),
            "mov" => (RegToReg, 0x2C00),
            "or" => (RegToReg, 0x2800),
            "sbc" => (RegToReg, 0x0800),
            "sub" => (RegToReg, 0x1800),

            "break" => (NoOperand, 0x9598),
            "clc" => (NoOperand, 0x9488),
            "clh" => (NoOperand, 0x94D8),
            "cli" => (NoOperand, 0x94F8),
            "cln" => (NoOperand, 0x94A8),
            "cls" => (NoOperand, 0x94C8),
            "clt" => (NoOperand, 0x94E8),
            "clv" => (NoOperand, 0x94B8),
            "clz" => (NoOperand, 0x9498),
            "eicall" => (NoOperand, 0x9519),
            "eijmp" => (NoOperand, 0x9419),
            "icall" => (NoOperand, 0x9509),
            "ijmp" => (NoOperand, 0x9409),
            "nop" => (NoOperand, 0x0000),
            "ret" => (NoOperand, 0x9508),
            "reti" => (NoOperand, 0x9518),
            "sec" => (NoOperand, 0x9408),
            "seh" => (NoOperand, 0x9458),
            "sei" => (NoOperand, 0x9478),
            "sen" => (NoOperand, 0x9428),
            "ses" => (NoOperand, 0x9448),
            "set" => (NoOperand, 0x9468),
            "sev" => (NoOperand, 0x9438),
            "sez" => (NoOperand, 0x9418),
            "sleep" => (NoOperand, 0x9588),
            "wdr" => (NoOperand, 0x95A8),

            "cbi" => (IoBit, 0x9800),
            "sbi" => (IoBit, 0x9A00),
            "sbic" => (IoBit, 0x9900),
            "sbis" => (IoBit, 0x9B00),

            "bst" => (RegBit, 0xFA00),
            "bld" => (RegBit, 0xF800),
            "sbrc" => (RegBit, 0xFC00),
            "sbrs" => (RegBit, 0xFE00),

            "pop" => (OneReg, 0x900F),
            "push" => (OneReg, 0x920F),
            "asr" => (OneReg, 0x9405),
            "com" => (OneReg, 0x9400),
            "dec" => (OneReg, 0x940A),
            "inc" => (OneReg, 0x9403),
            "lsr" => (OneReg, 0x9406),
            "neg" => (OneReg, 0x9401),
            "ror" => (OneReg, 0x9407),
            "swap" => (OneReg, 0x9402),

            "rol" => (SameReg, 0x1C00),
            "clr" => (SameReg, 0x2400),
            "tst" => (SameReg, 0x2000),
            "lsl" => (SameReg, 0x0C00),

            "ser" => (UpperReg, 0xEF0F),

            "bset" => (Status, 0x9408),
            "bclr" => (Status, 0x9488),

            "brcc" => (Branch, 0xF400),
            "brcs" => (Branch, 0xF000),
            "breq" => (Branch, 0xF001),
            "brge" => (Branch, 0xF404),
            "brhc" => (Branch, 0xF405),
            "brhs" => (Branch, 0xF005),
            "brid" => (Branch, 0xF407),
            "brie" => (Branch, 0xF007),
            "brlo" => (Branch, 0xF000),
            "brlt" => (Branch, 0xF004),
            "brmi" => (Branch, 0xF002),
            "brne" => (Branch, 0xF401),
            "brpl" => (Branch, 0xF402),
            "brsh" => (Branch, 0xF400),
            "brtc" => (Branch, 0xF406),
            "brts" => (Branch, 0xF006),
            "brvc" => (Branch, 0xF403),
            "brvs" => (Branch, 0xF003),
            "rjmp" => (Jump, 0xC000),
            "rcall" => (Jump, 0xD000),

            "xch" => (ZReg, 0x9204),
            "las" => (ZReg, 0x9205),
            "lat" => (ZReg, 0x9207),
            "lac" => (ZReg, 0x9206),

            "andi" => (Imm8, 0x7000),
            "cpi" => (Imm8, 0x3000),
            "ldi" => (Imm8, 0xE000),
            "ori" => (Imm8, 0x6000),
            "sbci" => (Imm8, 0x4000),
            "subi" => (Imm8, 0x5000),
            "sbr" => (Imm8, 0x6000),
            "cbr" => (Imm8Inverted, 0x7000),

            "adiw" => (Imm6, 0x9600),
            "sbiw" => (Imm6, 0x9700),

            "in" => (In, 0xB000),
            "out" => (Out, 0xB800),
            "lds" => (Lds, 0xA000),
            "sts" => (Sts, 0xA800),
            "ld" => (Ld, 0),
            "st" => (St, 0),
            _ => return Err(()),
        };
        Ok(Self { family, base })
    }
}

fn reg(r: i32) -> Result<i32, InputError> {
    if (0..=31).contains(&r) {
        Ok(r)
    } else {
        Err(InputError::Register(r))
    }
}

fn upper(r: i32) -> Result<i32, InputError> {
    if (16..=31).contains(&r) {
        Ok(r - 16)
    } else {
        Err(InputError::UpperRegister(r))
    }
}

fn bit(b: i32) -> Result<i32, InputError> {
    if (0..=7).contains(&b) {
        Ok(b)
    } else {
        Err(InputError::Bit(b))
    }
}

fn within(v: i32, lo: i32, hi: i32) -> Result<i32, InputError> {
    if (lo..=hi).contains(&v) {
        Ok(v)
    } else {
        Err(InputError::Immediate(v))
    }
}

/// Maps `r24`..`r30`, or a pair number 0..3, onto the two `dd` bits.
fn pair(r: i32) -> Result<i32, InputError> {
    match r {
        0..=3 => Ok(r),
        24 | 26 | 28 | 30 => Ok((r - 24) / 2),
        _ => Err(InputError::RegisterPair(r)),
    }
}

// 7 bit data address, stored as ---- -546 ---- 3210
fn short_address(k: i32) -> Result<i32, InputError> {
    if !(0..=0x7F).contains(&k) {
        return Err(InputError::DataAddress(k));
    }
    Ok((k & 0x0F) + ((k & 0x10) << 5) + ((k & 0x20) << 5) + ((k & 0x40) << 2))
}

fn io(a: i32, max: i32) -> Result<i32, InputError> {
    if (0..=max).contains(&a) {
        Ok(a)
    } else {
        Err(InputError::IoAddress(a))
    }
}

impl Opcode {
    fn word(self, fields: i32) -> u16 {
        (i32::from(self.base) + fields) as u16
    }

    /// Encodes the single-operand families.
    pub fn single(self, r: i32) -> Result<u16, InputError> {
        use Family::*;
        Ok(match self.family {
            OneReg => self.word(reg(r)? << 4),
            SameReg => {
                let r = reg(r)?;
                self.word((r << 4) + (r & 0x0F) + ((r & 0x10) << 5))
            }
            UpperReg => self.word(upper(r)? << 4),
            Status => self.word(bit(r)? << 4),
            family => {
                return Err(InputError::InvalidArgCount {
                    exp: family.operands(),
                    got: 1,
                })
            }
        })
    }

    /// Encodes the two-operand families, `d` being the first operand as
    /// written and `s` the second. `ld`/`st` go through [`Opcode::indexed`].
    pub fn pair(self, d: i32, s: i32) -> Result<u16, InputError> {
        use Family::*;
        Ok(match self.family {
            RegToReg => {
                let (d, s) = (reg(d)?, reg(s)?);
                self.word((d << 4) + (s & 0x0F) + ((s & 0x10) << 5))
            }
            IoBit => self.word((io(d, 31)? << 3) + bit(s)?),
            RegBit => self.word((reg(d)? << 4) + bit(s)?),
            ZReg => self.word(reg(s)? << 4),
            Imm6 => {
                let k = within(s, 0, 63)?;
                self.word((pair(d)? << 4) + ((k & 0x30) << 2) + (k & 0x0F))
            }
            Imm8 | Imm8Inverted => {
                let mut k = within(s, -128, 255)? & 0xFF;
                if self.family == Imm8Inverted {
                    k ^= 0xFF;
                }
                self.word((upper(d)? << 4) + ((k & 0xF0) << 4) + (k & 0x0F))
            }
            In => {
                let a = io(s, 63)?;
                self.word((reg(d)? << 4) + (a & 0x0F) + ((a & 0x30) << 5))
            }
            Out => {
                let a = io(d, 63)?;
                self.word((reg(s)? << 4) + (a & 0x0F) + ((a & 0x30) << 5))
            }
            Lds => self.word((upper(d)? << 4) + short_address(s)?),
            Sts => self.word((upper(s)? << 4) + short_address(d)?),
            family => {
                return Err(InputError::InvalidArgCount {
                    exp: family.operands(),
                    got: 2,
                })
            }
        })
    }

    /// `ld r, mode` and `st mode, r`.
    pub fn indexed(self, r: i32, mode: &str) -> Result<u16, InputError> {
        let base = match self.family {
            Family::Ld => ld_mode(mode),
            Family::St => st_mode(mode),
            family => {
                return Err(InputError::InvalidArgCount {
                    exp: family.operands(),
                    got: 2,
                })
            }
        }
        .ok_or_else(|| InputError::AddressingMode(mode.to_owned()))?;
        Ok((i32::from(base) + (reg(r)? << 4)) as u16)
    }

    /// Encodes a relative branch, `offset` counted in words from the
    /// instruction after the branch.
    pub fn branch(self, offset: i64) -> Result<u16, InputError> {
        let (lo, hi) = match self.family {
            Family::Jump => (-2048, 2047),
            Family::Branch => (-64, 63),
            family => {
                return Err(InputError::InvalidArgCount {
                    exp: family.operands(),
                    got: 1,
                })
            }
        };
        if !(lo..=hi).contains(&offset) {
            return Err(InputError::BranchRange(offset));
        }
        let offset = offset as i32;
        Ok(match self.family {
            Family::Jump => self.word(offset & 0x0FFF),
            _ => self.word((offset & 0x7F) << 3),
        })
    }
}

pub fn ld_mode(mode: &str) -> Option<u16> {
    Some(match mode {
        "x" => 0x900C,
        "x+" => 0x900D,
        "-x" => 0x900E,
        "y" => 0x8008,
        "y+" => 0x9009,
        "-y" => 0x900A,
        "z" => 0x8000,
        "z+" => 0x9001,
        "-z" => 0x9002,
        _ => return None,
    })
}

pub fn st_mode(mode: &str) -> Option<u16> {
    Some(match mode {
        "x" => 0x920C,
        "x+" => 0x920D,
        "-x" => 0x920E,
        "y" => 0x8208,
        "y+" => 0x9209,
        "-y" => 0x920A,
        "z" => 0x8200,
        "z+" => 0x9201,
        "-z" => 0x9202,
        _ => return None,
    })
}

/// Register names, pointer halves and the register pairs usable with
/// `adiw`/`sbiw`.
pub fn register(name: &str) -> Option<i32> {
    Some(match name {
        "r25:r24" => 0,
        "r27:r26" | "xh:xl" => 1,
        "r29:r28" | "yh:yl" => 2,
        "r31:r30" | "zh:zl" => 3,
        "zh" => 31,
        "zl" => 30,
        "yh" => 29,
        "yl" => 28,
        "xh" => 27,
        "xl" => 26,
        _ => {
            let n = name.strip_prefix('r')?;
            if n.is_empty() || n.len() > 2 || !n.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let n: i32 = n.parse().ok()?;
            return (n <= 31).then_some(n);
        }
    })
}

pub fn fuse(name: &str) -> Option<u8> {
    Some(match name {
        "ckout" => 4,
        "wdton" => 2,
        "rstdisbl" => 1,
        _ => return None,
    })
}
