use std::collections::HashMap;
use std::hash::BuildHasher;

use ahash::AHashMap;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::{ExternalFn, Op, Program, Token, Value};

#[cfg(test)]
mod test;

/// Shifts by more than this many bits are rejected.
pub const MAX_SHIFT: i64 = 1 << 16;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("'{op}' cannot be applied to {lhs} and {rhs}")]
    TypeMismatch { op: String, lhs: Value, rhs: Value },
    #[error("'{op}' cannot be applied to {arg}")]
    BadOperand { op: String, arg: Value },
    #[error("'{0}' is missing an operand")]
    MissingOperand(String),
    #[error("{0} values left on the stack")]
    Leftover(usize),
    #[error("no value left on the stack")]
    Empty,
    #[error("unknown function '{0}'")]
    UnresolvedFunction(String),
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("modulus {0} is not positive")]
    Modulus(BigInt),
    #[error("shift by {0} is out of range")]
    ShiftRange(BigInt),
}

/// Supplies values for the variables of an expression. Unbound names
/// evaluate to [`Value::Null`].
pub trait Scope {
    fn lookup(&self, name: &str) -> Option<Value>;
}

impl<S: BuildHasher> Scope for HashMap<String, Value, S> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl Scope for AHashMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl Scope for () {
    fn lookup(&self, _: &str) -> Option<Value> {
        None
    }
}

impl<T: Scope + ?Sized> Scope for &T {
    fn lookup(&self, name: &str) -> Option<Value> {
        (**self).lookup(name)
    }
}

/// Adapts a closure into a [`Scope`].
pub struct FnScope<F>(pub F);

impl<F: Fn(&str) -> Option<Value>> Scope for FnScope<F> {
    fn lookup(&self, name: &str) -> Option<Value> {
        (self.0)(name)
    }
}

pub(crate) fn run<S: Scope + ?Sized>(
    program: &Program,
    scope: &S,
    functions: &AHashMap<String, ExternalFn>,
) -> Result<Value, EvalError> {
    let mut stack: Vec<Value> = Vec::new();
    let mut skip_to = None;
    for tok in &program.tokens {
        if let Some(id) = skip_to {
            if tok.shortcut_id() == Some(id) {
                skip_to = None;
            }
            continue;
        }
        match *tok {
            Token::Num(sym) => stack.push(Value::Int(number(program.resolve(sym))?)),
            Token::Str(sym) => stack.push(Value::Str(program.resolve(sym).to_owned())),
            Token::Var(sym) => stack.push(match program.resolve(sym) {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                "null" => Value::Null,
                name => scope.lookup(name).unwrap_or(Value::Null),
            }),
            Token::Op(Op::Not) => {
                let arg = pop(&mut stack, "!")?;
                stack.push(not(arg)?);
            }
            Token::Op(Op::Open | Op::Close) | Token::Comma => (),
            Token::Op(op) => {
                let rhs = pop(&mut stack, op.symbol())?;
                let lhs = pop(&mut stack, op.symbol())?;
                stack.push(binary(op, op.symbol(), lhs, rhs)?);
            }
            Token::Guard(logic, id) => {
                let top = stack
                    .last()
                    .ok_or_else(|| EvalError::MissingOperand(logic.symbol().to_owned()))?;
                let Value::Bool(b) = top else {
                    return Err(EvalError::BadOperand {
                        op: logic.symbol().to_owned(),
                        arg: top.clone(),
                    });
                };
                // false && _ and true || _ are already decided
                if *b == matches!(logic, crate::Logic::Or) {
                    skip_to = Some(id);
                }
            }
            Token::Logic(logic, _) => {
                let rhs = pop(&mut stack, logic.symbol())?;
                let lhs = pop(&mut stack, logic.symbol())?;
                stack.push(binary(logic.op(), logic.symbol(), lhs, rhs)?);
            }
            Token::Func(sym) => {
                let arg = stack.pop().unwrap_or(Value::Null);
                let value = call(program.resolve(sym), arg, &mut stack, functions)?;
                stack.push(value);
            }
        }
    }
    match stack.len() {
        0 => Err(EvalError::Empty),
        1 => stack.pop().ok_or(EvalError::Empty),
        n => Err(EvalError::Leftover(n)),
    }
}

fn pop(stack: &mut Vec<Value>, op: &str) -> Result<Value, EvalError> {
    stack
        .pop()
        .ok_or_else(|| EvalError::MissingOperand(op.to_owned()))
}

fn number(text: &str) -> Result<BigInt, EvalError> {
    let (neg, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let parsed = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => BigInt::parse_bytes(hex.as_bytes(), 16),
        None => BigInt::parse_bytes(digits.as_bytes(), 10),
    };
    let value = parsed.ok_or_else(|| EvalError::InvalidNumber(text.to_owned()))?;
    Ok(if neg { -value } else { value })
}

fn not(arg: Value) -> Result<Value, EvalError> {
    match arg {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        Value::Int(i) => Ok(Value::Int(!i)),
        arg => Err(EvalError::BadOperand {
            op: "!".to_owned(),
            arg,
        }),
    }
}

fn shift_amount(n: &BigInt) -> Result<i64, EvalError> {
    n.to_i64()
        .filter(|n| n.abs() <= MAX_SHIFT)
        .ok_or_else(|| EvalError::ShiftRange(n.clone()))
}

/// Negative amounts shift the other way.
fn shift_left(v: BigInt, n: i64) -> BigInt {
    if n >= 0 {
        v << n as usize
    } else {
        v >> n.unsigned_abs() as usize
    }
}

fn binary(op: Op, sym: &str, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    use Value::*;
    Ok(match (op, lhs, rhs) {
        (Op::Eq, l, r) => Bool(l == r),
        (Op::Ne, l, r) => Bool(l != r),
        (Op::Lt | Op::Le | Op::Gt | Op::Ge, l, r) => {
            let ord = match (&l, &r) {
                (Int(a), Int(b)) => a.cmp(b),
                (Str(a), Str(b)) => a.cmp(b),
                (Bool(a), Bool(b)) => a.cmp(b),
                _ => return Err(mismatch(sym, l, r)),
            };
            Bool(match op {
                Op::Lt => ord.is_lt(),
                Op::Le => ord.is_le(),
                Op::Gt => ord.is_gt(),
                _ => ord.is_ge(),
            })
        }
        (Op::Add, Int(a), Int(b)) => Int(a + b),
        (Op::Add, Int(a), Str(b)) => Str(format!("{a}{b}")),
        (Op::Add, Str(a), r) => Str(format!("{a}{r}")),
        (Op::Sub, Int(a), Int(b)) => Int(a - b),
        (Op::Mul, Int(a), Int(b)) => Int(a * b),
        (Op::Div, Int(a), Int(b)) => {
            if b.is_zero() {
                return Err(EvalError::DivisionByZero);
            }
            Int(a / b)
        }
        (Op::Rem, Int(a), Int(b)) => {
            if !b.is_positive() {
                return Err(EvalError::Modulus(b));
            }
            Int(a.mod_floor(&b))
        }
        (Op::Shl, Int(a), Int(b)) => Int(shift_left(a, shift_amount(&b)?)),
        // division by 2^n, truncating toward zero
        (Op::Shr, Int(a), Int(b)) => {
            let divisor = shift_left(BigInt::from(1), shift_amount(&b)?);
            if divisor.is_zero() {
                return Err(EvalError::DivisionByZero);
            }
            Int(a / divisor)
        }
        (Op::Ushr, Int(a), Int(b)) => Int(shift_left(a, -shift_amount(&b)?)),
        (Op::And, Bool(a), Bool(b)) => Bool(a & b),
        (Op::And, Int(a), Int(b)) => Int(a & b),
        (Op::Or, Bool(a), Bool(b)) => Bool(a | b),
        (Op::Or, Int(a), Int(b)) => Int(a | b),
        (Op::Xor, Bool(a), Bool(b)) => Bool(a ^ b),
        (Op::Xor, Int(a), Int(b)) => Int(a ^ b),
        (_, l, r) => return Err(mismatch(sym, l, r)),
    })
}

fn mismatch(op: &str, lhs: Value, rhs: Value) -> EvalError {
    EvalError::TypeMismatch {
        op: op.to_owned(),
        lhs,
        rhs,
    }
}

fn call(
    name: &str,
    arg: Value,
    stack: &mut Vec<Value>,
    functions: &AHashMap<String, ExternalFn>,
) -> Result<Value, EvalError> {
    let lower = name.to_lowercase();
    match lower.as_str() {
        "max" | "min" => {
            let lhs = pop(stack, name)?;
            let (Value::Int(a), Value::Int(b)) = (&lhs, &arg) else {
                return Err(mismatch(name, lhs, arg));
            };
            let v = if lower == "max" { a.max(b) } else { a.min(b) };
            Ok(Value::Int(v.clone()))
        }
        "high" | "low" | "abs" => {
            let Value::Int(v) = arg else {
                return Err(EvalError::BadOperand {
                    op: name.to_owned(),
                    arg,
                });
            };
            Ok(Value::Int(match lower.as_str() {
                "high" => (v / 256) & BigInt::from(0xFF),
                "low" => v & BigInt::from(0xFF),
                _ => v.abs(),
            }))
        }
        _ => match functions.get(&lower) {
            Some(func) => func(arg, stack),
            None => Err(EvalError::UnresolvedFunction(name.to_owned())),
        },
    }
}
