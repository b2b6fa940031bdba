//! Infix expression parser and evaluator.
//!
//! Expressions are converted to a postfix [`Program`] with [`parse`] and run
//! against a [`Scope`] with [`eval`]. Integers are arbitrary precision,
//! `&&`/`||` short-circuit, and callers may register extra functions on an
//! [`Evaluator`].
//!
//! Operators of equal precedence in the arithmetic, shift, comparison and
//! equality groups associate left, so `8 - 2 - 1` is `5`. Sources written
//! for the ATtiny10 IDE evaluator, which groups every operator right to
//! left and gives `7`, may need parentheses. Bitwise and boolean operators
//! group right to left here too.

use std::fmt;

use ahash::AHashMap;
use string_interner::{DefaultBackend, DefaultSymbol, StringInterner};

pub mod eval;
pub mod lex;
pub mod parse;
mod value;

pub use eval::{EvalError, FnScope, Scope};
pub use parse::ParseError;
pub use value::Value;

/// Functions every [`Evaluator`] knows about.
pub const BUILTINS: [&str; 5] = ["max", "min", "high", "low", "abs"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Var(DefaultSymbol),
    Num(DefaultSymbol),
    Str(DefaultSymbol),
    Func(DefaultSymbol),
    Op(Op),
    /// Checks the left operand of `&&`/`||` and skips to the matching
    /// [`Token::Logic`] when the right operand cannot change the result.
    Guard(Logic, u32),
    Logic(Logic, u32),
    Comma,
}

impl Token {
    /// Operator precedence, 1 is the loosest binding.
    pub fn prec(&self) -> u8 {
        match self {
            Self::Op(op) => op.prec(),
            Self::Guard(..) => 2,
            Self::Logic(..) => 1,
            Self::Func(_) => 10,
            _ => 0,
        }
    }
    pub fn shortcut_id(&self) -> Option<u32> {
        match self {
            Self::Guard(_, id) | Self::Logic(_, id) => Some(*id),
            _ => None,
        }
    }
    /// Arithmetic and comparison operators group left to right. Everything
    /// else, including the short-circuit pairs, groups right to left.
    pub fn binds_left(&self) -> bool {
        matches!(self, Self::Op(op) if (3..=7).contains(&op.prec()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Or,
    And,
    Xor,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Shl,
    Shr,
    Ushr,
    Sub,
    Add,
    Div,
    Mul,
    Rem,
    Not,
    Open,
    Close,
}

impl Op {
    pub const fn prec(self) -> u8 {
        use Op::*;
        match self {
            Or | And | Xor => 1,
            Eq | Ne => 3,
            Lt | Le | Gt | Ge => 4,
            Shl | Shr | Ushr => 5,
            Sub | Add => 6,
            Div | Mul | Rem => 7,
            Not => 8,
            Open | Close => 9,
        }
    }
    pub const fn symbol(self) -> &'static str {
        use Op::*;
        match self {
            Or => "|",
            And => "&",
            Xor => "^",
            Eq => "==",
            Ne => "!=",
            Lt => "<",
            Le => "<=",
            Gt => ">",
            Ge => ">=",
            Shl => "<<",
            Shr => ">>",
            Ushr => ">>>",
            Sub => "-",
            Add => "+",
            Div => "/",
            Mul => "*",
            Rem => "%",
            Not => "!",
            Open => "(",
            Close => ")",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logic {
    And,
    Or,
}

impl Logic {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
        }
    }
    pub const fn guard_symbol(self) -> &'static str {
        match self {
            Self::And => "S&",
            Self::Or => "S|",
        }
    }
    /// The non-short-circuit operator applied once both operands are known.
    pub const fn op(self) -> Op {
        match self {
            Self::And => Op::And,
            Self::Or => Op::Or,
        }
    }
}

/// A parsed expression in postfix order.
#[derive(Debug, Clone)]
pub struct Program {
    pub si: StringInterner<DefaultBackend>,
    /// The whole infix expression, kept for diagnostics.
    pub source: String,
    pub tokens: Vec<Token>,
}

impl Program {
    pub fn resolve(&self, sym: DefaultSymbol) -> &str {
        self.si.resolve(sym).unwrap_or_default()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tok) in self.tokens.iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            match *tok {
                Token::Var(s) | Token::Num(s) | Token::Func(s) => f.write_str(self.resolve(s))?,
                Token::Str(s) => write!(f, "'{}'", self.resolve(s))?,
                Token::Op(op) => f.write_str(op.symbol())?,
                Token::Guard(l, id) => write!(f, "{}:{id}", l.guard_symbol())?,
                Token::Logic(l, id) => write!(f, "{}:{id}", l.symbol())?,
                Token::Comma => f.write_str(",")?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
    #[error("error parsing '{expr}': {kind}")]
    Parse { expr: String, kind: ParseError },
    #[error("error evaluating '{expr}': {kind}")]
    Eval { expr: String, kind: EvalError },
}

/// Receives the argument on top of the stack and the remaining stack, so
/// functions taking more than one argument pop the rest themselves.
pub type ExternalFn = Box<dyn Fn(Value, &mut Vec<Value>) -> Result<Value, EvalError>>;

/// Parser and evaluator with an optional set of caller-supplied functions.
#[derive(Default)]
pub struct Evaluator {
    functions: AHashMap<String, ExternalFn>,
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("Evaluator")
            .field("functions", &names)
            .finish()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_function(
        mut self,
        name: &str,
        func: impl Fn(Value, &mut Vec<Value>) -> Result<Value, EvalError> + 'static,
    ) -> Self {
        self.functions.insert(name.to_lowercase(), Box::new(func));
        self
    }

    pub fn is_function(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        BUILTINS.contains(&name.as_str()) || self.functions.contains_key(&name)
    }

    pub fn parse(&self, expr: &str) -> Result<Program, ExprError> {
        parse::parse_with(expr, &|name| self.is_function(name)).map_err(|kind| ExprError::Parse {
            expr: expr.to_owned(),
            kind,
        })
    }

    pub fn eval<S: Scope + ?Sized>(&self, program: &Program, scope: &S) -> Result<Value, ExprError> {
        eval::run(program, scope, &self.functions).map_err(|kind| ExprError::Eval {
            expr: program.source.clone(),
            kind,
        })
    }

    /// Parses and evaluates in one step.
    pub fn eval_str<S: Scope + ?Sized>(&self, expr: &str, scope: &S) -> Result<Value, ExprError> {
        self.eval(&self.parse(expr)?, scope)
    }
}

/// Parses with only the built-in functions.
pub fn parse(expr: &str) -> Result<Program, ExprError> {
    Evaluator::default().parse(expr)
}

/// Evaluates with only the built-in functions.
pub fn eval<S: Scope + ?Sized>(program: &Program, scope: &S) -> Result<Value, ExprError> {
    Evaluator::default().eval(program, scope)
}
