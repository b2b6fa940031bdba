use string_interner::{DefaultBackend, StringInterner};

use crate::{Logic, Op, ParseError, Token};

#[cfg(test)]
mod test;

#[derive(Debug)]
pub struct LexOutput {
    pub si: StringInterner<DefaultBackend>,
    pub tokens: Vec<Token>,
}

/// Splits `src` into infix tokens. Identifiers for which `is_function`
/// returns true become [`Token::Func`].
pub fn lex_all(src: &str, is_function: &dyn Fn(&str) -> bool) -> Result<LexOutput, ParseError> {
    let mut lexer = Lexer::new(src, is_function);
    while lexer.advance()? {}
    Ok(lexer.finish())
}

pub use private::Lexer;

mod private {
    use std::str::Chars;

    use string_interner::{DefaultBackend, StringInterner};

    use super::LexOutput;
    use crate::Token;

    pub struct Lexer<'a> {
        src: &'a str,
        chars: Chars<'a>,
        pos: usize,
        next_id: u32,
        si: StringInterner<DefaultBackend>,
        tokens: Vec<Token>,
        pub(super) is_function: &'a dyn Fn(&str) -> bool,
    }

    const EOF_CHAR: char = '\0';

    impl<'a> Lexer<'a> {
        pub(crate) fn new(src: &'a str, is_function: &'a dyn Fn(&str) -> bool) -> Self {
            Self {
                src,
                chars: src.chars(),
                pos: 0,
                next_id: 0,
                si: StringInterner::default(),
                tokens: Vec::new(),
                is_function,
            }
        }
        pub(crate) fn finish(self) -> LexOutput {
            LexOutput {
                si: self.si,
                tokens: self.tokens,
            }
        }
        pub(crate) fn first(&self) -> char {
            self.chars.clone().next().unwrap_or(EOF_CHAR)
        }
        pub(crate) fn second(&self) -> char {
            let mut iter = self.chars.clone();
            iter.next();
            iter.next().unwrap_or(EOF_CHAR)
        }
        pub(crate) fn bump(&mut self) -> Option<char> {
            let c = self.chars.next()?;
            self.pos += c.len_utf8();
            Some(c)
        }
        pub(crate) fn eat_while(&mut self, mut predicate: impl FnMut(char) -> bool) {
            while !self.is_eof() && predicate(self.first()) {
                self.bump();
            }
        }
        pub(crate) fn is_eof(&self) -> bool {
            self.chars.as_str().is_empty()
        }
        pub(crate) fn pos(&self) -> usize {
            self.pos
        }
        pub(crate) fn slice(&self, from: usize) -> &'a str {
            &self.src[from..self.pos]
        }
        pub(crate) fn intern(&mut self, s: &str) -> string_interner::DefaultSymbol {
            self.si.get_or_intern(s)
        }
        pub(crate) fn push(&mut self, tok: Token) {
            self.tokens.push(tok);
        }
        pub(crate) fn last(&self) -> Option<&Token> {
            self.tokens.last()
        }
        pub(crate) fn next_id(&mut self) -> u32 {
            let id = self.next_id;
            self.next_id += 1;
            id
        }
    }
}

impl Lexer<'_> {
    pub fn advance(&mut self) -> Result<bool, ParseError> {
        let start = self.pos();
        let Some(ch) = self.bump() else {
            return Ok(false);
        };
        match ch {
            _ if ch.is_whitespace() => (),
            _ if ch.is_ascii_digit() || ch == '.' => self.number(start),
            '+' | '-' if self.first().is_ascii_digit() => self.number(start),
            _ if ch.is_alphabetic() || ch == '_' => self.ident(start),
            '\'' => self.string(start)?,
            _ => self.operator(ch, start)?,
        }
        Ok(true)
    }

    fn ident(&mut self, start: usize) {
        self.eat_while(is_id_continue);
        let name = self.slice(start);
        let sym = self.intern(name);
        let tok = if (self.is_function)(name) {
            Token::Func(sym)
        } else {
            Token::Var(sym)
        };
        self.push(tok);
    }

    fn string(&mut self, start: usize) -> Result<(), ParseError> {
        let body = self.pos();
        loop {
            match self.bump() {
                Some('\'') => break,
                Some(_) => (),
                None => return Err(ParseError::UnterminatedString(start)),
            }
        }
        let text = &self.slice(body)[..self.pos() - body - 1];
        let sym = self.intern(text);
        self.push(Token::Str(sym));
        Ok(())
    }

    // A leading sign is scanned as part of the literal and split back out
    // when the literal follows a value, so `3-1` subtracts but `-1` does not.
    fn number(&mut self, start: usize) {
        let signed = matches!(self.slice(start), "+" | "-");
        let digits = if signed { start + 1 } else { start };
        loop {
            let c = self.first();
            let text = &self.slice(start)[digits - start..];
            let hex = text.len() >= 2 && matches!(&text[..2], "0x" | "0X");
            let accept = c.is_ascii_digit()
                || c == '.'
                || (text == "0" && matches!(c, 'x' | 'X'))
                || (hex && c.is_ascii_hexdigit());
            if !accept || self.is_eof() {
                break;
            }
            self.bump();
        }
        let text = self.slice(start);
        if signed && self.follows_value() {
            let op = if text.starts_with('-') { Op::Sub } else { Op::Add };
            self.push(Token::Op(op));
            let sym = self.intern(&text[1..]);
            self.push(Token::Num(sym));
        } else {
            let sym = self.intern(text);
            self.push(Token::Num(sym));
        }
    }

    fn follows_value(&self) -> bool {
        matches!(
            self.last(),
            Some(Token::Num(_) | Token::Var(_) | Token::Str(_) | Token::Op(Op::Close))
        )
    }

    fn operator(&mut self, ch: char, start: usize) -> Result<(), ParseError> {
        use Op::*;
        let next = self.first();
        let op = match ch {
            '<' if next == '=' => self.then(Le),
            '>' if next == '=' => self.then(Ge),
            '=' if next == '=' => self.then(Eq),
            '!' if next == '=' => self.then(Ne),
            '<' if next == '<' => self.then(Shl),
            '>' if next == '>' && self.second() == '>' => {
                self.bump();
                self.then(Ushr)
            }
            '>' if next == '>' => self.then(Shr),
            '&' if next == '&' => {
                self.bump();
                return Ok(self.shortcut(Logic::And));
            }
            '|' if next == '|' => {
                self.bump();
                return Ok(self.shortcut(Logic::Or));
            }
            ',' => {
                self.push(Token::Comma);
                return Ok(());
            }
            '&' => And,
            '|' => Or,
            '^' => Xor,
            '<' => Lt,
            '>' => Gt,
            '!' => Not,
            '+' => Add,
            '-' => Sub,
            '*' => Mul,
            '/' => Div,
            '%' => Rem,
            '(' => Open,
            ')' => Close,
            _ => return Err(ParseError::UnexpectedChar(ch, start)),
        };
        self.push(Token::Op(op));
        Ok(())
    }

    fn then(&mut self, op: Op) -> Op {
        self.bump();
        op
    }

    fn shortcut(&mut self, logic: Logic) {
        let id = self.next_id();
        self.push(Token::Guard(logic, id));
        self.push(Token::Logic(logic, id));
    }
}

fn is_id_continue(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '.' | '_' | ':')
}
