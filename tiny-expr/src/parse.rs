use crate::lex::{lex_all, LexOutput};
use crate::{Op, Program, Token};


#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected character '{0}' at {1}")]
    UnexpectedChar(char, usize),
    #[error("unterminated string starting at {0}")]
    UnterminatedString(usize),
    #[error("')' without a matching '('")]
    UnbalancedParen,
}

pub(crate) fn parse_with(src: &str, is_function: &dyn Fn(&str) -> bool) -> Result<Program, ParseError> {
    let LexOutput { si, tokens } = lex_all(src, is_function)?;
    Ok(Program {
        si,
        source: src.to_owned(),
        tokens: to_postfix(tokens)?,
    })
}

/// Shunting-yard conversion from infix to postfix order.
///
/// A function name left directly below an opening parenthesis is emitted
/// when that parenthesis closes, which places `max` after both of its
/// arguments in `max(a, b)`.
pub fn to_postfix(tokens: Vec<Token>) -> Result<Vec<Token>, ParseError> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Token> = Vec::new();
    for tok in tokens {
        match tok {
            Token::Var(_) | Token::Num(_) | Token::Str(_) => out.push(tok),
            Token::Op(Op::Open) => stack.push(tok),
            Token::Op(Op::Close) => {
                loop {
                    match stack.pop() {
                        Some(Token::Op(Op::Open)) => break,
                        Some(top) => out.push(top),
                        None => return Err(ParseError::UnbalancedParen),
                    }
                }
                if let Some(&top @ Token::Func(_)) = stack.last() {
                    stack.pop();
                    out.push(top);
                }
            }
            // arguments are separated, the call itself stays on the stack
            Token::Comma => {
                while let Some(&top) = stack.last() {
                    if top == Token::Op(Op::Open) {
                        break;
                    }
                    stack.pop();
                    out.push(top);
                }
            }
            _ => {
                while let Some(&top) = stack.last() {
                    if top == Token::Op(Op::Open) || !yields(top, tok) {
                        break;
                    }
                    stack.pop();
                    out.push(top);
                }
                stack.push(tok);
            }
        }
    }
    // unclosed '(' are dropped
    out.extend(
        stack
            .into_iter()
            .rev()
            .filter(|t| *t != Token::Op(Op::Open)),
    );
    Ok(out)
}

/// Whether `top` must be output before `incoming` is pushed.
fn yields(top: Token, incoming: Token) -> bool {
    top.prec() > incoming.prec() || (top.prec() == incoming.prec() && incoming.binds_left())
}
