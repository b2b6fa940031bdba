use expect_test::{expect, Expect};

use crate::{ParseError, Token};

fn check(src: &str, expect: Expect) {
    let out = super::lex_all(src, &|name| crate::BUILTINS.contains(&name)).unwrap();
    let resolve = |s| out.si.resolve(s).unwrap_or_default();
    let tokens = out
        .tokens
        .iter()
        .map(|tok| match *tok {
            Token::Var(s) => format!("Var({})", resolve(s)),
            Token::Num(s) => format!("Num({})", resolve(s)),
            Token::Str(s) => format!("Str({})", resolve(s)),
            Token::Func(s) => format!("Func({})", resolve(s)),
            tok => format!("{tok:?}"),
        })
        .collect::<Vec<_>>()
        .join("\n");
    expect.assert_eq(&tokens);
}

fn check_err(src: &str, expected: ParseError) {
    let err = super::lex_all(src, &|_| false).unwrap_err();
    assert_eq!(err, expected);
}

#[test]
fn empty() {
    check("", expect![[r#""#]]);
    check(" \t ", expect![[r#""#]]);
}

#[test]
fn numbers() {
    check(
        "12 0x1F 0XaB .5",
        expect![[r#"
            Num(12)
            Num(0x1F)
            Num(0XaB)
            Num(.5)"#]],
    );
}

#[test]
fn signed_literal() {
    check(
        "-8 >> 2",
        expect![[r#"
            Num(-8)
            Op(Shr)
            Num(2)"#]],
    );
}

#[test]
fn sign_after_value_is_operator() {
    check(
        "3-1+x-2",
        expect![[r#"
            Num(3)
            Op(Sub)
            Num(1)
            Op(Add)
            Var(x)
            Op(Sub)
            Num(2)"#]],
    );
    check(
        "a - -1",
        expect![[r#"
            Var(a)
            Op(Sub)
            Num(-1)"#]],
    );
}

#[test]
fn operators() {
    check(
        "<= >= == != << >> >>> < > ! & | ^ % * /",
        expect![[r#"
            Op(Le)
            Op(Ge)
            Op(Eq)
            Op(Ne)
            Op(Shl)
            Op(Shr)
            Op(Ushr)
            Op(Lt)
            Op(Gt)
            Op(Not)
            Op(And)
            Op(Or)
            Op(Xor)
            Op(Rem)
            Op(Mul)
            Op(Div)"#]],
    );
}

#[test]
fn short_circuit_pairs() {
    check(
        "a && b || c",
        expect![[r#"
            Var(a)
            Guard(And, 0)
            Logic(And, 0)
            Var(b)
            Guard(Or, 1)
            Logic(Or, 1)
            Var(c)"#]],
    );
}

#[test]
fn functions_and_strings() {
    check(
        "max(V1, 'a b') + foo.bar",
        expect![[r#"
            Func(max)
            Op(Open)
            Var(V1)
            Comma
            Str(a b)
            Op(Close)
            Op(Add)
            Var(foo.bar)"#]],
    );
}

#[test]
fn errors() {
    check_err("'abc", ParseError::UnterminatedString(0));
    check_err("1 # 2", ParseError::UnexpectedChar('#', 2));
}
