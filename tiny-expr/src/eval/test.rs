use std::collections::HashMap;

use num_bigint::BigInt;

use crate::{EvalError, Evaluator, ExprError, FnScope, Value};

fn vars(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn eval_with(src: &str, scope: &HashMap<String, Value>) -> Value {
    Evaluator::new().eval_str(src, scope).unwrap()
}

fn eval(src: &str) -> Value {
    eval_with(src, &HashMap::new())
}

fn eval_err(src: &str) -> EvalError {
    match Evaluator::new().eval_str(src, &()) {
        Err(ExprError::Eval { kind, .. }) => kind,
        other => panic!("{src}: expected an evaluation error, got {other:?}"),
    }
}

#[track_caller]
fn check_bool(src: &str, scope: &HashMap<String, Value>, expected: bool) {
    assert_eq!(eval_with(src, scope), Value::Bool(expected), "{src}");
}

#[track_caller]
fn check_int(src: &str, expected: i64) {
    assert_eq!(eval(src), Value::int(expected), "{src}");
}

#[test]
fn comparisons() {
    let none = HashMap::new();
    for (src, expected) in [
        ("11 < 12", true),
        ("11 < 11", false),
        ("12 > 10", true),
        ("11 > 11", false),
        ("12 <= 12", true),
        ("13 <= 12", false),
        ("12 >= 12", true),
        ("13 >= 12", true),
        ("12 >= 13", false),
        ("10 == 10", true),
        ("10 == 11", false),
        ("10 != 10", false),
        ("10 != 11", true),
        ("-2 < -1", true),
        ("'XX' == 'XX'", true),
        ("'XX' != 'YY'", true),
        ("(2 + 2) > (1 + 1)", true),
    ] {
        check_bool(src, &none, expected);
    }
}

#[test]
fn logic() {
    let none = HashMap::new();
    for (src, expected) in [
        ("true & true", true),
        ("true & false", false),
        ("true | false", true),
        ("!true ^ !false", true),
        ("('XX' == 'XX') & true", true),
        ("('XX' < 'XY') & true", true),
    ] {
        check_bool(src, &none, expected);
    }
}

#[test]
fn concatenation() {
    let scope = vars(&[("I", Value::str("X")), ("Q", Value::str("Y"))]);
    for src in [
        "I + Q == 'XY'",
        "'X' + 'Y' == 'XY'",
        "'X' + 10 == 'X10'",
        "10 + 'X' == '10X'",
        "Q + 10 == 'Y10'",
        "10 + Q == '10Y'",
        "'is ' + null == 'is null'",
    ] {
        check_bool(src, &scope, true);
    }
}

#[test]
fn arithmetic() {
    check_int("0xD8", 0xD8);
    check_int("(2 + 2) * (1 + 1)", 8);
    check_int("4 + 2", 6);
    check_int("4 + -2", 2);
    check_int("4 - 2", 2);
    check_int("4 / 2", 2);
    check_int("7 / -2", -3);
    check_int("(2 * (3 + 3)) / 2", 6);
    check_int("10 - 4 - 3", 3);
    check_int("8 - 2 - 1", 5);
    check_int("64 / 4 / 2", 8);
    check_int("(1 ^ (1 | 2)) & 3", 2);
    check_int("(1 ^ !3) & 3", 1);
    check_int("5 % 2", 1);
    check_int("-7 % 3", 2);
}

#[test]
fn shifts() {
    check_int("1 << 2", 4);
    check_int("-1 << 2", -4);
    check_int("4 << -1", 2);
    check_int("8 >> 2", 2);
    check_int("-8 >> 2", -2);
    check_int("-8 >>> 2", -2);
    check_int("-7 >> 1", -3);
    check_int("-7 >>> 1", -4);
}

#[test]
fn big_integers() {
    let big: BigInt = "340282366920938463463374607431768211456".parse().unwrap();
    assert_eq!(eval("1 << 128"), Value::Int(big));
}

#[test]
fn builtins() {
    let scope = vars(&[("A", Value::int(10)), ("B", Value::int(20))]);
    assert_eq!(eval_with("A+B", &scope), Value::int(30));
    assert_eq!(eval_with("max(A,B)", &scope), Value::int(20));
    assert_eq!(eval_with("min(A,B)", &scope), Value::int(10));
    assert_eq!(eval_with("MAX(A,B)", &scope), Value::int(20));
    check_int("high(0x1234)", 0x12);
    check_int("low(0x1234)", 0x34);
    check_int("abs(-2)", 2);
}

#[test]
fn unbound_variables_are_null() {
    let scope = vars(&[("V1", Value::str("1")), ("V3", Value::Null)]);
    check_bool("QQ == '1'", &scope, false);
    check_bool("QQ != '1'", &scope, true);
    check_bool("QQ == null", &scope, true);
    check_bool("V1 == '1'", &scope, true);
}

#[test]
fn short_circuit() {
    let scope = vars(&[
        ("V1", Value::str("1")),
        ("V2", Value::str("2")),
        ("V3", Value::Null),
    ]);
    check_bool("V3 != null  &&  V3 == 'TEST'", &scope, false);
    check_bool("V3 == null  ||  V3 == 'TEST'", &scope, true);
    check_bool("V2 == null  ||  V2 == 'TEST'", &scope, false);
    check_bool("V1 == '1' && V2 == '2' && V3 == null", &scope, true);
}

#[test]
fn short_circuit_skips_right_operand() {
    let untouchable = FnScope(|name: &str| -> Option<Value> {
        panic!("'{name}' should not have been looked up")
    });
    let ev = Evaluator::new();
    assert_eq!(ev.eval_str("false && boom", &untouchable), Ok(Value::Bool(false)));
    assert_eq!(ev.eval_str("true || boom", &untouchable), Ok(Value::Bool(true)));
    assert_eq!(
        ev.eval_str("(1 > 2 && boom > 0) || 3 == 3", &untouchable),
        Ok(Value::Bool(true))
    );
}

#[test]
fn external_function() {
    let ev = Evaluator::new().with_function("reverse", |arg, _| match arg {
        Value::Str(s) => Ok(Value::Str(s.chars().rev().collect())),
        arg => Err(EvalError::BadOperand {
            op: "reverse".to_owned(),
            arg,
        }),
    });
    assert_eq!(ev.eval_str("reverse('XYZ') == 'ZYX'", &()), Ok(Value::Bool(true)));
    assert!(ev.eval_str("reverse(1)", &()).is_err());

    // a program holding an external call cannot run without that function
    let program = ev.parse("reverse('XYZ')").unwrap();
    assert_eq!(
        crate::eval(&program, &()),
        Err(ExprError::Eval {
            expr: "reverse('XYZ')".to_owned(),
            kind: EvalError::UnresolvedFunction("reverse".to_owned()),
        })
    );
}

#[test]
fn errors() {
    assert_eq!(eval_err(""), EvalError::Empty);
    assert_eq!(eval_err("1 2"), EvalError::Leftover(2));
    assert_eq!(eval_err("1 +"), EvalError::MissingOperand("+".to_owned()));
    assert_eq!(eval_err("1 / 0"), EvalError::DivisionByZero);
    assert_eq!(eval_err("5 % -2"), EvalError::Modulus(BigInt::from(-2)));
    assert_eq!(eval_err("5 % 0"), EvalError::Modulus(BigInt::from(0)));
    assert_eq!(
        eval_err("1 << 100000000"),
        EvalError::ShiftRange(BigInt::from(100000000))
    );
    assert_eq!(
        eval_err("1 && true"),
        EvalError::BadOperand {
            op: "&&".to_owned(),
            arg: Value::int(1),
        }
    );
    assert_eq!(
        eval_err("1 - 'a'"),
        EvalError::TypeMismatch {
            op: "-".to_owned(),
            lhs: Value::int(1),
            rhs: Value::str("a"),
        }
    );
    assert_eq!(
        eval_err("1 - 'a'").to_string(),
        "'-' cannot be applied to 1 and a"
    );
}
