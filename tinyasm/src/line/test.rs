use expect_test::{expect, Expect};

fn check(src: &str, expect: Expect) {
    let line = super::split(src);
    expect.assert_eq(&format!(
        "label: {:?}\nparts: {:?}\ncomment: {:?}",
        line.label, line.parts, line.comment
    ));
}

#[test]
fn empty() {
    check(
        "   \t ",
        expect![[r#"
            label: None
            parts: []
            comment: None"#]],
    );
}

#[test]
fn comment_only() {
    check(
        "  ; set up the stack",
        expect![[r#"
            label: None
            parts: []
            comment: Some("; set up the stack")"#]],
    );
    check(
        "// slashes too",
        expect![[r#"
            label: None
            parts: []
            comment: Some("// slashes too")"#]],
    );
}

#[test]
fn instruction() {
    check(
        "\tadd   r1,  r0 ; sum",
        expect![[r#"
            label: None
            parts: ["add", "r1", "r0"]
            comment: Some("; sum")"#]],
    );
    check(
        "ldi r16, high( 0x1234 )// top byte",
        expect![[r#"
            label: None
            parts: ["ldi", "r16", "high( 0x1234 )"]
            comment: Some("// top byte")"#]],
    );
}

#[test]
fn labels() {
    check(
        "loop: rjmp loop",
        expect![[r#"
            label: Some("loop")
            parts: ["rjmp", "loop"]
            comment: None"#]],
    );
    check(
        "done:",
        expect![[r#"
            label: Some("done")
            parts: []
            comment: None"#]],
    );
    // a register pair is not a label
    check(
        "adiw r25:r24, 1",
        expect![[r#"
            label: None
            parts: ["adiw", "r25:r24", "1"]
            comment: None"#]],
    );
}

#[test]
fn quoted_operands() {
    check(
        "msg: .db 'a; b, c', 0 ; text",
        expect![[r#"
            label: Some("msg")
            parts: [".db", "'a; b, c'", "0"]
            comment: Some("; text")"#]],
    );
}

#[test]
fn empty_operands_are_skipped() {
    check(
        ".fuses wdton,, ckout,",
        expect![[r#"
            label: None
            parts: [".fuses", "wdton", "ckout"]
            comment: None"#]],
    );
}
