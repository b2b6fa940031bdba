use ahash::AHashMap;
use expect_test::expect;
use tiny_expr::Value;

use crate::{hex, AsmError, Assembler, Config, Segment};

fn assemble(src: &str) -> Assembler {
    let mut asm = Assembler::default();
    asm.assemble(src).unwrap();
    asm
}

#[test]
fn add_encodes_little_endian() {
    let asm = assemble(".cseg\nadd r1,r0\n");
    assert_eq!(asm.bytes(), [0x10, 0x0C]);
    assert_eq!(asm.error_count(), 0);
}

#[test]
fn relative_jump_to_previous_word() {
    let asm = assemble(".cseg\nnop\nrjmp pc-1\n");
    assert_eq!(asm.word(1), Some(0xCFFE));
}

#[test]
fn fuses() {
    let asm = assemble(".fuses wdton\n");
    assert_eq!(asm.fuses(), 0xFD);
    assert!(asm.hex().contains("\n*D\n"));
    assert!(asm.listing().starts_with("Fuses: 0xFD\n"));

    let asm = assemble(".fuses ckout, rstdisbl\n");
    assert_eq!(asm.fuses(), 0xFA);

    let asm = assemble(".fuses bogus\n");
    assert_eq!(asm.error_count(), 1);
    assert_eq!(asm.fuses(), 0xFF);
}

#[test]
fn program() {
    let asm = assemble(
        "; blink
.device attiny10
.cseg
.equ LED = 2
        sbi DDRB, LED      ; output
loop:   sbi PINB, LED
        rjmp loop
msg:    .db 'Hi', 0
",
    );
    assert_eq!(asm.error_count(), 0);
    expect![[r#"
        Fuses: 0xFF
        ; blink
        0000: 9A0A  sbi DDRB LED        ; output
        loop:
        0001: 9A02  sbi PINB LED
        0002: CFFE  rjmp loop
        msg:
        0003: 6948  .db 'Hi' 0
        0004: 0000
    "#]]
    .assert_eq(&asm.listing());
    expect![[r#"
        :020000020000FC
        *F
        :0A0000000A9A029AFECF4869000038
        :00000001FF
    "#]]
    .assert_eq(&asm.hex());
    assert_eq!(hex::read(&asm.hex()).unwrap().data, asm.bytes());
}

#[test]
fn undefined_label_does_not_stop_assembly() {
    let asm = assemble(".cseg\nrjmp missing\nnop\nldi r16, 1\n");
    assert_eq!(asm.error_count(), 1);
    assert_eq!(
        asm.notes(0),
        ["* * * Err: rjmp missing - Unknown symbol 'missing'"]
    );
    assert_eq!(asm.word(0), Some(0xFFFF));
    assert_eq!(asm.word(1), Some(0x0000));
    assert_eq!(asm.word(2), Some(0xE001));
}

#[test]
fn unknown_lines_take_no_space() {
    let asm = assemble(".cseg\nfrob\nnop\n");
    assert_eq!(asm.notes(0), ["* * * Err: frob - Unknown: frob"]);
    assert_eq!(asm.bytes(), [0x00, 0x00]);
    assert_eq!(asm.error_count(), 1);
    assert_eq!(asm.listing().matches("Err").count(), asm.error_count());
}

#[test]
fn unsupported_directives_keep_addresses() {
    let asm = assemble(".cseg\n.list\nstart: nop\n.include tn10def.inc\nnop r1\nrjmp start\n");
    assert_eq!(asm.symbol("start"), Some(&Value::int(0)));
    assert_eq!(asm.bytes(), [0x00, 0x00, 0xFE, 0xCF]);
    assert_eq!(asm.error_count(), 3);
    assert_eq!(
        asm.notes(1),
        [
            "* * * Err: .include tn10def.inc - Unknown: .include tn10def.inc",
            "* * * Err: nop r1 - expected 0 operands, got 1",
        ]
    );
}

#[test]
fn failed_operands_take_a_word() {
    let asm = assemble(".cseg\npush nowhere\nnop\n");
    assert_eq!(
        asm.notes(0),
        ["* * * Err: push nowhere - Unknown symbol 'nowhere'"]
    );
    assert_eq!(asm.bytes(), [0xFF, 0xFF, 0x00, 0x00]);
}

#[test]
fn same_output_every_run() {
    let src = ".cseg\nstart: ldi r16, 0x10\nloop: dec r16\nbrne loop\nrjmp start\n";
    let (a, b) = (assemble(src), assemble(src));
    assert_eq!(a.hex(), b.hex());
    assert_eq!(a.listing(), b.listing());
}

#[test]
fn segments() {
    let asm = assemble(".dseg\nbuf: .byte 4\nflag: .byte 1\n.cseg\nlds r16, flag\n");
    assert_eq!(asm.symbol("buf"), Some(&Value::int(0x40)));
    assert_eq!(asm.symbol("FLAG"), Some(&Value::int(0x44)));
    assert_eq!(asm.segment(), Segment::Code);
    // lds r16, 0x44
    assert_eq!(asm.word(0), Some(0xA104));
}

#[test]
fn data_needs_code_segment() {
    let asm = assemble(".db 1\n.dw 2\n.cseg\nnop\n");
    assert_eq!(asm.error_count(), 2);
    assert_eq!(
        asm.notes(0),
        [
            ".db directive doesn't work in DSEG",
            ".dw directive doesn't work in DSEG"
        ]
    );
    assert_eq!(asm.bytes(), [0x00, 0x00]);
}

#[test]
fn data_words() {
    let asm = assemble(".cseg\n.dw 0x1234, 0xABCD\n.db 1, 2, 3\n");
    assert_eq!(
        asm.bytes(),
        [0x34, 0x12, 0xCD, 0xAB, 0x01, 0x02, 0x03, 0x00]
    );
}

#[test]
fn origin() {
    let asm = assemble(".cseg\n.org 0x10\nnop\n");
    assert_eq!(asm.bytes().len(), 0x22);
    assert_eq!(asm.word(0x0F), Some(0xFFFF));
    assert_eq!(asm.word(0x10), Some(0x0000));
    assert_eq!(asm.notes(0x10), [".org 0x10"]);
}

#[test]
fn equates_are_expressions() {
    let asm = assemble(".equ base = 0x40\n.equ top = max(base + 0x1F, 0x10)\n.def temp = r16\n");
    assert_eq!(asm.symbol("top"), Some(&Value::int(0x5F)));
    assert_eq!(asm.symbol("temp"), Some(&Value::int(16)));

    let asm = assemble(".equ broken\n");
    assert_eq!(asm.error_count(), 1);
}

#[test]
fn devices() {
    let asm = assemble(".device ATtiny10\n");
    assert_eq!(asm.error_count(), 0);
    assert_eq!(asm.symbol("pinb"), Some(&Value::int(0)));
    assert_eq!(asm.symbol("SRAM_SIZE"), Some(&Value::int(32)));

    let asm = assemble(".device attiny85\n");
    assert_eq!(asm.notes(0), ["unknown device type: attiny85"]);

    let mut board = AHashMap::new();
    board.insert("board".to_owned(), "LED=3\nBAD=nope + 1\n".to_owned());
    let mut asm = Assembler::default().with_devices(board);
    asm.assemble(".device board\n").unwrap();
    assert_eq!(asm.symbol("led"), Some(&Value::int(3)));
    assert_eq!(asm.notes(0), ["Bad device symbol: BAD: nope + 1"]);
}

#[test]
fn capacity() {
    let mut asm = Assembler::new(Config {
        capacity: 4,
        ..Config::default()
    });
    let err = asm.assemble(".cseg\nnop\nnop\nnop\n").unwrap_err();
    assert!(matches!(
        err,
        AsmError::Capacity {
            needed: 6,
            capacity: 4
        }
    ));
}

#[test]
fn capacity_stays_within_hex_addresses() {
    let mut asm = Assembler::new(Config {
        capacity: 0x20000,
        ..Config::default()
    });
    let err = asm
        .assemble(".cseg\nnop\n.org 0x8000\nldi r16, 1\n")
        .unwrap_err();
    assert!(matches!(
        err,
        AsmError::Capacity {
            needed: 0x10002,
            capacity: 0x10000
        }
    ));
}
