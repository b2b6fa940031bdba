use std::fs;

use ahash::AHashMap;
use expect_test::expect;

use super::{parse_props, DeviceSource, Devices};
use crate::DeviceError;

#[test]
fn props_formats() {
    let props = parse_props(
        "
        # comment
        ! also a comment
        PINB=0x00
        DDRB : 0x01
        PORTB 0x02
        SIZE = end - start + 1
        EMPTY
        ",
    );
    expect![[r#"
        [
            (
                "PINB",
                "0x00",
            ),
            (
                "DDRB",
                "0x01",
            ),
            (
                "PORTB",
                "0x02",
            ),
            (
                "SIZE",
                "end - start + 1",
            ),
            (
                "EMPTY",
                "",
            ),
        ]
    "#]]
    .assert_debug_eq(&props);
}

#[test]
fn builtin_family() {
    let devices = Devices::default();
    for name in ["attiny4", "attiny5", "attiny9", "attiny10"] {
        let props = devices.load(name).unwrap();
        assert!(props.iter().any(|(k, v)| k == "PORTB" && v == "0x02"), "{name}");
    }
    assert!(matches!(
        devices.load("atmega328p"),
        Err(DeviceError::Unknown(name)) if name == "atmega328p"
    ));
}

#[test]
fn directories_come_first() {
    let dir = std::env::temp_dir().join(format!("tinyasm-devices-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("attiny10.props"), "PORTB=0x12\n").unwrap();
    fs::write(dir.join("custom.props"), "LED=3\n").unwrap();

    let devices = Devices::new(vec![dir.clone()]);
    assert_eq!(
        devices.load("attiny10").unwrap(),
        [("PORTB".to_owned(), "0x12".to_owned())]
    );
    assert_eq!(
        devices.load("custom").unwrap(),
        [("LED".to_owned(), "3".to_owned())]
    );
    // not in the directory, so built in
    assert!(devices.load("attiny4").unwrap().len() > 1);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn map_source() {
    let mut map = AHashMap::new();
    map.insert("board".to_owned(), "LED=1\nBUTTON=led + 1\n".to_owned());
    assert_eq!(map.load("board").unwrap().len(), 2);
    assert!(map.load("attiny10").is_err());
}
