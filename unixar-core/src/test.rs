use alloc::vec::Vec;
use core::mem;

use crate::{check_magic, pad_len, Error, Field, Header, Member, Mode, HEADER_SIZE, MAGIC};

fn member(name: &[u8], size: u64) -> Member {
    Member {
        name: name.to_vec(),
        mtime: 1_359_300_246,
        uid: 1000,
        gid: 100,
        mode: Mode::FILE | Mode::from_bits_truncate(0o644),
        size,
    }
}

#[test]
fn header_size() {
    assert_eq!(mem::size_of::<Header>(), 60);
    assert_eq!(HEADER_SIZE, 60);
}

#[test]
fn encode_layout() {
    let header = Header::encode(&member(b"hello.txt", 5)).unwrap();
    assert_eq!(
        header.as_bytes(),
        &b"hello.txt/      1359300246  1000  100   100644  5         `\n"[..]
    );
}

#[test]
fn encode_never_writes_nul() {
    let header = Header::encode(&member(b"a", 0)).unwrap();
    assert!(!header.as_bytes().contains(&0));
}

#[test]
fn round_trip() {
    let original = Member {
        name: b"archive.o".to_vec(),
        mtime: 999_999_999_999,
        uid: 999_999,
        gid: 0,
        mode: Mode::from_bits_retain(0o104755),
        size: 9_999_999_999,
    };
    let header = Header::encode(&original).unwrap();
    let decoded = Header::decode(header.as_bytes()).unwrap();
    assert_eq!(decoded, header);
    assert_eq!(decoded.member().unwrap(), original);
}

#[test]
fn display_name_keeps_interior_and_trailing_spaces() {
    let header = Header::encode(&member(b"my file ", 1)).unwrap();
    assert_eq!(header.display_name(), b"my file ");

    let header = Header::encode(&member(b"a b", 1)).unwrap();
    assert_eq!(header.display_name(), b"a b");
}

#[test]
fn display_name_without_slash() {
    let mut header = Header::encode(&member(b"x", 1)).unwrap();
    header.name = *b"bsdname         ";
    assert_eq!(header.display_name(), b"bsdname");
}

#[test]
fn name_overflow() {
    assert_eq!(
        Header::encode(&member(b"fifteen_chars_x", 1)).map(|h| h.display_name().to_vec()),
        Ok(b"fifteen_chars_x".to_vec())
    );
    assert_eq!(
        Header::encode(&member(b"sixteen_chars_xx", 1)),
        Err(Error::FieldOverflow(Field::Name))
    );
}

#[test]
fn invalid_names() {
    assert_eq!(Header::encode(&member(b"", 1)), Err(Error::InvalidName));
    assert_eq!(Header::encode(&member(b"dir/file", 1)), Err(Error::InvalidName));
}

#[test]
fn numeric_overflow() {
    let mut m = member(b"big", 10_000_000_000);
    assert_eq!(Header::encode(&m), Err(Error::FieldOverflow(Field::Size)));

    m.size = 1;
    m.uid = 1_000_000;
    assert_eq!(Header::encode(&m), Err(Error::FieldOverflow(Field::Uid)));
}

#[test]
fn decode_truncated() {
    let header = Header::encode(&member(b"short", 3)).unwrap();
    assert_eq!(
        Header::decode(&header.as_bytes()[..59]),
        Err(Error::Truncated { expected: 60, actual: 59 })
    );
}

#[test]
fn decode_ignores_trailing_data() {
    let header = Header::encode(&member(b"long", 3)).unwrap();
    let mut data = Vec::from(header.as_bytes());
    data.extend_from_slice(b"abc\n");
    assert_eq!(Header::decode(&data), Ok(header));
}

#[test]
fn decode_bad_terminator() {
    let mut data = Vec::from(Header::encode(&member(b"t", 3)).unwrap().as_bytes());
    data[58] = b'x';
    assert_eq!(Header::decode(&data), Err(Error::InvalidTerminator(*b"x\n")));
}

#[test]
fn decode_bad_size() {
    let mut header = Header::encode(&member(b"t", 3)).unwrap();
    header.size = *b"12a       ";
    assert_eq!(header.size(), Err(Error::InvalidField(Field::Size)));

    header.size = [b' '; 10];
    assert_eq!(header.size(), Err(Error::InvalidField(Field::Size)));
}

#[test]
fn blank_ids_read_as_zero() {
    let mut header = Header::encode(&member(b"t", 3)).unwrap();
    header.uid = [b' '; 6];
    header.gid = [b' '; 6];
    assert_eq!(header.uid(), Ok(0));
    assert_eq!(header.gid(), Ok(0));
}

#[test]
fn sizes_and_padding() {
    let header = Header::encode(&member(b"odd", 3)).unwrap();
    assert_eq!(header.total_size(), Ok(63));
    assert_eq!(header.padded_size(), Ok(64));

    let header = Header::encode(&member(b"even", 4)).unwrap();
    assert_eq!(header.padded_size(), Ok(64));

    assert_eq!(pad_len(0), 0);
    assert_eq!(pad_len(7), 1);
}

#[test]
fn mode_bits() {
    let mode = Mode::from_bits_retain(0o106750);
    assert_eq!(mode.perm().bits(), 0o6750);
    assert_eq!(mode.kind(), Mode::FILE);
}

#[test]
fn magic() {
    assert_eq!(check_magic(&MAGIC), Ok(()));
    assert_eq!(check_magic(b"!<arch>\nrest"), Ok(()));
    assert_eq!(check_magic(b"!<arch>"), Err(Error::NotAnArchive));
    assert_eq!(check_magic(b"!<thin>\n"), Err(Error::NotAnArchive));
}
