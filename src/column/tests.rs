use super::*;

fn encode(column: &Column) -> Vec<u8> {
    let mut bytes = Vec::new();
    column.serialize_into(&mut bytes).unwrap();
    bytes
}

#[test]
fn int64_cells_are_little_endian_words() {
    let mut column = Column::new(ColumnType::Int64);
    column.append_text("1").unwrap();
    column.append_text("-2").unwrap();

    let bytes = encode(&column);
    assert_eq!(bytes.len(), 16);
    assert_eq!(&bytes[..8], &1i64.to_le_bytes());
    assert_eq!(&bytes[8..], &(-2i64).to_le_bytes());
    assert_eq!(column.encoded_size(), 16);
    assert_eq!(column.encoded_size_of_last(), 8);
}

#[test]
fn int64_rejects_non_integer_text() {
    let mut column = Column::new(ColumnType::Int64);
    for cell in ["John", "", " 5", "5 ", "1.5", "1e9", "99999999999999999999"] {
        assert!(column.append_text(cell).is_err(), "{cell:?} should be rejected");
    }
    assert!(column.is_empty());
    assert_eq!(column.encoded_size(), 0);
}

#[test]
fn int64_text_is_canonical() {
    let mut column = Column::new(ColumnType::Int64);
    for cell in ["+40", "007", "-0", "-9223372036854775808"] {
        column.append_text(cell).unwrap();
    }
    let texts: Vec<_> = (0..column.len())
        .map(|i| column.cell_text(i).unwrap().into_owned())
        .collect();
    assert_eq!(texts, ["40", "7", "0", "-9223372036854775808"]);
    assert_eq!(column.cell_text(4), None);
}

#[test]
fn string_cells_carry_byte_length_prefix() {
    let mut column = Column::new(ColumnType::String);
    column.append_text("NYC").unwrap();
    column.append_text("").unwrap();
    column.append_text("Zürich").unwrap();

    assert_eq!(column.encoded_size_of_last(), 8 + 7);
    assert_eq!(column.encoded_size(), (8 + 3) + 8 + (8 + 7));

    let bytes = encode(&column);
    assert_eq!(bytes.len() as u64, column.encoded_size());
    assert_eq!(&bytes[..8], &3i64.to_le_bytes());
    assert_eq!(&bytes[8..11], b"NYC");
    assert_eq!(&bytes[11..19], &0i64.to_le_bytes());
    assert_eq!(&bytes[19..27], &7i64.to_le_bytes());
    assert_eq!(&bytes[27..], "Zürich".as_bytes());
}

#[test]
fn decode_replaces_previous_cells() {
    let mut source = Column::new(ColumnType::String);
    source.append_text("a").unwrap();
    source.append_text("bc").unwrap();
    let bytes = encode(&source);

    let mut column = Column::new(ColumnType::String);
    column.append_text("stale").unwrap();
    column.deserialize_from(&bytes).unwrap();
    assert_eq!(column, source);
    assert_eq!(column.value(1), Some(Value::Str(Cow::Borrowed("bc"))));
    assert_eq!(column.encoded_size(), bytes.len() as u64);
}

#[test]
fn int64_decode_requires_whole_words() {
    let mut column = Column::new(ColumnType::Int64);
    let err = column.deserialize_from(&[0u8; 12]).unwrap_err();
    assert_eq!(err, DecodeError::Misaligned { len: 12 });
    assert!(column.is_empty());

    column.deserialize_from(&42i64.to_le_bytes()).unwrap();
    assert_eq!(column.value(0), Some(Value::Int64(42)));
}

#[test]
fn string_decode_rejects_overruns_and_truncation() {
    let mut column = Column::new(ColumnType::String);

    let mut overrun = 10i64.to_le_bytes().to_vec();
    overrun.extend_from_slice(b"short");
    assert_eq!(
        column.deserialize_from(&overrun).unwrap_err(),
        DecodeError::Overrun {
            offset: 0,
            declared: 10
        }
    );

    let mut negative = (-1i64).to_le_bytes().to_vec();
    negative.extend_from_slice(b"x");
    assert!(matches!(
        column.deserialize_from(&negative).unwrap_err(),
        DecodeError::Overrun { declared: -1, .. }
    ));

    let mut truncated = 1i64.to_le_bytes().to_vec();
    truncated.push(b'a');
    truncated.extend_from_slice(&[0u8; 3]);
    assert_eq!(
        column.deserialize_from(&truncated).unwrap_err(),
        DecodeError::TruncatedPrefix { offset: 9 }
    );
    assert!(column.is_empty());
}

#[test]
fn string_decode_rejects_invalid_utf8() {
    let mut bytes = 2i64.to_le_bytes().to_vec();
    bytes.extend_from_slice(&[0xC3, 0x28]);
    let mut column = Column::new(ColumnType::String);
    assert_eq!(
        column.deserialize_from(&bytes).unwrap_err(),
        DecodeError::InvalidUtf8 { offset: 8 }
    );
}

#[test]
fn clear_resets_size_and_allows_reuse() {
    let mut column = Column::new(ColumnType::String);
    column.append_text("first batch").unwrap();
    column.clear();
    column.clear();
    assert!(column.is_empty());
    assert_eq!(column.encoded_size(), 0);
    assert_eq!(column.encoded_size_of_last(), 0);

    column.append_text("x").unwrap();
    assert_eq!(column.cell_text(0).as_deref(), Some("x"));
    assert_eq!(column.encoded_size(), 9);
    assert_eq!(column.column_type(), ColumnType::String);
}

#[test]
fn empty_slices_decode_to_empty_columns() {
    for column_type in [ColumnType::Int64, ColumnType::String] {
        let mut column = Column::new(column_type);
        column.deserialize_from(&[]).unwrap();
        assert!(column.is_empty());
    }
}
