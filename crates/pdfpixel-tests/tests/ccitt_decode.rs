//! CCITT fax decoding against an independent encoder

use pdfpixel_core::Error;
use pdfpixel_core::bits::BitReader;
use pdfpixel_core::filter::ccitt::{self, CcittParams, decode_row_1d, decode_row_2d};
use pdfpixel_tests::ccitt::{changes, write_run};
use pdfpixel_tests::patterns::{blocky_bitonal, random_bitonal};
use pdfpixel_tests::{BitWriter, encode_g3_1d, encode_g3_mixed, encode_g4, init_logging, pack_rows};

#[test]
fn test_vertical_modes_offset_from_b1() {
    // reference: black run 8..12 in a 24-pixel row
    let reference = [8, 12];
    let codes = [
        ("0000010", -3),
        ("000010", -2),
        ("010", -1),
        ("1", 0),
        ("011", 1),
        ("000011", 2),
        ("0000011", 3),
    ];
    for (bits, delta) in codes {
        let mut w = BitWriter::new();
        w.write_str(bits);
        // close the black run on b2 with V0, then V0 to the end of the row
        w.write_str("11");
        let data = w.finish();
        let mut reader = BitReader::new(&data);
        let line = decode_row_2d(&mut reader, &reference, 24, 0).unwrap();
        let a1 = (8 + delta) as usize;
        assert_eq!(line.changes, vec![a1, 12], "mode {bits}");
    }
}

#[test]
fn test_blank_row_is_one_run() {
    let mut reader = BitReader::new(&[0x80]);
    let line = decode_row_2d(&mut reader, &[], 100, 0).unwrap();
    assert_eq!(line.runs(), vec![100]);
}

#[test]
fn test_horizontal_mode_with_makeup_codes() {
    let mut w = BitWriter::new();
    w.write_str("001");
    write_run(&mut w, 130, false);
    write_run(&mut w, 70, true);
    // V0 against a blank reference lands on the row end
    w.write_str("1");
    let data = w.finish();
    let mut reader = BitReader::new(&data);
    let line = decode_row_2d(&mut reader, &[], 300, 0).unwrap();
    assert_eq!(line.changes, vec![130, 200]);
    assert_eq!(line.runs(), vec![130, 70, 100]);
}

#[test]
fn test_one_dimensional_row() {
    let mut w = BitWriter::new();
    for (run, black) in [(3, false), (5, true), (2, false)] {
        write_run(&mut w, run, black);
    }
    let data = w.finish();
    let mut reader = BitReader::new(&data);
    let line = decode_row_1d(&mut reader, 10, 0).unwrap();
    assert_eq!(line.changes, vec![3, 8]);
}

#[test]
fn test_group4_round_trip() {
    init_logging();
    for (seed, width) in [(1u64, 8usize), (2, 13), (3, 64), (4, 200), (5, 1728)] {
        let rows = random_bitonal(seed, width, 20, 0.2);
        let data = encode_g4(&rows, width, false);
        let out = ccitt::decode(&data, &CcittParams::group4(width, rows.len())).unwrap();
        assert_eq!(out, pack_rows(&rows, width, false), "width {width}");
    }
}

#[test]
fn test_group4_long_runs() {
    for (seed, width) in [(7u64, 300usize), (8, 3000)] {
        let rows = blocky_bitonal(seed, width, 16);
        let data = encode_g4(&rows, width, true);
        let out = ccitt::decode(&data, &CcittParams::group4(width, 0)).unwrap();
        assert_eq!(out, pack_rows(&rows, width, false), "width {width}");
    }
}

#[test]
fn test_end_of_block_stops_decoding() {
    let rows = random_bitonal(9, 32, 5, 0.5);
    let mut data = encode_g4(&rows, 32, true);
    // trailing garbage after EOFB is never read
    data.extend_from_slice(&[0xAB, 0xCD]);
    let out = ccitt::decode(&data, &CcittParams::group4(32, 0)).unwrap();
    assert_eq!(out.len(), 5 * 4);
    assert_eq!(out, pack_rows(&rows, 32, false));
}

#[test]
fn test_black_is_1_flips_output() {
    let rows = random_bitonal(10, 16, 4, 0.4);
    let data = encode_g4(&rows, 16, false);
    let params = CcittParams {
        black_is_1: true,
        ..CcittParams::group4(16, 4)
    };
    assert_eq!(ccitt::decode(&data, &params).unwrap(), pack_rows(&rows, 16, true));
}

#[test]
fn test_group3_one_dimensional() {
    let rows = random_bitonal(11, 50, 10, 0.3);
    let params = CcittParams {
        k: 0,
        columns: 50,
        rows: 10,
        ..CcittParams::default()
    };
    for eol in [false, true] {
        let data = encode_g3_1d(&rows, 50, eol);
        let params = CcittParams {
            end_of_line: eol,
            ..params.clone()
        };
        assert_eq!(ccitt::decode(&data, &params).unwrap(), pack_rows(&rows, 50, false));
    }
}

#[test]
fn test_group3_mixed() {
    let rows = random_bitonal(12, 77, 12, 0.25);
    let data = encode_g3_mixed(&rows, 77, 4);
    let params = CcittParams {
        k: 4,
        columns: 77,
        rows: 12,
        ..CcittParams::default()
    };
    assert_eq!(ccitt::decode(&data, &params).unwrap(), pack_rows(&rows, 77, false));
}

#[test]
fn test_row_starting_black() {
    let mut row = vec![false; 20];
    row[..5].fill(true);
    assert_eq!(changes(&row), vec![0, 5]);
    let rows = vec![row.clone(), row];
    let data = encode_g4(&rows, 20, false);
    let out = ccitt::decode(&data, &CcittParams::group4(20, 2)).unwrap();
    assert_eq!(out, pack_rows(&rows, 20, false));
}

#[test]
fn test_uncompressed_mode_is_rejected() {
    let result = ccitt::decode(&[0x02, 0xFF], &CcittParams::group4(16, 1));
    assert!(matches!(result, Err(Error::Ccitt { row: 0, .. })));
}

#[test]
fn test_missing_rows_are_not_invented() {
    let rows = random_bitonal(13, 24, 3, 0.3);
    let data = encode_g4(&rows, 24, false);
    let out = ccitt::decode(&data, &CcittParams::group4(24, 10)).unwrap();
    assert_eq!(out.len(), 3 * 3);
}
