// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn round_trips_command_words() {
    let words: Vec<Vec<u8>> = vec![b"SADD".to_vec(), b"resources".to_vec(), b"s3://b/x.pdf".to_vec()];
    let mut buf = Vec::new();
    write_message(&mut buf, &words).expect("encode");
    let decoded = read_message(&mut buf.as_slice()).expect("decode");
    assert_eq!(decoded, words);
}

#[test]
fn round_trips_binary_unsafe_bytes() {
    let words: Vec<Vec<u8>> = vec![vec![0, 1, 2, 255, 254], b"\n\r\0".to_vec()];
    let mut buf = Vec::new();
    write_message(&mut buf, &words).expect("encode");
    let decoded = read_message(&mut buf.as_slice()).expect("decode");
    assert_eq!(decoded, words);
}

#[test]
fn empty_message_round_trips() {
    let words: Vec<Vec<u8>> = vec![];
    let mut buf = Vec::new();
    write_message(&mut buf, &words).expect("encode");
    let decoded = read_message(&mut buf.as_slice()).expect("decode");
    assert_eq!(decoded, words);
}

#[test]
fn truncated_stream_errors() {
    let words: Vec<Vec<u8>> = vec![b"hello".to_vec()];
    let mut buf = encode(&words);
    buf.truncate(buf.len() - 2);
    assert!(read_message(&mut buf.as_slice()).is_err());
}
