use super::*;

use crate::delimiter::Delimiter;
use crate::encoding::ContentEncoding;

fn message(delimiter: &str, use_encoding: bool, encoding: ContentEncoding) -> Message {
    Message::new(
        Delimiter::new(delimiter.as_bytes().to_vec()).unwrap(),
        use_encoding,
        encoding,
    )
}

#[test]
fn parse_short_base64_frame() {
    let mut msg = message("&", true, ContentEncoding::Base64);
    msg.parse(b"key1&value1&value2&&key2&value2&&&&Qk9EWUJPRFlCT0RZ&&&&&&&&")
        .unwrap();

    assert_eq!(msg.header("key1").unwrap(), ["value1", "value2"]);
    assert_eq!(msg.header("key2").unwrap(), ["value2"]);
    assert_eq!(msg.body(), b"BODYBODYBODY");
}

#[test]
fn parse_tolerates_missing_ending_delimiter() {
    // the decompression path hands parse a frame whose ending delimiter was
    // already consumed
    let mut msg = message("&", true, ContentEncoding::Base64);
    msg.parse(b"key1&value1&value2&&key2&value2&&&&Qk9EWUJPRFlCT0RZ")
        .unwrap();

    assert_eq!(msg.header("key1").unwrap(), ["value1", "value2"]);
    assert_eq!(msg.body(), b"BODYBODYBODY");
}

#[test]
fn generate_short_base64_frame() {
    let mut msg = message("&", true, ContentEncoding::Base64);
    msg.add_header("key1", "value1").unwrap();
    msg.add_header("key1", "value2").unwrap();
    msg.add_header("key2", "value2").unwrap();
    msg.set_body(b"BODYBODYBODY".to_vec());

    // header order is unspecified: two headers, two possible frames
    let frame = msg.generate();
    let expected: [&[u8]; 2] = [
        b"key1&value1&value2&&key2&value2&&&&Qk9EWUJPRFlCT0RZ&&&&&&&&",
        b"key2&value2&&key1&value1&value2&&&&Qk9EWUJPRFlCT0RZ&&&&&&&&",
    ];
    assert!(
        expected.contains(&frame.as_slice()),
        "unexpected frame: {}",
        String::from_utf8_lossy(&frame),
    );
}

#[test]
fn generate_single_header_unencoded_frame() {
    let mut msg = message("&", false, ContentEncoding::Base64);
    msg.add_header("key1", "value1").unwrap();
    msg.set_body(b"BODYBODYBODY".to_vec());

    assert_eq!(
        msg.generate(),
        b"key1&value1&&&&BODYBODYBODY&&&&&&&&".to_vec()
    );
}

#[test]
fn generated_frames_end_with_the_ending_delimiter() {
    for (delimiter, use_encoding) in [("&", true), ("&", false), ("###", true)] {
        let mut msg = message(delimiter, use_encoding, ContentEncoding::Base64);
        msg.add_header("key", "value").unwrap();
        msg.set_body(b"BODY".to_vec());

        let frame = msg.generate();
        let ending = msg.delimiter().ending();
        assert!(frame.ends_with(&ending));
    }
}

#[test]
fn round_trip_long_body() {
    let body = b"BODYBODYBODY_".repeat(100_000);
    for use_encoding in [true, false] {
        let mut msg = message("&", use_encoding, ContentEncoding::Base64);
        msg.add_header("key1", "value1").unwrap();
        msg.add_header("key2", "value2").unwrap();
        msg.set_body(body.clone());

        let mut parsed = message("&", use_encoding, ContentEncoding::Base64);
        parsed.parse(&msg.generate()).unwrap();
        assert_eq!(parsed.body(), &body);
        assert_eq!(parsed.header("key1").unwrap(), ["value1"]);
        assert_eq!(parsed.header("key2").unwrap(), ["value2"]);
    }
}

#[test]
fn round_trip_multi_byte_delimiter_preserves_value_order() {
    let mut msg = message("###", true, ContentEncoding::Base64);
    msg.add_header("key1", "value1").unwrap();
    msg.add_header("key1", "value2").unwrap();
    msg.add_header("key1", "value3").unwrap();
    msg.add_header("key2", "value2").unwrap();
    msg.set_body(b"BODYBODYBODY".to_vec());

    let mut parsed = message("###", true, ContentEncoding::Base64);
    parsed.parse(&msg.generate()).unwrap();

    assert_eq!(parsed.header("key1").unwrap(), ["value1", "value2", "value3"]);
    assert_eq!(parsed.header("key2").unwrap(), ["value2"]);
    assert_eq!(parsed.body(), b"BODYBODYBODY");
}

#[test]
fn round_trip_law_across_codecs() {
    let codecs = [
        ContentEncoding::Identity,
        ContentEncoding::Base16,
        ContentEncoding::Base32,
        ContentEncoding::Base64,
        ContentEncoding::Binary,
    ];
    for delimiter in ["&", "###", "$"] {
        for codec in codecs {
            let mut msg = message(delimiter, true, codec);
            msg.add_header("key1", "value1").unwrap();
            msg.add_header("key1", "value2").unwrap();
            msg.add_header("key2", "value2").unwrap();
            msg.set_body(b"BODYBODYBODY".to_vec());
            msg.add_raw_file("hostile", format!("!@*{delimiter}{delimiter}tail").into_bytes());

            let mut parsed = message(delimiter, true, codec);
            parsed.parse(&msg.generate()).unwrap();

            assert_eq!(
                parsed, msg,
                "round trip failed for delimiter {delimiter:?} codec {}",
                codec.name(),
            );
        }
    }
}

#[test]
fn empty_body_round_trips_as_empty() {
    let mut msg = message("###", true, ContentEncoding::Base64);
    msg.add_header("key1", "value1").unwrap();
    msg.add_header("key1", "value2").unwrap();
    msg.add_header("key1", "value3").unwrap();
    msg.add_header("key2", "value2").unwrap();

    let mut parsed = message("###", true, ContentEncoding::Base64);
    parsed.parse(&msg.generate()).unwrap();

    assert!(parsed.body().is_empty());
    assert_eq!(parsed.header("key1").unwrap(), ["value1", "value2", "value3"]);
    assert_eq!(parsed.header("key2").unwrap(), ["value2"]);
}

#[test]
fn zero_headers_round_trip() {
    // nothing in the invariants requires a header, so a bare body must
    // survive: the generator has no header line whose trailing delimiters
    // could form the body delimiter and has to write it outright
    for (delimiter, use_encoding) in [("&", true), ("&", false), ("###", true), ("$", true)] {
        let mut msg = message(delimiter, use_encoding, ContentEncoding::Base64);
        msg.set_body(b"BODYBODYBODY".to_vec());

        let frame = msg.generate();
        let mut parsed = message(delimiter, use_encoding, ContentEncoding::Base64);
        parsed.parse(&frame).unwrap();

        assert!(parsed.headers().is_empty());
        assert_eq!(
            parsed.body(),
            b"BODYBODYBODY",
            "zero-header round trip failed for delimiter {delimiter:?} encoded {use_encoding}",
        );
    }
}

#[test]
fn zero_headers_with_files_and_empty_body_round_trip() {
    let mut msg = message("&", false, ContentEncoding::Base64);
    msg.add_raw_file("a.txt", b"alpha".to_vec());
    msg.add_raw_file("hostile", b"tail&&piece".to_vec());

    let mut parsed = message("&", false, ContentEncoding::Base64);
    parsed.parse(&msg.generate()).unwrap();

    assert!(parsed.headers().is_empty());
    assert!(parsed.body().is_empty());
    assert_eq!(parsed.files()["a.txt"].data(), b"alpha");
    assert_eq!(parsed.files()["hostile"].data(), b"tail&&piece");
}

#[test]
fn empty_body_with_files_round_trips_as_empty() {
    let mut msg = message("&", false, ContentEncoding::Base64);
    msg.add_header("key", "value").unwrap();
    msg.add_raw_file("a.txt", b"alpha".to_vec());
    msg.add_raw_file("b.txt", b"beta".to_vec());

    let mut parsed = message("&", false, ContentEncoding::Base64);
    parsed.parse(&msg.generate()).unwrap();

    assert!(parsed.body().is_empty());
    assert_eq!(parsed.files().len(), 2);
    assert_eq!(parsed.files()["a.txt"].data(), b"alpha");
    assert_eq!(parsed.files()["b.txt"].data(), b"beta");
}

#[test]
fn colliding_file_payloads_are_encoded_on_the_wire() {
    let data = b"!@#$%^&*()$$$$$$$$FILE1".to_vec();
    let mut msg = message("&", false, ContentEncoding::Base64);
    msg.add_header("key", "value").unwrap();
    msg.add_raw_file("file1", data.clone());

    let frame = msg.generate();
    // the payload carries the delimiter, so the record is flagged and the
    // raw bytes never appear on the wire
    assert!(crate::util::find(&frame, b"file1&&true&&").is_some());
    assert!(crate::util::find(&frame, &data).is_none());

    let mut parsed = message("&", false, ContentEncoding::Base64);
    parsed.parse(&frame).unwrap();
    assert_eq!(parsed.files()["file1"].data(), &data);
}

#[test]
fn clean_file_payloads_stay_raw_on_the_wire() {
    let mut msg = message("&", false, ContentEncoding::Base64);
    msg.add_header("key", "value").unwrap();
    msg.add_raw_file("file1", b"Hello World".to_vec());

    let frame = msg.generate();
    assert!(crate::util::find(&frame, b"file1&&false&&Hello World").is_some());

    let mut parsed = message("&", false, ContentEncoding::Base64);
    parsed.parse(&frame).unwrap();
    assert_eq!(parsed.files()["file1"].data(), b"Hello World");
}

#[test]
fn several_files_round_trip_with_base16_body_codec() {
    let data = "!@#$%^&*()$$$$$$$$FILE";
    let mut msg = message("&", false, ContentEncoding::Base16);
    add_sample_headers(&mut msg);
    msg.set_body(b"BODYBODYBODY".to_vec());
    for i in 1..=3 {
        msg.add_raw_file(format!("file{i}"), format!("{data}{i}").into_bytes());
    }

    let mut parsed = message("&", false, ContentEncoding::Base16);
    parsed.parse(&msg.generate()).unwrap();

    for i in 1..=3 {
        assert_eq!(
            parsed.files()[&format!("file{i}")].data(),
            format!("{data}{i}").as_bytes()
        );
    }
    assert_eq!(parsed.body(), b"BODYBODYBODY");
    assert_eq!(parsed.header("key1").unwrap(), ["value1", "value2", "value3"]);
    assert_eq!(parsed.header("key2").unwrap(), ["value2"]);
}

#[test]
fn a_frame_travels_intact_as_a_file_payload() {
    // a generated frame is full of structural delimiters, so carrying one
    // inside another message relies entirely on the encoding flag
    let mut inner = message("&", true, ContentEncoding::Base64);
    inner.add_header("kind", "nested").unwrap();
    inner.set_body(b"inner body".to_vec());
    let inner_frame = inner.generate();

    let mut outer = message("&", false, ContentEncoding::Base64);
    outer.add_header("kind", "carrier").unwrap();
    outer.add_raw_file("payload.qp", inner_frame.clone());

    let mut parsed_outer = message("&", false, ContentEncoding::Base64);
    parsed_outer.parse(&outer.generate()).unwrap();
    assert_eq!(parsed_outer.files()["payload.qp"].data(), &inner_frame);

    let mut parsed_inner = message("&", true, ContentEncoding::Base64);
    parsed_inner
        .parse(parsed_outer.files()["payload.qp"].data())
        .unwrap();
    assert_eq!(parsed_inner.header("kind").unwrap(), ["nested"]);
    assert_eq!(parsed_inner.body(), b"inner body");
}

#[test]
fn header_removal_and_prefix_extraction() {
    let mut msg = message("&", false, ContentEncoding::Base64);
    msg.add_header("Q-COOKIES-session", "abc").unwrap();
    msg.add_header("Q-COOKIES-user", "u1").unwrap();
    msg.add_header("kind", "app").unwrap();

    let taken = msg.take_headers_with_prefix("Q-COOKIES-");
    assert_eq!(taken.len(), 2);
    assert!(msg.header("Q-COOKIES-session").is_none());
    assert_eq!(msg.header("kind").unwrap(), ["app"]);

    assert_eq!(msg.remove_header("kind"), Some(vec!["app".to_owned()]));
    assert!(msg.headers().is_empty());
}

#[test]
fn duplicate_file_names_overwrite() {
    let mut msg = message("&", false, ContentEncoding::Base64);
    msg.add_raw_file("file", b"first".to_vec());
    msg.add_raw_file("file", b"second".to_vec());

    assert_eq!(msg.files().len(), 1);
    assert_eq!(msg.files()["file"].data(), b"second");
}

#[test]
fn content_variants_normalize() {
    let mut msg = message("&", false, ContentEncoding::Base64);
    msg.add_content(Content::Text("BODY".into()));
    msg.add_content(Content::Binary(b"BODY".to_vec()));
    msg.add_content(Content::File(FileAttachment::new("f", b"data".to_vec())));

    assert_eq!(msg.body(), b"BODYBODY");
    assert_eq!(msg.files().len(), 1);
}

#[test]
fn add_header_rejects_embedded_delimiters() {
    let mut msg = message("&", false, ContentEncoding::Base64);
    assert_eq!(
        msg.add_header("bad&key", "value").unwrap_err(),
        InvalidHeaderValue::KeyContainsDelimiter
    );
    assert_eq!(
        msg.add_header("key", "bad&value").unwrap_err(),
        InvalidHeaderValue::ValueContainsDelimiter
    );

    let mut multi = message("###", false, ContentEncoding::Base64);
    assert_eq!(
        multi.add_header("bad###key", "value").unwrap_err(),
        InvalidHeaderValue::KeyContainsDelimiter
    );
    // a single byte of a multi-byte delimiter is fine
    multi.add_header("ok#key", "ok#value").unwrap();
}

#[test]
fn parse_rejects_frame_without_body_delimiter() {
    let mut msg = message("&", false, ContentEncoding::Base64);
    assert!(matches!(
        msg.parse(b"no structural markers at all"),
        Err(ParseError::InvalidFrame)
    ));
}

#[test]
fn parse_rejects_header_line_without_value() {
    let mut msg = message("&", false, ContentEncoding::Base64);
    assert!(matches!(
        msg.parse(b"orphankey&&&&BODY&&&&&&&&"),
        Err(ParseError::InvalidHeader)
    ));
}

#[test]
fn parse_rejects_non_utf8_header_text() {
    let mut msg = message("&", false, ContentEncoding::Base64);
    let mut data = vec![0xff, 0xfe];
    data.extend_from_slice(b"&value&&&&BODY&&&&&&&&");
    assert!(matches!(msg.parse(&data), Err(ParseError::InvalidHeader)));
}

#[test]
fn parse_rejects_malformed_file_records() {
    // two fields instead of three
    let mut msg = message("&", false, ContentEncoding::Base64);
    assert!(matches!(
        msg.parse(b"k&v&&&&file1&&somedata&&&&&&BODY&&&&&&&&"),
        Err(ParseError::InvalidFile)
    ));

    // unparseable encoding flag
    let mut msg = message("&", false, ContentEncoding::Base64);
    assert!(matches!(
        msg.parse(b"k&v&&&&file1&&maybe&&data&&&&&&BODY&&&&&&&&"),
        Err(ParseError::InvalidFile)
    ));
}

#[test]
fn parse_surfaces_codec_failures() {
    let mut msg = message("&", true, ContentEncoding::Base64);
    assert!(matches!(
        msg.parse(b"k&v&&&&!!!&&&&&&&&"),
        Err(ParseError::Decode(_))
    ));
}

fn add_sample_headers(msg: &mut Message) {
    msg.add_header("key1", "value1").unwrap();
    msg.add_header("key1", "value2").unwrap();
    msg.add_header("key1", "value3").unwrap();
    msg.add_header("key2", "value2").unwrap();
}
