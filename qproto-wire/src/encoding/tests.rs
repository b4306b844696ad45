use super::*;

#[test]
fn base64_matches_known_vector() {
    let encoded = ContentEncoding::Base64.encode(b"BODYBODYBODY");
    assert_eq!(encoded, b"Qk9EWUJPRFlCT0RZ");

    let decoded = ContentEncoding::Base64.decode(&encoded).unwrap();
    assert_eq!(decoded, b"BODYBODYBODY");
}

#[test]
fn every_codec_round_trips() {
    let payload = b"!@#$%^&*()\x00\xff binary-ish payload";
    for codec in [
        ContentEncoding::Identity,
        ContentEncoding::Base16,
        ContentEncoding::Base32,
        ContentEncoding::Base64,
        ContentEncoding::Binary,
    ] {
        let encoded = codec.encode(payload);
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded, payload, "{} did not round-trip", codec.name());
    }
}

#[test]
fn encoded_alphabets_avoid_unbanned_delimiters() {
    // any byte a config could legally pick as a delimiter must be absent
    // from the textual codec output
    let payload: Vec<u8> = (0u8..=255).collect();
    for codec in [
        ContentEncoding::Base16,
        ContentEncoding::Base32,
        ContentEncoding::Base64,
    ] {
        let encoded = codec.encode(&payload);
        for delim in [b'&', b'$', b'#', b'@', b'%', b'!'] {
            assert!(
                !encoded.contains(&delim),
                "{} output contains {:?}",
                codec.name(),
                delim as char,
            );
        }
    }
}

#[test]
fn decode_rejects_garbage() {
    assert!(ContentEncoding::Base16.decode(b"zz not hex").is_err());
    assert!(ContentEncoding::Base64.decode(b"!!!!").is_err());
    assert!(ContentEncoding::Base32.decode(b"!!!!").is_err());
    // truncated length prefix
    assert!(ContentEncoding::Binary.decode(&[0x05]).is_err());
}

#[test]
fn codec_names_round_trip() {
    for codec in [
        ContentEncoding::Identity,
        ContentEncoding::Base16,
        ContentEncoding::Base32,
        ContentEncoding::Base64,
        ContentEncoding::Binary,
    ] {
        assert_eq!(ContentEncoding::from_name(codec.name()), Some(codec));
    }
    assert_eq!(ContentEncoding::from_name("gob"), None);
}

#[test]
fn gzip_round_trips() {
    let payload = b"BODYBODYBODY_".repeat(1000);
    let compressed = compress(&payload).unwrap();
    assert!(compressed.len() < payload.len());
    assert_eq!(decompress(&compressed).unwrap(), payload);
}

#[test]
fn gzip_rejects_corrupt_streams() {
    assert!(decompress(b"definitely not gzip").is_err());
}
