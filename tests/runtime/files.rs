//! Encodings and file round trips

use genogram_runtime::{Format, from_bytes, load_from_file, read, save_to_file, to_bytes, write};
use tempfile::TempDir;

use crate::sample;

#[test]
fn both_encodings_round_trip_through_files() {
    let s = sample();
    let data = write(s.doc.graph());
    let dir = TempDir::new().unwrap();

    for (file, format) in [("a.gen", Format::MessagePack), ("a.json", Format::Json)] {
        let path = dir.path().join(file);
        save_to_file(&data, &path, format).unwrap();
        let loaded = load_from_file(&path).unwrap();
        assert_eq!(loaded, data, "{} differs", format.name());
        let (graph, report) = read(&loaded).unwrap();
        assert!(report.is_clean());
        assert_eq!(&graph, s.doc.graph());
    }
}

#[test]
fn encoding_is_detected_from_content() {
    let data = write(sample().doc.graph());
    let json = to_bytes(&data, Format::Json).unwrap();
    let packed = to_bytes(&data, Format::MessagePack).unwrap();
    assert_eq!(Format::detect(&json), Format::Json);
    assert_eq!(Format::detect(&packed), Format::MessagePack);
    assert!(packed.len() < json.len());
    assert_eq!(from_bytes(&json).unwrap(), from_bytes(&packed).unwrap());
}

#[test]
fn json_is_human_readable() {
    let data = write(sample().doc.graph());
    let json = String::from_utf8(to_bytes(&data, Format::Json).unwrap()).unwrap();
    assert!(json.contains("\"kind\": \"pair_bond\""));
    assert!(json.contains("\"relationship\": \"cutoff\""));
    assert!(json.contains("\"Session 1\""));
}

#[test]
fn garbage_is_an_error() {
    assert!(from_bytes(b"{ not json").is_err());
    assert!(from_bytes(&[0xc1, 0x00]).is_err());
    let dir = TempDir::new().unwrap();
    assert!(load_from_file(dir.path().join("missing.gen")).is_err());
}
