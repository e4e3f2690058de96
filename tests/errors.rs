use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use rpbo::{Archive, FileEntry, LoadMode, PackingMethod, PboError, ProductEntry, clone_archive};

fn archive_with(dir: &Path, entries: Vec<(FileEntry, Vec<u8>)>) -> PathBuf {
    let mut mapping = Vec::new();
    for (i, (entry, data)) in entries.into_iter().enumerate() {
        let src = dir.join(format!("src{i}"));
        fs::write(&src, &data).unwrap();
        mapping.push((entry, src));
    }
    let out = dir.join("archive.pbo");
    clone_archive(&out, &ProductEntry::default(), mapping, None).unwrap();
    out
}

#[test]
fn missing_archive() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("nope.pbo");
    assert!(matches!(
        Archive::open(&path, LoadMode::Stream),
        Err(PboError::ArchiveNotFound(p)) if p == path
    ));
}

#[test]
fn wrong_signature() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("zip.pbo");
    fs::write(&path, b"PK\x03\x04rest of a zip").unwrap();
    assert!(matches!(
        Archive::open(&path, LoadMode::Stream),
        Err(PboError::NotAnArchive(b'P'))
    ));
}

#[test]
fn empty_file_is_malformed() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("empty.pbo");
    fs::write(&path, b"").unwrap();
    assert!(matches!(
        Archive::open(&path, LoadMode::Preload),
        Err(PboError::Malformed(_))
    ));
}

#[test]
fn truncated_archive_is_malformed() {
    let tmp = tempfile::tempdir().unwrap();
    let path = archive_with(
        tmp.path(),
        vec![(FileEntry::uncompressed("a.txt", 5, 0), b"hello".to_vec())],
    );
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 10]).unwrap();

    for mode in [LoadMode::Stream, LoadMode::Preload] {
        assert!(matches!(Archive::open(&path, mode), Err(PboError::Malformed(_))));
    }
}

#[test]
fn entry_from_another_archive() {
    let tmp = tempfile::tempdir().unwrap();
    let path = archive_with(tmp.path(), vec![(FileEntry::uncompressed("a", 1, 0), b"a".to_vec())]);
    let archive = Archive::open(&path, LoadMode::Stream).unwrap();

    let stranger = FileEntry::uncompressed("b", 1, 0);
    assert!(matches!(
        archive.extract_to_memory(&stranger),
        Err(PboError::UnknownEntry(name)) if name == "b"
    ));
    assert!(matches!(
        archive.payload_offset(&stranger),
        Err(PboError::UnknownEntry(_))
    ));
    assert!(archive.entry("b").is_none());
}

#[test]
fn packed_entries_are_listed_but_not_extracted() {
    let tmp = tempfile::tempdir().unwrap();
    let packed = FileEntry::new("packed.bin", PackingMethod::Packed, 64, 0, 4);
    let path = archive_with(
        tmp.path(),
        vec![(packed.clone(), b"\x01\x02\x03\x04".to_vec()), (FileEntry::uncompressed("plain", 2, 0), b"ok".to_vec())],
    );

    let archive = Archive::open(&path, LoadMode::Preload).unwrap();
    assert_eq!(archive.entries()[0], packed);
    assert!(matches!(
        archive.extract_to_memory(&archive.entries()[0]),
        Err(PboError::UnsupportedPacking { magic: 0x4370_7273, .. })
    ));
    assert_eq!(archive.extract_to_memory(&archive.entries()[1]).unwrap(), b"ok".to_vec());
    assert!(archive.extract_all(&tmp.path().join("out")).is_err());
}

#[test]
fn escaping_entry_names_abort_extraction() {
    let tmp = tempfile::tempdir().unwrap();
    let path = archive_with(
        tmp.path(),
        vec![
            (FileEntry::uncompressed("fine.txt", 1, 0), b"f".to_vec()),
            (FileEntry::uncompressed("..\\..\\evil.txt", 1, 0), b"e".to_vec()),
        ],
    );

    let archive = Archive::open(&path, LoadMode::Stream).unwrap();
    let out = tmp.path().join("out");
    assert!(matches!(archive.extract_all(&out), Err(PboError::UnsafePath(_))));
    assert!(!out.join("fine.txt").exists());
}

#[test]
fn archive_shrinking_after_open_is_truncated_payload() {
    let tmp = tempfile::tempdir().unwrap();
    let data = vec![9u8; 1000];
    let path = archive_with(
        tmp.path(),
        vec![(FileEntry::uncompressed("big", 1000, 0), data)],
    );

    let archive = Archive::open(&path, LoadMode::Stream).unwrap();
    let cut = archive.data_start() + 100;
    OpenOptions::new().write(true).open(&path).unwrap().set_len(cut).unwrap();

    match archive.extract_to_writer(&archive.entries()[0], &mut Vec::<u8>::new()) {
        Err(PboError::TruncatedPayload {
            expected, actual, ..
        }) => {
            assert_eq!(expected, 1000);
            assert_eq!(actual, 100);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(
        archive.extract_to_memory(&archive.entries()[0]),
        Err(PboError::TruncatedPayload { .. })
    ));
}
