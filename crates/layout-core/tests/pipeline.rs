use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use layout_core::{process, Fingerprinter, LayoutError, ProcessOptions, Sha256Fingerprinter};
use tempfile::{tempdir, TempDir};

// 2020-06-26 12:40:37 UTC
const TS: i64 = 1_593_175_237;

fn sidecar(ts: i64) -> String {
    format!(
        r#"{{"title":"ignored","photoTakenTime":{{"timestamp":"{}","formatted":"ignored"}}}}"#,
        ts
    )
}

fn write(dir: &Path, name: &str, contents: impl AsRef<[u8]>) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), contents).unwrap();
}

/// A small takeout with one auto-upload folder and one album that overlap.
fn build_takeout() -> (TempDir, PathBuf) {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("Takeout").join("Google Photos");
    let year = root.join("Photos from 2020");
    let album = root.join("Summer Trip");

    // same capture exported twice: dedup keeps the canonical name
    write(&year, "VID_20200626_124037.mp4", b"video bytes");
    write(&year, "VID_20200626_124037.mp4.json", sidecar(TS));
    write(&year, "VID_20200626_124037(1).mp4", b"video bytes");
    write(&year, "VID_20200626_124037.mp4(1).json", sidecar(TS));

    // duplicate-index marker after the extension, plus an edited copy
    write(&year, "P1020323.JPG", b"first camera shot");
    write(&year, "P1020323.JPG.json", sidecar(TS + 10));
    write(&year, "P1020323(1).JPG", b"second camera shot");
    write(&year, "P1020323.JPG(1).json", sidecar(TS + 20));
    write(&year, "P1020323(1)-edited.JPG", b"edited shot");

    // truncated extension
    write(&year, "70ECD1A6-F846-4CB7-9709-474FCB7B3E15-COLLAGE.jpg", b"collage");
    write(&year, "70ECD1A6-F846-4CB7-9709-474FCB7B3E15-COLLAGE.j.json", sidecar(TS + 30));

    // album copy of an upload at a different timestamp: same bytes, linked once
    write(&album, "VID_20200626_124037.mp4", b"video bytes");
    write(&album, "VID_20200626_124037.mp4.json", sidecar(TS + 3600));

    // different picture with a name already used this month
    write(&album, "p1020323.jpg", b"unrelated picture");
    write(&album, "p1020323.jpg.json", sidecar(TS + 7200));

    write(&album, "metadata.json", r#"{"albumData":{"title":"Summer Trip"}}"#);
    write(&album, "orphan.jpg.json", sidecar(TS));

    write(&root.join(".hidden"), "x.jpg.json", "not json");
    write(&root, "print-subscriptions.json", "{}");

    (tmp, root)
}

fn options(input: &Path, output: &Path) -> ProcessOptions {
    ProcessOptions {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        ..Default::default()
    }
}

/// relative path -> fingerprint for every file under `dir`
fn manifest(dir: &Path) -> BTreeMap<String, String> {
    let mut files = BTreeMap::new();
    collect(dir, dir, &mut files);
    files
}

fn collect(base: &Path, dir: &Path, files: &mut BTreeMap<String, String>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect(base, &path, files);
        } else {
            let rel = path.strip_prefix(base).unwrap().to_string_lossy().replace('\\', "/");
            files.insert(rel, Sha256Fingerprinter.fingerprint(&path).unwrap());
        }
    }
}

#[test]
fn test_full_layout() {
    let (tmp, root) = build_takeout();
    let out = tmp.path().join("out");

    let result = process(&options(&root, &out), &|_, _, _, _| {}).unwrap();
    assert_eq!(result.total_records, 7);
    assert_eq!(result.duplicates_removed, 1);
    assert_eq!(result.unresolved, 1);
    assert_eq!(result.already_present, 1);
    assert_eq!(result.collisions, 1);
    assert_eq!(result.media_linked, 5);
    assert_eq!(result.warnings.len(), 2);

    let month = out.join("2020").join("06");
    let names: Vec<&str> = vec![
        "70ecd1a6-f846-4cb7-9709-474fcb7b3e15-collage.jpg",
        "70ecd1a6-f846-4cb7-9709-474fcb7b3e15-collage.jpg.json",
        "p1020323(1).jpg",
        "p1020323(1).jpg.json",
        "p1020323(1)_edited.jpg",
        "p1020323.jpg",
        "p1020323.jpg.json",
        "p1020323_26-144037.jpg",
        "p1020323_26-144037.jpg.json",
        "vid_20200626_124037.mp4",
        "vid_20200626_124037.mp4.json",
    ];
    let mut listed: Vec<String> = fs::read_dir(&month)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    listed.sort();
    assert_eq!(listed, names);

    assert_eq!(fs::read(month.join("p1020323.jpg")).unwrap(), b"first camera shot");
    assert_eq!(fs::read(month.join("p1020323(1).jpg")).unwrap(), b"second camera shot");
    assert_eq!(fs::read(month.join("p1020323(1)_edited.jpg")).unwrap(), b"edited shot");
    assert_eq!(fs::read(month.join("p1020323_26-144037.jpg")).unwrap(), b"unrelated picture");
    assert_eq!(
        fs::read_to_string(month.join("p1020323_26-144037.jpg.json")).unwrap(),
        sidecar(TS + 7200)
    );
}

#[test]
fn test_no_distinct_file_is_dropped() {
    let (tmp, root) = build_takeout();
    let out = tmp.path().join("out");
    process(&options(&root, &out), &|_, _, _, _| {}).unwrap();

    let emitted: Vec<String> = manifest(&out).into_values().collect();
    for (rel, fp) in manifest(&root) {
        let is_media = !rel.ends_with(".json");
        if is_media {
            assert!(emitted.contains(&fp), "{} missing from output", rel);
        }
    }
}

#[test]
fn test_rerun_into_fresh_output_is_identical() {
    let (tmp, root) = build_takeout();
    let first = tmp.path().join("out1");
    let second = tmp.path().join("out2");

    process(&options(&root, &first), &|_, _, _, _| {}).unwrap();
    process(&options(&root, &second), &|_, _, _, _| {}).unwrap();

    let a = manifest(&first);
    assert!(!a.is_empty());
    assert_eq!(a, manifest(&second));
}

#[test]
fn test_rerun_into_same_output_adds_nothing() {
    let (tmp, root) = build_takeout();
    let out = tmp.path().join("out");

    process(&options(&root, &out), &|_, _, _, _| {}).unwrap();
    let before = manifest(&out);
    let again = process(&options(&root, &out), &|_, _, _, _| {}).unwrap();
    assert_eq!(again.media_linked, 0);
    assert_eq!(before, manifest(&out));
}

#[test]
fn test_malformed_sidecar_aborts_before_output() {
    let (tmp, root) = build_takeout();
    write(
        &root.join("Photos from 2020"),
        "broken.jpg.json",
        r#"{"photoTakenTime":{"timestamp":""}}"#,
    );
    write(&root.join("Photos from 2020"), "broken.jpg", b"broken");
    let out = tmp.path().join("out");

    let err = process(&options(&root, &out), &|_, _, _, _| {}).unwrap_err();
    assert!(matches!(err, LayoutError::MalformedMetadata { .. }), "{}", err);
    assert!(!out.exists());
}

#[test]
fn test_dir_filter_and_keep_case() {
    let (tmp, root) = build_takeout();
    let out = tmp.path().join("out");
    let opts = ProcessOptions {
        dir_filter: Some("Photos from *".to_string()),
        lowercase_names: false,
        ..options(&root, &out)
    };

    let result = process(&opts, &|_, _, _, _| {}).unwrap();
    assert_eq!(result.unresolved, 0);
    assert_eq!(result.collisions, 0);

    let month = out.join("2020").join("06");
    assert!(month.join("P1020323(1).JPG").exists());
    assert!(month.join("P1020323(1)_edited.JPG").exists());
    assert!(!month.join("p1020323_26-144037.jpg").exists());
}
