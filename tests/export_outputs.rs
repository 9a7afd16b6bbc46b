//! End-to-end export runs for every format, validated against each
//! format's own grammar and against the on-disk byte accounting.

mod common;

use std::fs;
use std::path::Path;

use proptest::prelude::*;
use takeout::{create_writer, DialogsInfo, Format, Settings};

use common::*;

/// Sum of file sizes and file count under a directory tree
fn disk_usage(dir: &Path) -> (u64, u64) {
    let mut bytes = 0;
    let mut files = 0;
    for entry in fs::read_dir(dir).unwrap() {
        let entry = entry.unwrap();
        let path = entry.path();
        if path.is_dir() {
            let (b, f) = disk_usage(&path);
            bytes += b;
            files += f;
        } else {
            bytes += fs::metadata(&path).unwrap().len();
            files += 1;
        }
    }
    (bytes, files)
}

#[test]
fn full_export_succeeds_for_every_format() {
    for format in [Format::Text, Format::Yaml, Format::Html, Format::Json] {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = create_writer(format);
        writer.start(&Settings::new(dir.path(), format)).unwrap();
        drive_full_export(&mut writer).unwrap();

        let main = writer.main_file_path().unwrap();
        assert!(main.exists(), "missing main artifact for {format:?}");
        assert!(fs::metadata(&main).unwrap().len() > 0);
    }
}

#[test]
fn json_end_to_end_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = create_writer(Format::Json);
    writer
        .start(&Settings::new(dir.path(), Format::Json))
        .unwrap();
    writer.write_personal(&personal()).unwrap();
    writer.write_contacts_list(&contacts(2)).unwrap();
    writer
        .write_dialogs_start(&DialogsInfo { count: 1 })
        .unwrap();
    writer.write_dialog_start(&dialog(7, "Alice", 2)).unwrap();
    writer
        .write_dialog_slice(&slice(vec![
            message(1, "Alice", "hi"),
            message(2, "Jane", "hello"),
        ]))
        .unwrap();
    writer.write_dialog_end().unwrap();
    writer.write_dialogs_end().unwrap();
    writer.finish().unwrap();

    let main = writer.main_file_path().unwrap();
    assert_eq!(main, dir.path().join("export_results.json"));

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&main).unwrap()).unwrap();
    assert!(value.is_object());
    assert_eq!(value["personal"]["first_name"], "Jane");
    assert_eq!(value["contacts"].as_array().unwrap().len(), 2);
    let dialogs = value["dialogs"].as_array().unwrap();
    assert_eq!(dialogs.len(), 1);
    assert_eq!(dialogs[0]["messages"].as_array().unwrap().len(), 2);
}

#[test]
fn stats_bytes_match_artifacts_on_disk() {
    for format in [Format::Text, Format::Yaml, Format::Html, Format::Json] {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = create_writer(format);
        let stats = writer.stats();
        writer.start(&Settings::new(dir.path(), format)).unwrap();
        drive_full_export(&mut writer).unwrap();

        let (bytes, files) = disk_usage(dir.path());
        let snap = stats.snapshot();
        assert_eq!(snap.bytes_written, bytes, "byte mismatch for {format:?}");
        assert_eq!(snap.files_created, files, "file mismatch for {format:?}");
        assert_eq!(snap.messages_written, 4);
        assert_eq!(snap.pictures_written, 3);
        assert_eq!(snap.contacts_written, 2);
        assert_eq!(snap.sessions_written, 1);
        assert_eq!(snap.dialogs_written, 3);
    }
}

#[test]
fn html_index_links_resolve_to_real_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = create_writer(Format::Html);
    writer
        .start(&Settings::new(dir.path(), Format::Html))
        .unwrap();
    drive_full_export(&mut writer).unwrap();

    let index = fs::read_to_string(dir.path().join("export_results.html")).unwrap();
    let mut seen = 0;
    for part in index.split("href=\"").skip(1) {
        let target = part.split('"').next().unwrap();
        assert!(
            dir.path().join(target).exists(),
            "dangling index link: {target}"
        );
        seen += 1;
    }
    // Three list pages plus three chat pages.
    assert_eq!(seen, 6);

    // Per-chat pages exist under chats/ with slugged names.
    assert!(dir.path().join("chats/alice_smith.html").exists());
    assert!(dir.path().join("chats/rust_devs.html").exists());
    assert!(dir.path().join("chats/old_announcements.html").exists());
}

#[test]
fn yaml_output_is_indentation_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = create_writer(Format::Yaml);
    writer
        .start(&Settings::new(dir.path(), Format::Yaml))
        .unwrap();
    drive_full_export(&mut writer).unwrap();

    let text = fs::read_to_string(dir.path().join("export_results.yaml")).unwrap();
    assert!(text.starts_with("personal:\n"));
    assert!(!text.contains('\t'));
    // Every top-level section key sits at column zero.
    for key in ["profile_pictures:", "contacts:", "sessions:", "dialogs:", "left_chats:"] {
        assert!(
            text.contains(&format!("\n{key}")),
            "missing top-level key {key}"
        );
    }
    // Indentation steps are always multiples of two spaces.
    for line in text.lines() {
        let spaces = line.len() - line.trim_start_matches(' ').len();
        assert_eq!(spaces % 2, 0, "odd indent in line: {line:?}");
    }
}

#[test]
fn text_output_contains_every_section_header() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = create_writer(Format::Text);
    writer
        .start(&Settings::new(dir.path(), Format::Text))
        .unwrap();
    drive_full_export(&mut writer).unwrap();

    let text = fs::read_to_string(dir.path().join("export_results.txt")).unwrap();
    for header in [
        "Personal information",
        "Profile pictures (3)",
        "Contacts (2)",
        "Sessions (1)",
        "Chats (2)",
        "Left chats (1)",
    ] {
        assert!(text.contains(header), "missing header {header:?}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Any dialog/batch shape must produce parseable JSON that preserves
    /// dialog and message counts.
    #[test]
    fn json_preserves_counts_for_random_shapes(
        shape in prop::collection::vec(prop::collection::vec(0usize..5, 0..4), 0..4)
    ) {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = create_writer(Format::Json);
        writer.start(&Settings::new(dir.path(), Format::Json)).unwrap();
        writer.write_dialogs_start(&DialogsInfo { count: shape.len() }).unwrap();

        let mut next_id = 1i64;
        for (i, batches) in shape.iter().enumerate() {
            let total: usize = batches.iter().sum();
            writer
                .write_dialog_start(&dialog(i as i64 + 1, &format!("chat {i}"), total))
                .unwrap();
            for batch in batches {
                let messages = (0..*batch)
                    .map(|_| {
                        let m = message(next_id, "someone", "text");
                        next_id += 1;
                        m
                    })
                    .collect();
                writer.write_dialog_slice(&slice(messages)).unwrap();
            }
            writer.write_dialog_end().unwrap();
        }
        writer.write_dialogs_end().unwrap();
        writer.finish().unwrap();

        let text = fs::read_to_string(dir.path().join("export_results.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let dialogs = value["dialogs"].as_array().unwrap();
        prop_assert_eq!(dialogs.len(), shape.len());
        for (entry, batches) in dialogs.iter().zip(&shape) {
            let expected: usize = batches.iter().sum();
            prop_assert_eq!(entry["messages"].as_array().unwrap().len(), expected);
        }
    }
}
