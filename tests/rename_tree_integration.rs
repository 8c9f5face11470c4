use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use assert_fs::prelude::*;
use tree_rename::{BufferSink, rename_tree};
use walkdir::WalkDir;

/// Relative path -> file contents (None for directories).
fn snapshot(root: &Path) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|e| e.expect("walk"))
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
            let data = if e.file_type().is_file() {
                Some(fs::read(e.path()).unwrap())
            } else {
                None
            };
            (rel, data)
        })
        .collect()
}

fn names(dir: &Path) -> Vec<String> {
    let mut v: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    v.sort();
    v
}

fn sample_tree() -> assert_fs::TempDir {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("hello world.txt").write_str("hello").unwrap();
    temp.child("my folder/image (1).jpg").write_str("img").unwrap();
    temp.child("my folder/nested dir/README (2).MD").write_str("readme").unwrap();
    temp.child("photos (1)/mixed CASE name.txt").write_str("mixed").unwrap();
    temp
}

#[test]
fn apply_renames_whole_tree_bottom_up() {
    let temp = sample_tree();
    let mut sink = BufferSink::new();

    let summary = rename_tree(temp.path(), false, &mut sink).expect("rename_tree");

    assert_eq!(names(temp.path()), vec!["Hello world.txt", "MY FOLDER", "PHOTOS"]);
    assert_eq!(names(&temp.path().join("MY FOLDER")), vec!["Image.jpg", "NESTED DIR"]);
    assert_eq!(names(&temp.path().join("MY FOLDER/NESTED DIR")), vec!["Readme.MD"]);
    assert_eq!(
        fs::read_to_string(temp.path().join("PHOTOS/Mixed case name.txt")).unwrap(),
        "mixed"
    );
    assert_eq!(summary.visited_dirs, 4);
    assert_eq!(summary.visited_files, 4);
    assert_eq!(summary.actions, 7);
    assert_eq!(summary.failures, 0);
    assert!(sink.contains("Completed operations: 7"));
}

#[test]
fn second_apply_run_performs_no_actions() {
    let temp = sample_tree();
    rename_tree(temp.path(), false, &mut BufferSink::new()).unwrap();
    let settled = snapshot(temp.path());

    let mut sink = BufferSink::new();
    let summary = rename_tree(temp.path(), false, &mut sink).unwrap();

    assert_eq!(summary.actions, 0);
    assert_eq!(snapshot(temp.path()), settled);
    assert!(!sink.contains("FROM:"));
}

#[test]
fn dry_run_leaves_tree_identical() {
    let temp = sample_tree();
    let before = snapshot(temp.path());
    let mut sink = BufferSink::new();

    let summary = rename_tree(temp.path(), true, &mut sink).unwrap();

    assert_eq!(snapshot(temp.path()), before);
    assert_eq!(summary.actions, 7);
    assert!(sink.contains("MODE: DRY RUN"));
    assert!(sink.contains("DRY RUN: would rename FOLDER via temp"));
    assert!(sink.contains("Planned operations: 7"));
}

#[test]
fn missing_root_is_not_found() {
    let temp = assert_fs::TempDir::new().unwrap();
    let missing = temp.path().join("does-not-exist");
    let mut sink = BufferSink::new();

    let err = rename_tree(&missing, true, &mut sink).unwrap_err();
    assert_eq!(err.kind(), "root_not_found");
    assert!(err.to_string().contains("Path not found"));
    assert!(sink.lines.is_empty());
}

#[test]
fn no_temp_names_survive_a_run() {
    let temp = sample_tree();
    rename_tree(temp.path(), false, &mut BufferSink::new()).unwrap();
    let leftovers: Vec<_> = snapshot(temp.path())
        .into_keys()
        .filter(|p| p.to_string_lossy().contains("__tmp__"))
        .collect();
    assert!(leftovers.is_empty(), "temp entries left behind: {leftovers:?}");
}

#[test]
fn names_near_the_length_limit_are_renamed() {
    let temp = assert_fs::TempDir::new().unwrap();
    let stem = "x".repeat(240);
    temp.child(format!("{stem}.txt")).write_str("long").unwrap();

    let summary = rename_tree(temp.path(), false, &mut BufferSink::new()).unwrap();

    assert_eq!(summary.failures, 0);
    assert_eq!(summary.actions, 1);
    let expected = format!("X{}.txt", "x".repeat(239));
    assert_eq!(names(temp.path()), vec![expected]);
}

// Collision cases need names that differ only in case to coexist, which
// rules out case-insensitive volumes.
#[cfg(target_os = "linux")]
mod collisions {
    use super::*;

    #[test]
    fn file_overwrites_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("A.txt").write_str("old").unwrap();
        temp.child("a (1).txt").write_str("new").unwrap();
        let mut sink = BufferSink::new();

        rename_tree(temp.path(), false, &mut sink).unwrap();

        assert_eq!(names(temp.path()), vec!["A.txt"]);
        assert_eq!(fs::read_to_string(temp.path().join("A.txt")).unwrap(), "new");
        assert!(sink.contains("TARGET EXISTS -> OVERWRITE (FILE)"));
    }

    #[test]
    fn folder_merges_into_folder() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("DOCS/Keep.txt").write_str("keep").unwrap();
        temp.child("DOCS/Same.txt").write_str("old").unwrap();
        temp.child("docs/Same.txt").write_str("new").unwrap();
        temp.child("docs/Extra.txt").write_str("extra").unwrap();
        let mut sink = BufferSink::new();

        rename_tree(temp.path(), false, &mut sink).unwrap();

        assert_eq!(names(temp.path()), vec!["DOCS"]);
        assert_eq!(
            names(&temp.path().join("DOCS")),
            vec!["Extra.txt", "Keep.txt", "Same.txt"]
        );
        assert_eq!(fs::read_to_string(temp.path().join("DOCS/Same.txt")).unwrap(), "new");
        assert!(sink.contains("MERGE:"));
    }

    #[test]
    fn file_replaces_folder() {
        let temp = assert_fs::TempDir::new().unwrap();
        // Files are handled before folders, so "x" lands on the folder "X".
        temp.child("X/inner.txt").write_str("gone").unwrap();
        temp.child("x").write_str("file").unwrap();

        rename_tree(temp.path(), false, &mut BufferSink::new()).unwrap();

        let x = temp.path().join("X");
        assert!(x.is_file());
        assert_eq!(fs::read_to_string(&x).unwrap(), "file");
    }

    #[test]
    fn folder_replaces_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("A").write_str("file").unwrap();
        temp.child("a/Inner.txt").write_str("inner").unwrap();
        let mut sink = BufferSink::new();

        rename_tree(temp.path(), false, &mut sink).unwrap();

        let a = temp.path().join("A");
        assert!(a.is_dir());
        assert_eq!(fs::read_to_string(a.join("Inner.txt")).unwrap(), "inner");
        assert!(sink.contains("OVERWRITE: removing file to replace with folder"));
    }
}
