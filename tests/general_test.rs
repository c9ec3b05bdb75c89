use cfgml_core::translate;
use miette::Report;
use std::fs;
use std::path::{Path, PathBuf};

fn conf_files(dir: &str) -> Vec<PathBuf> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join(dir);
    let entries = fs::read_dir(&dir).expect("Failed to read fixture directory");

    let mut files: Vec<PathBuf> = entries
        .map(|entry| entry.expect("Failed to read directory entry").path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "conf"))
        .collect();
    files.sort();
    files
}

#[test]
fn test_all_ok_files() {
    let files = conf_files("ok");
    assert!(!files.is_empty(), "No fixtures found in tests/ok");

    for path in files {
        let source = fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Failed to read file: {:?}", path));
        if let Err(err) = translate(&source, &path.to_string_lossy()) {
            panic!("Failed to translate {:?}. Error: {:?}", path, Report::new(err));
        }
    }
}

#[test]
fn test_all_bad_files() {
    let files = conf_files("bad");
    assert!(!files.is_empty(), "No fixtures found in tests/bad");

    for path in files {
        let source = fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Failed to read file: {:?}", path));
        let result = translate(&source, &path.to_string_lossy());
        assert!(result.is_err(), "{:?} should not translate", path);
    }
}
