//! Integration tests for the `run` and `check-config` commands.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use javannotate::cli::{self, CheckConfigArgs, RunArgs, EXIT_ERROR, EXIT_FAILED, EXIT_SUCCESS};
use javannotate::context::Fingerprint;
use tempfile::TempDir;

fn testdata(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata").join(name)
}

/// Lay out a source root with `TestClass.java` in its package directory.
fn workspace(temp: &TempDir) -> (PathBuf, PathBuf, PathBuf) {
    let root = temp.path().join("src");
    fs::create_dir_all(root.join("codegen")).unwrap();
    let source = root.join("codegen/TestClass.java");
    fs::copy(testdata("codegen/TestClass.java"), &source).unwrap();
    let config = temp.path().join("cfg.json");
    fs::copy(testdata("cfg.json"), &config).unwrap();
    (root, source, config)
}

fn run_args(root: &Path, config: &Path, incremental: bool) -> RunArgs {
    RunArgs {
        config: config.to_path_buf(),
        source_root: root.to_path_buf(),
        incremental,
        state_file: None,
    }
}

#[test]
fn test_run_full_build() {
    let temp = TempDir::new().unwrap();
    let (root, source, config) = workspace(&temp);

    let code = cli::run_annotate(&run_args(&root, &config, false)).unwrap();
    assert_eq!(code, EXIT_SUCCESS);
    assert!(fs::read_to_string(&source).unwrap().contains("@ClassAnnotation"));
    assert!(
        !root.join(".javannotate-state.json").exists(),
        "full builds should not write incremental state"
    );
}

#[test]
fn test_run_incremental_skips_unchanged_files() {
    let temp = TempDir::new().unwrap();
    let (root, source, config) = workspace(&temp);
    fs::write(
        &config,
        r#"{"classes": {
            "codegen.TestClass": {"classAnnotations": ["@ClassAnnotation"]},
            "codegen.NestedTestClass": {"classAnnotations": ["@NestedAnnotation"]}
        }}"#,
    )
    .unwrap();
    let args = run_args(&root, &config, true);

    assert_eq!(cli::run_annotate(&args).unwrap(), EXIT_SUCCESS);
    assert!(root.join(".javannotate-state.json").exists());
    let recorded = Fingerprint::of(&source).unwrap();

    // Any rewrite from here on would land with a later mtime.
    thread::sleep(Duration::from_millis(50));

    // Nothing changed since the recorded run, so the file is not rewritten.
    assert_eq!(cli::run_annotate(&args).unwrap(), EXIT_SUCCESS);
    assert_eq!(Fingerprint::of(&source).unwrap(), recorded);

    // A new file has no recorded fingerprint and is picked up alone.
    let added = root.join("codegen/NestedTestClass.java");
    fs::copy(testdata("codegen/NestedTestClass.java"), &added).unwrap();
    assert_eq!(cli::run_annotate(&args).unwrap(), EXIT_SUCCESS);
    assert!(
        fs::read_to_string(&added).unwrap().contains("@NestedAnnotation"),
        "added file should be rewritten"
    );
    assert_eq!(
        Fingerprint::of(&source).unwrap(),
        recorded,
        "unchanged file should still be skipped"
    );
}

#[test]
fn test_run_incremental_config_change_processes_all() {
    let temp = TempDir::new().unwrap();
    let (root, source, config) = workspace(&temp);
    let args = run_args(&root, &config, true);
    assert_eq!(cli::run_annotate(&args).unwrap(), EXIT_SUCCESS);

    fs::write(
        &config,
        r#"{"classes": {"codegen.TestClass": {"classAnnotations": ["@Replaced"]}}}"#,
    )
    .unwrap();
    assert_eq!(cli::run_annotate(&args).unwrap(), EXIT_SUCCESS);
    assert!(fs::read_to_string(&source).unwrap().contains("@Replaced"));
}

#[test]
fn test_run_reports_parse_faults() {
    let temp = TempDir::new().unwrap();
    let (root, source, config) = workspace(&temp);
    fs::copy(
        testdata("codegen/CorruptJavaFile.java"),
        root.join("codegen/CorruptJavaFile.java"),
    )
    .unwrap();

    let code = cli::run_annotate(&run_args(&root, &config, false)).unwrap();
    assert_eq!(code, EXIT_FAILED);
    assert!(fs::read_to_string(&source).unwrap().contains("@ClassAnnotation"));
}

#[test]
fn test_run_preconditions() {
    let temp = TempDir::new().unwrap();
    let (root, _, config) = workspace(&temp);

    let missing_root = run_args(&temp.path().join("nope"), &config, false);
    assert_eq!(cli::run_annotate(&missing_root).unwrap(), EXIT_ERROR);

    let missing_config = run_args(&root, &temp.path().join("nope.json"), false);
    assert_eq!(cli::run_annotate(&missing_config).unwrap(), EXIT_ERROR);
}

#[test]
fn test_check_config() {
    let valid = CheckConfigArgs {
        config: testdata("cfg_several_annotations.yaml"),
    };
    assert_eq!(cli::run_check_config(&valid).unwrap(), EXIT_SUCCESS);

    let temp = TempDir::new().unwrap();
    let broken = temp.path().join("broken.json");
    fs::write(
        &broken,
        r#"{"classes": {"a.B": {"classAnnotations": ["not an annotation"]}}}"#,
    )
    .unwrap();
    let invalid = CheckConfigArgs { config: broken };
    assert_eq!(cli::run_check_config(&invalid).unwrap(), EXIT_ERROR);
}
