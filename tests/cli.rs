use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn levelbake(scene: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_levelbake"))
        .arg(scene)
        .args(args)
        .output()
        .expect("levelbake should start")
}

#[test]
fn level_artifact_is_named_after_the_scene_file() {
    let tmp = TempDir::new().unwrap();
    let scene = tmp.path().join("level_03.json");
    fs::copy(fixture("forest.json"), &scene).unwrap();
    let out = tmp.path().join("public");

    let output = levelbake(&scene, &["export-level", "--out", out.to_str().unwrap()]);

    assert!(output.status.success(), "{:?}", output);
    assert!(out.join("level_03.glb").is_file());
    assert!(!out.join("forest.glb").exists());
}

#[test]
fn dry_run_writes_nothing_but_can_save_the_scene() {
    let tmp = TempDir::new().unwrap();
    let scene = tmp.path().join("forest.json");
    fs::copy(fixture("forest.json"), &scene).unwrap();
    let saved = tmp.path().join("baked.json");

    let args = ["--dry-run", "--write-scene", saved.to_str().unwrap(), "chunks"];
    let output = levelbake(&scene, &args);

    assert!(output.status.success(), "{:?}", output);
    assert!(!tmp.path().join("chunks").exists());
    let baked = fs::read_to_string(&saved).unwrap();
    assert!(baked.contains("\"shack.001\""));
}
