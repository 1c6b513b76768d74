use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn zdraw(workdir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("zdraw").expect("找不到 zdraw 可执行文件");
    cmd.current_dir(workdir).env_remove("ZDRAW_CONFIG");
    cmd
}

#[test]
fn loads_renders_and_saves_document() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("drawing.txt");
    let output = dir.path().join("saved.txt");
    fs::write(
        &input,
        "ShapeGroup 2\n  Rectangle 0 0 4 2\n  ShapeGroup 1\n    Circle 5 5 1\n",
    )
    .unwrap();

    zdraw(dir.path())
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .args(["--translate", "1", "-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("已从文件加载文档"))
        .stdout(predicate::str::contains("圆 圆心=(6, 4), 半径=1"))
        .stdout(predicate::str::contains("已保存到"));

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "ShapeGroup 2\n  Rectangle 1 -1 4 2\n  ShapeGroup 1\n    Circle 6 4 1\n"
    );
}

#[test]
fn falls_back_to_demo_when_default_input_is_missing() {
    let dir = tempfile::tempdir().unwrap();

    zdraw(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("已构建内置示例图形"));

    let saved = fs::read_to_string(dir.path().join("new_drawing_composite.txt")).unwrap();
    assert!(saved.starts_with("ShapeGroup 2\n"));
}

#[test]
fn config_file_selects_paths_and_indent() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("in.txt"), "ShapeGroup 1 ShapeGroup 1 Square 0 0 3").unwrap();
    let config = dir.path().join("zdraw.toml");
    fs::write(
        &config,
        "[document]\ninput = \"in.txt\"\noutput = \"out.txt\"\nindent = 0\n",
    )
    .unwrap();

    zdraw(dir.path()).arg("--config").arg(&config).assert().success();

    assert_eq!(
        fs::read_to_string(dir.path().join("out.txt")).unwrap(),
        "ShapeGroup 1\nShapeGroup 1\nSquare 0 0 3\n"
    );
}

#[test]
fn unknown_shape_kind_fails_without_writing_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.txt");
    let output = dir.path().join("out.txt");
    fs::write(&input, "ShapeGroup 1 Blob 1 2 3").unwrap();

    zdraw(dir.path())
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unregistered shape type: Blob"));

    assert!(!output.exists());
}
