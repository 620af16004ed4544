use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const CORRECTNESS: &str = r#"
tests:
  - name: vector assignment
    indices:
      - symbol: i
        static extent: 4
    tensors:
      - name: A
        extents: [i]
      - name: B
        extents: [i]
    expression: "A(i) = B(i);"
"#;

const COMPILE_TIME_CHECKS: &str = r#"
tests:
  - name: rank mismatch
    indices:
      - symbol: i
        static extent: 3
        allow dynamic: false
    setup:
      tensors:
        - name: A
          extents: [i]
    with bug:
      lines:
        - "A(i,i) = 1;"
    correct:
      lines:
        - "A(i) = 1;"
"#;

fn get_binary_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.push("ktgen");
    path
}

/// Run ktgen inside `dir` with an empty project configuration, so neither
/// the caller's environment nor a home configuration leaks in.
fn run_ktgen(dir: &Path, args: &[&str]) -> Output {
    Command::new(get_binary_path())
        .args(args)
        .current_dir(dir)
        .env_remove("KTGEN_CONFIG")
        .env_remove("KTGEN_ROOT")
        .env_remove("KTGEN_SEED")
        .env_remove("KTGEN_DEFAULT_EXTENT")
        .env_remove("KTGEN_RUN_ARGS")
        .env_remove("KTGEN_DEBUG")
        .env_remove("KTGEN_LOG_LEVEL")
        .output()
        .expect("Failed to execute ktgen binary")
}

fn tests_root() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join(".ktgen.yaml"), "{}\n").unwrap();
    for (dir, contents) in [
        ("correctness", CORRECTNESS),
        ("compile_time_checks", COMPILE_TIME_CHECKS),
    ] {
        fs::create_dir(temp_dir.path().join(dir)).unwrap();
        fs::write(
            temp_dir.path().join(dir).join("test_definitions.yaml"),
            contents,
        )
        .unwrap();
    }
    temp_dir
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_help_lists_commands() {
    let temp_dir = tests_root();
    let output = run_ktgen(temp_dir.path(), &["--help"]);
    assert!(output.status.success());
    let text = stdout(&output);
    for command in ["generate", "check", "plan", "config"] {
        assert!(text.contains(command), "help is missing {command}: {text}");
    }
}

#[test]
fn test_generate_then_check() {
    let temp_dir = tests_root();
    let root = temp_dir.path();

    let output = run_ktgen(root, &["generate"]);
    assert!(output.status.success(), "generate failed: {}", stderr(&output));
    assert!(stdout(&output).contains("correctness: 4 written, 0 unchanged"));
    assert!(stdout(&output).contains("compile_time_checks: 3 written, 0 unchanged"));

    assert!(root.join("correctness/vector_assignment/s.cpp").exists());
    assert!(root.join("correctness/vector_assignment/d.cpp").exists());
    assert!(root.join("compile_time_checks/rank_mismatch/s.cpp").exists());
    assert_eq!(
        fs::read_to_string(root.join("correctness/CMakeLists.txt")).unwrap(),
        "add_subdirectory(\"vector_assignment\")\n"
    );

    let output = run_ktgen(root, &["check"]);
    assert!(output.status.success(), "check failed: {}", stdout(&output));
    assert!(stdout(&output).contains("All 7 generated files are up to date"));

    let output = run_ktgen(root, &["generate"]);
    assert!(stdout(&output).contains("correctness: 0 written, 4 unchanged"));
}

#[test]
fn test_check_reports_stale_and_missing_files() {
    let temp_dir = tests_root();
    let root = temp_dir.path();
    assert!(run_ktgen(root, &["generate"]).status.success());

    let source = root.join("correctness/vector_assignment/s.cpp");
    let edited = fs::read_to_string(&source).unwrap().replace("return 0;", "return 2;");
    fs::write(&source, edited).unwrap();
    fs::remove_file(root.join("compile_time_checks/CMakeLists.txt")).unwrap();

    let output = run_ktgen(root, &["check"]);
    assert!(!output.status.success());
    let text = stdout(&output);
    assert!(text.contains("stale: correctness/vector_assignment/s.cpp"), "{text}");
    assert!(text.contains("-    return 2;"), "{text}");
    assert!(text.contains("+    return 0;"), "{text}");
    assert!(text.contains("missing: compile_time_checks/CMakeLists.txt"), "{text}");
    assert!(stderr(&output).contains("2 of 7 generated files are out of date"));
}

#[test]
fn test_malformed_definitions_write_nothing() {
    let temp_dir = tests_root();
    let root = temp_dir.path();
    fs::write(
        root.join("compile_time_checks/test_definitions.yaml"),
        "tests: [ {name: broken\n",
    )
    .unwrap();

    let output = run_ktgen(root, &["generate"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to expand compile_time_checks tests"));
    assert!(!root.join("correctness/vector_assignment").exists());
}

#[test]
fn test_missing_expression_is_reported() {
    let temp_dir = tests_root();
    let root = temp_dir.path();
    fs::write(
        root.join("correctness/test_definitions.yaml"),
        "tests:\n  - name: no expression\n",
    )
    .unwrap();

    let output = run_ktgen(root, &["--category", "correctness", "generate"]);
    assert!(!output.status.success());
    let text = stderr(&output);
    assert!(text.contains("no expression"), "{text}");
    assert!(text.contains("expression"), "{text}");
}

#[test]
fn test_category_selection() {
    let temp_dir = tests_root();
    let root = temp_dir.path();
    fs::remove_dir_all(root.join("compile_time_checks")).unwrap();

    let output = run_ktgen(root, &["generate"]);
    assert!(!output.status.success(), "missing category should fail");

    let output = run_ktgen(root, &["generate", "--category", "correctness"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(root.join("correctness/CMakeLists.txt").exists());
    assert!(!root.join("compile_time_checks").exists());
}

#[test]
fn test_root_option() {
    let temp_dir = tests_root();
    let nested = temp_dir.path().join("tests");
    fs::create_dir(&nested).unwrap();
    for dir in ["correctness", "compile_time_checks"] {
        fs::rename(temp_dir.path().join(dir), nested.join(dir)).unwrap();
    }

    let output = run_ktgen(temp_dir.path(), &["--root", "tests", "generate"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(nested.join("correctness/vector_assignment/d.cpp").exists());
}

#[test]
fn test_plan_text_and_json() {
    let temp_dir = tests_root();
    let root = temp_dir.path();

    let output = run_ktgen(root, &["plan"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("  vector_assignment (vector assignment)"));
    assert!(text.contains("    [d] xc_vector_assignment_d"));
    assert!(text.contains("      run run_test_vector_assignment_d"));
    assert!(text.contains("      build test_rank_mismatch_s_with_bug (must fail)"));

    let output = run_ktgen(root, &["plan", "--json"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json[0]["category"], "correctness");
    assert_eq!(json[0]["specs"][0]["variants"].as_array().unwrap().len(), 2);
    assert_eq!(json[1]["category"], "compile_time_checks");
    assert!(!root.join("correctness/CMakeLists.txt").exists());
}

#[test]
fn test_run_args_reach_registration() {
    let temp_dir = tests_root();
    let root = temp_dir.path();

    let output = run_ktgen(root, &["--run-args", "6,7", "generate"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let cmake =
        fs::read_to_string(root.join("correctness/vector_assignment/CMakeLists.txt")).unwrap();
    assert!(cmake.contains("COMMAND $<TARGET_FILE:xc_vector_assignment_d> 6 7\n"));
}

#[test]
fn test_config_file_and_show() {
    let temp_dir = tests_root();
    let root = temp_dir.path();
    fs::write(
        root.join(".ktgen.yaml"),
        "extents:\n  default_static: 6\nbuild:\n  run_arguments: [8]\n",
    )
    .unwrap();

    let output = run_ktgen(root, &["--seed", "42", "config", "show"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("default_static: 6"), "{text}");
    assert!(text.contains("seed: 42"), "{text}");

    let output = run_ktgen(root, &["config", "generate", "--output", "ktgen.toml"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let toml = fs::read_to_string(root.join("ktgen.toml")).unwrap();
    assert!(toml.contains("default_static = 6"), "{toml}");
}

#[test]
fn test_seeded_category_run_matches_full_run() {
    let temp_dir = tests_root();
    let root = temp_dir.path();
    for dir in ["correctness", "compile_time_checks"] {
        let path = root.join(dir).join("test_definitions.yaml");
        let unspecified = fs::read_to_string(&path)
            .unwrap()
            .lines()
            .filter(|line| !line.contains("static extent"))
            .map(|line| format!("{line}\n"))
            .collect::<String>();
        fs::write(&path, unspecified).unwrap();
    }

    let output = run_ktgen(root, &["--seed", "9", "generate"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let output = run_ktgen(
        root,
        &["--seed", "9", "--category", "compile-time-checks", "check"],
    );
    assert!(output.status.success(), "{}", stdout(&output));
}

#[test]
fn test_too_few_run_args_for_dynamic_slots() {
    let temp_dir = tests_root();
    let root = temp_dir.path();
    fs::write(
        root.join("correctness/test_definitions.yaml"),
        "tests:\n  - name: two slots\n    indices:\n      - symbol: i\n      \
         - symbol: j\n    expression: \"x = 1;\"\n",
    )
    .unwrap();

    let output = run_ktgen(root, &["--run-args", "3", "generate"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("only 1 run arguments are configured"));
    assert!(!root.join("correctness/two_slots").exists());
}

#[test]
fn test_zero_default_extent_is_rejected() {
    let temp_dir = tests_root();
    let output = run_ktgen(temp_dir.path(), &["--default-extent", "0", "generate"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("default static extent must be positive"));
}
