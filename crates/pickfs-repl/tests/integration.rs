//! Integration tests for the pickfs console.
//!
//! These tests run scripts through the console and check its output.

use pickfs_kernel::ProviderConfig;
use pickfs_repl::Repl;
use rstest::rstest;

/// Helper to run multiple lines through a fresh console and collect outputs.
fn run_script(script: &str) -> Vec<String> {
    run_script_with(ProviderConfig::default(), script)
}

fn run_script_with(config: ProviderConfig, script: &str) -> Vec<String> {
    let mut repl = Repl::with_config(config).expect("Failed to create console");
    let mut outputs = Vec::new();

    for line in script.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match repl.process_line(line) {
            Ok(Some(output)) => outputs.push(output),
            Ok(None) => {}
            Err(e) => outputs.push(format!("ERROR: {e}")),
        }
    }

    outputs
}

/// Helper to check if output contains expected strings.
fn outputs_contain(outputs: &[String], expected: &[&str]) -> bool {
    let joined = outputs.join("\n");
    expected.iter().all(|e| joined.contains(e))
}

// ============================================================================
// Documents
// ============================================================================

#[test]
fn write_then_cat_streaming() {
    let outputs = run_script(
        r#"
        mkdir /notes
        write /notes/todo.txt buy milk
        cat /notes/todo.txt
    "#,
    );
    assert!(outputs_contain(
        &outputs,
        &["created folder /notes", "wrote 8 bytes to /notes/todo.txt", "buy milk"]
    ));
}

#[test]
fn write_then_cat_buffered() {
    let outputs = run_script(
        r#"
        /buffer on
        write /a.txt through a temp file
        cat /a.txt
    "#,
    );
    assert!(outputs_contain(&outputs, &["buffer locally: on", "through a temp file"]));
}

#[test]
fn listing_shows_kinds() {
    let outputs = run_script(
        r#"
        mkdir /dir
        touch /file.txt
        ls
    "#,
    );
    let listing = outputs.last().expect("ls should print");
    assert!(listing.lines().any(|l| l.starts_with('d') && l.ends_with("/dir")));
    assert!(listing.lines().any(|l| l.starts_with('f') && l.ends_with("/file.txt")));
}

#[test]
fn cp_mv_rename_rm() {
    let outputs = run_script(
        r#"
        mkdir /src
        mkdir /dst
        write /src/a.txt hello
        cp /src/a.txt /dst
        mv /dst/a.txt /
        rename /a.txt b.txt
        cat /b.txt
        rm /b.txt
        stat /b.txt
    "#,
    );
    assert!(outputs_contain(
        &outputs,
        &[
            "copied to /dst/a.txt",
            "moved to /a.txt",
            "renamed to /b.txt",
            "hello",
            "ERROR: not found: /b.txt",
        ]
    ));
}

#[test]
fn find_and_recent() {
    let outputs = run_script(
        r#"
        mkdir /a
        touch /a/xyz.txt
        touch /a/other.txt
        find xyz
        recent
    "#,
    );
    let found = &outputs[outputs.len() - 2];
    assert!(found.contains("/a/xyz.txt"));
    assert!(!found.contains("other"));

    let recent = &outputs[outputs.len() - 1];
    assert_eq!(recent.lines().count(), 4);
}

#[test]
fn cat_folder_is_an_error() {
    let outputs = run_script(
        r#"
        mkdir /dir
        cat /dir
    "#,
    );
    assert!(outputs_contain(&outputs, &["ERROR: invalid operation"]));
}

// ============================================================================
// Control surface
// ============================================================================

#[test]
fn seed_then_reset() {
    let outputs = run_script(
        r#"
        seed 40
        reset
        ls
    "#,
    );
    assert!(outputs_contain(&outputs, &["generated /generated-", "store reset", "(empty)"]));
}

#[test]
fn auth_gate_blocks_commands() {
    let outputs = run_script(
        r#"
        /auth off
        touch /x
        /auth on
        touch /x
    "#,
    );
    assert!(outputs_contain(
        &outputs,
        &["authenticated: off", "ERROR: please authenticate (createDocument)", "created file /x"]
    ));
}

#[test]
fn auth_can_start_closed() {
    let config = ProviderConfig {
        authenticated: false,
        ..ProviderConfig::default()
    };
    let outputs = run_script_with(config, "/flags\nls");
    assert!(outputs_contain(&outputs, &["authenticated: off", "ERROR: please authenticate"]));
}

#[test]
fn changes_are_drained() {
    let outputs = run_script(
        r#"
        touch /a
        /changes
        /changes
    "#,
    );
    assert!(outputs_contain(&outputs, &["changed /a\nchanged /", "(no changes)"]));
}

#[test]
fn quit_marks_done() {
    let mut repl = Repl::with_config(ProviderConfig::default()).expect("Failed to create console");
    assert!(!repl.is_done());
    repl.process_line("/quit").expect("quit should not fail");
    assert!(repl.is_done());
}

// ============================================================================
// Bad input
// ============================================================================

#[rstest]
#[case("frobnicate /a", "unknown command: frobnicate")]
#[case("cp /a", "wrong arguments for cp")]
#[case("seed lots", "not a count: lots")]
#[case("/buffer maybe", "expected on or off")]
#[case("/nonsense", "Unknown command: /nonsense")]
fn bad_input_is_reported(#[case] line: &str, #[case] expected: &str) {
    let outputs = run_script(line);
    assert!(
        outputs_contain(&outputs, &[expected]),
        "expected {expected:?} in {outputs:?}"
    );
}
