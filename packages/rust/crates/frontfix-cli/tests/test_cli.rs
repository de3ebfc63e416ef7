//! End-to-end tests for the `frontfix` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use anyhow::{Context, Result};
use tempfile::TempDir;

const RULES: &str = r#"
name: a11y
rules:
  - name: btn-group-role
    pattern: '<div class="btn-group"'
    replacement: '<div class="btn-group" role="group" aria-label="Actions"'
    guard: { pattern: '^[^>]*\brole=', mode: forbid, side: after, window: 200 }
"#;

const TEMPLATE: &str = "<div class=\"btn-group\">\n  <a class=\"btn\">x</a>\n</div>\n";

fn frontfix(cwd: &Path, args: &[&str]) -> Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_frontfix"))
        .current_dir(cwd)
        .env("RUST_LOG", "off")
        .args(args)
        .output()
        .context("failed to spawn frontfix")
}

fn fixture() -> Result<TempDir> {
    let dir = TempDir::new()?;
    fs::create_dir_all(dir.path().join("templates/asset"))?;
    fs::write(dir.path().join("templates/asset/index.html.twig"), TEMPLATE)?;
    fs::write(dir.path().join("a11y.yaml"), RULES)?;
    Ok(dir)
}

#[test]
fn rewrite_dry_run_json_leaves_files_alone() -> Result<()> {
    let dir = fixture()?;
    let out = frontfix(
        dir.path(),
        &["rewrite", "--rules", "a11y.yaml", "--dry-run", "--output", "json"],
    )?;
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let report: serde_json::Value = serde_json::from_slice(&out.stdout)?;
    assert_eq!(report["dry_run"], true);
    assert_eq!(report["files_modified"], 1);
    assert_eq!(report["files"][0]["changes"][0]["rule"], "btn-group-role");

    let content = fs::read_to_string(dir.path().join("templates/asset/index.html.twig"))?;
    assert_eq!(content, TEMPLATE);
    Ok(())
}

#[test]
fn rewrite_twice_is_idempotent() -> Result<()> {
    let dir = fixture()?;
    let first = frontfix(dir.path(), &["rewrite", "--rules", "a11y.yaml", "--backup"])?;
    assert!(first.status.success());
    let text = String::from_utf8_lossy(&first.stdout);
    assert!(text.contains("wrote asset/index.html.twig: 1 change(s)"));
    assert!(dir.path().join("templates/asset/index.html.twig.bak").exists());

    let rewritten = fs::read_to_string(dir.path().join("templates/asset/index.html.twig"))?;
    assert!(rewritten.starts_with(r#"<div class="btn-group" role="group" aria-label="Actions">"#));

    let second = frontfix(dir.path(), &["rewrite", "--rules", "a11y.yaml"])?;
    assert!(second.status.success());
    assert!(String::from_utf8_lossy(&second.stdout).contains("files modified: 0"));
    Ok(())
}

#[test]
fn rules_come_from_config_file() -> Result<()> {
    let dir = fixture()?;
    fs::write(dir.path().join("frontfix.yaml"), "rules: [a11y.yaml]\n")?;
    let out = frontfix(dir.path(), &["rewrite", "--dry-run"])?;
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("would write asset/index.html.twig"));
    Ok(())
}

#[test]
fn bad_pattern_exits_non_zero() -> Result<()> {
    let dir = fixture()?;
    fs::write(
        dir.path().join("broken.yaml"),
        "rules:\n  - { name: broken, pattern: '(unclosed', replacement: x }\n",
    )?;
    let out = frontfix(dir.path(), &["rewrite", "--rules", "broken.yaml"])?;
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("broken"));
    let content = fs::read_to_string(dir.path().join("templates/asset/index.html.twig"))?;
    assert_eq!(content, TEMPLATE);
    Ok(())
}

#[test]
fn missing_root_exits_non_zero() -> Result<()> {
    let dir = fixture()?;
    let out = frontfix(
        dir.path(),
        &["rewrite", "--rules", "a11y.yaml", "--root", "nope"],
    )?;
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Root directory not found"));
    Ok(())
}

#[test]
fn unreadable_file_still_exits_zero() -> Result<()> {
    let dir = fixture()?;
    fs::write(dir.path().join("templates/broken.html.twig"), b"\0\0")?;
    let out = frontfix(dir.path(), &["rewrite", "--rules", "a11y.yaml"])?;
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("failures:       1"));
    assert!(text.contains("WARN broken.html.twig: read failed: Binary file detected"));
    Ok(())
}

#[test]
fn check_tags_reports_imbalance() -> Result<()> {
    let dir = fixture()?;
    fs::write(dir.path().join("templates/bad.html.twig"), "<h1>A</h1><h1>B\n")?;
    let out = frontfix(dir.path(), &["check-tags", "--tag", "h1"])?;
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("WARN bad.html.twig: <h1> unbalanced: 2 open / 1 close"));
    assert!(text.contains("2 file(s) scanned, 1 issue(s)"));
    Ok(())
}

#[test]
fn duplicates_and_compare_keys() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(
        dir.path().join("messages.de.yaml"),
        "nav:\n  title: Navigation\n  help: Hilfe\n  title: Navi\n",
    )?;
    fs::write(dir.path().join("messages.en.yaml"), "nav:\n  title: Navigation\nlegal: Legal\n")?;

    let dups = frontfix(dir.path(), &["duplicates", "messages.de.yaml"])?;
    assert!(dups.status.success());
    let text = String::from_utf8_lossy(&dups.stdout);
    assert!(text.contains("messages.de.yaml: 1 duplicate key(s)"));
    assert!(text.contains("nav.title (key) lines 2, 4"));

    let cmp = frontfix(
        dir.path(),
        &["compare-keys", "messages.de.yaml", "messages.en.yaml", "-o", "json"],
    )?;
    assert!(cmp.status.success());
    let json: serde_json::Value = serde_json::from_slice(&cmp.stdout)?;
    assert_eq!(json["only_left"][0]["key"], "nav.help");
    assert_eq!(json["only_left"][0]["value"], "Hilfe");
    assert_eq!(json["only_right"][0]["key"], "legal");
    assert_eq!(json["common"], 1);

    fs::write(dir.path().join("messages.fr.yaml"), "footer:\n  note: Note\n")?;
    let text = frontfix(
        dir.path(),
        &["compare-keys", "messages.de.yaml", "messages.fr.yaml"],
    )?;
    assert!(text.status.success());
    let text = String::from_utf8_lossy(&text.stdout);
    assert!(text.contains("  nav.help: Hilfe"));
    assert!(text.contains("Sections only in messages.de.yaml (1):\n  nav\n"));
    assert!(text.contains("Sections only in messages.fr.yaml (1):\n  footer\n"));
    Ok(())
}

#[test]
fn audit_text_with_custom_words() -> Result<()> {
    let dir = fixture()?;
    fs::write(
        dir.path().join("templates/dash.html.twig"),
        "<h1>Dashboard</h1>\n<p>{{ 'intro'|trans }}</p>\n",
    )?;
    fs::write(dir.path().join("words.txt"), "dashboard\n")?;

    let out = frontfix(dir.path(), &["audit-text", "--words", "words.txt"])?;
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("dash.html.twig:1: <h1> Dashboard"));
    assert!(text.contains("dash.html.twig:2: 'intro'|trans without arguments"));
    assert!(text.contains("  missing_trans_params: 1"));
    assert!(text.contains("2 finding(s) in 1 of 2 file(s)"));
    Ok(())
}

#[test]
fn audit_text_checks_domains() -> Result<()> {
    let dir = fixture()?;
    fs::write(
        dir.path().join("templates/list.html.twig"),
        "<p>{{ 'a'|trans({}, 'messages') }}</p>\n<p>{{ 'b'|trans({}, 'mesages') }}</p>\n",
    )?;

    let out = frontfix(
        dir.path(),
        &["audit-text", "--domain", "messages", "-o", "json"],
    )?;
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout)?;
    let findings = &json["files"][0]["findings"];
    assert_eq!(findings.as_array().map(Vec::len), Some(1));
    assert_eq!(findings[0]["kind"], "invalid_domain");
    assert_eq!(findings[0]["line"], 2);
    assert_eq!(findings[0]["text"], "mesages");

    let open = frontfix(dir.path(), &["audit-text", "-o", "json"])?;
    let json: serde_json::Value = serde_json::from_slice(&open.stdout)?;
    assert_eq!(json["files"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[test]
fn rewrite_validate_all_checks_untouched_files() -> Result<()> {
    let dir = fixture()?;
    fs::write(dir.path().join("templates/open.html.twig"), "<div>\n")?;

    let plain = frontfix(dir.path(), &["rewrite", "--rules", "a11y.yaml", "--dry-run"])?;
    assert!(plain.status.success());
    assert!(!String::from_utf8_lossy(&plain.stdout).contains("open.html.twig"));

    let all = frontfix(
        dir.path(),
        &["rewrite", "--rules", "a11y.yaml", "--dry-run", "--validate-all"],
    )?;
    assert!(all.status.success());
    assert!(
        String::from_utf8_lossy(&all.stdout)
            .contains("WARN open.html.twig: <div> unbalanced: 1 open / 0 close")
    );
    Ok(())
}
