//! Tests for the read-only audits - translation keys and hardcoded text.

use std::collections::HashSet;
use std::fs;
use tempfile::TempDir;

use frontfix_core::{
    FindingKind, KeyIndex, KeyKind, ResolveOptions, WordListClassifier, audit_files,
    compare_keys, read_text, resolve_files,
};

#[test]
fn test_duplicate_keys_from_file() {
    let dir = TempDir::new().expect("Create temp dir");
    let path = dir.path().join("messages.de.yaml");
    fs::write(
        &path,
        "asset:\n  title: Anlage\n  list: Liste\n  title: Anlage (neu)\nuser:\n  name: Name\n",
    )
    .expect("Write translations");

    let index = KeyIndex::parse(&read_text(&path, 1024 * 1024).expect("Read translations"));
    let dups = index.duplicates();
    assert_eq!(dups.len(), 1);
    assert_eq!(dups[0].key, "asset.title");
    assert_eq!(dups[0].kind, KeyKind::Leaf);
    let values: Vec<&str> = dups[0].occurrences.iter().map(|o| o.value.as_str()).collect();
    assert_eq!(values, ["Anlage", "Anlage (neu)"]);
}

#[test]
fn test_compare_language_files() {
    let de = KeyIndex::parse("nav:\n  home: Start\n  help: Hilfe\nfooter: Fuß\n");
    let en = KeyIndex::parse("nav:\n  home: Home\nfooter: Footer\nlegal: Legal\n");
    let cmp = compare_keys(&de, &en);
    let left: Vec<(&str, &str)> = cmp
        .only_left
        .iter()
        .map(|m| (m.key.as_str(), m.value.as_str()))
        .collect();
    assert_eq!(left, [("nav.help", "Hilfe")]);
    assert_eq!(cmp.only_right[0].key, "legal");
    assert_eq!(cmp.only_right[0].value, "Legal");
    assert_eq!(cmp.common, 2);
    assert!(cmp.sections_only_left.is_empty());
    assert!(cmp.sections_only_right.is_empty());
}

#[test]
fn test_audit_tree() {
    let dir = TempDir::new().expect("Create temp dir");
    fs::write(
        dir.path().join("index.html.twig"),
        "{% trans_default_domain 'asset' %}\n<h1>{{ 'title'|trans }}</h1>\n<button>Save changes</button>\n",
    )
    .expect("Write index");
    fs::write(
        dir.path().join("clean.html.twig"),
        "<h1>{{ 'title'|trans({}, 'asset') }}</h1>\n",
    )
    .expect("Write clean");
    fs::write(dir.path().join("binary.html.twig"), b"\0\0\0").expect("Write binary");

    let files = resolve_files(&ResolveOptions {
        root: dir.path().to_path_buf(),
        ..Default::default()
    })
    .expect("Resolve");
    let report = audit_files(
        &files,
        &WordListClassifier::default(),
        &HashSet::new(),
        1024 * 1024,
    );

    assert_eq!(report.files_scanned, 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.files.len(), 1);
    assert_eq!(report.total(), 1);
    let finding = &report.files[0].findings[0];
    assert_eq!(finding.line, 3);
    assert_eq!(finding.kind, FindingKind::ElementText);
    assert_eq!(finding.text, "Save changes");
}

#[test]
fn test_audit_trans_usage_against_domains() {
    let dir = TempDir::new().expect("Create temp dir");
    fs::write(
        dir.path().join("show.html.twig"),
        "<h1>{{ 'asset.title'|trans }}</h1>\n\
         <a title=\"Delete the item\">{{ 'asset.delete'|trans({}, 'assets') }}</a>\n\
         <p>{{ 'asset.help'|trans({}) }}</p>\n",
    )
    .expect("Write template");

    let files = resolve_files(&ResolveOptions {
        root: dir.path().to_path_buf(),
        ..Default::default()
    })
    .expect("Resolve");
    let domains: HashSet<String> = ["asset".to_string()].into_iter().collect();
    let report = audit_files(&files, &WordListClassifier::default(), &domains, 1024 * 1024);

    let found: Vec<(usize, FindingKind)> = report.files[0]
        .findings
        .iter()
        .map(|f| (f.line, f.kind))
        .collect();
    assert_eq!(
        found,
        [
            (1, FindingKind::MissingTransParams),
            (2, FindingKind::Attribute),
            (2, FindingKind::InvalidDomain),
            (3, FindingKind::NoDomain),
        ]
    );
    let counts = report.count_by_kind();
    assert_eq!(counts.get(&FindingKind::Attribute), Some(&1));
    assert_eq!(counts.get(&FindingKind::ElementText), None);
}
