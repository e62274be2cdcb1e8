//! End-to-end checks of the editor-facing API on a small multi-file
//! workspace.

use nixref::TextSize;
use nixref::hir::{DiagnosticsConfig, codes};
use nixref::ide::{AnalysisHost, TokenType};

const DEFAULT_NIX: &str = r#"{ pkgs ? import <nixpkgs> { } }:
let
  inherit (pkgs) lib;
  version = "1.0";
  mkPackage = name: pkgs.stdenv.mkDerivation {
    pname = name;
    inherit version;
  };
in {
  hello = mkPackage "hello";
  world = mkPackage "world";
  names = builtins.attrNames { inherit version; };
}
"#;

fn offset_of(text: &str, needle: &str, nth: usize) -> TextSize {
    let (offset, _) = text
        .match_indices(needle)
        .nth(nth)
        .unwrap_or_else(|| panic!("{needle} #{nth} not found"));
    TextSize::from(offset as u32)
}

#[test]
fn test_goto_definition_across_bindings() {
    let mut host = AnalysisHost::new();
    let file = host.set_file_content("/project/default.nix", DEFAULT_NIX);
    let analysis = host.analysis();

    // the usage in `hello = mkPackage "hello";`
    let targets = analysis.goto_definition(file, offset_of(DEFAULT_NIX, "mkPackage", 1));
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].name, "mkPackage");
    assert_eq!(targets[0].start.line, 4);
    assert_eq!(targets[0].start.col, 2);

    // `inherit (pkgs) lib;`
    let offset = offset_of(DEFAULT_NIX, "(pkgs)", 0) + TextSize::from(1);
    let targets = analysis.goto_definition(file, offset);
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].start.line, 0);
}

#[test]
fn test_find_references_to_let_binding() {
    let mut host = AnalysisHost::new();
    let file = host.set_file_content("/project/default.nix", DEFAULT_NIX);
    let analysis = host.analysis();

    let references = analysis.find_references(file, offset_of(DEFAULT_NIX, "mkPackage", 0));
    let lines: Vec<_> = references
        .iter()
        .map(|r| (r.start.line, r.is_declaration))
        .collect();
    assert_eq!(lines, [(4, true), (9, false), (10, false)]);
}

#[test]
fn test_references_include_inherits() {
    let mut host = AnalysisHost::new();
    let file = host.set_file_content("/project/default.nix", DEFAULT_NIX);
    let analysis = host.analysis();

    let references = analysis.find_references(file, offset_of(DEFAULT_NIX, "version", 0));
    let usages = references.iter().filter(|r| !r.is_declaration).count();
    assert_eq!(usages, 2);
}

#[test]
fn test_semantic_tokens_classify_usages() {
    let mut host = AnalysisHost::new();
    let file = host.set_file_content("/project/default.nix", DEFAULT_NIX);
    let tokens = host.analysis().semantic_tokens(file);

    let kind_at = |line: u32, col: u32| {
        tokens
            .iter()
            .find(|t| t.line == line && t.col == col)
            .map(|t| t.token_type)
    };
    // `import` in the default of `pkgs`
    assert_eq!(kind_at(0, 9), Some(TokenType::Builtin));
    // `pkgs.stdenv.mkDerivation`
    assert_eq!(kind_at(4, 20), Some(TokenType::Parameter));
    assert_eq!(kind_at(4, 25), Some(TokenType::Property));
    // `builtins.attrNames`
    assert_eq!(kind_at(11, 10), Some(TokenType::Builtin));
    assert_eq!(kind_at(11, 19), Some(TokenType::Builtin));
}

#[test]
fn test_diagnostics_for_workspace() {
    let mut host = AnalysisHost::new();
    let good = host.set_file_content("/project/default.nix", DEFAULT_NIX);
    let bad = host.set_file_content("/project/broken.nix", "let a = 1; a = 2; in b");
    let analysis = host.analysis();
    let config = DiagnosticsConfig::default();

    assert!(analysis.diagnostics(good, &config).is_empty());

    let mut found: Vec<String> = analysis
        .diagnostics(bad, &config)
        .into_iter()
        .filter_map(|d| d.code.map(|code| code.to_string()))
        .collect();
    found.sort();
    assert_eq!(found, [codes::UNDEFINED_VARIABLE, codes::DUPLICATE_BINDING]);

    let quiet = DiagnosticsConfig {
        undefined_variables: false,
        ..DiagnosticsConfig::default()
    };
    assert_eq!(analysis.diagnostics(bad, &quiet).len(), 1);
}

#[test]
fn test_interpolated_path_is_clean() {
    let text = "x: ./foo/${x}.nix";
    let mut host = AnalysisHost::new();
    let file = host.set_file_content("/project/path.nix", text);
    let analysis = host.analysis();

    assert!(analysis.diagnostics(file, &DiagnosticsConfig::default()).is_empty());
    let targets = analysis.goto_definition(file, offset_of(text, "x", 1));
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].start.col, 0);
}

#[test]
fn test_files_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shell.nix");
    std::fs::write(&path, "with import <nixpkgs> { }; mkShell { }").unwrap();

    let mut host = AnalysisHost::new();
    let file = host.load_file(&path).unwrap();
    assert_eq!(host.file_id(&path), Some(file));
    let tokens = host.analysis().semantic_tokens(file);
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[1].token_type, TokenType::Variable);
}
