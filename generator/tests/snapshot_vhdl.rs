// Snapshot tests: lock generated VHDL output to detect unintended behavior changes.
//
// Uses the library API (read → validate → build_table → emit) through
// `pipeline::generate`. Snapshots are managed by `insta` and stored under
// `generator/tests/snapshots/`.
//
// Run `cargo insta review` after intentional output changes to update baselines.

use std::path::{Path, PathBuf};

use twgen::emit::EmitOptions;

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn generate_fixture(name: &str, options: &EmitOptions) -> String {
    let path = fixtures_dir().join(name);
    let source = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {}", path.display(), e));
    let (vhdl, diagnostics) = twgen::pipeline::generate(&source, options)
        .unwrap_or_else(|diags| panic!("generation failed for {}: {:?}", name, diags));
    assert!(
        diagnostics.iter().all(|d| !d.is_error()),
        "unexpected errors: {:?}",
        diagnostics
    );
    vhdl
}

fn snapshot_fixture(name: &str, suffix: &str, options: &EmitOptions) {
    let vhdl = generate_fixture(name, options);
    assert!(!vhdl.is_empty(), "empty VHDL output for {}", name);
    let snap_name = format!("{}{}", name.replace('.', "_"), suffix);
    let vhdl = vhdl.trim_end();
    insta::assert_snapshot!(snap_name, vhdl);
}

// ── Per-fixture snapshot tests ─────────────────────────────────────────────

#[test]
fn snapshot_constants_vhd() {
    snapshot_fixture("constants.vhd", "", &EmitOptions::default());
}

#[test]
fn snapshot_constants_vhd_legacy() {
    snapshot_fixture("constants.vhd", "_legacy", &EmitOptions::legacy());
}

#[test]
fn snapshot_single_pair_vhd() {
    snapshot_fixture("single_pair.vhd", "", &EmitOptions::default());
}
