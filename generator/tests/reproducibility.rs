// Reproducibility tests for generated packages.
//
// These tests verify that the generator produces byte-identical output
// for identical inputs, across runs and across the library and binary paths.

use std::path::{Path, PathBuf};
use std::process::Command;

use twgen::emit::EmitOptions;

fn twgen_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_twgen"))
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn run_twgen(args: &[&str]) -> String {
    let output = Command::new(twgen_binary())
        .args(args)
        .output()
        .expect("failed to run twgen");
    assert!(
        output.status.success(),
        "twgen failed with args {:?}\nstderr: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("non-UTF8 output")
}

/// Generating the same source twice produces byte-identical VHDL.
#[test]
fn same_source_identical_vhdl() {
    let src = fixture("constants.vhd");
    let first = run_twgen(&[src.to_str().unwrap()]);
    let second = run_twgen(&[src.to_str().unwrap()]);
    assert_eq!(first, second, "VHDL output should be byte-identical across runs");
}

#[test]
fn same_source_identical_legacy_vhdl() {
    let src = fixture("constants.vhd");
    let first = run_twgen(&["--legacy", src.to_str().unwrap()]);
    let second = run_twgen(&["--legacy", src.to_str().unwrap()]);
    assert_eq!(first, second);
}

/// Build info is a pure function of source, options and generator version.
#[test]
fn build_info_is_stable() {
    let src = fixture("single_pair.vhd");
    let first = run_twgen(&["--emit", "build-info", src.to_str().unwrap()]);
    let second = run_twgen(&["--emit", "build-info", src.to_str().unwrap()]);
    assert_eq!(first, second);
}

/// The binary writes exactly what the library generates.
#[test]
fn binary_matches_library() {
    let src = fixture("constants.vhd");
    let source = std::fs::read_to_string(&src).unwrap();
    let (library, _) = twgen::pipeline::generate(&source, &EmitOptions::default()).unwrap();
    let binary = run_twgen(&[src.to_str().unwrap()]);
    assert_eq!(library, binary);
}

/// Comments and layout of the parameter source do not affect the output.
#[test]
fn source_formatting_does_not_change_output() {
    let plain = "\
constant TW_PRES : integer := 6;
constant DFT_LG_DSPS : integer := 2;
constant DFT_SIZE : integer := 8;
";
    let decorated = "\
-- precision
constant TW_PRES     : integer := 6;   -- bits
  constant DFT_LG_DSPS : integer := 1 + 1;
constant DFT_SIZE    : natural := 2**3; -- points
";
    let options = EmitOptions::default();
    let (a, _) = twgen::pipeline::generate(plain, &options).unwrap();
    let (b, _) = twgen::pipeline::generate(decorated, &options).unwrap();
    assert_eq!(a, b);
}
