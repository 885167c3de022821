use super::{CleanupArg, Cli, FailureArg, ResumeArg};
use clap::Parser;
use ismdl_core::config::{CleanupMode, FailurePolicy, IsmConfig, ResumeCheck};
use std::path::{Path, PathBuf};

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn cli_parse_minimal_uses_defaults() {
    let cli = parse(&["ismdl", "-i", "https://example.com/v.ism"]);
    assert_eq!(cli.input, "https://example.com/v.ism");
    assert!(cli.dir.is_none());
    assert_eq!(cli.work_dir(), PathBuf::from("download"));
    assert_eq!(cli.output, PathBuf::from("out.mp4"));
    assert!(cli.manifest.is_none());
    assert!(!cli.sequential);
    assert!(!cli.audio_bsf);
    assert!(!cli.keep_parts);
    assert!(!cli.overwrite);
}

#[test]
fn cli_parse_requires_input() {
    assert!(Cli::try_parse_from(["ismdl"]).is_err());
}

#[test]
fn cli_parse_paths_and_hidden_manifest() {
    let cli = parse(&[
        "ismdl",
        "-i",
        "https://example.com/v.ism/",
        "-d",
        "/tmp/frags",
        "-o",
        "lecture.mp4",
        "-m",
        "/tmp/frags/_manifest.txt",
    ]);
    assert_eq!(cli.work_dir(), PathBuf::from("/tmp/frags"));
    assert_eq!(cli.output, PathBuf::from("lecture.mp4"));
    assert_eq!(cli.manifest.as_deref(), Some(Path::new("/tmp/frags/_manifest.txt")));
}

#[test]
fn cli_parse_value_enums() {
    let cli = parse(&[
        "ismdl",
        "-i",
        "https://example.com/v.ism",
        "--cleanup",
        "directory",
        "--on-failure",
        "proceed",
        "--resume-check",
        "non-empty",
    ]);
    assert_eq!(cli.cleanup, Some(CleanupArg::Directory));
    assert_eq!(cli.on_failure, Some(FailureArg::Proceed));
    assert_eq!(cli.resume_check, Some(ResumeArg::NonEmpty));
}

#[test]
fn cli_parse_rejects_unknown_cleanup_mode() {
    assert!(Cli::try_parse_from(["ismdl", "-i", "https://e.com/v.ism", "--cleanup", "all"]).is_err());
}

#[test]
fn cli_sequential_conflicts_with_workers() {
    assert!(Cli::try_parse_from(["ismdl", "-i", "https://e.com/v.ism", "--sequential", "-j", "4"]).is_err());
}

#[test]
fn overrides_workers_and_sequential() {
    let cfg = parse(&["ismdl", "-i", "https://e.com/v.ism", "-j", "8"]).apply_overrides(IsmConfig::default());
    assert_eq!(cfg.workers, 8);
    let cfg = parse(&["ismdl", "-i", "https://e.com/v.ism", "--sequential"]).apply_overrides(IsmConfig::default());
    assert_eq!(cfg.workers, 1);
    let cfg = parse(&["ismdl", "-i", "https://e.com/v.ism"]).apply_overrides(IsmConfig::default());
    assert_eq!(cfg.workers, IsmConfig::default().workers);
}

#[test]
fn explicit_dir_defaults_to_directory_cleanup() {
    let cfg = parse(&["ismdl", "-i", "https://e.com/v.ism", "-d", "frags"]).apply_overrides(IsmConfig::default());
    assert_eq!(cfg.cleanup, CleanupMode::Directory);
    let cfg = parse(&["ismdl", "-i", "https://e.com/v.ism"]).apply_overrides(IsmConfig::default());
    assert_eq!(cfg.cleanup, CleanupMode::Intermediates);
}

#[test]
fn explicit_cleanup_flag_wins_over_dir() {
    let cfg = parse(&[
        "ismdl",
        "-i",
        "https://e.com/v.ism",
        "-d",
        "frags",
        "--cleanup",
        "intermediates",
    ])
    .apply_overrides(IsmConfig::default());
    assert_eq!(cfg.cleanup, CleanupMode::Intermediates);
}

#[test]
fn overrides_failure_and_resume_policies() {
    let cfg = parse(&[
        "ismdl",
        "-i",
        "https://e.com/v.ism",
        "--on-failure",
        "proceed",
        "--resume-check",
        "non-empty",
    ])
    .apply_overrides(IsmConfig::default());
    assert_eq!(cfg.on_fragment_failure, FailurePolicy::Proceed);
    assert_eq!(cfg.resume_check, ResumeCheck::NonEmpty);
}
