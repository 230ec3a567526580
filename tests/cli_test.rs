//! Argument validation at the command boundary.

use clap::Parser;
use rstest::rstest;
use tempfile::TempDir;

use hofbauer::cli::args::Cli;
use hofbauer::cli::commands::execute_command;
use hofbauer::cli::CliError;
use hofbauer::exitcode;
use hofbauer::util::testing;

fn run(args: &[&str]) -> Result<(), CliError> {
    testing::init_test_setup();
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("hofbauer.toml");
    std::fs::write(&config, "").unwrap();
    let config = config.to_string_lossy().into_owned();

    let mut argv = vec!["hofbauer", "--config", config.as_str()];
    argv.extend_from_slice(args);
    execute_command(&Cli::parse_from(argv))
}

#[rstest]
#[case(&["assemble", "--depth", "0"])]
#[case(&["assemble", "--passes", "0"])]
#[case(&["assemble", "-k", "0"])]
#[case(&["tower", "--depth", "0"])]
#[case(&["ulam", "--bins", "0"])]
#[case(&["ulam", "--samples", "0"])]
fn given_zero_parameter_when_executing_then_usage_exit(#[case] args: &[&str]) {
    let err = run(args).unwrap_err();

    assert!(matches!(err, CliError::InvalidArgs(_)), "{err:?}");
    assert_eq!(err.exit_code(), exitcode::USAGE);
}

#[test]
fn given_unknown_map_when_executing_then_usage_exit() {
    let err = run(&["tower", "--map", "logistic"]).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::USAGE);
}

#[test]
fn given_valid_assemble_when_executing_then_ok() {
    run(&["assemble", "--slope", "1.8", "-k", "3", "--depth", "2"]).unwrap();
}
