//! Command-line definition

use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

fn input_arg() -> Arg {
    Arg::new("input")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("CSV working copy")
}

fn output_arg() -> Arg {
    Arg::new("output")
        .long("output")
        .short('o')
        .value_parser(value_parser!(PathBuf))
        .help("Write here instead of over the input")
}

fn dry_run_arg() -> Arg {
    Arg::new("dry-run")
        .long("dry-run")
        .action(ArgAction::SetTrue)
        .help("Compute and report, write nothing")
}

pub(crate) fn build_cli() -> Command {
    Command::new("rowmend")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Append-only enrichment of CSV rows, with snapshot-backed recovery")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Config file (default: ./rowmend.toml if present)"),
        )
        .arg(
            Arg::new("snapshot-dir")
                .long("snapshot-dir")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Snapshot directory (default: <output>.rowmend/)"),
        )
        .subcommand(
            Command::new("enhance")
                .about("Append enhancement text to a range of rows")
                .arg(input_arg())
                .arg(
                    Arg::new("range")
                        .long("range")
                        .short('r')
                        .required(true)
                        .help("Rows to enhance: LOW..HIGH, inclusive"),
                )
                .arg(
                    Arg::new("enhancements")
                        .long("enhancements")
                        .short('e')
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Enhancement file (.json, .yaml, .yml, .toml)"),
                )
                .arg(output_arg())
                .arg(
                    Arg::new("column")
                        .long("column")
                        .help("Default target column (default: Description)"),
                )
                .arg(
                    Arg::new("strict")
                        .long("strict")
                        .action(ArgAction::SetTrue)
                        .help("Fail if any selected row has no enhancement"),
                )
                .arg(
                    Arg::new("rows")
                        .long("rows")
                        .action(ArgAction::SetTrue)
                        .help("Ranges are spreadsheet row numbers (header is row 1)"),
                )
                .arg(
                    Arg::new("expect-enhanced")
                        .long("expect-enhanced")
                        .help("Rows that must already be enhanced: LOW..HIGH"),
                )
                .arg(
                    Arg::new("escaped-separator")
                        .long("escaped-separator")
                        .action(ArgAction::SetTrue)
                        .help("Separate paragraphs with a literal \\n\\n"),
                )
                .arg(dry_run_arg()),
        )
        .subcommand(
            Command::new("check")
                .about("Reconcile the working copy with its snapshot history; never writes")
                .arg(input_arg()),
        )
        .subcommand(
            Command::new("restore")
                .about("Restore enhancements the working copy lost")
                .arg(input_arg())
                .arg(output_arg())
                .arg(dry_run_arg()),
        )
        .subcommand(
            Command::new("snapshots")
                .about("List snapshot history")
                .arg(input_arg()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_is_well_formed() {
        build_cli().debug_assert();
    }

    #[test]
    fn parses_enhance_flags() {
        let matches = build_cli()
            .try_get_matches_from([
                "rowmend",
                "enhance",
                "gods.csv",
                "--range",
                "102..201",
                "--enhancements",
                "batch2.yaml",
                "--rows",
                "--strict",
                "--snapshot-dir",
                "/tmp/snaps",
            ])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "enhance");
        assert_eq!(args.get_one::<String>("range").unwrap(), "102..201");
        assert!(args.get_flag("rows"));
        assert!(args.get_flag("strict"));
        assert!(!args.get_flag("dry-run"));
        assert_eq!(
            args.get_one::<PathBuf>("snapshot-dir").unwrap(),
            &PathBuf::from("/tmp/snaps")
        );
    }

    #[test]
    fn enhance_requires_range_and_source() {
        assert!(build_cli()
            .try_get_matches_from(["rowmend", "enhance", "gods.csv"])
            .is_err());
    }
}
