//! rowmend binary

mod cli;
mod logging;

use anyhow::Context;
use clap::ArgMatches;
use rowmend_core::{exit_code, CheckOutcome, EnhanceRequest, RunConfig, RunError, RunReport, Runner};
use rowmend_enhance::{load_enhancements, CoveragePolicy, ParagraphSeparator, RangeSelector};
use std::path::{Path, PathBuf};

fn main() {
    logging::init();

    let matches = match cli::build_cli().try_get_matches() {
        Ok(matches) => matches,
        Err(err) => {
            let _ = err.print();
            std::process::exit(if err.use_stderr() { exit_code::USAGE } else { exit_code::OK });
        }
    };

    let code = match run(&matches) {
        Ok(()) => exit_code::OK,
        Err(err) => report_error(&err),
    };
    std::process::exit(code);
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "rowmend starting");
    match matches.subcommand() {
        Some(("enhance", args)) => cmd_enhance(args),
        Some(("check", args)) => cmd_check(args),
        Some(("restore", args)) => cmd_restore(args),
        Some(("snapshots", args)) => cmd_snapshots(args),
        Some((other, _)) => anyhow::bail!("unknown command '{other}'"),
        None => anyhow::bail!("no command given"),
    }
}

fn report_error(err: &anyhow::Error) -> i32 {
    eprintln!("error: {err:#}");
    let Some(run_err) = err.downcast_ref::<RunError>() else {
        return exit_code::FAILURE;
    };
    let actions = run_err.recovery_actions();
    if !actions.is_empty() {
        eprintln!();
        eprintln!("what you can do:");
        for action in actions {
            eprintln!("  - {action}");
        }
    }
    run_err.exit_code()
}

/// Defaults, then config file, then environment, then shared flags
fn base_config(args: &ArgMatches) -> anyhow::Result<RunConfig> {
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let explicit = args.get_one::<PathBuf>("config").map(PathBuf::as_path);
    let mut config = RunConfig::discover(explicit, &cwd)
        .map_err(RunError::from)?
        .with_process_env();
    if let Some(dir) = args.get_one::<PathBuf>("snapshot-dir") {
        config = config.with_snapshot_dir(dir);
    }
    Ok(config)
}

fn parse_range(text: &str, rows: bool) -> Result<RangeSelector, RunError> {
    let selector: RangeSelector = text.parse()?;
    if rows {
        Ok(RangeSelector::from_row_numbers(selector.low().get(), selector.high().get())?)
    } else {
        Ok(selector)
    }
}

fn input(args: &ArgMatches) -> &Path {
    args.get_one::<PathBuf>("input")
        .map(PathBuf::as_path)
        .unwrap_or_else(|| Path::new(""))
}

fn cmd_enhance(args: &ArgMatches) -> anyhow::Result<()> {
    let rows = args.get_flag("rows");
    let mut config = base_config(args)?;
    if let Some(column) = args.get_one::<String>("column") {
        config = config.with_target_column(column);
    }
    if args.get_flag("strict") {
        config = config.with_coverage(CoveragePolicy::Strict);
    }
    if args.get_flag("escaped-separator") {
        config = config.with_separator(ParagraphSeparator::Escaped);
    }
    if let Some(expected) = args.get_one::<String>("expect-enhanced") {
        config = config.with_expect_enhanced(parse_range(expected, rows)?);
    }

    let selector = parse_range(args.get_one::<String>("range").map_or("", String::as_str), rows)?;
    let source = args
        .get_one::<PathBuf>("enhancements")
        .context("--enhancements is required")?;
    let enhancements = load_enhancements(source).map_err(RunError::from)?;

    let mut request = EnhanceRequest::new(input(args), selector, enhancements)
        .with_dry_run(args.get_flag("dry-run"));
    if let Some(output) = args.get_one::<PathBuf>("output") {
        request = request.with_output(output);
    }

    let store = config.snapshot_store(request.output_path());
    let report = Runner::new(config, store).enhance(&request)?;
    print_report(&report);
    Ok(())
}

fn cmd_check(args: &ArgMatches) -> anyhow::Result<()> {
    let config = base_config(args)?;
    let store = config.snapshot_store(input(args));
    match Runner::new(config, store).check(input(args))? {
        CheckOutcome::Bootstrap => {
            println!("bootstrap: no snapshot history; the next run starts fresh");
        }
        CheckOutcome::Reconciled(plan) => {
            println!("{} (snapshot {})", plan.classification, plan.snapshot);
            if !plan.ahead.is_empty() {
                println!("  {} field(s) enhanced since the snapshot", plan.ahead.len());
            }
            for r in &plan.restorations {
                println!("  lost: record {} {} '{}'", r.ordinal, r.key, r.column_name);
            }
            if !plan.is_noop() {
                println!("run `rowmend restore` to bring them back");
            }
        }
    }
    Ok(())
}

fn cmd_restore(args: &ArgMatches) -> anyhow::Result<()> {
    let config = base_config(args)?;
    let output = args.get_one::<PathBuf>("output").map(PathBuf::as_path);
    let store = config.snapshot_store(output.unwrap_or(input(args)));
    let report = Runner::new(config, store).restore(input(args), output, args.get_flag("dry-run"))?;
    print_report(&report);
    Ok(())
}

fn cmd_snapshots(args: &ArgMatches) -> anyhow::Result<()> {
    let config = base_config(args)?;
    let store = config.snapshot_store(input(args));
    let history = Runner::new(config, store).snapshots()?;
    if history.is_empty() {
        println!("no snapshots");
    }
    for meta in history {
        println!(
            "{}  {}  {:>6} records  {}  separator={}",
            meta.id,
            meta.created_at.to_rfc3339(),
            meta.record_count,
            meta.merkle_root.short(),
            meta.separator
        );
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    let path: Vec<String> = report.path.iter().map(ToString::to_string).collect();
    println!("{}", path.join(" -> "));
    if let Some(plan) = report.plan.as_ref().filter(|p| !p.is_noop()) {
        println!(
            "  restored {} field(s) in {} record(s) from snapshot {}",
            plan.restorations.len(),
            plan.restored_records().len(),
            plan.snapshot
        );
    }
    let e = &report.enhance;
    if e.modified_count() + e.already_present.len() + e.uncovered.len() > 0 {
        println!(
            "  enhanced {} record(s); {} already present; {} without enhancement",
            e.modified_count(),
            e.already_present.len(),
            e.uncovered.len()
        );
    }
    match &report.committed {
        Some(meta) => println!("  wrote {} (snapshot {})", report.output.display(), meta.id),
        None => println!("  nothing written"),
    }
}
