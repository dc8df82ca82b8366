//! `procflow` command-line entry point

use anyhow::Result;
use chrono::Local;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use procflow_cli::{commands, logging, CliConfig, LogFormat, ProcessInput};
use procflow_render::Format;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

fn input_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("steps")
                .long("steps")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("CSV file with one row per step"),
        )
        .arg(
            Arg::new("notes")
                .long("notes")
                .value_parser(value_parser!(PathBuf))
                .help("CSV file with one row per note"),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .help("Process name (defaults to the steps file name)"),
        )
}

fn cli() -> Command {
    Command::new("procflow")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Validate business process graphs and render their documentation")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file (default: ./procflow.toml if present)"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log every validation finding"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .global(true)
                .default_value("text")
                .value_parser(["text", "json"])
                .help("Log line format on stderr"),
        )
        .subcommand(
            input_args(Command::new("validate").about("Check a process and print the report")).arg(
                Arg::new("json")
                    .long("json")
                    .action(ArgAction::SetTrue)
                    .help("Print the report as JSON"),
            ),
        )
        .subcommand(
            input_args(Command::new("render").about("Write CSV, Mermaid and Markdown artifacts"))
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_parser(value_parser!(PathBuf))
                        .help("Base output directory"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .default_value("all")
                        .value_parser(["all", "csv", "mermaid", "markdown"])
                        .help("Artifact to produce"),
                ),
        )
}

fn process_input(args: &ArgMatches) -> ProcessInput {
    ProcessInput {
        steps: args.get_one::<PathBuf>("steps").cloned().unwrap_or_default(),
        notes: args.get_one::<PathBuf>("notes").cloned(),
        name: args.get_one::<String>("name").cloned(),
    }
}

fn formats(args: &ArgMatches) -> Vec<Format> {
    match args.get_one::<String>("format").map(String::as_str) {
        None | Some("all") => Format::ALL.to_vec(),
        Some(name) => name.parse().map(|f| vec![f]).unwrap_or_else(|_| Format::ALL.to_vec()),
    }
}

fn run(matches: &ArgMatches) -> Result<bool> {
    let verbose = matches.get_flag("verbose");
    let log_format = match matches.get_one::<String>("log-format").map(String::as_str) {
        Some("json") => LogFormat::Json,
        _ => LogFormat::Text,
    };
    logging::init(verbose, log_format);

    let config = CliConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?
        .with_verbose(verbose);
    let mut stdout = io::stdout().lock();

    match matches.subcommand() {
        Some(("validate", args)) => {
            commands::validate(&process_input(args), &config, args.get_flag("json"), &mut stdout)
        }
        Some(("render", args)) => {
            let config = config.with_output_dir(args.get_one::<PathBuf>("out").cloned());
            let dir = commands::render(
                &process_input(args),
                &config,
                &formats(args),
                Local::now(),
                &mut stdout,
            )?;
            Ok(dir.is_some())
        }
        _ => Ok(false),
    }
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    match run(&matches) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}
