use std::env;

use tracing::{error, info};

use crate::data::{
    load_input, write_best_agent_csv, write_report_json, DEFAULT_BEST_AGENT_CSV_PATH,
    DEFAULT_REPORT_PATH,
};
use crate::dispatch::{NoDelay, UniformDelay};
use crate::server;

pub const BIND_ENV: &str = "DISPATCH_BIND";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

const USAGE: &str = "usage: delivery_dispatch <run|validate|serve>";
const RUN_USAGE: &str = "usage: delivery_dispatch run <input.json|input.yaml> [--report PATH] [--csv PATH] [--seed N] [--no-delay] [--table]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Run,
    Validate,
    Serve,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("run") => Some(Command::Run),
        Some("validate") => Some(Command::Validate),
        Some("serve") => Some(Command::Serve),
        _ => None,
    }
}

/// Flags accepted by `run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub input: String,
    pub report_path: String,
    pub csv_path: String,
    pub seed: Option<u64>,
    pub no_delay: bool,
    pub table: bool,
}

impl RunOptions {
    pub fn parse(args: &[String]) -> Option<Self> {
        let mut input = None;
        let mut options = Self {
            input: String::new(),
            report_path: DEFAULT_REPORT_PATH.to_string(),
            csv_path: DEFAULT_BEST_AGENT_CSV_PATH.to_string(),
            seed: None,
            no_delay: false,
            table: false,
        };

        let mut rest = args.iter().skip(2);
        while let Some(arg) = rest.next() {
            match arg.as_str() {
                "--report" => options.report_path = rest.next()?.clone(),
                "--csv" => options.csv_path = rest.next()?.clone(),
                "--seed" => options.seed = parse_seed_arg(rest.next()),
                "--no-delay" => options.no_delay = true,
                "--table" => options.table = true,
                positional if input.is_none() && !positional.starts_with("--") => {
                    input = Some(positional.to_string());
                }
                other => {
                    eprintln!("ignoring unexpected argument '{other}'");
                }
            }
        }

        options.input = input?;
        Some(options)
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Run) => handle_run(args),
        Some(Command::Validate) => handle_validate(args),
        Some(Command::Serve) => handle_serve(),
        None => {
            eprintln!("{USAGE}");
            2
        }
    }
}

fn handle_run(args: &[String]) -> i32 {
    let Some(options) = RunOptions::parse(args) else {
        eprintln!("{RUN_USAGE}");
        return 2;
    };

    let input = match load_input(&options.input) {
        Ok(input) => input,
        Err(err) => {
            eprintln!("run failed: {err}");
            return 1;
        }
    };

    let dispatched = if options.no_delay {
        input.dispatch(NoDelay)
    } else {
        let delay = options
            .seed
            .map(UniformDelay::from_seed)
            .unwrap_or_else(UniformDelay::from_entropy);
        info!(seed = delay.seed(), "using uniform delivery delay");
        input.dispatch(delay)
    };
    let report = match dispatched {
        Ok(report) => report,
        Err(err) => {
            error!(input = %options.input, "dispatch failed: {err}");
            eprintln!("run failed: {err}");
            return 1;
        }
    };

    println!("{}", report.validation());

    if let Err(err) = write_report_json(&report, &options.report_path) {
        eprintln!("run failed: {err}");
        return 1;
    }
    println!("Report Generated Successfully");

    if let Err(err) = write_best_agent_csv(&report, &options.csv_path) {
        eprintln!("run failed: {err}");
        return 1;
    }
    println!("Best agent exported to CSV");

    if options.table {
        println!("{report}");
    }

    0
}

fn handle_validate(args: &[String]) -> i32 {
    let Some(path) = args.get(2) else {
        eprintln!("usage: delivery_dispatch validate <input.json|input.yaml>");
        return 2;
    };

    let checked = load_input(path)
        .map_err(|err| err.to_string())
        .and_then(|input| input.validate().map_err(|err| err.to_string()));
    match checked {
        Ok(()) => {
            println!("validation passed: {path}");
            0
        }
        Err(err) => {
            eprintln!("validation failed: {err}");
            1
        }
    }
}

fn handle_serve() -> i32 {
    let bind_addr = env::var(BIND_ENV).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    match server::run_server(&bind_addr) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn parse_seed_arg(raw: Option<&String>) -> Option<u64> {
    let value = raw?;
    match value.parse::<u64>() {
        Ok(seed) => Some(seed),
        Err(_) => {
            eprintln!("invalid seed '{value}', using a random seed");
            None
        }
    }
}
