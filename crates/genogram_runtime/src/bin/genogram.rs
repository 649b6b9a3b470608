//! Genogram CLI entry point.

use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use genogram_runtime::{Format, Repl, RuntimeConfig, Session, logging};

/// CLI configuration parsed from arguments.
#[derive(Default)]
struct CliConfig {
    diagram: Option<PathBuf>,
    scripts: Vec<PathBuf>,
    batch_mode: bool,
    check_only: bool,
    show_help: bool,
    show_version: bool,
    format: Option<Format>,
    log_filter: Option<String>,
    undo_limit: Option<Option<usize>>,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let mut config = CliConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "-b" | "--batch" => config.batch_mode = true,
            "--check" => config.check_only = true,
            "-s" | "--script" => {
                i += 1;
                let path = args.get(i).ok_or("--script requires a path")?;
                config.scripts.push(PathBuf::from(path));
            }
            "-f" | "--format" => {
                i += 1;
                let name = args.get(i).ok_or("--format requires a value")?;
                config.format = Some(name.parse()?);
            }
            "--log" => {
                i += 1;
                let filter = args.get(i).ok_or("--log requires a filter")?;
                config.log_filter = Some(filter.clone());
            }
            "--undo-limit" => {
                i += 1;
                let value = args.get(i).ok_or("--undo-limit requires a value")?;
                config.undo_limit = Some(match value.as_str() {
                    "none" | "unbounded" => None,
                    n => Some(
                        n.parse()
                            .map_err(|_| format!("invalid --undo-limit value: {n}"))?,
                    ),
                });
            }
            arg if arg.starts_with('-') => {
                return Err(format!("unknown option: {arg}").into());
            }
            path => {
                if config.diagram.is_some() {
                    return Err(format!("only one diagram may be opened: {path}").into());
                }
                config.diagram = Some(PathBuf::from(path));
            }
        }
        i += 1;
    }

    Ok(config)
}

fn runtime_config(cli: &CliConfig) -> RuntimeConfig {
    let mut config = if cli.batch_mode || cli.check_only {
        RuntimeConfig::batch()
    } else {
        RuntimeConfig::default()
    };
    if let Some(format) = cli.format {
        config = config.with_format(format);
    }
    if let Some(filter) = &cli.log_filter {
        config = config.with_log_filter(filter.clone());
    }
    if let Some(limit) = cli.undo_limit {
        config = config.with_undo_limit(limit);
    }
    config
}

fn run(args: Vec<String>) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = parse_args(args)?;

    if cli.show_help {
        print_help();
        return Ok(ExitCode::SUCCESS);
    }

    if cli.show_version {
        println!("genogram {}", env!("CARGO_PKG_VERSION"));
        return Ok(ExitCode::SUCCESS);
    }

    let config = runtime_config(&cli);
    logging::init(&config.log_filter)?;

    let session = match &cli.diagram {
        Some(path) if path.exists() => Session::open(path, config.clone())?,
        Some(path) => {
            if cli.check_only {
                return Err(format!("no such diagram: {}", path.display()).into());
            }
            let mut session = Session::new(config.clone());
            session.save_as(path)?;
            session
        }
        None => Session::new(config.clone()),
    };

    if cli.check_only {
        return Ok(check(&session));
    }

    let mut repl = Repl::new(config)?.with_session(session);

    for script in &cli.scripts {
        let file = File::open(script)
            .map_err(|e| format!("failed to open script '{}': {e}", script.display()))?;
        if let Err((line, e)) = repl.run_script(BufReader::new(file)) {
            eprintln!("\x1b[31m{}:{line}: {e}\x1b[0m", script.display());
            return Ok(ExitCode::FAILURE);
        }
    }

    if cli.batch_mode {
        if cli.scripts.is_empty() {
            if let Err((line, e)) = repl.run_script(io::stdin().lock()) {
                eprintln!("\x1b[31mstdin:{line}: {e}\x1b[0m");
                return Ok(ExitCode::FAILURE);
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    if !cli.scripts.is_empty() {
        repl = repl.without_banner();
    }

    repl.run()?;
    Ok(ExitCode::SUCCESS)
}

/// Prints what loading repaired and validates the result.
fn check(session: &Session) -> ExitCode {
    let report = session.report();
    let graph = session.document().graph();
    println!("Entities: {}", graph.len());
    println!("Pruned: {}", report.pruned_count());
    for entry in &report.pruned {
        println!("  - {entry:?}");
    }
    println!("Dissolved multiple births: {}", report.dissolved.len());
    match session.document().validate() {
        Ok(()) => {
            println!("\x1b[32mok\x1b[0m");
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("\x1b[31minvalid: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    println!(
        "\x1b[1mgenogram\x1b[0m - Family relationship diagram editor

\x1b[1mUSAGE:\x1b[0m
    genogram [OPTIONS] [DIAGRAM]

\x1b[1mARGUMENTS:\x1b[0m
    [DIAGRAM]    Diagram file to open (created if missing)

\x1b[1mOPTIONS:\x1b[0m
    -h, --help             Print help information
    -V, --version          Print version information
    -b, --batch            Run scripts (or stdin) and exit
    -s, --script PATH      Run REPL commands from a file first
    -f, --format FORMAT    Save encoding: msgpack (default) or json
        --check            Load the diagram, report repairs, validate, exit
        --log FILTER       Log filter when RUST_LOG is unset (default: warn)
        --undo-limit N     Undo steps kept, or 'none' for unbounded

\x1b[1mEXAMPLES:\x1b[0m
    genogram                          Start with an empty diagram
    genogram smith.gen                Open smith.gen
    genogram --check smith.gen        Validate smith.gen
    genogram -b -s build.txt out.json Run build.txt against out.json

Type 'help' inside the REPL for its commands."
    );
}
