use boa_exec::ExecutionResult;
use boa_exec_core::config::ENV_CONFIG_PATH;
use boa_exec_core::{
    execute_with_console, read_bounded, BoundedReadError, ConsoleTarget, Error, ExecConfig,
    SourceKind, STDIN_LIMIT,
};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::ffi::{CStr, CString};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

const HELLO_SCRIPT: &CStr = c"console.log('hello from C from Rust from JavaScript!');";

// Exit codes. `stdin` follows the bounded-reader convention; `eval` and
// `run` use 1 for a script failure and 2 for anything else.
const EXIT_OK: i32 = 0;
const EXIT_READ_ERROR: i32 = 1;
const EXIT_TOO_LARGE: i32 = 2;
const EXIT_NULL_RESULT: i32 = 3;
const EXIT_WRITE_ERROR: i32 = 4;
const EXIT_SCRIPT_ERROR: i32 = 1;
const EXIT_ERROR: i32 = 2;

/// boa-exec — run JavaScript through the boa-exec boundary
///
/// Execute scripts from the command line, a file, or standard input.
#[derive(Parser)]
#[command(name = "boa-exec", version, about, long_about = None)]
struct Cli {
    /// JSON configuration file (limits, console target)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Do not print results of eval/run
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log debug information to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a fixed console.log script through the C boundary and free the result
    Hello,

    /// Execute a script read from standard input
    Stdin {
        /// Inputs of this many bytes or more are rejected (exit 2)
        #[arg(long, default_value_t = STDIN_LIMIT)]
        limit: usize,
    },

    /// Evaluate a script given as an argument
    Eval {
        /// JavaScript source
        source: String,
        #[command(flatten)]
        mode: EvalMode,
    },

    /// Execute a script file
    Run {
        /// Path to .js file
        file: PathBuf,
        #[command(flatten)]
        mode: EvalMode,
    },

    /// Show version information
    Version,
}

#[derive(clap::Args)]
struct EvalMode {
    /// Output as JSON (console output captured)
    #[arg(long)]
    json: bool,

    /// Run in strict mode
    #[arg(long)]
    strict: bool,

    /// Treat the source as an ECMAScript module
    #[arg(short, long)]
    module: bool,
}

impl EvalMode {
    fn apply(&self, mut config: ExecConfig) -> ExecConfig {
        if self.json {
            config.console = ConsoleTarget::Capture;
        }
        if self.strict {
            config.strict = true;
        }
        if self.module {
            config.source_kind = SourceKind::Module;
        }
        config
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(path) = &cli.config {
        // the C boundary reads its configuration from the environment
        std::env::set_var(ENV_CONFIG_PATH, path);
    }

    let exit_code = match cli.command {
        Commands::Hello => cmd_hello(),
        Commands::Stdin { limit } => cmd_stdin(limit),
        Commands::Eval { source, mode } => match load_config(cli.config.as_deref()) {
            Ok(config) => evaluate(&source, mode.apply(config), mode.json, cli.quiet),
            Err(e) => report_error(&e),
        },
        Commands::Run { file, mode } => {
            let config = match load_config(cli.config.as_deref()) {
                Ok(c) => c,
                Err(e) => process::exit(report_error(&e)),
            };
            match read_script(&file) {
                Ok(source) => evaluate(&source, mode.apply(config), mode.json, cli.quiet),
                Err(e) => report_error(&e),
            }
        }
        Commands::Version => {
            println!("boa-exec {} (engine: boa)", env!("CARGO_PKG_VERSION"));
            EXIT_OK
        }
    };

    process::exit(exit_code);
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ExecConfig, Error> {
    match path {
        Some(p) => ExecConfig::from_file(p),
        None => ExecConfig::from_env(),
    }
}

fn read_script(path: &Path) -> Result<String, Error> {
    let bytes = std::fs::read(path)?;
    let text = std::str::from_utf8(&bytes)?;
    Ok(text.to_string())
}

// ── hello / stdin: callers of the C boundary ──────────────

fn cmd_hello() -> i32 {
    let Some(result) = ExecutionResult::exec(HELLO_SCRIPT) else {
        eprintln!("{}: boa_exec returned null", "error".red());
        return EXIT_NULL_RESULT;
    };
    println!("Got back: \"{}\"", result);
    drop(result);
    println!("All freed!");
    EXIT_OK
}

fn cmd_stdin(limit: usize) -> i32 {
    let input = match read_bounded(io::stdin().lock(), limit) {
        Ok(bytes) => bytes,
        Err(BoundedReadError::Io(e)) => {
            eprintln!("stdin: {}", e);
            return EXIT_READ_ERROR;
        }
        Err(BoundedReadError::Oversized { limit }) => {
            tracing::warn!(limit, "input rejected without executing");
            return EXIT_TOO_LARGE;
        }
    };

    let Some(result) = ExecutionResult::exec(&until_nul(input)) else {
        return EXIT_NULL_RESULT;
    };

    let mut stdout = io::stdout().lock();
    if let Err(e) = stdout.write_all(result.as_bytes()).and_then(|_| stdout.flush()) {
        eprintln!("stdout: {}", e);
        return EXIT_WRITE_ERROR;
    }
    EXIT_OK
}

/// A C string sees the input up to its first NUL; do the same.
fn until_nul(mut bytes: Vec<u8>) -> CString {
    if let Some(end) = bytes.iter().position(|&b| b == 0) {
        bytes.truncate(end);
    }
    CString::new(bytes).unwrap_or_default()
}

// ── eval / run ────────────────────────────────────────────

fn evaluate(source: &str, config: ExecConfig, json: bool, quiet: bool) -> i32 {
    let outcome = execute_with_console(source, &config);
    let code = match &outcome.result {
        Ok(_) => EXIT_OK,
        Err(Error::Script(_)) => EXIT_SCRIPT_ERROR,
        Err(_) => EXIT_ERROR,
    };

    if json {
        let console = &outcome.console;
        let output = match &outcome.result {
            Ok(value) => serde_json::json!({
                "ok": true,
                "value": value,
                "console": console,
            }),
            Err(Error::Script(e)) => serde_json::json!({
                "ok": false,
                "kind": e.kind,
                "error": e.message,
                "console": console,
            }),
            Err(e) => serde_json::json!({
                "ok": false,
                "kind": "input",
                "error": e.to_string(),
                "console": console,
            }),
        };
        match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("{}: serialization error: {}", "error".red(), e);
                return EXIT_ERROR;
            }
        }
        return code;
    }

    match outcome.result {
        Ok(value) => {
            if !quiet {
                println!("{}", value);
            }
        }
        Err(e) => {
            report_error(&e);
        }
    }
    code
}

fn report_error(e: &Error) -> i32 {
    match e {
        Error::Script(s) => {
            eprintln!("{} {}", "Uncaught".red(), s.message);
            EXIT_SCRIPT_ERROR
        }
        other => {
            eprintln!("{}: {}", "error".red(), other);
            EXIT_ERROR
        }
    }
}
