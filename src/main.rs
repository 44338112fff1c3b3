use clap::{Parser, Subcommand};
use rust_bf_debug::commands::list::{self, ListArgs};
use rust_bf_debug::commands::run::{self, RunArgs};
use rust_bf_debug::config::Settings;
use rust_bf_debug::logging::init_logging;
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

fn print_top_usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run  [--debug|-d] [--timeout <SECONDS>] <SCRIPT>   # Run a script (path or name in the scripts directory)
  {0} list [--dir <DIR>]                                  # List scripts in the scripts directory

Global options:
  --log-file <PATH>   Append JSON execution records to PATH (fallback BF_LOG_FILE)

Run "{0} <subcommand> --help" for more info.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

#[derive(Parser, Debug)]
#[command(name = "bf", disable_help_flag = true, disable_help_subcommand = true)]
struct Cli {
    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,

    /// Append JSON execution records to PATH
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    Run(RunArgs),
    List(ListArgs),
}

fn main() {
    // We still pull the program name for help rendering consistency
    let program = env::args().next().unwrap_or_else(|| String::from("bf"));

    let cli = Cli::parse();

    if cli.help {
        print_top_usage_and_exit(&program, 0);
    }
    let Some(command) = cli.command else {
        print_top_usage_and_exit(&program, 2);
    };

    let settings = Settings::load();
    let log_file = cli.log_file.or_else(|| settings.log_file.clone());
    if let Err(e) = init_logging(log_file.as_deref()) {
        eprintln!("{program}: {e}");
        let _ = io::stderr().flush();
        std::process::exit(1);
    }

    let code = match command {
        Command::Run(args) => run::run(&program, args, &settings),
        Command::List(args) => list::run(&program, args, &settings),
    };

    std::process::exit(code);
}
