use clap::Args;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::cli_util::print_script_error;
use crate::config::Settings;
use crate::scripts;

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct ListArgs {
    /// Directory to list (fallback BF_SCRIPTS_DIR; default ./scripts)
    #[arg(long = "dir", value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: ListArgs, settings: &Settings) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let dir = args.dir.unwrap_or_else(|| settings.scripts_dir.clone());
    match scripts::list(&dir) {
        Ok(names) => {
            if names.is_empty() {
                eprintln!("{program}: no scripts in {}", dir.display());
                let _ = io::stderr().flush();
            }
            let mut out = io::stdout().lock();
            for name in names {
                let _ = writeln!(out, "{name}");
            }
            let _ = out.flush();
            0
        }
        Err(e) => {
            print_script_error(program, &e);
            1
        }
    }
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} list [--dir <DIR>]

Options:
  --dir <DIR>   Directory to list instead of the configured scripts directory
  --help, -h    Show this help

Description:
  Prints the name of every ".bf" script in the directory, one per line, sorted.
  Names can be passed straight to "{0} run".
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
