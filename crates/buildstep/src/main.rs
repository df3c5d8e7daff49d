//! Buildstep CLI - run cancellable build steps from the command line
//!
//! Binary name: `buildstep`

use std::process;

mod cli;
mod definition;
mod report;

use cli::handlers::{exit_code_for, run_cli};

#[tokio::main]
async fn main() {
    let code = match run_cli().await {
        Ok(code) => code,
        Err(err) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Error: {err:#}");
            }
            exit_code_for(&err)
        }
    };

    #[allow(clippy::exit)]
    process::exit(code);
}
