//! CLI command definitions using `clap`

use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, Command as ClapCommand};

pub fn after_help_text(examples: &[&str]) -> String {
    let mut text = String::from("EXAMPLES:\n");
    for example in examples {
        text.push_str("  ");
        text.push_str(example);
        text.push('\n');
    }
    text
}

fn trailing_command() -> Arg {
    Arg::new("command")
        .required(true)
        .num_args(1..)
        .last(true)
        .value_name("COMMAND")
        .help("Program and arguments to run, after `--`")
}

pub fn cmd_run() -> ClapCommand {
    ClapCommand::new("run")
        .about("Run every step of a build definition file")
        .arg(
            Arg::new("definition")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML file listing the build steps"),
        )
        .after_help(after_help_text(&[
            "buildstep run build.toml          Run the steps in build.toml",
            "buildstep -v run build.toml       Same, with debug logging",
        ]))
}

pub fn cmd_sleep() -> ClapCommand {
    ClapCommand::new("sleep")
        .about("Run a single delay step")
        .arg(
            Arg::new("seconds")
                .required(true)
                .value_parser(value_parser!(f64))
                .help("How long to wait, fractions allowed"),
        )
}

pub fn cmd_lock() -> ClapCommand {
    ClapCommand::new("lock")
        .about("Hold an exclusive advisory lock on a file while a command runs")
        .arg(
            Arg::new("path")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Existing file to lock"),
        )
        .arg(
            Arg::new("key")
                .long("key")
                .value_name("KEY")
                .help("Build property to publish the lock handle under"),
        )
        .arg(trailing_command())
        .after_help(after_help_text(&[
            "buildstep lock /tmp/fpga.lock -- make bitstream",
            "buildstep lock board.lock --key board -- ./flash.sh",
        ]))
}

pub fn cmd_check_timing() -> ClapCommand {
    ClapCommand::new("check-timing")
        .about("Run a synthesis command and fail if timing constraints were not met")
        .arg(trailing_command())
        .after_help(after_help_text(&[
            "buildstep check-timing -- vivado -mode batch -source build.tcl",
        ]))
}

pub fn build_cli() -> ClapCommand {
    ClapCommand::new("buildstep")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Run cancellable build steps")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Extra config file layered over global and project config"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log at debug level"),
        )
        .subcommand(cmd_run())
        .subcommand(cmd_sleep())
        .subcommand(cmd_lock())
        .subcommand(cmd_check_timing())
}
