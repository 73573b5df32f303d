mod args;
mod common;
mod parse;
mod run;
mod schedule;

use std::process::ExitCode;

use clap::{
    builder::{styling::AnsiColor, Styles},
    ColorChoice, Parser, Subcommand,
};
use env_logger::WriteStyle;
use log::error;

use crate::logger;

use self::args::{GlobalArgs, LoggerArgs, RunArgs, ScheduleArgs};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None, propagate_version = true, styles = cli_styles())]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Back up every directory once and exit
    Run(RunArgs),
    /// Back up every directory daily at a fixed local time
    Schedule(ScheduleArgs),
}

impl Command {
    fn global(&self) -> &GlobalArgs {
        match self {
            Command::Run(args) => &args.global,
            Command::Schedule(args) => &args.global,
        }
    }
}

pub async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(&cli.command.global().logger);

    let result = match cli.command {
        Command::Run(args) => run::main(args).await,
        Command::Schedule(args) => schedule::main(args).await,
    };

    if let Err(err) = result {
        error!("{err}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn init_logger(args: &LoggerArgs) {
    let level = logger::level_from_args(args.verbose, args.quiet);
    logger::init(level, write_style(args.color));
}

fn write_style(color: ColorChoice) -> WriteStyle {
    match color {
        ColorChoice::Always => WriteStyle::Always,
        ColorChoice::Never => WriteStyle::Never,
        _ => WriteStyle::Auto,
    }
}

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightMagenta.on_default())
        .usage(AnsiColor::BrightMagenta.on_default())
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightCyan.on_default())
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Cli, Command};

    #[test]
    fn arguments_are_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_schedule_flags() {
        let cli = Cli::try_parse_from([
            "stowaway",
            "schedule",
            "--storage",
            "file:///srv/backups",
            "--hour",
            "4",
            "--minute",
            "30",
            "--timezone",
            "Europe/Berlin",
            "--run-on-startup",
            "false",
            "--jobs",
            "8",
        ])
        .unwrap();

        let Command::Schedule(args) = cli.command else {
            panic!("expected schedule command");
        };
        assert_eq!((args.hour, args.minute), (4, 30));
        assert_eq!(args.timezone, chrono_tz::Europe::Berlin);
        assert!(!args.run_on_startup);
        assert_eq!(args.backup.jobs, 8);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let args = ["stowaway", "run", "--storage", "file:///srv/backups"];
        assert!(Cli::try_parse_from(args.iter().chain(&["--compression-level", "20"])).is_err());
        assert!(Cli::try_parse_from(args.iter().chain(&["--jobs", "0"])).is_err());
        assert!(Cli::try_parse_from(args.iter().chain(&["--volume-size", "0"])).is_err());
    }
}
