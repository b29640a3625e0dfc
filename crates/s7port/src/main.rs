mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::{Command, ServeArgs};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "s7port", version, about = "Erlang port for Siemens S7 PLCs")]
struct Cli {
    /// Output format for reporting subcommands.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        env = "S7PORT_LOG_LEVEL",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Option<Command>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version requests are not failures.
            let code = if err.use_stderr() { exit::USAGE } else { exit::SUCCESS };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));
    let result = cmd::run(command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["s7port"]).expect("bare invocation should parse");
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_serve_options() {
        let cli = Cli::try_parse_from([
            "s7port",
            "serve",
            "--library",
            "/opt/snap7/libsnap7.so",
            "--max-frame",
            "1024",
        ])
        .expect("serve args should parse");

        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.backend.library.as_deref(), Some("/opt/snap7/libsnap7.so"));
                assert_eq!(args.max_frame, 1024);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_zero_max_frame() {
        let err = Cli::try_parse_from(["s7port", "serve", "--max-frame", "0"])
            .expect_err("zero frame limit should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn rejects_oversized_max_frame() {
        assert!(Cli::try_parse_from(["s7port", "serve", "--max-frame", "70000"]).is_err());
    }

    #[test]
    fn parses_global_format_after_subcommand() {
        let cli = Cli::try_parse_from(["s7port", "commands", "--format", "pretty"])
            .expect("commands args should parse");
        assert!(matches!(cli.format, Some(OutputFormat::Pretty)));
        assert!(matches!(cli.command, Some(Command::Commands(_))));
    }
}
