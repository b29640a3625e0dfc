use serde::Serialize;
use s7port_command::COMMANDS;

use crate::cmd::CommandsArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, table, OutputFormat};

#[derive(Debug, Serialize)]
struct CommandEntry {
    name: &'static str,
    argument: &'static str,
}

#[derive(Debug, Serialize)]
struct CommandsOutput {
    count: usize,
    commands: Vec<CommandEntry>,
}

pub fn run(_args: CommandsArgs, format: OutputFormat) -> CliResult<i32> {
    let commands: Vec<CommandEntry> = COMMANDS
        .iter()
        .map(|command| CommandEntry {
            name: command.name,
            argument: command.argument,
        })
        .collect();
    let output = CommandsOutput {
        count: commands.len(),
        commands,
    };

    match format {
        OutputFormat::Json => print_json(&output),
        OutputFormat::Table => {
            let rows = output
                .commands
                .iter()
                .map(|entry| vec![entry.name, entry.argument]);
            println!("{}", table(vec!["COMMAND", "ARGUMENT"], rows));
        }
        OutputFormat::Pretty => {
            for entry in &output.commands {
                println!("{:<26} {}", entry.name, entry.argument);
            }
        }
        OutputFormat::Raw => {
            for entry in &output.commands {
                println!("{}", entry.name);
            }
        }
    }

    Ok(SUCCESS)
}
