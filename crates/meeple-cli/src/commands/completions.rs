use std::io::{self, Write};
use std::path::Path;

use clap::CommandFactory;
use clap_complete::{generate, shells};

use crate::cli::{Cli, CompletionShell};
use crate::error::CliError;

pub fn run_completions(shell: CompletionShell, output: Option<&Path>) -> Result<(), CliError> {
    let mut cmd = Cli::command();

    match output {
        Some(path) => {
            let mut file = std::fs::File::create(path)?;
            write_completions(shell, &mut cmd, &mut file);
            println!("Wrote completions to {}", path.display());
        }
        None => {
            write_completions(shell, &mut cmd, &mut io::stdout());
        }
    }
    Ok(())
}

fn write_completions(shell: CompletionShell, cmd: &mut clap::Command, writer: &mut dyn Write) {
    match shell {
        CompletionShell::Bash => generate(shells::Bash, cmd, "meeple", writer),
        CompletionShell::Zsh => generate(shells::Zsh, cmd, "meeple", writer),
        CompletionShell::Fish => generate(shells::Fish, cmd, "meeple", writer),
    }
}
