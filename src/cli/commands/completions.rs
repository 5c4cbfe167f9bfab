//! Shell completions generation command.
//!
//! ```bash
//! ibplot completions bash > ~/.local/share/bash-completion/completions/ibplot
//! ibplot completions zsh -o ~/.zsh/completions/_ibplot
//! ```

use crate::cli::{Cli, CompletionsArgs, ShellType};
use crate::error::Result;
use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::io;
use tracing::info;

const BIN_NAME: &str = "ibplot";

/// Execute the completions command.
///
/// # Errors
///
/// Returns an error if the output file cannot be created.
pub fn execute(args: &CompletionsArgs) -> Result<()> {
    info!(shell = ?args.shell, output = ?args.output, "Generating shell completions");

    let mut cmd = Cli::command();
    let shell = convert_shell_type(args.shell);

    if let Some(output_path) = &args.output {
        let mut file = std::fs::File::create(output_path)?;
        generate(shell, &mut cmd, BIN_NAME, &mut file);
        eprintln!("Generated {shell} completions to {}", output_path.display());
    } else {
        generate(shell, &mut cmd, BIN_NAME, &mut io::stdout());
    }

    Ok(())
}

const fn convert_shell_type(shell: ShellType) -> Shell {
    match shell {
        ShellType::Bash => Shell::Bash,
        ShellType::Zsh => Shell::Zsh,
        ShellType::Fish => Shell::Fish,
        ShellType::PowerShell => Shell::PowerShell,
        ShellType::Elvish => Shell::Elvish,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(shell: Shell) -> String {
        let mut cmd = Cli::command();
        let mut output = Vec::new();
        generate(shell, &mut cmd, BIN_NAME, &mut output);
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_convert_shell_type() {
        assert_eq!(convert_shell_type(ShellType::Bash), Shell::Bash);
        assert_eq!(convert_shell_type(ShellType::PowerShell), Shell::PowerShell);
        assert_eq!(convert_shell_type(ShellType::Elvish), Shell::Elvish);
    }

    #[test]
    fn test_bash_completion_lists_commands_and_flags() {
        let script = script(Shell::Bash);
        assert!(script.contains("_ibplot"), "should define _ibplot function");
        for command in ["plot", "summary", "cache", "schema"] {
            assert!(script.contains(command), "should include {command}");
        }
        assert!(script.contains("--json"));
        assert!(script.contains("--best-of"));
    }

    #[test]
    fn test_fish_completion_generation() {
        assert!(script(Shell::Fish).contains("complete -c ibplot"));
    }
}
