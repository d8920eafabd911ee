use crate::error::CommandError;
use crate::events::CommandResult;
use log::{debug, error, info};
use std::future::Future;
use std::pin::Pin;
use std::process::Output;
use tokio::process::Command;

/// Port for executing health-check and remediation commands
///
/// Implementations never fail: launch errors and non-zero exits are reported
/// through [`CommandResult`] with the output absent.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &str) -> Pin<Box<dyn Future<Output = CommandResult> + Send>>;
}

/// Runs command strings through `sh -c`
///
/// The call waits for the subprocess to exit; there is no timeout.
#[derive(Debug, Clone)]
pub struct ShellCommandRunner {
    shell: String,
}

impl Default for ShellCommandRunner {
    fn default() -> Self {
        Self::new("sh")
    }
}

impl ShellCommandRunner {
    /// Create a runner using the given POSIX shell binary
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    async fn execute(shell: &str, command: &str) -> Result<Output, CommandError> {
        Command::new(shell)
            .arg("-c")
            .arg(command)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| CommandError::Spawn(format!("{}: {}", command, e)))
    }

    /// Turn a finished process into a result, logging the outcome
    fn interpret(command: &str, output: Output) -> CommandResult {
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            info!("Command successful: {}", command);
            debug!("Command output: {}", stdout.trim_end());
            CommandResult::success(stdout)
        } else {
            error!(
                "Command failed: {} ({})\nError: {}",
                command,
                output.status,
                stderr.trim_end()
            );
            CommandResult::failure(stderr)
        }
    }
}

impl CommandRunner for ShellCommandRunner {
    fn run(&self, command: &str) -> Pin<Box<dyn Future<Output = CommandResult> + Send>> {
        let shell = self.shell.clone();
        let command = command.to_string();

        Box::pin(async move {
            debug!("Running command: {}", command);

            match Self::execute(&shell, &command).await {
                Ok(output) => Self::interpret(&command, output),
                Err(e) => {
                    error!("An error occurred while running command: {}", e);
                    CommandResult::failure(e.to_string())
                }
            }
        })
    }
}
