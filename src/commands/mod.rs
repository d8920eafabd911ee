/// Command execution port and shell implementation
pub mod runner;

pub use runner::{CommandRunner, ShellCommandRunner};
