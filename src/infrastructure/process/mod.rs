pub mod command_runner;

pub use command_runner::{CommandError, CommandOutput, CommandRunner, CommandSpec, SystemCommandRunner};
