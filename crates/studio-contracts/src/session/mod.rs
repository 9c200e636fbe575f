mod command_parser;
mod command_registry;

pub use command_parser::{parse_session_command, SessionCommand};
pub use command_registry::SESSION_HELP_COMMANDS;
