//! Line-oriented front end for the study board.

pub mod command;
pub mod config;
pub mod error;
pub mod session;

pub use command::{Command, GotoTarget, parse_command};
pub use config::{SessionConfig, SessionOption};
pub use error::ShellError;
pub use session::{Flow, StudySession};
