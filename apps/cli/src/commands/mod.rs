//! 命令定义和实现

pub mod config;
pub mod inspect;
pub mod run;

pub use config::ConfigCommand;
pub use inspect::InspectCommand;
pub use run::RunCommand;
