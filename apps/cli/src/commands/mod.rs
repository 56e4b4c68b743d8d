//! 命令定义和实现

pub mod config;
pub mod convert;
pub mod run;

pub use config::ConfigCommand;
pub use convert::ConvertCommand;
pub use run::RunCommand;
