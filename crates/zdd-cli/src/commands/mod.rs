pub mod deploy;
pub mod help;
