//! Command implementations that touch the repository layout.

pub mod init;
