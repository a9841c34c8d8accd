pub mod catalog;
pub mod command;
pub mod copy;
pub mod file;
pub mod manifest;
