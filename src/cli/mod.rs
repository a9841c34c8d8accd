pub mod args;

pub use args::{Arguments, Preset};

use clap::Parser;

pub fn parse() -> Arguments {
    Arguments::parse()
}
