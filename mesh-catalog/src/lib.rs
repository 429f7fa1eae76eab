#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod args;
pub mod snapshot;

pub use self::args::{Args, LogFormat};
