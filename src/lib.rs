//! Typed argument parsing for keyboard-driven browser commands.
//!
//! A command line such as `:open -t example.com ;; zoom 120` is split by the
//! [`runner`], each command's tokens go through its
//! [`argparser::ArgumentParser`], and the resulting strings are converted to
//! typed [`argparser::Value`]s by [`argparser::convert`].

pub mod argparser;
pub mod cli;
pub mod command;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod runner;
pub mod tabs;

/// The `clap` definition of the `keycmd` binary, for man page generation.
#[must_use]
pub fn command() -> clap::Command {
    <cli::Cli as clap::CommandFactory>::command()
}
