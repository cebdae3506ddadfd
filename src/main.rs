//! Dark-mode override stylesheet generator for HTML email.
//!
//! Reads a message body from a file or stdin and prints the
//! `@media (prefers-color-scheme: dark)` stylesheet that should be injected
//! next to it.
//!
//! # Usage
//!
//! ```text
//! darkmail [--sender ADDRESS] [--force-off] [--classify] [INPUT]
//! ```
//!
//! Nothing is printed when the message needs no override (it supports dark
//! mode natively, or dark mode is forced off). With `--classify` the program
//! prints one of `native`, `proton` or `none` instead of the stylesheet.
//!
//! Exit codes:
//! - 0: The message was processed
//! - 2: The message could not be read or processed
//!
//! # Environment Variables
//!
//! - `DEBUG`: When set, enables debug output to stderr.
//! - `DARKMAIL_SENDER`: Default for `--sender`.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;

use darkmail::{DarkModeSetting, DarkStyleSupport, classify, dark_mode_stylesheet, logs};

/// Generate a dark-mode override stylesheet for an HTML email body.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// HTML file to read; `-` or nothing reads stdin
    input: Option<PathBuf>,

    /// Sender address of the message
    #[arg(long, env = "DARKMAIL_SENDER", default_value = "")]
    sender: String,

    /// Treat dark mode as disabled by the user
    #[arg(long)]
    force_off: bool,

    /// Only print how the message handles dark mode
    #[arg(long)]
    classify: bool,
}

/// Read the message body from `path`, or stdin for `None`/`-`.
fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut html = String::new();
            io::stdin()
                .read_to_string(&mut html)
                .context("Failed to read message from stdin")?;
            Ok(html)
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let html = read_input(args.input.as_deref())?;
    debug!("read {} bytes", html.len());

    let setting = if args.force_off {
        DarkModeSetting::ForceOff
    } else {
        DarkModeSetting::FollowSystem
    };

    if args.classify {
        let support =
            classify(&html, &args.sender, setting).context("Failed to classify message")?;
        let label = match support {
            DarkStyleSupport::NativeSupport => "native",
            DarkStyleSupport::ProtonSupport => "proton",
            DarkStyleSupport::NotSupport => "none",
        };
        println!("{label}");
        return Ok(());
    }

    let stylesheet = dark_mode_stylesheet(&html, &args.sender, setting)
        .context("Failed to build dark-mode stylesheet")?;
    match stylesheet {
        Some(css) => println!("{css}"),
        None => debug!("no override needed"),
    }
    Ok(())
}

/// Main entry point for the darkmail stylesheet generator.
///
/// Sets up logging, parses the command line and runs the pipeline, exiting
/// with code 2 on failure.
fn main() {
    if let Err(e) = logs::init() {
        eprintln!("warning: {e}");
    }

    let args = Args::parse();
    debug!("args={args:?}");

    if let Err(e) = run(&args) {
        eprintln!("darkmail: {e:#}");
        process::exit(2);
    }
}
