use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use colored::*;

use crate::connection::{ConnectionConfig, HttpConnector};
use crate::reader::RustylineReader;
use crate::repl::Console;

const HOME_DIR_NAME: &str = ".pilosa-shell";
const HISTORY_FILE_NAME: &str = "history";
const SESSIONS_DIR_NAME: &str = "sessions";

#[derive(Parser, Debug)]
#[command(name = "pilosa-shell")]
#[command(version)]
#[command(about = "An interactive console for Pilosa bitmap index servers", long_about = None)]
pub struct Cli {
    /// Directory holding line history and saved sessions
    #[arg(long, value_name = "DIR")]
    pub home: Option<PathBuf>,

    /// Disable line history and session files
    #[arg(long, conflicts_with = "home")]
    pub no_home: bool,

    #[arg(short, long)]
    pub verbose: bool,
}

/// Where history and session files live. `None` disables the feature.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct HomeLayout {
    pub history_file: Option<PathBuf>,
    pub sessions_dir: Option<PathBuf>,
}

impl HomeLayout {
    /// Creates the home and sessions directories. Failures are written to
    /// `out` as warnings and switch off whatever depends on the missing directory.
    pub fn prepare<W: Write>(home: Option<&Path>, out: &mut W) -> Self {
        let Some(home) = home else {
            return Self::default();
        };
        if let Err(err) = fs::create_dir_all(home) {
            write_warning(
                out,
                &format!(
                    "Cannot create {}, history and sessions are disabled: {}",
                    home.display(),
                    err
                ),
            );
            return Self::default();
        }

        let sessions = home.join(SESSIONS_DIR_NAME);
        let sessions_dir = match fs::create_dir_all(&sessions) {
            Ok(()) => Some(sessions),
            Err(err) => {
                write_warning(
                    out,
                    &format!("Cannot create {}, sessions are disabled: {}", sessions.display(), err),
                );
                None
            }
        };

        Self {
            history_file: Some(home.join(HISTORY_FILE_NAME)),
            sessions_dir,
        }
    }
}

fn write_warning<W: Write>(out: &mut W, message: &str) {
    if let Err(err) = writeln!(out, "{} {}", "Warning:".yellow().bold(), message) {
        tracing::debug!("Cannot write warning: {}", err);
    }
}

fn print_banner() {
    println!("{}", "=== Pilosa Shell ===".bright_cyan().bold());
    println!("{}", "Type :help for available commands, :exit to exit.".bright_black());
    println!();
}

impl Cli {
    pub fn home_dir(&self) -> Option<PathBuf> {
        if self.no_home {
            return None;
        }
        self.home
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join(HOME_DIR_NAME)))
    }

    pub async fn execute(&self) -> Result<()> {
        let layout = HomeLayout::prepare(self.home_dir().as_deref(), &mut io::stdout());
        let mut reader = RustylineReader::new(layout.history_file.clone())?;
        let connector = HttpConnector::new(ConnectionConfig::default());
        let mut console = Console::new(connector, io::stdout(), layout.sessions_dir);

        print_banner();
        let result = console.run(&mut reader).await;
        reader.save_history();
        result?;
        Ok(())
    }
}
