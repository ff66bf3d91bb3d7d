//! Command-line interface for the exploder.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{validate_l5x_path, EXPLODED_SUBDIR_NAME};
use crate::error::{PloderError, Result};
use crate::options::{SerializationFormat, SerializationOptions};
use crate::service::{explode_file, implode_file};

/// L5X exploder - Split controller exports into version-control friendly files.
#[derive(Parser)]
#[command(name = "l5xplode")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split an L5X file into a directory tree.
    Explode {
        /// L5X file to read
        #[arg(long)]
        l5x: PathBuf,

        /// Destination directory; the tree is written to its RSLogix5000Content subfolder
        #[arg(long)]
        dir: PathBuf,

        /// Replace an existing exploded tree
        #[arg(short, long)]
        force: bool,

        /// Put every attribute on its own line in markup files
        #[arg(long)]
        pretty_attributes: bool,

        /// Storage format of element files
        #[arg(long, value_enum, default_value_t = SerializationFormat::Xml)]
        format: SerializationFormat,

        /// Keep ExportDate and LastModifiedDate
        #[arg(long)]
        keep_export_date: bool,
    },

    /// Rebuild an L5X file from a directory tree.
    Implode {
        /// Directory holding the RSLogix5000Content subfolder
        #[arg(long)]
        dir: PathBuf,

        /// L5X file to write
        #[arg(long)]
        l5x: PathBuf,

        /// Overwrite an existing L5X file
        #[arg(short, long)]
        force: bool,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Explode {
            l5x,
            dir,
            force,
            pretty_attributes,
            format,
            keep_export_date,
        } => {
            let options = SerializationOptions {
                format,
                pretty_attributes,
                omit_export_date: !keep_export_date,
            };
            explode_command(&l5x, &dir, force, options)
        }
        Commands::Implode { dir, l5x, force } => implode_command(&dir, &l5x, force),
    }
}

/// Execute the explode command.
fn explode_command(
    l5x: &Path,
    dir: &Path,
    force: bool,
    options: SerializationOptions,
) -> Result<()> {
    // Validate inputs before touching the destination
    validate_l5x_path(l5x)?;
    if !l5x.is_file() {
        return Err(PloderError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Input file does not exist: {}", l5x.display()),
        )));
    }
    let target = dir.join(EXPLODED_SUBDIR_NAME);
    if target.exists() && !force {
        return Err(PloderError::DestinationExists(target));
    }

    println!(
        "{} {} into {}",
        style("Exploding").bold(),
        style(l5x.display()).cyan(),
        style(target.display()).green()
    );

    let pb = spinner("Writing element files...");
    let files = match explode_file(l5x, dir, options) {
        Ok(files) => files,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };
    pb.finish_and_clear();

    println!("  Format: {}", options.format.as_str());
    println!("  Files: {files}");
    println!();
    println!("{} {}", style("Saved to:").green().bold(), target.display());

    Ok(())
}

/// Execute the implode command.
fn implode_command(dir: &Path, l5x: &Path, force: bool) -> Result<()> {
    validate_l5x_path(l5x)?;
    let source = dir.join(EXPLODED_SUBDIR_NAME);
    if !source.is_dir() {
        return Err(PloderError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Exploded tree does not exist: {}", source.display()),
        )));
    }
    if l5x.exists() && !force {
        return Err(PloderError::DestinationExists(l5x.to_path_buf()));
    }

    println!(
        "{} {} into {}",
        style("Imploding").bold(),
        style(source.display()).cyan(),
        style(l5x.display()).green()
    );

    let pb = spinner("Reading element files...");
    if let Err(e) = implode_file(dir, l5x) {
        pb.finish_and_clear();
        return Err(e);
    }
    pb.finish_and_clear();

    println!();
    println!("{} {}", style("Saved to:").green().bold(), l5x.display());

    Ok(())
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
