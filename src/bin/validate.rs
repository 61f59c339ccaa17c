use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use detectdesk::config::init_tracing;
use detectdesk::validation::{validate_directory, validate_image_file, validate_legend};

/// How many entries of a directory listing are printed.
const LISTING_LIMIT: usize = 10;

#[derive(Parser)]
#[command(name = "detectdesk-validate")]
#[command(about = "Check legend files and images before uploading them")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a class legend file
    ClassFile { path: PathBuf },
    /// Validate a single image
    Image { path: PathBuf },
    /// Validate every image below a directory
    Directory { path: PathBuf },
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn check_class_file(path: &Path) -> anyhow::Result<()> {
    println!("Validating class file: {}", path.display());
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            println!("FAIL: File not found: {}", path.display());
            return Ok(());
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to read {:?}", path)),
    };

    let config = match validate_legend(&content) {
        Ok(config) => config,
        Err(e) => {
            println!("FAIL: {}", e);
            return Ok(());
        }
    };

    println!("OK: {}", config.summary());
    println!("Total classes: {}", config.len());
    println!("Classes with custom colors: {}", config.custom_color_count());
    println!("Classes with default colors: {}", config.default_color_count());
    println!("\nClass details:");
    for (i, entry) in config.entries.iter().enumerate() {
        let color = match entry.color {
            Some(color) => format!("(Color: {})", color),
            None => "(Default color)".to_string(),
        };
        println!("  {:3}. {} {}", i + 1, entry.class_name, color);
    }
    Ok(())
}

fn check_image(path: &Path) {
    println!("Validating image: {}", path.display());
    match validate_image_file(path) {
        Ok(validation) => {
            println!("OK: {}", validation.summary());
            println!("File: {}", validation.file_name);
            println!("Dimensions: {}x{}", validation.width, validation.height);
            println!("Size: {:.1}MB", validation.size_mb());
            println!("Type: {}", validation.file_type);
        }
        Err(e) => println!("FAIL: {}", e),
    }
}

fn check_directory(path: &Path) -> anyhow::Result<()> {
    println!("Validating images in directory: {}", path.display());
    let report = validate_directory(path)?;

    println!("Valid images: {}", report.valid.len());
    println!("Invalid images: {}", report.invalid.len());

    if !report.valid.is_empty() {
        println!("\nValid images:");
        for (i, image) in report.valid.iter().take(LISTING_LIMIT).enumerate() {
            println!("  {:3}. {}", i + 1, display_name(image));
        }
        if report.valid.len() > LISTING_LIMIT {
            println!("     ... and {} more", report.valid.len() - LISTING_LIMIT);
        }
    }

    if !report.invalid.is_empty() {
        println!("\nInvalid images:");
        for (image, error) in report.invalid.iter().take(LISTING_LIMIT) {
            println!("  - {}: {}", display_name(image), error);
        }
        if report.invalid.len() > LISTING_LIMIT {
            println!("     ... and {} more", report.invalid.len() - LISTING_LIMIT);
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::ClassFile { path } => check_class_file(&path)?,
        Command::Image { path } => check_image(&path),
        Command::Directory { path } => check_directory(&path)?,
    }
    Ok(())
}
