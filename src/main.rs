//! Main entry point for the rpbo CLI application.
//!
//! This binary lists, extracts, tests and creates PBO archives.

use anyhow::{Result, bail};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};

use rpbo::pbo::primitives::hex;
use rpbo::{Archive, Cli, FileEntry, PboWriter};

/// Application entry point.
///
/// Parses command-line arguments and dispatches to create, test, list or
/// extract mode.
fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(ref dir) = cli.create {
        return create_archive(Path::new(dir), &cli);
    }

    let archive = Archive::open(&cli.file, cli.load_mode())?;

    // Test mode: recompute the checksum and exit
    if cli.test {
        archive.verify_checksum()?;
        if !cli.is_quiet() {
            println!(
                "No errors detected in {} ({} files, sha1 {})",
                cli.file,
                archive.entries().len(),
                hex(archive.checksum())
            );
        }
        return Ok(());
    }

    // List mode: display archive contents and exit
    if cli.list || cli.verbose {
        list_files(&archive, cli.verbose);
        return Ok(());
    }

    // Apply filters to determine which files to extract:
    // 1. If specific files are requested, only include matching entries
    // 2. Exclude files matching the exclusion patterns
    let files_to_extract: Vec<_> = archive
        .entries()
        .iter()
        .filter(|e| {
            if !cli.files.is_empty() && !cli.files.iter().any(|f| matches_request(f, &e.file_name)) {
                return false;
            }

            !cli
                .exclude
                .iter()
                .any(|x| e.file_name.contains(x.as_str()) || glob_match(x, &e.file_name))
        })
        .collect();

    let multiple_files = cli.pipe && files_to_extract.len() > 1;
    for entry in files_to_extract {
        extract_file(&archive, entry, &cli, multiple_files)?;
    }

    Ok(())
}

/// Pack a directory into `cli.file`.
fn create_archive(dir: &Path, cli: &Cli) -> Result<()> {
    let writer = PboWriter::from_directory(dir, cli.product())?;
    if !cli.is_quiet() {
        for entry in writer.entries() {
            println!("  adding: {}", entry.file_name);
        }
    }
    writer.write(Path::new(&cli.file))?;
    Ok(())
}

/// Check whether a requested name or pattern selects an entry.
///
/// Patterns with wildcards are glob matched against the full name, plain
/// names must equal the full name or its last component.
fn matches_request(request: &str, file_name: &str) -> bool {
    if has_glob_chars(request) {
        return glob_match(request, file_name);
    }
    let basename = file_name.rsplit(['\\', '/']).next().unwrap_or(file_name);
    file_name == request || basename == request
}

/// List files in the archive.
///
/// Supports two output formats:
/// - Simple format (`-l`): Just file names, one per line
/// - Verbose format (`-v`): Product header, then a table with sizes, packing
///   and UTC timestamps
fn list_files(archive: &Archive, verbose: bool) {
    if !verbose {
        for entry in archive.entries() {
            println!("{}", entry.file_name);
        }
        return;
    }

    let product = archive.product();
    if !product.is_empty() {
        println!("Prefix:  {}", product.prefix);
        println!("Product: {} {}", product.product_name, product.product_version);
        for extra in &product.additional {
            println!("Extra:   {extra}");
        }
        println!();
    }

    println!(
        "{:>10}  {:>10}  {:>6}  {:>10}  {:>5}  Name",
        "Length", "Size", "Method", "Date", "Time"
    );
    println!("{}", "-".repeat(70));

    let mut total_original = 0u64;
    let mut total_data = 0u64;

    for entry in archive.entries() {
        let (year, month, day) = entry.modified_date();
        let (hour, minute, _second) = entry.modified_time();
        println!(
            "{:>10}  {:>10}  {:>6}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            entry.original_size,
            entry.data_size,
            entry.packing_method.name(),
            year,
            month,
            day,
            hour,
            minute,
            entry.file_name
        );
        total_original += u64::from(entry.original_size);
        total_data += u64::from(entry.data_size);
    }

    println!("{}", "-".repeat(70));
    println!(
        "{:>10}  {:>10}  {:>6}  {:>17}  {} files ({})",
        total_original,
        total_data,
        "",
        "",
        archive.entries().len(),
        format_size(total_data)
    );
}

/// Extract a single file from the archive.
///
/// Handles various extraction options:
/// - Pipe mode (`-p`): Write to stdout instead of file
/// - Custom output directory (`-d`): Extract to specified directory
/// - Junk paths (`-j`): Ignore directory structure in archive
/// - Overwrite control (`-n`, `-o`): Handle existing files
fn extract_file(
    archive: &Archive,
    entry: &FileEntry,
    cli: &Cli,
    show_filename: bool,
) -> Result<()> {
    // Pipe mode: write file contents directly to stdout
    if cli.pipe {
        let stdout = std::io::stdout();
        let mut stdout = stdout.lock();
        if show_filename {
            writeln!(stdout, "--- {} ---", entry.file_name)?;
        }
        archive.extract_to_writer(entry, &mut stdout)?;
        stdout.flush()?;
        return Ok(());
    }

    let relative = if cli.junk_paths {
        // Junk paths: use only the base filename, ignore directory structure
        match rpbo::pbo::host_path(&entry.file_name)?.file_name() {
            Some(name) => PathBuf::from(name),
            None => bail!("entry has no file name: {}", entry.file_name),
        }
    } else {
        rpbo::pbo::host_path(&entry.file_name)?
    };

    let output_path = match cli.extract_dir {
        Some(ref dir) => PathBuf::from(dir).join(relative),
        None => relative,
    };

    // Handle existing files based on overwrite options
    if output_path.exists() {
        if cli.never_overwrite {
            if !cli.is_very_quiet() {
                eprintln!("Skipping: {} (file exists)", entry.file_name);
            }
            return Ok(());
        }

        if !cli.overwrite {
            if !cli.is_very_quiet() {
                eprintln!("Skipping: {} (use -o to overwrite)", entry.file_name);
            }
            return Ok(());
        }
    }

    if !cli.is_quiet() {
        println!("  extracting: {}", entry.file_name);
    }

    archive.extract_to_file(entry, &output_path)?;

    Ok(())
}

/// Check if a pattern contains glob wildcard characters.
fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Simple glob pattern matching supporting `*` and `?` wildcards.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
///
/// # Examples
///
/// ```ignore
/// assert!(glob_match("*.sqf", "scripts\\init.sqf"));
/// assert!(glob_match("data\\tex?.paa", "data\\tex1.paa"));
/// assert!(!glob_match("*.sqf", "config.cpp"));
/// ```
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();

    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            // Star matches zero characters, or one more and stays
            (Some('*'), _) => {
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if *p == *t => do_match(&pattern[1..], &text[1..]),
            _ => false,
        }
    }

    do_match(&pattern_chars, &text_chars)
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
