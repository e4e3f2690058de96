use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "rpbo")]
#[command(version)]
#[command(about = "A Rust PBO archive utility", long_about = None)]
#[command(after_help = "Examples:\n  \
  rpbo addon.pbo -x .bak          extract all files except backups from addon.pbo\n  \
  rpbo -p addon.pbo config.cpp    send config.cpp to stdout\n  \
  rpbo -c addon_src addon.pbo --prefix x\\addon --product-name addon --product-version 1.0\n  \
  rpbo -t addon.pbo               verify the stored checksum")]
pub struct Cli {
    /// PBO file path
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Files to extract (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely, including the product header
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract files to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Test archive checksum
    #[arg(short = 't')]
    pub test: bool,

    /// Extract files into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Exclude files that follow
    #[arg(short = 'x', value_name = "FILE", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Load the data region into memory before extracting
    #[arg(short = 'm')]
    pub memory: bool,

    /// Create FILE from the contents of DIR
    #[arg(short = 'c', value_name = "DIR")]
    pub create: Option<String>,

    /// Product prefix written to the header (with -c)
    #[arg(long, value_name = "PREFIX", default_value = "")]
    pub prefix: String,

    /// Product name written to the header (with -c)
    #[arg(long, value_name = "NAME", default_value = "")]
    pub product_name: String,

    /// Product version written to the header (with -c)
    #[arg(long, value_name = "VERSION", default_value = "")]
    pub product_version: String,

    /// Extra header string, repeatable (with -c)
    #[arg(long = "extra", value_name = "STRING")]
    pub extra: Vec<String>,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    pub fn load_mode(&self) -> crate::LoadMode {
        if self.memory {
            crate::LoadMode::Preload
        } else {
            crate::LoadMode::Stream
        }
    }

    pub fn product(&self) -> crate::ProductEntry {
        crate::ProductEntry::new(
            self.prefix.clone(),
            self.product_name.clone(),
            self.product_version.clone(),
            self.extra.clone(),
        )
    }
}
