use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "zipup")]
#[command(version)]
#[command(about = "A Rust zip utility that streams archives to files or pipes", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipup out.zip docs photo.jpg   archive docs/ and photo.jpg into out.zip\n  \
  zipup -p src | ssh host 'cat > src.zip'   stream an archive through a pipe\n  \
  zipup --chunk-size 65536 out.zip big.bin  stream with 64 KiB read chunks")]
pub struct Cli {
    /// Output ZIP file path (with -p this is just another input path)
    #[arg(value_name = "ZIPFILE", required_unless_present = "pipe")]
    pub output: Option<String>,

    /// Files and directories to archive
    #[arg(value_name = "PATHS")]
    pub paths: Vec<String>,

    /// Write the archive to stdout, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Read chunk size in bytes for streaming file contents
    #[arg(long, value_name = "BYTES", default_value_t = crate::zip::DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    /// The paths to archive. In pipe mode there is no output positional,
    /// so the first positional counts as an input too.
    pub fn inputs(&self) -> Vec<&str> {
        let first = self.pipe.then_some(&self.output).and_then(Option::as_deref);
        first
            .into_iter()
            .chain(self.paths.iter().map(String::as_str))
            .collect()
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }
}
