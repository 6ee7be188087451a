use clap::Parser;
use std::{
    ffi::OsStr,
    fs::{read_to_string, File, OpenOptions},
    io::{self, Error as IoError, Write},
    path::PathBuf,
};
use thiserror::Error;
use toml::{de::Error as TomlError, from_str};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use ical_recurrence::{Recurrence, RecurrenceConfig, RecurrenceError};

#[derive(Debug, Error)]
enum Error {
    #[error("Failed to open input recurrence text: {0}")]
    OpenInput(#[from] IoError),
    #[error("Failed to deserialize input rule description: {0}")]
    ParseInput(#[from] TomlError),
    #[error("Failed to read recurrence rule: {0}")]
    Rule(#[from] RecurrenceError),
    #[error("Failed to open output: {0}")]
    OpenOutput(IoError),
    #[error("Failed to write to output: {0}")]
    WriteOutput(IoError),
}

#[derive(Parser)]
#[command(author, version, about)]
struct Opt {
    // Path to the input recurrence text.
    input: PathBuf,
    /// Specify path to write the result to [default: -]
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Print the human-readable description instead of canonical text.
    #[arg(long)]
    describe: bool,
    /// Read the input as a TOML rule description instead of recurrence text.
    #[arg(long)]
    from_toml: bool,
    /// Force debug logging.
    #[arg(long)]
    debug: bool,
}

/// Returns `true` if the file type is a fifo.
#[cfg(not(target_family = "unix"))]
fn is_fifo(_: std::fs::FileType) -> bool {
    false
}

/// Returns `true` if the file type is a fifo.
#[cfg(target_family = "unix")]
fn is_fifo(file_type: std::fs::FileType) -> bool {
    use std::os::unix::fs::FileTypeExt;
    file_type.is_fifo()
}

/// Wrapper around output writer which handles differences between stdout, file and pipe outputs.
enum Output {
    Stdout(io::Stdout),
    File(File),
    Pipe(File),
}

impl Output {
    /// Create a `Output` from the output path (or "-" for stdout).
    fn new(path: &OsStr) -> io::Result<Self> {
        if path == "-" {
            return Ok(Output::Stdout(io::stdout()));
        }

        let file =
            OpenOptions::new().read(true).write(true).create(true).truncate(true).open(path)?;
        if is_fifo(file.metadata()?.file_type()) {
            Ok(Output::Pipe(file))
        } else {
            Ok(Output::File(file))
        }
    }
}

impl io::Write for Output {
    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout(stdout) => stdout.flush(),
            Output::Pipe(pipe) => pipe.flush(),
            Output::File(file) => file.flush(),
        }
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout(stdout) => stdout.write(buf),
            Output::Pipe(pipe) => pipe.write(buf),
            Output::File(file) => file.write(buf),
        }
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(Level::WARN.to_string()))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn run() -> Result<(), Error> {
    let opts = Opt::parse();
    init_tracing(opts.debug);

    let raw = read_to_string(&opts.input)?;
    let rule = if opts.from_toml {
        let config: RecurrenceConfig = from_str(&raw)?;
        Recurrence::from_config(&config)?
    } else {
        raw.parse::<Recurrence>()?
    };

    let rendered =
        if opts.describe { format!("{rule}\n") } else { rule.to_recurrence_string()? };

    let mut output = if let Some(output) = opts.output {
        Output::new(output.as_os_str())
    } else {
        Output::new(OsStr::new("-"))
    }
    .map_err(Error::OpenOutput)?;
    write!(output, "{rendered}").map_err(Error::WriteOutput)?;

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
