use std::{
    error::Error,
    fs,
    io::{self, Read},
    path::PathBuf,
    process::ExitCode,
};

use clap::Parser;
use tinyasm::{config::MAX_CAPACITY, hex, Assembler, CodeImage, Config};
use tracing::Level;

#[derive(Parser)]
#[command(version, about = "ATtiny4/5/9/10 assembler", long_about = None)]
struct Args {
    /// Assembly source file (default: stdin)
    source: Option<PathBuf>,

    /// Intel-HEX output file (default: stdout, unless a listing is written)
    #[arg(short = 'x', long)]
    hex: Option<PathBuf>,

    /// Listing output file
    #[arg(short, long)]
    list: Option<PathBuf>,

    /// Directories searched for `<device>.props` (repeatable)
    #[arg(short = 'I', long)]
    device_dir: Vec<PathBuf>,

    /// Largest image in bytes, at most 0x10000
    #[arg(
        long,
        default_value_t = MAX_CAPACITY as u64,
        value_parser = clap::value_parser!(u64).range(1..=MAX_CAPACITY as u64),
    )]
    capacity: u64,

    /// Read the HEX output back and compare it with the assembled bytes
    #[arg(long)]
    verify: bool,

    /// Print the program as a C array initializer instead of HEX
    #[arg(long)]
    array: bool,

    /// One of `TRACE`, `DEBUG`, `INFO`, `WARN`, or `ERROR`
    #[arg(short = 'L', long, default_value_t = Level::WARN)]
    log_level: Level,
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(io::stderr)
        .init();

    if let Err(e) = main_real(args) {
        tracing::error!("{e}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn main_real(args: Args) -> Result<(), Box<dyn Error>> {
    let src = match &args.source {
        Some(path) => {
            fs::read_to_string(path).map_err(|e| format!("cant open {}: {e}", path.display()))?
        }
        None => {
            let mut src = String::new();
            io::stdin().read_to_string(&mut src)?;
            src
        }
    };

    let mut asm = Assembler::new(Config {
        capacity: args.capacity as usize,
        device_dirs: args.device_dir,
    });
    asm.assemble(&src)?;

    if let Some(path) = &args.list {
        fs::write(path, asm.listing())?;
    }

    let hex = asm.hex();
    if args.verify {
        let loaded = hex::read(&hex)?;
        if loaded.data != asm.bytes() || loaded.fuses != asm.fuses() & 0x0F {
            return Err("HEX output does not match the assembled image".into());
        }
        tracing::info!(bytes = loaded.data.len(), "verified");
    }

    if args.array {
        let image = CodeImage {
            data: asm.bytes().to_vec(),
            fuses: asm.fuses(),
        };
        println!("{}", image.c_array());
    } else {
        match (&args.hex, &args.list) {
            (Some(path), _) => fs::write(path, &hex)?,
            (None, None) => print!("{hex}"),
            (None, Some(_)) => (),
        }
    }

    match asm.error_count() {
        0 => Ok(()),
        1 => Err("1 error".into()),
        n => Err(format!("{n} errors").into()),
    }
}
