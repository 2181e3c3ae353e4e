use std::fs;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, info, warn};

use huffzip::codec;
use huffzip::{BitChannel, HuffError, Mode, Summary};

#[derive(Parser)]
#[command(author, version, about = "Static Huffman file compressor")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compress INPUT into OUTPUT
    Compress {
        input: PathBuf,
        output: PathBuf,

        /// Also write the code table (bincode) to this path
        #[arg(long, value_name = "PATH")]
        dump_codes: Option<PathBuf>,
    },
    /// Restore the original file from a compressed INPUT
    Decompress { input: PathBuf, output: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::init();

    // set once the output file has been created; nothing else is ever removed
    let mut created = false;
    let (output, result) = match &cli.command {
        Command::Compress {
            input,
            output,
            dump_codes,
        } => (output, compress(input, output, dump_codes.as_deref(), &mut created)),
        Command::Decompress { input, output } => (output, decompress(input, output, &mut created)),
    };

    match result {
        Ok(summary) => {
            report(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("huffzip: {}", e);
            if created {
                if let Err(remove_err) = fs::remove_file(output) {
                    warn!("could not remove {}: {}", output.display(), remove_err);
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn compress(
    input: &Path,
    output: &Path,
    dump_codes: Option<&Path>,
    created: &mut bool,
) -> Result<Summary, HuffError> {
    codec::ensure_distinct(input, output)?;
    let mut source = codec::open_input(input)?;
    if let Some(dump_path) = dump_codes {
        codec::ensure_distinct(input, dump_path)?;
        let table = codec::code_table_for(&mut source)?;
        source.seek(SeekFrom::Start(0)).map_err(HuffError::Read)?;
        let mut writer = BufWriter::new(codec::create_output(dump_path)?);
        table.dump(&mut writer)?;
        writer.flush().map_err(HuffError::Write)?;
        info!("wrote {} codes to {}", table.len(), dump_path.display());
    }
    let channel = BitChannel::open(output, Mode::Write)?;
    *created = true;
    codec::compress(source, channel)
}

fn decompress(input: &Path, output: &Path, created: &mut bool) -> Result<Summary, HuffError> {
    codec::ensure_distinct(input, output)?;
    let channel = BitChannel::open(input, Mode::Read)?;
    let sink = codec::create_output(output)?;
    *created = true;
    codec::decompress(channel, sink)
}

fn report(summary: &Summary) {
    info!(
        "tree {} bits, {} symbols, {} compressed bytes",
        summary.tree_bits, summary.symbols, summary.compressed_bytes
    );
    println!(
        "{} bytes <-> {} bytes ({:.1}%)",
        summary.symbols,
        summary.compressed_bytes,
        summary.ratio() * 100.0
    );
}
