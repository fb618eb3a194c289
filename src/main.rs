use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use progress_io::{open_binary, open_text, Access, Encoding, ProgressOptions};

#[derive(Parser)]
#[command(name = "progress-io")]
#[command(version)]
#[command(about = "Copy a file while showing a progress bar", long_about = None)]
struct Cli {
    /// Write here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Decode the input and write it out as UTF-8
    #[arg(long)]
    text: bool,

    /// Input encoding in text mode
    #[arg(long, default_value = "utf-8")]
    encoding: Encoding,

    /// Label shown in front of the bar
    #[arg(long)]
    desc: Option<String>,

    /// Use kB/MB instead of KiB/MiB
    #[arg(long)]
    decimal: bool,

    /// Don't draw the progress bar
    #[arg(short, long)]
    quiet: bool,

    input: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut options = ProgressOptions::new()
        .with_disable(cli.quiet)
        .with_unit_divisor(if cli.decimal { 1000 } else { 1024 });
    options.desc = cli
        .desc
        .clone()
        .or_else(|| cli.input.file_name().map(|n| n.to_string_lossy().into_owned()));

    let out: Box<dyn Write> = match &cli.output {
        Some(p) => Box::new(
            fs::File::create(p).with_context(|| format!("failed to create {}", p.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut out = BufWriter::new(out);

    let copied = if cli.text {
        copy_text(&cli, &options, &mut out)?
    } else {
        copy_binary(&cli, &options, &mut out)?
    };
    out.flush().context("failed to flush output")?;

    info!("copied {} bytes from {}", copied, cli.input.display());
    Ok(())
}

fn copy_binary(cli: &Cli, options: &ProgressOptions, out: &mut impl Write) -> Result<u64> {
    let mut f = open_binary(&cli.input, Access::Read, options)
        .with_context(|| format!("failed to open {}", cli.input.display()))?;
    io::copy(&mut f, out).context("copy failed")?;
    let n = f.position();
    f.close()?;
    Ok(n)
}

fn copy_text(cli: &Cli, options: &ProgressOptions, out: &mut impl Write) -> Result<u64> {
    let mut f = open_text(&cli.input, Access::Read, cli.encoding, options)
        .with_context(|| format!("failed to open {}", cli.input.display()))?;
    let mut line = String::new();
    loop {
        line.clear();
        let n = f.read_line(&mut line).with_context(|| {
            format!(
                "failed to decode {} as {}",
                cli.input.display(),
                cli.encoding
            )
        })?;
        if n == 0 {
            break;
        }
        out.write_all(line.as_bytes())?;
    }
    let n = f.progress_bar().position();
    f.close()?;
    Ok(n)
}
