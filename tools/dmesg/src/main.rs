//! dmesg: prints a kernel log snapshot exported by kmsg

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use kmsg_kernel::dmesg::{LogConfig, Snapshot, DEFAULT_CAPACITY};

#[derive(Parser, Debug)]
#[command(name = "dmesg", version, about = "Print an exported kernel log snapshot")]
struct Args {
    /// Snapshot file written by the kernel's export call
    snapshot: PathBuf,

    /// Ring capacity the snapshot was taken with
    #[arg(short, long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// Dump the raw ring instead of decoded messages
    #[arg(long)]
    raw: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    LogConfig::new(args.capacity)
        .validate()
        .map_err(|e| anyhow!("--capacity: {}", e))?;

    let bytes = fs::read(&args.snapshot)
        .with_context(|| format!("reading {}", args.snapshot.display()))?;
    log::debug!("{} bytes from {}", bytes.len(), args.snapshot.display());

    let expected = Snapshot::encoded_len(args.capacity);
    if bytes.len() != expected {
        log::warn!(
            "snapshot is {} bytes, capacity {} expects {}",
            bytes.len(),
            args.capacity,
            expected
        );
    }

    let snapshot = Snapshot::from_bytes(&bytes, args.capacity)
        .map_err(|e| anyhow!("{}: {}", args.snapshot.display(), e))?;

    let out = if args.raw {
        format!("{}\n", snapshot.raw())
    } else {
        let mut out = String::new();
        let count = snapshot
            .render(&mut out)
            .map_err(|e| anyhow!("decoding failed: {}", e))?;
        log::debug!("{} messages", count);
        out
    };

    io::stdout()
        .lock()
        .write_all(out.as_bytes())
        .context("writing to stdout")?;
    Ok(())
}
