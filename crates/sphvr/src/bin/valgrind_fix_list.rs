//! Replace Valgrind's `<insert_a_suppression_name_here>` with numbered names.
//!
//! usage: sphvr-valgrind-fix-list [infile [outfile]]

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};

use anyhow::{Context, Result};

use sphvr::valgrind::number_placeholders;

fn main() -> Result<()> {
    sphvr::init_logging();

    let mut args = std::env::args_os().skip(1);
    let input: Box<dyn Read> = match args.next() {
        Some(path) => Box::new(
            File::open(&path).with_context(|| format!("Cannot open {}", path.to_string_lossy()))?,
        ),
        None => Box::new(io::stdin().lock()),
    };
    let output: Box<dyn Write> = match args.next() {
        Some(path) => Box::new(
            File::create(&path).with_context(|| format!("Cannot create {}", path.to_string_lossy()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };

    let hits = number_placeholders(BufReader::new(input), BufWriter::new(output))?;
    log::debug!("Named {hits} suppressions");
    Ok(())
}
