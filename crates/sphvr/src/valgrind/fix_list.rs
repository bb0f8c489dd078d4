use std::io::{self, BufRead, Write};

/// Name Valgrind writes into generated suppressions.
pub const PLACEHOLDER: &str = "<insert_a_suppression_name_here>";
/// Prefix of the replacement name; the hit number is appended.
pub const LABEL: &str = "memcheck problem #";

/// Copy `input` to `output`, naming each suppression `memcheck problem #N`.
///
/// Lines are numbered in order of appearance. Every placeholder on the same
/// line gets that line's number. Returns the number of lines rewritten.
pub fn number_placeholders<R: BufRead, W: Write>(mut input: R, mut output: W) -> io::Result<usize> {
    let mut hits = 0;
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        if line.contains(PLACEHOLDER) {
            hits += 1;
            let label = format!("{LABEL}{hits}");
            output.write_all(line.replace(PLACEHOLDER, &label).as_bytes())?;
        } else {
            output.write_all(line.as_bytes())?;
        }
    }
    output.flush()?;
    Ok(hits)
}
