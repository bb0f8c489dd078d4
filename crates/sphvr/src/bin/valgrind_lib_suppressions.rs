//! Print a leak suppression for every shared object named in a suppression file.
//!
//! usage: sphvr-valgrind-lib-suppressions [suppressions_file]

use std::path::PathBuf;

use sphvr::valgrind::lib_suppressions::{self, DEFAULT_SUPPRESSIONS};

fn main() {
    sphvr::init_logging();

    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SUPPRESSIONS));

    for block in lib_suppressions::generate(&path) {
        println!("{block}");
    }
}
