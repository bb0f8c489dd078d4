use std::collections::BTreeSet;
use std::path::Path;

/// Suppression file the generator reads when no path is given.
pub const DEFAULT_SUPPRESSIONS: &str = "valgrind/suppressions/current.supp";

const STRIP_PREFIXES: [&str; 2] = ["obj:/lib/", "obj:/usr/lib/"];

/// Unique `obj:` frames in `text`, trimmed and sorted.
pub fn collect_objects(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| line.contains("obj:"))
        .map(|line| line.trim().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// `obj:/usr/lib/libglib-2.0.so.0.7800.0` -> `libglib-2`.
pub fn library_name(object: &str) -> &str {
    let mut name = object.trim();
    for prefix in STRIP_PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix) {
            name = rest;
        }
    }
    // Drops `.so` along with any version suffix.
    name.split('.').next().unwrap_or(name)
}

/// Leak suppression matching any stack that passes through `object`.
pub fn suppression_block(object: &str) -> String {
    let object = object.trim();
    format!(
        "{{\n   {}\n   Memcheck:Leak\n   ...\n   {}\n   ...\n}}",
        library_name(object),
        object
    )
}

/// Read `path` and build one block per unique `obj:` frame.
/// An unreadable file yields no blocks.
pub fn generate(path: &Path) -> Vec<String> {
    match std::fs::read(path) {
        Ok(bytes) => collect_objects(&String::from_utf8_lossy(&bytes))
            .iter()
            .map(|object| suppression_block(object))
            .collect(),
        Err(e) => {
            log::debug!("No suppressions read from {}: {e}", path.display());
            Vec::new()
        }
    }
}
