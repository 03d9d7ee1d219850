use std::fs;
use std::path::Path;

/// Create an OSC8 hyperlink for terminal output
pub fn osc8_link(url: &str, text: &str) -> String {
    format!("\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\", url, text)
}

/// Link to a local output file, labelled with its path as given
pub fn osc8_path_link(path: &Path) -> String {
    let abs_path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    osc8_link(
        &format!("file://{}", abs_path.display()),
        &path.display().to_string(),
    )
}
