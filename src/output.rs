//! HTML output and file path generation

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for output operations
#[derive(Debug, Error)]
pub enum OutputError {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Write rendered HTML to a file, creating parent directories as needed.
pub fn save_html(html: &str, path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    std::fs::write(path, html)?;
    Ok(())
}

/// Short name of a template id for use in file names.
///
/// `@classic` becomes `classic`, `cards/summer.hbs` becomes `summer`.
pub fn template_file_stem(template_id: &str) -> String {
    let id = template_id.strip_prefix('@').unwrap_or(template_id);
    Path::new(id)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("card")
        .to_string()
}

/// Default file name for an entity rendered with a template: `{data_stem}_{template}.html`.
pub fn card_file_name(data_file: &Path, template_id: &str) -> String {
    let data_stem = data_file.file_stem().and_then(|s| s.to_str()).unwrap_or("card");
    format!("{}_{}.html", data_stem, template_file_stem(template_id))
}

/// Generate the output path for a rendered card.
///
/// | Scenario | Output |
/// |----------|--------|
/// | `-o card.html` | `card.html` |
/// | `-o dir/` or an existing directory | `dir/{data_stem}_{template}.html` |
pub fn generate_output_path(data_file: &Path, template_id: &str, output_arg: &Path) -> PathBuf {
    let is_dir = output_arg.as_os_str().to_string_lossy().ends_with('/') || output_arg.is_dir();

    if is_dir {
        output_arg.join(card_file_name(data_file, template_id))
    } else {
        output_arg.to_path_buf()
    }
}
