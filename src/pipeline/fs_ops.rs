use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn ensure_dir<P: AsRef<Path>>(p: P) -> std::io::Result<()> {
    if !p.as_ref().exists() {
        fs::create_dir_all(&p)?;
    }
    Ok(())
}

/// Regular files directly inside `dir` whose name ends in `.{extension}`,
/// sorted by name.
pub fn find_input_files(dir: &Path, extension: &str) -> std::io::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a directory", dir.display()),
        ));
    }

    let suffix = format!(".{}", extension.trim_start_matches('.'));
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().ends_with(&suffix) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}
