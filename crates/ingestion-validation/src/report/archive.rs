//! Zip packaging of report components.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use super::ReportError;

/// Pack `files` (flat, by file name) into `archive_path`.
///
/// Runs on the blocking pool. Returns the archive size in bytes.
pub async fn zip_files(files: Vec<PathBuf>, archive_path: PathBuf) -> Result<u64, ReportError> {
    tokio::task::spawn_blocking(move || write_archive(&files, &archive_path)).await?
}

fn write_archive(files: &[PathBuf], archive_path: &Path) -> Result<u64, ReportError> {
    let output = File::create(archive_path)?;
    let mut zip = zip::ZipWriter::new(BufWriter::new(output));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        zip.start_file(name, options)?;
        let mut input = File::open(path)?;
        std::io::copy(&mut input, &mut zip)?;
    }

    let mut writer = zip.finish()?;
    writer.flush()?;
    drop(writer);

    Ok(std::fs::metadata(archive_path)?.len())
}
