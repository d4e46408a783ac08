//! Thumbnail extraction from FreeCAD archives
//!
//! A `.FCStd` file is a ZIP container. FreeCAD stores the document preview at
//! a fixed entry, `thumbnails/Thumbnail.png`. The central directory is read
//! first to validate the container, then local headers are walked in
//! container order so the first entry with that name wins even when the
//! archive holds duplicates. Only the matching entry is decompressed.
//!
//! The entry is streamed into a temporary sibling of the output path and
//! persisted over it once fully written and synced, so a failed copy never
//! leaves a partial preview behind.

use super::error::{PreviewError, Result};
use super::types::ExtractionOutcome;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::read::read_zipfile_from_stream;
use zip::result::{ZipError, ZipResult};
use zip::ZipArchive;

/// Internal path of the preview image inside a FreeCAD archive.
pub const THUMBNAIL_ENTRY: &str = "thumbnails/Thumbnail.png";

/// Extract the thumbnail of `archive_path` into `output_path`.
///
/// Creates or replaces exactly one file on `Extracted`; creates nothing
/// otherwise.
pub fn extract_thumbnail(archive_path: &Path, output_path: &Path) -> ExtractionOutcome {
    match try_extract(archive_path, output_path) {
        Ok(Some(bytes)) => {
            info!(
                "Extracted thumbnail from {} to {} ({} bytes)",
                archive_path.display(),
                output_path.display(),
                bytes
            );
            ExtractionOutcome::Extracted {
                output: output_path.to_path_buf(),
                bytes,
            }
        }
        Ok(None) => {
            debug!("No {} entry in {}", THUMBNAIL_ENTRY, archive_path.display());
            ExtractionOutcome::NotFound
        }
        Err(err) => ExtractionOutcome::Failed(err),
    }
}

fn try_extract(archive_path: &Path, output_path: &Path) -> Result<Option<u64>> {
    let unreadable = |source: ZipError| PreviewError::ArchiveUnreadable {
        path: archive_path.to_path_buf(),
        source,
    };
    let stream_failure = |source: io::Error| PreviewError::StreamFailure {
        archive: archive_path.to_path_buf(),
        output: output_path.to_path_buf(),
        source,
    };

    let file = File::open(archive_path).map_err(|e| unreadable(ZipError::Io(e)))?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(unreadable)?;

    let local = File::open(archive_path).map_err(|e| unreadable(ZipError::Io(e)))?;
    let mut local = BufReader::new(local);
    match extract_first_local(&mut local, THUMBNAIL_ENTRY.as_bytes(), output_path) {
        Ok(Some(written)) => return written.map(Some).map_err(stream_failure),
        Ok(None) => return Ok(None),
        Err(err) => debug!(
            "Local headers of {} cannot be streamed ({}); using the central directory",
            archive_path.display(),
            err
        ),
    }

    let Some(index) = find_entry(&mut archive, THUMBNAIL_ENTRY.as_bytes()).map_err(unreadable)?
    else {
        return Ok(None);
    };

    let mut entry = archive.by_index(index).map_err(unreadable)?;
    let bytes = write_replacing(output_path, &mut entry).map_err(stream_failure)?;
    Ok(Some(bytes))
}

/// Walk local headers from the start of `reader` and write the first entry
/// named `name` to `output`.
///
/// `Ok(None)` means the central directory was reached without a match. An
/// `Err` means the headers could not be walked (data descriptors, encrypted
/// entries, a prefixed stub) and the caller should fall back to the central
/// directory. The write result of a matching entry is returned as is.
fn extract_first_local<R: Read>(
    reader: &mut R,
    name: &[u8],
    output: &Path,
) -> ZipResult<Option<io::Result<u64>>> {
    loop {
        let Some(mut entry) = read_zipfile_from_stream(reader)? else {
            return Ok(None);
        };
        if entry.name_raw() == name {
            return Ok(Some(write_replacing(output, &mut entry)));
        }
    }
}

/// Index of the first entry whose raw name equals `name` in the central
/// directory. Duplicate names collapse to one entry here.
fn find_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &[u8]) -> ZipResult<Option<usize>> {
    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index)?;
        if entry.name_raw() == name {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

/// Stream `reader` into `output`, replacing it only after a complete write.
fn write_replacing<R: Read + ?Sized>(output: &Path, reader: &mut R) -> io::Result<u64> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut part = tempfile::Builder::new()
        .prefix(".fcpreview-")
        .suffix(".part")
        .tempfile_in(&dir)?;

    let bytes = {
        let mut writer = BufWriter::new(part.as_file_mut());
        let bytes = io::copy(reader, &mut writer)?;
        writer.flush()?;
        bytes
    };
    part.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(part.path(), fs::Permissions::from_mode(0o644))?;
    }

    part.persist(output).map_err(|e| e.error)?;
    Ok(bytes)
}
