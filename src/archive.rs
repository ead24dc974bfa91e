// ============================================
// FontFlow - archive.rs
// ============================================
// The archive scanner: pulls font files out of ZIP archives.
//
// Only entries with a font extension (.ttf, .otf, .ttc, .otc - any case)
// are written to disk. Everything else in the archive (readme.txt,
// license files, preview images) is skipped without being touched.
//
// Extraction is all-or-nothing per archive. Each entry is first written
// to "<name>.part" and renamed once complete; if anything goes wrong,
// every file this archive produced is removed again before the error is
// returned. A corrupt archive never leaves half a font behind.
// ============================================

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

// ============================================
// FONT TYPES
// ============================================

/// The font formats we know how to install
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    /// .ttf
    TrueType,
    /// .otf
    OpenType,
    /// .ttc
    TrueTypeCollection,
    /// .otc
    OpenTypeCollection,
}

impl FontKind {
    /// Classify a path by its (case-insensitive) extension.
    /// Returns None for anything that isn't a font file.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "ttf" => Some(FontKind::TrueType),
            "otf" => Some(FontKind::OpenType),
            "ttc" => Some(FontKind::TrueTypeCollection),
            "otc" => Some(FontKind::OpenTypeCollection),
            _ => None,
        }
    }

    /// Suffix Windows uses for value names under the Fonts registry key,
    /// e.g. "Arial (TrueType)"
    pub fn registry_suffix(&self) -> &'static str {
        match self {
            FontKind::TrueType => "(TrueType)",
            FontKind::OpenType => "(OpenType)",
            FontKind::TrueTypeCollection => "(TrueType Collection)",
            FontKind::OpenTypeCollection => "(OpenType Collection)",
        }
    }
}

/// A font file extracted to the scratch folder, waiting to be installed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontCandidate {
    pub path: PathBuf,
    pub kind: FontKind,
}

impl FontCandidate {
    /// Just the file name ("Inter-Bold.ttf") - what ends up in the font folder
    pub fn file_name(&self) -> String {
        file_display_name(&self.path)
    }
}

// ============================================
// ERRORS
// ============================================

#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Not a ZIP file, or the ZIP is damaged
    #[error("Invalid ZIP file: {archive} ({reason})")]
    InvalidArchive { archive: String, reason: String },

    /// Couldn't open the archive or write into the scratch folder
    #[error("Error extracting {archive}: {source}")]
    Io {
        archive: String,
        #[source]
        source: io::Error,
    },
}

// ============================================
// EXTRACTION
// ============================================

/// Extract every font file in `zip_path` into `dest_dir`.
///
/// Sub-folders inside the archive are kept (e.g. `Static/Inter-Bold.ttf`
/// lands in `dest_dir/Static/Inter-Bold.ttf`). Entries whose names would
/// escape `dest_dir` (absolute paths, `..`) are skipped.
///
/// # Returns
/// * `Ok(Vec<FontCandidate>)` - the extracted fonts, in archive order
/// * `Err(ArchiveError)` - nothing from this archive is left on disk
pub fn extract_fonts(zip_path: &Path, dest_dir: &Path) -> Result<Vec<FontCandidate>, ArchiveError> {
    let archive_name = file_display_name(zip_path);
    let mut written: Vec<PathBuf> = Vec::new();

    let result = extract_into(zip_path, dest_dir, &archive_name, &mut written);
    if result.is_err() {
        for path in &written {
            let _ = fs::remove_file(path);
        }
    }
    result
}

fn extract_into(
    zip_path: &Path,
    dest_dir: &Path,
    archive_name: &str,
    written: &mut Vec<PathBuf>,
) -> Result<Vec<FontCandidate>, ArchiveError> {
    let io_err = |source: io::Error| ArchiveError::Io {
        archive: archive_name.to_string(),
        source,
    };
    let invalid = |reason: String| ArchiveError::InvalidArchive {
        archive: archive_name.to_string(),
        reason,
    };

    let file = File::open(zip_path).map_err(io_err)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| invalid(e.to_string()))?;

    let mut fonts = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| invalid(e.to_string()))?;

        // Directory entries are just markers, even if named "foo.ttf/"
        if entry.is_dir() {
            continue;
        }

        let Some(relative) = entry.enclosed_name() else {
            log::warn!(
                "[Archive] {}: skipping unsafe entry name {:?}",
                archive_name,
                entry.name()
            );
            continue;
        };

        let Some(kind) = FontKind::from_path(&relative) else {
            log::debug!("[Archive] {}: skipping {}", archive_name, entry.name());
            continue;
        };

        // Read the whole entry first: a CRC or decompression error here
        // means the archive is damaged, not that the disk is.
        // The declared size is only a claim - never allocate from it. Read
        // at most one byte past it and compare.
        let entry_name = entry.name().to_string();
        let declared = entry.size();
        let mut data = Vec::new();
        entry
            .by_ref()
            .take(declared.saturating_add(1))
            .read_to_end(&mut data)
            .map_err(|e| invalid(format!("{}: {}", entry_name, e)))?;
        if data.len() as u64 != declared {
            return Err(invalid(format!(
                "{}: header declares {} bytes but the entry holds {}",
                entry_name,
                declared,
                data.len()
            )));
        }

        let final_path = dest_dir.join(&relative);
        write_entry(&data, &final_path, written).map_err(io_err)?;

        log::info!("[Archive] Extracted: {}", file_display_name(&final_path));
        fonts.push(FontCandidate {
            path: final_path,
            kind,
        });
    }

    log::info!("[Archive] {}: {} font file(s)", archive_name, fonts.len());
    Ok(fonts)
}

/// Write `data` to `final_path` via a ".part" file, tracking what exists
/// on disk so the caller can roll back.
fn write_entry(data: &[u8], final_path: &Path, written: &mut Vec<PathBuf>) -> io::Result<()> {
    if let Some(parent) = final_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut part_name = final_path.as_os_str().to_os_string();
    part_name.push(".part");
    let part_path = PathBuf::from(part_name);

    written.push(part_path.clone());
    fs::write(&part_path, data)?;
    fs::rename(&part_path, final_path)?;

    // The .part file is gone; track the final file instead
    written.pop();
    written.push(final_path.to_path_buf());
    Ok(())
}

/// File name of a path for messages, falling back to the full path
pub fn file_display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================
// TESTS
// ============================================
