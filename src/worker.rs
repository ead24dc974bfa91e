// ============================================
// FontFlow - worker.rs
// ============================================
// One installation run: extract every selected archive, then install
// every font that came out of them.
//
// This runs on a background thread (see app.rs) so the window stays
// responsive. It never touches the UI directly - it reports what it's
// doing through the `progress` callback, and the caller decides how to
// show that.
//
// A broken archive doesn't stop the run: it's recorded in the summary
// and the remaining archives are still processed.
// ============================================

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::archive::{self, file_display_name, FontCandidate};
use crate::installer::{InstallResult, InstallStatus, Installer};
use crate::registrar::FontRegistrar;
use crate::scratch::ScratchDir;

/// What the worker is doing right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    Extracting { archive: String },
    /// `reason` is the full error, which already names the archive
    ArchiveFailed { reason: String },
    Installing { index: usize, total: usize, font: String },
    Finished,
}

impl Progress {
    /// One-line text for the status label
    pub fn status_text(&self) -> String {
        match self {
            Progress::Extracting { archive } => format!("Extracting: {}", archive),
            Progress::ArchiveFailed { reason } => format!("Skipped: {}", reason),
            Progress::Installing { index, total, font } => {
                format!("Installing ({}/{}): {}", index, total, font)
            }
            Progress::Finished => "Finishing up...".to_string(),
        }
    }
}

/// An archive that couldn't be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFailure {
    pub archive: String,
    pub reason: String,
}

/// Everything that happened during one run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Font files found across all archives
    pub total_fonts: usize,
    /// One entry per font file, in extraction order
    pub results: Vec<InstallResult>,
    pub archive_errors: Vec<ArchiveFailure>,
}

impl RunSummary {
    pub fn system_count(&self) -> usize {
        self.count(|s| *s == InstallStatus::SystemWide)
    }

    /// User-level installs, including partial ones
    pub fn user_count(&self) -> usize {
        self.count(|s| matches!(s, InstallStatus::UserLevel | InstallStatus::UserLevelPartial))
    }

    pub fn partial_count(&self) -> usize {
        self.count(|s| *s == InstallStatus::UserLevelPartial)
    }

    pub fn installed_count(&self) -> usize {
        self.count(InstallStatus::is_installed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &InstallResult> {
        self.results.iter().filter(|r| !r.status.is_installed())
    }

    fn count(&self, pred: impl Fn(&InstallStatus) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.status)).count()
    }
}

/// Extract and install fonts from `archives`.
///
/// Extraction happens in a fresh folder under `scratch_root` that is
/// deleted again before this returns. Only setup failures (e.g. the
/// scratch folder can't be created) are returned as errors; everything
/// per-archive and per-font ends up in the summary.
pub fn run_installation<R: FontRegistrar + ?Sized>(
    archives: &[PathBuf],
    installer: &Installer<R>,
    scratch_root: &Path,
    progress: impl Fn(Progress),
) -> Result<RunSummary> {
    log::info!("[Worker] Starting run with {} archive(s)", archives.len());

    let scratch = ScratchDir::create_in(scratch_root)?;
    let mut summary = RunSummary::default();
    let mut fonts: Vec<FontCandidate> = Vec::new();

    // Step 1: extract. Each archive gets its own sub-folder so two
    // archives containing "Regular.ttf" don't overwrite each other.
    for (index, zip_path) in archives.iter().enumerate() {
        let archive_name = file_display_name(zip_path);
        progress(Progress::Extracting { archive: archive_name.clone() });

        let dest = scratch.path().join(format!("{:03}", index));
        match archive::extract_fonts(zip_path, &dest) {
            Ok(found) => fonts.extend(found),
            Err(e) => {
                log::error!("[Worker] {}", e);
                let reason = e.to_string();
                progress(Progress::ArchiveFailed { reason: reason.clone() });
                summary.archive_errors.push(ArchiveFailure { archive: archive_name, reason });
            }
        }
    }

    summary.total_fonts = fonts.len();
    if fonts.is_empty() {
        log::warn!("[Worker] No font files found in the selected archives");
        progress(Progress::Finished);
        return Ok(summary);
    }

    // Step 2: install, one font at a time
    let total = fonts.len();
    for (i, font) in fonts.iter().enumerate() {
        progress(Progress::Installing {
            index: i + 1,
            total,
            font: font.file_name(),
        });
        summary.results.push(installer.install_font_file(font));
    }

    log::info!(
        "[Worker] Done: {}/{} installed ({} system, {} user, {} partial)",
        summary.installed_count(),
        summary.total_fonts,
        summary.system_count(),
        summary.user_count(),
        summary.partial_count()
    );
    progress(Progress::Finished);
    Ok(summary)
}

// ============================================
// TESTS
// ============================================
