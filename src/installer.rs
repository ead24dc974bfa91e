// ============================================
// FontFlow - installer.rs
// ============================================
// Installs one extracted font file, trying a list of locations in order.
//
// The list normally looks like this (see paths.rs):
//
//   1. C:\Windows\Fonts                              (System - needs admin)
//   2. %LOCALAPPDATA%\Microsoft\Windows\Fonts        (User)
//   3. %APPDATA%\Microsoft\Windows\Fonts             (User)
//   4. %USERPROFILE%\Documents\Fonts                 (User)
//   5. %TEMP%\UserFonts                              (User)
//
// The first location that takes the file wins. There is no retry and
// nothing runs in parallel - each font is handled on its own.
//
// SYSTEM attempt: copy, then register with Windows. If registration fails
// the copy is deleted again and we move on to the user folders.
//
// USER attempt: make sure the folder exists and is writable (probe file),
// copy, then register. Once the copy succeeds the font counts as installed
// even if registration fails - it's reported as "user-level-partial" so
// the summary can say so.
// ============================================

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::archive::{FontCandidate, FontKind};
use crate::registrar::FontRegistrar;

/// Name of the throwaway file used to check a folder is writable
const PROBE_FILE_NAME: &str = ".fontflow_write_test";

/// How a font file gets into a font folder (`fs::copy` outside of tests)
type CopyFn = fn(&Path, &Path) -> io::Result<u64>;

// ============================================
// TYPES
// ============================================

/// Who the font is installed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InstallScope {
    /// All users (C:\Windows\Fonts, HKLM)
    System,
    /// Current user only (per-user folder, HKCU)
    User,
}

/// One step of the fallback chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTarget {
    pub dir: PathBuf,
    pub scope: InstallScope,
}

impl InstallTarget {
    pub fn system(dir: impl Into<PathBuf>) -> Self {
        InstallTarget { dir: dir.into(), scope: InstallScope::System }
    }

    pub fn user(dir: impl Into<PathBuf>) -> Self {
        InstallTarget { dir: dir.into(), scope: InstallScope::User }
    }
}

/// Final outcome for one font file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallStatus {
    SystemWide,
    UserLevel,
    /// Copied to a user folder, but Windows refused to load it right now
    UserLevelPartial,
    Failed(String),
}

impl InstallStatus {
    /// Short tag shown in logs and failure lists
    pub fn tag(&self) -> &str {
        match self {
            InstallStatus::SystemWide => "system-wide",
            InstallStatus::UserLevel => "user-level",
            InstallStatus::UserLevelPartial => "user-level-partial",
            InstallStatus::Failed(reason) => reason,
        }
    }

    pub fn is_installed(&self) -> bool {
        !matches!(self, InstallStatus::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallResult {
    /// File name of the font ("Inter-Bold.ttf")
    pub font_name: String,
    pub status: InstallStatus,
    /// Where the file ended up (None when it failed)
    pub location: Option<PathBuf>,
}

/// Why a single location turned the font down
#[derive(Debug, Error)]
enum StepError {
    #[error("{} is not writable: {source}", .dir.display())]
    NotWritable {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not copy into {}: {source}", .dir.display())]
    Copy {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Windows rejected the font in {}", .dir.display())]
    Registration { dir: PathBuf },
}

// ============================================
// INSTALLER
// ============================================

pub struct Installer<'a, R: FontRegistrar + ?Sized> {
    targets: Vec<InstallTarget>,
    registrar: &'a R,
    /// Write the Fonts registry value so the font survives a reboot
    write_registry: bool,
    copy: CopyFn,
}

impl<'a, R: FontRegistrar + ?Sized> Installer<'a, R> {
    pub fn new(targets: Vec<InstallTarget>, registrar: &'a R, write_registry: bool) -> Self {
        Installer {
            targets,
            registrar,
            write_registry,
            copy: |from, to| fs::copy(from, to),
        }
    }

    #[cfg(test)]
    fn with_copy(mut self, copy: CopyFn) -> Self {
        self.copy = copy;
        self
    }

    /// Install one font, walking the fallback chain until a location
    /// accepts it. Always returns exactly one result.
    pub fn install_font_file(&self, font: &FontCandidate) -> InstallResult {
        let font_name = font.file_name();
        let mut last_error: Option<String> = None;

        for target in &self.targets {
            let attempt = match target.scope {
                InstallScope::System => self.try_system(target, font, &font_name),
                InstallScope::User => self.try_user(target, font, &font_name),
            };

            match attempt {
                Ok((status, dest)) => {
                    log::info!(
                        "[Install] {} -> {} ({})",
                        font_name,
                        dest.display(),
                        status.tag()
                    );
                    return InstallResult { font_name, status, location: Some(dest) };
                }
                Err(e) => {
                    if let StepError::Copy { source, .. } = &e {
                        if source.kind() == io::ErrorKind::PermissionDenied
                            && target.scope == InstallScope::System
                        {
                            log::warn!(
                                "[Install] {}: administrator privileges are required for {}",
                                font_name,
                                target.dir.display()
                            );
                        }
                    }
                    log::warn!("[Install] {}: {}", font_name, e);
                    last_error = Some(e.to_string());
                }
            }
        }

        let reason = match last_error {
            Some(e) => format!("no font folder accepted the file ({})", e),
            None => "no font folders configured".to_string(),
        };
        log::error!("[Install] {} failed: {}", font_name, reason);
        InstallResult { font_name, status: InstallStatus::Failed(reason), location: None }
    }

    fn try_system(
        &self,
        target: &InstallTarget,
        font: &FontCandidate,
        font_name: &str,
    ) -> Result<(InstallStatus, PathBuf), StepError> {
        let dest = target.dir.join(font_name);
        self.copy_into(target, font, &dest)?;

        if !self.registrar.add_font_resource(&dest) {
            // Don't leave an unregistered copy in the system folder
            remove_leftover(&dest);
            return Err(StepError::Registration { dir: target.dir.clone() });
        }

        // HKLM values hold just the file name (relative to C:\Windows\Fonts)
        self.persist(InstallScope::System, font, font_name);
        self.registrar.broadcast_font_change();
        Ok((InstallStatus::SystemWide, dest))
    }

    fn try_user(
        &self,
        target: &InstallTarget,
        font: &FontCandidate,
        font_name: &str,
    ) -> Result<(InstallStatus, PathBuf), StepError> {
        ensure_writable(&target.dir).map_err(|source| StepError::NotWritable {
            dir: target.dir.clone(),
            source,
        })?;

        let dest = target.dir.join(font_name);
        self.copy_into(target, font, &dest)?;

        // HKCU values need the full path
        let data = dest.to_string_lossy().to_string();

        if self.registrar.add_font_resource(&dest) {
            self.persist(InstallScope::User, font, &data);
            self.registrar.broadcast_font_change();
            Ok((InstallStatus::UserLevel, dest))
        } else {
            log::warn!(
                "[Install] {}: copied to {} but Windows did not load it",
                font_name,
                target.dir.display()
            );
            // Still record it so it loads at next sign-in
            self.persist(InstallScope::User, font, &data);
            Ok((InstallStatus::UserLevelPartial, dest))
        }
    }

    /// Copy the font to `dest`. The destination is created before any data
    /// is written, so a failed copy can leave a truncated file behind; that
    /// file is removed again.
    fn copy_into(
        &self,
        target: &InstallTarget,
        font: &FontCandidate,
        dest: &Path,
    ) -> Result<(), StepError> {
        if let Err(source) = (self.copy)(&font.path, dest) {
            if dest != font.path && dest.is_file() {
                remove_leftover(dest);
            }
            return Err(StepError::Copy { dir: target.dir.clone(), source });
        }
        Ok(())
    }

    /// Optional registry write. Failures are logged, never fatal.
    fn persist(&self, scope: InstallScope, font: &FontCandidate, data: &str) {
        if !self.write_registry {
            return;
        }
        let name = registry_display_name(&font.path, font.kind);
        if let Err(e) = self.registrar.write_registry_value(scope, &name, data) {
            log::warn!(
                "[Install] Registry registration failed for {}: {}",
                font.file_name(),
                e
            );
        }
    }
}

// ============================================
// HELPERS
// ============================================

/// Create `dir` if needed and prove we can write to it by creating and
/// deleting a probe file.
fn ensure_writable(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let probe = dir.join(PROBE_FILE_NAME);
    fs::write(&probe, b"test")?;
    fs::remove_file(&probe)
}

/// Remove a file we put in a font folder but couldn't finish installing.
/// Returns false (and logs) if it's still there.
fn remove_leftover(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("[Install] Could not remove {}: {}", path.display(), e);
            false
        }
    }
}

/// Registry value name for a font, derived from its file name:
/// "Open_Sans-Bold.ttf" => "Open Sans Bold (TrueType)"
pub fn registry_display_name(path: &Path, kind: FontKind) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let base = stem.replace(['_', '-'], " ");
    format!("{} {}", base, kind.registry_suffix())
}

// ============================================
// TESTS
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registrar::fake::RecordingRegistrar;
    use crate::scratch::ScratchDir;

    /// A scratch folder with one extracted font and helpers for targets
    struct Fixture {
        scratch: ScratchDir,
        font: FontCandidate,
    }

    impl Fixture {
        fn new(file_name: &str, content: &[u8]) -> Self {
            let scratch = ScratchDir::create_in(&std::env::temp_dir()).unwrap();
            let extracted = scratch.path().join("extracted");
            fs::create_dir_all(&extracted).unwrap();
            let path = extracted.join(file_name);
            fs::write(&path, content).unwrap();
            let kind = FontKind::from_path(&path).unwrap();
            Fixture { scratch, font: FontCandidate { path, kind } }
        }

        /// A directory that exists and is writable
        fn dir(&self, name: &str) -> PathBuf {
            let dir = self.scratch.path().join(name);
            fs::create_dir_all(&dir).unwrap();
            dir
        }

        /// A path that can never be used as a directory: it is a regular
        /// file. Works even when the tests run with admin/root rights.
        fn blocked(&self, name: &str) -> PathBuf {
            let path = self.scratch.path().join(name);
            fs::write(&path, b"not a directory").unwrap();
            path
        }
    }

    #[test]
    fn test_system_install_succeeds_first() {
        let fx = Fixture::new("Test_Font-Regular.ttf", b"font");
        let system = fx.dir("system");
        let user = fx.dir("user");
        let registrar = RecordingRegistrar::default();
        let installer = Installer::new(
            vec![InstallTarget::system(&system), InstallTarget::user(&user)],
            &registrar,
            true,
        );

        let result = installer.install_font_file(&fx.font);

        assert_eq!(result.status, InstallStatus::SystemWide);
        assert_eq!(result.status.tag(), "system-wide");
        assert_eq!(result.location, Some(system.join("Test_Font-Regular.ttf")));
        assert!(system.join("Test_Font-Regular.ttf").is_file());
        assert!(!user.join("Test_Font-Regular.ttf").exists());
        assert_eq!(*registrar.broadcasts.borrow(), 1);

        let registry = registrar.registry.borrow();
        assert_eq!(
            registry.get(&(InstallScope::System, "Test Font Regular (TrueType)".to_string())),
            Some(&"Test_Font-Regular.ttf".to_string())
        );
    }

    #[test]
    fn test_system_copy_failure_falls_back_to_user() {
        let fx = Fixture::new("Inter.otf", b"font");
        let blocker = fx.blocked("blocker");
        let user = fx.dir("user");
        let registrar = RecordingRegistrar::default();
        let installer = Installer::new(
            vec![
                InstallTarget::system(blocker.join("Fonts")),
                InstallTarget::user(&user),
            ],
            &registrar,
            true,
        );

        let result = installer.install_font_file(&fx.font);

        assert_eq!(result.status, InstallStatus::UserLevel);
        let dest = user.join("Inter.otf");
        assert!(dest.is_file());
        assert!(!user.join(PROBE_FILE_NAME).exists());

        // Per-user registry values carry the full path
        let registry = registrar.registry.borrow();
        assert_eq!(
            registry.get(&(InstallScope::User, "Inter (OpenType)".to_string())),
            Some(&dest.to_string_lossy().to_string())
        );
    }

    #[test]
    fn test_system_registration_failure_removes_copy() {
        let fx = Fixture::new("Mono.ttf", b"font");
        let system = fx.dir("sysfonts");
        let user = fx.dir("user");
        let registrar = RecordingRegistrar::rejecting("sysfonts");
        let installer = Installer::new(
            vec![InstallTarget::system(&system), InstallTarget::user(&user)],
            &registrar,
            true,
        );

        let result = installer.install_font_file(&fx.font);

        assert_eq!(result.status, InstallStatus::UserLevel);
        assert!(!system.join("Mono.ttf").exists());
        assert!(user.join("Mono.ttf").is_file());
    }

    /// Copy that fails halfway through for any folder named "system",
    /// leaving a truncated file like a full disk would
    fn copy_truncating_in_system(from: &Path, to: &Path) -> io::Result<u64> {
        if to.parent().and_then(|p| p.file_name()) == Some(std::ffi::OsStr::new("system")) {
            fs::write(to, b"trunc")?;
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        fs::copy(from, to)
    }

    #[test]
    fn test_failed_system_copy_leaves_no_partial_file() {
        let fx = Fixture::new("Half.ttf", b"complete font data");
        let system = fx.dir("system");
        let user = fx.dir("user");
        // An older copy of the same font is already installed
        fs::write(system.join("Half.ttf"), b"old version").unwrap();
        let registrar = RecordingRegistrar::default();
        let installer = Installer::new(
            vec![InstallTarget::system(&system), InstallTarget::user(&user)],
            &registrar,
            true,
        )
        .with_copy(copy_truncating_in_system);

        let result = installer.install_font_file(&fx.font);

        assert!(!system.join("Half.ttf").exists());
        assert_eq!(result.status, InstallStatus::UserLevel);
        assert_eq!(fs::read(user.join("Half.ttf")).unwrap(), b"complete font data");
        assert_eq!(registrar.added.borrow().len(), 1);
    }

    #[test]
    fn test_failed_user_copy_leaves_no_partial_file() {
        let fx = Fixture::new("Half.otf", b"complete font data");
        let system = fx.dir("system");
        let registrar = RecordingRegistrar::default();
        let installer = Installer::new(vec![InstallTarget::user(&system)], &registrar, true)
            .with_copy(copy_truncating_in_system);

        let result = installer.install_font_file(&fx.font);

        assert!(!result.status.is_installed());
        assert!(result.status.tag().contains("disk full"));
        assert!(!system.join("Half.otf").exists());
        assert!(registrar.added.borrow().is_empty());
    }

    #[test]
    fn test_remove_leftover_reports_failure() {
        let fx = Fixture::new("Gone.ttf", b"font");
        let file = fx.dir("leftovers").join("Gone.ttf");
        fs::write(&file, b"font").unwrap();
        assert!(remove_leftover(&file));
        assert!(!file.exists());

        // Already gone - nothing to remove
        assert!(!remove_leftover(&file));
    }

    #[test]
    fn test_third_user_candidate_receives_file() {
        let fx = Fixture::new("Third.ttf", b"font");
        let sys_blocker = fx.blocked("sys_blocker");
        let first = fx.blocked("user_one");
        let second = fx.blocked("user_two");
        let third = fx.scratch.path().join("user_three"); // created on demand
        let registrar = RecordingRegistrar::default();
        let installer = Installer::new(
            vec![
                InstallTarget::system(sys_blocker.join("Fonts")),
                InstallTarget::user(&first),
                InstallTarget::user(&second),
                InstallTarget::user(&third),
            ],
            &registrar,
            false,
        );

        let result = installer.install_font_file(&fx.font);

        assert_eq!(result.status, InstallStatus::UserLevel);
        assert_eq!(result.location, Some(third.join("Third.ttf")));
        assert_eq!(fs::read(third.join("Third.ttf")).unwrap(), b"font");
        // The blocked candidates are still plain files
        assert!(first.is_file());
        assert!(second.is_file());
    }

    #[test]
    fn test_user_registration_failure_is_partial() {
        let fx = Fixture::new("Partial.ttc", b"font");
        let sys_blocker = fx.blocked("sys_blocker");
        let user = fx.dir("userfonts");
        let registrar = RecordingRegistrar::rejecting("userfonts");
        let installer = Installer::new(
            vec![
                InstallTarget::system(sys_blocker.join("Fonts")),
                InstallTarget::user(&user),
            ],
            &registrar,
            true,
        );

        let result = installer.install_font_file(&fx.font);

        assert_eq!(result.status, InstallStatus::UserLevelPartial);
        assert_eq!(result.status.tag(), "user-level-partial");
        assert!(result.status.is_installed());
        assert!(user.join("Partial.ttc").is_file());
        // Registry still written so it loads at next sign-in, but no broadcast
        assert_eq!(*registrar.registry_writes.borrow(), 1);
        assert_eq!(*registrar.broadcasts.borrow(), 0);
        assert!(registrar
            .registry
            .borrow()
            .contains_key(&(InstallScope::User, "Partial (TrueType Collection)".to_string())));
    }

    #[test]
    fn test_every_location_failing_reports_failure() {
        let fx = Fixture::new("Nowhere.ttf", b"font");
        let blocker = fx.blocked("blocker");
        let user = fx.blocked("user");
        let registrar = RecordingRegistrar::default();
        let installer = Installer::new(
            vec![
                InstallTarget::system(blocker.join("Fonts")),
                InstallTarget::user(&user),
            ],
            &registrar,
            true,
        );

        let result = installer.install_font_file(&fx.font);

        match &result.status {
            InstallStatus::Failed(reason) => {
                assert!(reason.contains("no font folder accepted the file"));
                assert!(reason.contains("not writable"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(!result.status.is_installed());
        assert_eq!(result.location, None);
        assert!(registrar.added.borrow().is_empty());
        assert_eq!(*registrar.registry_writes.borrow(), 0);
    }

    #[test]
    fn test_no_targets_configured() {
        let fx = Fixture::new("Lonely.ttf", b"font");
        let registrar = RecordingRegistrar::default();
        let installer = Installer::new(Vec::new(), &registrar, true);

        let result = installer.install_font_file(&fx.font);
        assert_eq!(
            result.status,
            InstallStatus::Failed("no font folders configured".to_string())
        );
    }

    #[test]
    fn test_registry_failure_does_not_change_outcome() {
        let fx = Fixture::new("Stubborn.ttf", b"font");
        let system = fx.dir("system");
        let registrar = RecordingRegistrar {
            registry_fails: true,
            ..Default::default()
        };
        let installer = Installer::new(vec![InstallTarget::system(&system)], &registrar, true);

        let result = installer.install_font_file(&fx.font);

        assert_eq!(result.status, InstallStatus::SystemWide);
        assert_eq!(*registrar.registry_writes.borrow(), 1);
        assert_eq!(*registrar.broadcasts.borrow(), 1);
    }

    #[test]
    fn test_registry_write_can_be_disabled() {
        let fx = Fixture::new("Quiet.ttf", b"font");
        let system = fx.dir("system");
        let registrar = RecordingRegistrar::default();
        let installer = Installer::new(vec![InstallTarget::system(&system)], &registrar, false);

        let result = installer.install_font_file(&fx.font);

        assert_eq!(result.status, InstallStatus::SystemWide);
        assert_eq!(*registrar.registry_writes.borrow(), 0);
        assert_eq!(*registrar.broadcasts.borrow(), 1);
    }

    #[test]
    fn test_reinstall_overwrites_without_duplicate_registry_values() {
        let fx = Fixture::new("Again.ttf", b"first version");
        let system = fx.dir("system");
        let registrar = RecordingRegistrar::default();
        let installer = Installer::new(vec![InstallTarget::system(&system)], &registrar, true);

        installer.install_font_file(&fx.font);
        fs::write(&fx.font.path, b"second version").unwrap();
        let result = installer.install_font_file(&fx.font);

        assert_eq!(result.status, InstallStatus::SystemWide);
        assert_eq!(fs::read(system.join("Again.ttf")).unwrap(), b"second version");
        assert_eq!(*registrar.registry_writes.borrow(), 2);
        assert_eq!(registrar.registry.borrow().len(), 1);
    }

    #[test]
    fn test_registry_display_name() {
        assert_eq!(
            registry_display_name(Path::new("Open_Sans-Bold.ttf"), FontKind::TrueType),
            "Open Sans Bold (TrueType)"
        );
        assert_eq!(
            registry_display_name(Path::new("dir/Source-Code.otf"), FontKind::OpenType),
            "Source Code (OpenType)"
        );
        assert_eq!(
            registry_display_name(Path::new("Noto.TTC"), FontKind::TrueTypeCollection),
            "Noto (TrueType Collection)"
        );
        assert_eq!(
            registry_display_name(Path::new("Noto_CJK.otc"), FontKind::OpenTypeCollection),
            "Noto CJK (OpenType Collection)"
        );
    }
}
