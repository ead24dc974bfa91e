// ============================================
// FontFlow - paths.rs
// ============================================
// Where fonts can go, and where FontFlow keeps its own files.
//
// Font folders are tried in this order (first writable one wins):
//
//   %WINDIR%\Fonts                           system-wide, needs admin
//   %LOCALAPPDATA%\Microsoft\Windows\Fonts   the real per-user font folder
//   %APPDATA%\Microsoft\Windows\Fonts        roaming variant
//   %USERPROFILE%\Documents\Fonts            last-resort user folders
//   %TEMP%\UserFonts
//
// plus any extra folders listed in fontflow_settings.json.
// ============================================

use std::path::PathBuf;

use crate::installer::InstallTarget;
use crate::settings::Settings;

/// `%WINDIR%\Fonts`, or `C:\Windows\Fonts` if WINDIR isn't set
pub fn system_font_dir() -> PathBuf {
    system_font_dir_from(&env_var)
}

/// Per-user font folder candidates, in preference order
pub fn user_font_dirs() -> Vec<PathBuf> {
    user_font_dirs_from(&env_var, std::env::temp_dir())
}

/// The full fallback chain for an install run
pub fn install_targets(settings: &Settings) -> Vec<InstallTarget> {
    build_targets(system_font_dir(), user_font_dirs(), settings)
}

/// Get the directory where fontflow.exe is located.
///
/// Settings live next to the EXE (portable - works from a USB stick).
/// Falls back to the current directory if the EXE path can't be resolved.
pub fn app_directory() -> PathBuf {
    if let Ok(exe_path) = std::env::current_exe() {
        let resolved = exe_path.canonicalize().unwrap_or(exe_path);
        if let Some(parent) = resolved.parent() {
            // Strip \\?\ prefix that canonicalize adds on Windows
            let parent_str = parent.to_string_lossy();
            if let Some(stripped) = parent_str.strip_prefix(r"\\?\") {
                return PathBuf::from(stripped);
            }
            return parent.to_path_buf();
        }
    }
    log::warn!("Could not determine EXE directory, using current directory");
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

// ============================================
// INTERNALS (environment passed in so tests don't touch the real one)
// ============================================

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn system_font_dir_from(env: &dyn Fn(&str) -> Option<String>) -> PathBuf {
    let windir = env("WINDIR").unwrap_or_else(|| r"C:\Windows".to_string());
    PathBuf::from(windir).join("Fonts")
}

fn user_font_dirs_from(env: &dyn Fn(&str) -> Option<String>, temp_dir: PathBuf) -> Vec<PathBuf> {
    let profile = env("USERPROFILE").map(PathBuf::from);

    let local_appdata = env("LOCALAPPDATA")
        .map(PathBuf::from)
        .or_else(|| profile.as_ref().map(|p| p.join("AppData").join("Local")));
    let roaming_appdata = env("APPDATA")
        .map(PathBuf::from)
        .or_else(|| profile.as_ref().map(|p| p.join("AppData").join("Roaming")));

    let candidates = [
        local_appdata.map(|d| d.join("Microsoft").join("Windows").join("Fonts")),
        roaming_appdata.map(|d| d.join("Microsoft").join("Windows").join("Fonts")),
        profile.map(|p| p.join("Documents").join("Fonts")),
        Some(temp_dir.join("UserFonts")),
    ];

    let mut dirs: Vec<PathBuf> = Vec::new();
    for dir in candidates.into_iter().flatten() {
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    dirs
}

fn build_targets(system_dir: PathBuf, user_dirs: Vec<PathBuf>, settings: &Settings) -> Vec<InstallTarget> {
    let mut targets = Vec::new();
    if !settings.skip_system_dir {
        targets.push(InstallTarget::system(system_dir));
    }

    for dir in user_dirs.into_iter().chain(settings.extra_font_dirs.iter().cloned()) {
        if !targets.iter().any(|t| t.dir == dir) {
            targets.push(InstallTarget::user(dir));
        }
    }
    targets
}

// ============================================
// TESTS
// ============================================
