// ============================================
// FontFlow - registrar.rs
// ============================================
// The thin layer between the installer and Windows itself.
//
// Copying a font into a Fonts folder isn't enough on its own:
//   1. AddFontResourceW loads it into the session's font table, so
//      running programs can use it without a reboot
//   2. WM_FONTCHANGE is broadcast so open windows refresh their font lists
//   3. A value under ...\CurrentVersion\Fonts makes Windows load the font
//      again at the next boot / sign-in
//
// The installer only talks to the FontRegistrar trait. The real
// implementation calls the Windows API; tests swap in a fake that
// records the calls instead of touching the real font table.
// ============================================

use std::io;
use std::path::Path;

use crate::installer::InstallScope;

/// Registry key (under HKLM or HKCU) that lists installed fonts
pub const FONTS_REGISTRY_KEY: &str = r"SOFTWARE\Microsoft\Windows NT\CurrentVersion\Fonts";

/// Default timeout for the font-change broadcast (milliseconds)
pub const DEFAULT_BROADCAST_TIMEOUT_MS: u32 = 1000;

/// OS font registration primitives
pub trait FontRegistrar {
    /// Load a font file into the font table. Returns true on success.
    fn add_font_resource(&self, font_path: &Path) -> bool;

    /// Tell all top-level windows that the font table changed.
    /// Must not block forever on a hung window.
    fn broadcast_font_change(&self);

    /// Write `name = data` under the Fonts key for `scope`
    /// (HKLM for system installs, HKCU for per-user installs).
    /// Overwrites an existing value with the same name.
    fn write_registry_value(&self, scope: InstallScope, name: &str, data: &str) -> io::Result<()>;
}

// ============================================
// WINDOWS IMPLEMENTATION
// ============================================

#[cfg(windows)]
pub use windows_impl::WindowsRegistrar;

#[cfg(windows)]
mod windows_impl {
    use super::*;
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;

    use winapi::shared::basetsd::DWORD_PTR;
    use winapi::um::wingdi::AddFontResourceW;
    use winapi::um::winuser::{SendMessageTimeoutW, HWND_BROADCAST, SMTO_ABORTIFHUNG, WM_FONTCHANGE};
    use winreg::enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, KEY_SET_VALUE};
    use winreg::RegKey;

    /// Registers fonts with GDI, User32 and the registry
    #[derive(Debug, Clone)]
    pub struct WindowsRegistrar {
        broadcast_timeout_ms: u32,
    }

    impl WindowsRegistrar {
        pub fn new(broadcast_timeout_ms: u32) -> Self {
            WindowsRegistrar { broadcast_timeout_ms }
        }
    }

    impl Default for WindowsRegistrar {
        fn default() -> Self {
            WindowsRegistrar::new(DEFAULT_BROADCAST_TIMEOUT_MS)
        }
    }

    /// Null-terminated UTF-16 for the W-suffixed API functions
    fn to_wide(s: &OsStr) -> Vec<u16> {
        s.encode_wide().chain(Some(0)).collect()
    }

    impl FontRegistrar for WindowsRegistrar {
        fn add_font_resource(&self, font_path: &Path) -> bool {
            let wide = to_wide(font_path.as_os_str());
            // Returns the number of fonts added; 0 means failure
            let added = unsafe { AddFontResourceW(wide.as_ptr()) };
            log::debug!("[Registrar] AddFontResourceW({}) = {}", font_path.display(), added);
            added > 0
        }

        fn broadcast_font_change(&self) {
            let mut result: DWORD_PTR = 0;
            // SMTO_ABORTIFHUNG + timeout: a frozen window can't stall us
            let sent = unsafe {
                SendMessageTimeoutW(
                    HWND_BROADCAST,
                    WM_FONTCHANGE,
                    0,
                    0,
                    SMTO_ABORTIFHUNG,
                    self.broadcast_timeout_ms,
                    &mut result,
                )
            };
            if sent == 0 {
                log::warn!("[Registrar] WM_FONTCHANGE broadcast timed out or failed");
            }
        }

        fn write_registry_value(&self, scope: InstallScope, name: &str, data: &str) -> io::Result<()> {
            let root = match scope {
                InstallScope::System => HKEY_LOCAL_MACHINE,
                InstallScope::User => HKEY_CURRENT_USER,
            };
            // HKCU often has no Fonts key until the first per-user font
            let (key, _) = RegKey::predef(root).create_subkey_with_flags(FONTS_REGISTRY_KEY, KEY_SET_VALUE)?;
            key.set_value(name, &data.to_string())
        }
    }

    /// True when the process is running elevated
    pub fn is_user_admin() -> bool {
        unsafe { winapi::um::shlobj::IsUserAnAdmin() != 0 }
    }
}

#[cfg(windows)]
pub use windows_impl::is_user_admin;

// ============================================
// TEST FAKE
// ============================================
