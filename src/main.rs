// ============================================
// FontFlow - main.rs
// ============================================
// This is the entry point of the application.
//
// The program flow is:
// 1. main() starts and sets up logging
// 2. On Windows, app::run() opens the window and runs the UI event loop
// 3. On anything else, we explain that FontFlow is Windows-only and exit
//
// Module map:
//   archive    - pull font files out of ZIP archives
//   installer  - copy + register one font, with system -> user fallback
//   registrar  - the Windows API calls (GDI, User32, registry)
//   paths      - system and per-user font folders
//   scratch    - temporary extraction folders that clean themselves up
//   settings   - fontflow_settings.json next to the EXE
//   worker     - one full install run (runs on a background thread)
//   summary    - the end-of-run dialog text
//   app        - the Slint window (Windows only)
// ============================================

// No console window in release builds
#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]
// Without the GUI, most of the crate is only reachable from tests
#![cfg_attr(not(windows), allow(dead_code))]

mod archive;
mod installer;
mod paths;
mod registrar;
mod scratch;
mod settings;
mod summary;
mod worker;

#[cfg(windows)]
mod app;

fn main() {
    // RUST_LOG=debug for more detail
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("============================================");
    log::info!("FontFlow v{}", env!("CARGO_PKG_VERSION"));
    log::info!("============================================");

    #[cfg(windows)]
    {
        log::info!("Settings file: {}", settings::Settings::default_path().display());
        if let Err(e) = app::run() {
            log::error!("UI error: {}", e);
            std::process::exit(1);
        }
    }

    #[cfg(not(windows))]
    {
        eprintln!("FontFlow is designed for Windows only.");
        std::process::exit(1);
    }
}
