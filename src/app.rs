// ============================================
// FontFlow - app.rs
// ============================================
// The window and its callbacks (Windows only).
//
// Flow:
// 1. User picks one or more ZIP files (file picker)
// 2. "Install Fonts" starts a background thread running worker.rs
// 3. The thread posts status text back to the UI as it goes
// 4. When done, a message box shows the summary and the window
//    returns to idle
// ============================================

// Include the compiled Slint UI code
// This macro reads the generated code from build.rs
slint::include_modules!();

use std::any::Any;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::rc::Rc;

use rfd::{FileDialog, MessageButtons, MessageDialog};

use crate::installer::Installer;
use crate::registrar::{self, WindowsRegistrar};
use crate::settings::Settings;
use crate::summary::{MessageLevel, SummaryMessage};
use crate::{paths, worker};

pub fn run() -> Result<(), slint::PlatformError> {
    let settings_path = Settings::default_path();
    let settings = Rc::new(RefCell::new(Settings::load_or_default(&settings_path)));

    // ZIP files the user has picked so far (UI thread only)
    let selected: Rc<RefCell<Vec<PathBuf>>> = Rc::new(RefCell::new(Vec::new()));

    let is_admin = registrar::is_user_admin();
    if !is_admin {
        log::info!("Running without administrator privileges - fonts will install per-user");
    }

    let ui = MainWindow::new()?;
    ui.set_version(format!("v{}", env!("CARGO_PKG_VERSION")).into());
    ui.set_privilege_text(privilege_text(is_admin).into());
    ui.set_write_registry(settings.borrow().write_registry);
    refresh_archive_list(&ui, &selected.borrow());

    let ui_handle = ui.as_weak();

    // ============================================
    // CALLBACKS
    // ============================================

    // Callback: Select ZIP Files
    ui.on_select_archives({
        let ui = ui_handle.clone();
        let selected = selected.clone();
        let settings = settings.clone();
        let settings_path = settings_path.clone();
        move || {
            let mut dialog = FileDialog::new()
                .set_title("Select ZIP files containing fonts")
                .add_filter("ZIP files", &["zip"])
                .add_filter("All files", &["*"]);

            if let Some(dir) = settings.borrow().last_directory.clone() {
                if dir.is_dir() {
                    dialog = dialog.set_directory(dir);
                }
            }

            let Some(files) = dialog.pick_files() else {
                return; // cancelled
            };

            // Remember the folder for next time
            if let Some(parent) = files.first().and_then(|f| f.parent()) {
                settings.borrow_mut().last_directory = Some(parent.to_path_buf());
                settings.borrow().save_or_warn(&settings_path);
            }

            {
                let mut list = selected.borrow_mut();
                for file in files {
                    if !list.contains(&file) {
                        list.push(file);
                    }
                }
                log::info!("{} archive(s) selected", list.len());
            }

            if let Some(ui) = ui.upgrade() {
                refresh_archive_list(&ui, &selected.borrow());
            }
        }
    });

    // Callback: Clear List
    ui.on_clear_archives({
        let ui = ui_handle.clone();
        let selected = selected.clone();
        move || {
            selected.borrow_mut().clear();
            if let Some(ui) = ui.upgrade() {
                refresh_archive_list(&ui, &selected.borrow());
                ui.set_status_text("Ready to install fonts".into());
            }
        }
    });

    // Callback: registry checkbox
    ui.on_write_registry_toggled({
        let settings = settings.clone();
        let settings_path = settings_path.clone();
        move |checked| {
            settings.borrow_mut().write_registry = checked;
            settings.borrow().save_or_warn(&settings_path);
        }
    });

    // Callback: Install Fonts
    // The actual work runs on a separate thread so the window doesn't freeze.
    ui.on_install_fonts({
        let ui = ui_handle.clone();
        let selected = selected.clone();
        let settings = settings.clone();
        move || {
            let Some(ui) = ui.upgrade() else { return };

            let archives = selected.borrow().clone();
            if archives.is_empty() {
                show_message(&SummaryMessage {
                    level: MessageLevel::Warning,
                    title: "No Files Selected".to_string(),
                    body: "Please select ZIP files containing fonts first.".to_string(),
                });
                return;
            }

            ui.set_busy(true);
            ui.set_status_text("Extracting fonts from archives...".into());

            let settings = settings.borrow().clone();
            let ui_for_worker = ui.as_weak();

            std::thread::spawn(move || {
                let ui_for_progress = ui_for_worker.clone();

                // Anything that goes wrong in here - including a panic - ends
                // up in a dialog, and the window goes back to idle
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    let registrar = WindowsRegistrar::new(settings.broadcast_timeout_ms);
                    let installer = Installer::new(
                        paths::install_targets(&settings),
                        &registrar,
                        settings.write_registry,
                    );
                    worker::run_installation(&archives, &installer, &std::env::temp_dir(), |progress| {
                        post_status(&ui_for_progress, progress.status_text());
                    })
                }));

                let (status, message) = match outcome {
                    Ok(Ok(summary)) => (summary.status_line(), summary.message()),
                    Ok(Err(e)) => {
                        log::error!("Installation failed: {:#}", e);
                        (
                            "Failed: installation error".to_string(),
                            SummaryMessage::installation_error(&format!("{:#}", e)),
                        )
                    }
                    Err(payload) => {
                        let detail = panic_detail(payload.as_ref());
                        log::error!("Installation thread panicked: {}", detail);
                        (
                            "Failed: installation error".to_string(),
                            SummaryMessage::installation_error(&detail),
                        )
                    }
                };

                // Send results back to the UI thread
                let ui_done = ui_for_worker.clone();
                let _ = slint::invoke_from_event_loop(move || {
                    if let Some(ui) = ui_done.upgrade() {
                        ui.set_busy(false);
                        ui.set_status_text(status.into());
                    }
                });

                show_message(&message);
            });
        }
    });

    log::info!("Starting UI...");
    ui.run()
}

// ============================================
// HELPER FUNCTIONS
// ============================================

/// Push the file names of the selected archives into the list view
fn refresh_archive_list(ui: &MainWindow, archives: &[PathBuf]) {
    let names: Vec<slint::SharedString> = archives
        .iter()
        .map(|p| crate::archive::file_display_name(p).into())
        .collect();
    let model = Rc::new(slint::VecModel::from(names));
    ui.set_archive_names(model.into());
}

/// Update the status label from a background thread
fn post_status(ui: &slint::Weak<MainWindow>, text: String) {
    let ui = ui.clone();
    let _ = slint::invoke_from_event_loop(move || {
        if let Some(ui) = ui.upgrade() {
            ui.set_status_text(text.into());
        }
    });
}

fn privilege_text(is_admin: bool) -> &'static str {
    if is_admin {
        "Administrator mode • System-wide installation"
    } else {
        "Standard user • Fonts install for the current user"
    }
}

/// Blocking native message box
fn show_message(message: &SummaryMessage) {
    let level = match message.level {
        MessageLevel::Info => rfd::MessageLevel::Info,
        MessageLevel::Warning => rfd::MessageLevel::Warning,
        MessageLevel::Error => rfd::MessageLevel::Error,
    };
    MessageDialog::new()
        .set_level(level)
        .set_title(message.title.as_str())
        .set_description(message.body.as_str())
        .set_buttons(MessageButtons::Ok)
        .show();
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected internal error".to_string()
    }
}
