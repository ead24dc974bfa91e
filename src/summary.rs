// ============================================
// FontFlow - summary.rs
// ============================================
// Turns a RunSummary into the text of the dialog shown when a run ends.
// Kept separate from the GUI so the wording can be tested.
// ============================================

use crate::worker::RunSummary;

/// How many failed fonts to list when at least one font was installed
const FAILURES_SHOWN_ON_SUCCESS: usize = 5;
/// How many failed fonts to list when nothing was installed
const FAILURES_SHOWN_ON_FAILURE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
}

/// Title + body for a modal message box
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryMessage {
    pub level: MessageLevel,
    pub title: String,
    pub body: String,
}

impl SummaryMessage {
    /// Dialog for a run that blew up before producing a summary
    pub fn installation_error(detail: &str) -> Self {
        SummaryMessage {
            level: MessageLevel::Error,
            title: "Installation Error".to_string(),
            body: format!("An error occurred during installation: {}", detail),
        }
    }
}

impl RunSummary {
    /// Status bar text once the run is over
    pub fn status_line(&self) -> String {
        let installed = self.installed_count();
        if installed > 0 {
            format!(
                "Complete: {}/{} fonts installed successfully",
                installed, self.total_fonts
            )
        } else if self.total_fonts == 0 {
            "No fonts found in the selected archives".to_string()
        } else {
            "Failed: No fonts were installed".to_string()
        }
    }

    /// The end-of-run dialog
    pub fn message(&self) -> SummaryMessage {
        if self.total_fonts == 0 {
            let mut body = String::from(
                "No TTF, OTF, TTC or OTC font files were found in the selected ZIP archives.",
            );
            self.append_archive_errors(&mut body);
            return SummaryMessage {
                level: MessageLevel::Warning,
                title: "No Fonts Found".to_string(),
                body,
            };
        }

        let installed = self.installed_count();
        if installed > 0 {
            self.success_message(installed)
        } else {
            self.failure_message()
        }
    }

    fn success_message(&self, installed: usize) -> SummaryMessage {
        let mut parts = vec![format!(
            "Successfully installed {} out of {} fonts!\n",
            installed, self.total_fonts
        )];

        let system = self.system_count();
        if system > 0 {
            parts.push(format!(
                "{} fonts installed system-wide (available to all users)",
                system
            ));
        }

        let user = self.user_count();
        if user > 0 {
            parts.push(format!("{} fonts installed for the current user only", user));
        }

        let partial = self.partial_count();
        if partial > 0 {
            parts.push(format!(
                "   • {} of these were copied but Windows could not load them yet; \
                 they will be available after you sign in again",
                partial
            ));
        }

        let failures: Vec<_> = self.failures().collect();
        if !failures.is_empty() {
            parts.push(format!("\n{} fonts failed to install:", failures.len()));
            for failure in failures.iter().take(FAILURES_SHOWN_ON_SUCCESS) {
                parts.push(format!("   • {}: {}", failure.font_name, failure.status.tag()));
            }
            if failures.len() > FAILURES_SHOWN_ON_SUCCESS {
                parts.push(format!(
                    "   • ... and {} more",
                    failures.len() - FAILURES_SHOWN_ON_SUCCESS
                ));
            }
        }

        let mut body = parts.join("\n");
        self.append_archive_errors(&mut body);

        SummaryMessage {
            level: MessageLevel::Info,
            title: "Installation Complete".to_string(),
            body,
        }
    }

    fn failure_message(&self) -> SummaryMessage {
        let failures: Vec<_> = self.failures().collect();
        let mut details: Vec<String> = failures
            .iter()
            .take(FAILURES_SHOWN_ON_FAILURE)
            .map(|f| format!("• {}: {}", f.font_name, f.status.tag()))
            .collect();
        if failures.len() > FAILURES_SHOWN_ON_FAILURE {
            details.push(format!(
                "• ... and {} more failures",
                failures.len() - FAILURES_SHOWN_ON_FAILURE
            ));
        }

        let mut body = format!(
            "No fonts were successfully installed.\n\nFailure details:\n{}\n\n\
             Try running as Administrator for system-wide installation.",
            details.join("\n")
        );
        self.append_archive_errors(&mut body);

        SummaryMessage {
            level: MessageLevel::Error,
            title: "Installation Failed".to_string(),
            body,
        }
    }

    fn append_archive_errors(&self, body: &mut String) {
        if self.archive_errors.is_empty() {
            return;
        }
        body.push_str("\n\nArchives that could not be read:");
        for failure in &self.archive_errors {
            body.push_str(&format!("\n   • {}", failure.reason));
        }
    }
}

// ============================================
// TESTS
// ============================================
