// ============================================
// FontFlow - build.rs
// ============================================
// This file runs BEFORE the main program is compiled.
// It compiles the Slint UI file (.slint) into Rust code.
//
// The GUI only exists on Windows, so on other targets there is
// nothing to compile and this script does nothing.
// ============================================

fn main() {
    println!("cargo:rerun-if-changed=src/ui/main.slint");

    // CARGO_CFG_TARGET_OS is the OS we are building FOR (not the build host)
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os != "windows" {
        return;
    }

    // Compile the main Slint UI file
    // This converts src/ui/main.slint into Rust code that app.rs includes
    if let Err(e) = slint_build::compile("src/ui/main.slint") {
        eprintln!("============================================");
        eprintln!("ERROR: Failed to compile Slint UI");
        eprintln!("============================================");
        eprintln!("{}", e);
        eprintln!();
        eprintln!("Make sure src/ui/main.slint exists and has valid syntax.");
        eprintln!("============================================");

        // Exit with error code so the build fails
        std::process::exit(1);
    }
}
