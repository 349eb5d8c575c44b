//! Pure formatting functions for console output.
//!
//! Functions here only print; the run log decides what gets printed.

use console::style;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Format and print a warning with a yellow marker.
pub fn display_warning(message: &str) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), message);
}

/// Print a line without decoration, dimmed (command echo, debug output).
pub fn display_detail(message: &str) {
    println!("  {}", style(message).dim());
}

/// Instructions printed after the settings file is first created.
pub fn display_setup_instructions(settings: &str) {
    println!();
    println!("{} Configuration file created: {}", style("[!]").yellow(), settings);
    println!(
        "{} Edit the file and set 'project_name' to the project folder name, then run again.",
        style("[!]").yellow()
    );
    println!();
}

/// Summary of a finished release.
pub fn display_release_summary(mode: &str, tag: &str, branch: &str, tagged: bool) {
    println!("\n{}", style(format!("{} {} completed", mode, tag)).bold());
    println!("  Release branch: {}", style(branch).green());
    if tagged {
        println!("  Tag:            {}", style(tag).green());
    } else {
        println!("  Tag:            {}", style("not pushed").red());
    }
}
