mod exports;
mod progress;
mod styling;
mod summary;
mod tables;

pub use exports::export_report;
pub use progress::PhaseProgress;
pub use summary::print_summary;

use styling::{brand, muted};

/// Prints the `JobLens` banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        brand("🔎 JobLens"),
        muted(env!("CARGO_PKG_VERSION")),
        muted("Jenkins Job & Parameter Audit Tool")
    );
}
