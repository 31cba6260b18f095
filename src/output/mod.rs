//! Output module for console output and progress.
//!
//! Provides:
//! - Colored console output
//! - Progress bars
//! - Outcome reporting

pub mod console;
pub mod progress;
pub mod report;

pub use console::{
    print_banner, print_config_summary, print_error, print_info, print_success, print_warning,
};
pub use progress::create_segment_bar;
pub use report::{print_batch_summary, print_outcomes, write_json_report};
