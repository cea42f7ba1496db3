//! Command: print version information.

/// Print the dotpilot version to stdout.
#[allow(clippy::print_stdout)]
pub fn run() {
    println!("dotpilot {}", crate::version());
}
