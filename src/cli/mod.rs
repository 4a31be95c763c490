//! CLI Module
//!
//! Exit codes and outcome mapping for automation.

pub mod exit_codes;

pub use exit_codes::{code_for, exit_code_description, exit_code_for, ExitCodes};
