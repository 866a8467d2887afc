// ABOUTME: Configuration and constants for the interpreter
// This module contains version info, welcome messages, and CLI exit codes

#[allow(dead_code)]
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const WELCOME_MESSAGE: &str = "gkg interpreter";
pub const WELCOME_SUBTITLE: &str =
    "A tree-walking interpreter for a small class-based scripting language";

/// Source files must carry this extension; the CLI refuses anything else.
pub const SOURCE_EXTENSION: &str = "gkg";

// ============================================================================
// Exit codes (the sysexits.h convention the spec borrows from)
// ============================================================================

pub const EXIT_OK: i32 = 0;
pub const EXIT_USAGE: i32 = 64;
pub const EXIT_DATA_ERROR: i32 = 65;
pub const EXIT_IO_ERROR: i32 = 74;

pub const HISTORY_FILE: &str = ".gkg_history";

/// The REPL's exit command.
pub const REPL_EXIT_COMMAND: &str = "exit";
