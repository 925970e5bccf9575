//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | CLI usage error (bad args, missing config file)      |
//! | 3    | Invalid config (parse, validation, bad pattern)      |
//! | 4    | Runtime error (unreadable CSV, missing column, I/O)  |
//! | 5    | Quarantined rows present with `--fail-on-quarantine` |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing config file.
pub const EXIT_USAGE: u8 = 2;

/// Config failed to parse, validate, or compile into rule tables.
pub const EXIT_CATALOG_INVALID_CONFIG: u8 = 3;

/// Input data could not be loaded or output could not be written.
pub const EXIT_CATALOG_RUNTIME: u8 = 4;

/// The run completed but some rows were quarantined, and the caller asked
/// for that to fail the command.
pub const EXIT_CATALOG_QUARANTINE: u8 = 5;
