//! CLI Exit Code Registry
//!
//! Single source of truth for `plancheck` exit codes. Scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain     | Description                                   |
//! |---------|------------|-----------------------------------------------|
//! | 0       | Universal  | Success                                       |
//! | 1       | Universal  | General error (unspecified)                   |
//! | 2       | Universal  | CLI usage error (bad args, missing reference) |
//! | 3-9     | input      | Reading documents and workbooks               |
//! | 10-19   | schema     | Header detection and required columns         |
//! | 20-29   | embedding  | Embedding provider failures                   |
//! | 30-39   | config     | Config file parse/validation                  |
//! | 40-49   | result     | Comparison outcome and export                 |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Map it in `recon_exit_code` / `io_exit_code` if it comes from a library error

use plancheck_io::IoError;
use plancheck_recon::{EmbeddingError, ReconError};

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, no reference workbook configured.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Input (3-9)
// =============================================================================

/// Document or workbook could not be read (missing file, broken archive, bad XML/CSV).
pub const EXIT_INPUT_READ: u8 = 3;

/// Document type has no table reader (e.g. `.pdf`).
pub const EXIT_INPUT_UNSUPPORTED: u8 = 4;

/// No table in the submitted document is tagged with the requested subject.
pub const EXIT_INPUT_NO_TABLES: u8 = 5;

/// Reference workbook lacks the subject's catalog sheet.
pub const EXIT_INPUT_SHEET_MISSING: u8 = 6;

// =============================================================================
// Schema (10-19)
// =============================================================================

/// No header candidate and no fallback row in a table.
pub const EXIT_SCHEMA_DETECTION: u8 = 10;

/// A required canonical column (name_text) is absent after normalization.
pub const EXIT_SCHEMA_REQUIRED_FIELD: u8 = 11;

// =============================================================================
// Embedding (20-29)
// =============================================================================

/// Provider did not answer within `embedding.timeout_secs`.
pub const EXIT_EMBEDDING_TIMEOUT: u8 = 20;

/// Provider failed (transport, HTTP status, malformed or inconsistent vectors).
pub const EXIT_EMBEDDING_FAILED: u8 = 21;

/// Provider could not be set up (missing API key variable, bad endpoint).
pub const EXIT_EMBEDDING_SETUP: u8 = 22;

// =============================================================================
// Config (30-39)
// =============================================================================

/// Config file is not valid TOML or has unknown keys.
pub const EXIT_CONFIG_PARSE: u8 = 30;

/// Config parsed but failed validation (threshold range, alias target, ...).
pub const EXIT_CONFIG_INVALID: u8 = 31;

// =============================================================================
// Result (40-49)
// =============================================================================

/// `--fail-on-no-match` was given and at least one element had no match.
pub const EXIT_RESULT_NO_MATCH: u8 = 40;

/// Report could not be written to `--output`.
pub const EXIT_RESULT_EXPORT: u8 = 41;

// =============================================================================
// Library error mapping
// =============================================================================

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) => EXIT_CONFIG_PARSE,
        ReconError::ConfigValidation(_) => EXIT_CONFIG_INVALID,
        ReconError::SchemaDetection { .. } => EXIT_SCHEMA_DETECTION,
        ReconError::RequiredFieldMissing { .. } => EXIT_SCHEMA_REQUIRED_FIELD,
        ReconError::Embedding(e) => embedding_exit_code(e),
    }
}

pub fn embedding_exit_code(err: &EmbeddingError) -> u8 {
    match err {
        EmbeddingError::Timeout { .. } => EXIT_EMBEDDING_TIMEOUT,
        EmbeddingError::Setup(_) => EXIT_EMBEDDING_SETUP,
        _ => EXIT_EMBEDDING_FAILED,
    }
}

/// Map a document/export error to its exit code.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Unsupported { .. } => EXIT_INPUT_UNSUPPORTED,
        IoError::SheetMissing { .. } => EXIT_INPUT_SHEET_MISSING,
        IoError::Export(_) => EXIT_RESULT_EXPORT,
        IoError::Io { .. } | IoError::Archive(_) | IoError::Parse(_) | IoError::Workbook(_) => {
            EXIT_INPUT_READ
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn embedding_errors_split_by_kind() {
        let timeout = ReconError::Embedding(EmbeddingError::Timeout { after: Duration::from_secs(5) });
        assert_eq!(recon_exit_code(&timeout), EXIT_EMBEDDING_TIMEOUT);

        let http = ReconError::Embedding(EmbeddingError::Http { status: 500, body: String::new() });
        assert_eq!(recon_exit_code(&http), EXIT_EMBEDDING_FAILED);

        let setup = ReconError::Embedding(EmbeddingError::Setup("no key".into()));
        assert_eq!(recon_exit_code(&setup), EXIT_EMBEDDING_SETUP);
    }

    #[test]
    fn io_errors_map_to_input_range() {
        let err = IoError::Unsupported { path: "plan.pdf".into(), extension: "pdf".into() };
        assert_eq!(io_exit_code(&err), EXIT_INPUT_UNSUPPORTED);
        assert_eq!(io_exit_code(&IoError::Archive("bad zip".into())), EXIT_INPUT_READ);
        assert_eq!(io_exit_code(&IoError::Export("disk full".into())), EXIT_RESULT_EXPORT);
    }

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_INPUT_READ,
            EXIT_INPUT_UNSUPPORTED,
            EXIT_INPUT_NO_TABLES,
            EXIT_INPUT_SHEET_MISSING,
            EXIT_SCHEMA_DETECTION,
            EXIT_SCHEMA_REQUIRED_FIELD,
            EXIT_EMBEDDING_TIMEOUT,
            EXIT_EMBEDDING_FAILED,
            EXIT_EMBEDDING_SETUP,
            EXIT_CONFIG_PARSE,
            EXIT_CONFIG_INVALID,
            EXIT_RESULT_NO_MATCH,
            EXIT_RESULT_EXPORT,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }
}
