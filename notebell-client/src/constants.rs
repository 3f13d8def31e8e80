//! Default values for the notebell client.

// ============================================================================
// REMOTE STORE
// ============================================================================

/// Base address of the note store when none is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Upper bound for a single store request, in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

// ============================================================================
// REMINDERS
// ============================================================================

/// How often the reminder scheduler scans the collection, in milliseconds.
pub const DEFAULT_SCAN_INTERVAL_MS: u64 = 30_000;

pub const DEFAULT_REMINDER_TITLE: &str = "⏰ Reminder";

/// Notification body used when a note's title is blank.
pub const DEFAULT_REMINDER_FALLBACK_BODY: &str = "Note";

// ============================================================================
// LOCAL STATE
// ============================================================================

pub const DEFAULT_PREFERENCES_PATH: &str = "notebell-preferences.json";

pub const DEFAULT_LOG_FILTER: &str = "notebell=info,notebell_client=info,notebell_core=info";

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "NOTEBELL_CONFIG";
