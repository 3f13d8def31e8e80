//! notebell client library exports.

pub mod api_client;
pub mod app;
pub mod clock;
pub mod config;
pub mod constants;
pub mod edit_session;
pub mod error;
pub mod notifications;
pub mod persistence;
pub mod repository;
pub mod scheduler;
pub mod store;
pub mod telemetry;

pub use api_client::RestNoteRepository;
pub use app::NotesApp;
pub use clock::{Clock, SystemClock};
pub use config::ClientConfig;
pub use edit_session::{CommitOutcome, EditDraft, EditSession, EditSessionManager};
pub use error::ClientError;
pub use notifications::{NotificationChannel, Permission, ReminderNotification};
pub use repository::NoteRepository;
pub use scheduler::{ReminderScheduler, ScanReport, SchedulerConfig, SchedulerHandle, SharedLedger};
pub use store::SharedNoteStore;
