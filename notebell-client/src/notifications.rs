//! Local notification delivery.

use crate::config::{ChannelKind, NotificationConfig};
use notebell_core::NoteId;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Whether the user allowed local notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Not asked yet.
    Default,
    Granted,
    Denied,
}

impl Permission {
    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderNotification {
    pub note_id: NoteId,
    pub title: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Notification permission not granted")]
    PermissionDenied,
    #[error("Failed to launch notifier: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Delivery failed: {0}")]
    Failed(String),
}

/// A sink for reminder notifications.
///
/// Delivery is fire-and-forget: `deliver` returns once the notification has
/// been handed off, without waiting for the user to see it.
pub trait NotificationChannel: Send + Sync {
    fn permission(&self) -> Permission;

    /// Ask for permission. Returns the resulting state.
    fn request_permission(&self) -> Permission;

    fn deliver(&self, notification: &ReminderNotification) -> Result<(), DeliveryError>;
}

/// Writes reminders to the log.
#[derive(Debug, Default)]
pub struct LogChannel {
    granted: AtomicBool,
}

impl LogChannel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NotificationChannel for LogChannel {
    fn permission(&self) -> Permission {
        if self.granted.load(Ordering::Acquire) {
            Permission::Granted
        } else {
            Permission::Default
        }
    }

    fn request_permission(&self) -> Permission {
        self.granted.store(true, Ordering::Release);
        Permission::Granted
    }

    fn deliver(&self, notification: &ReminderNotification) -> Result<(), DeliveryError> {
        if !self.permission().is_granted() {
            return Err(DeliveryError::PermissionDenied);
        }
        tracing::info!(
            target: "notebell::reminder",
            note_id = %notification.note_id,
            title = %notification.title,
            body = %notification.body,
            "Reminder"
        );
        Ok(())
    }
}

/// Runs an external program (for example `notify-send`) per reminder, with
/// the title and body appended as the last two arguments.
#[derive(Debug)]
pub struct CommandChannel {
    program: String,
    args: Vec<String>,
    granted: AtomicBool,
}

impl CommandChannel {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            granted: AtomicBool::new(false),
        }
    }
}

impl NotificationChannel for CommandChannel {
    fn permission(&self) -> Permission {
        if self.granted.load(Ordering::Acquire) {
            Permission::Granted
        } else {
            Permission::Default
        }
    }

    fn request_permission(&self) -> Permission {
        if self.program.trim().is_empty() {
            return Permission::Denied;
        }
        self.granted.store(true, Ordering::Release);
        Permission::Granted
    }

    fn deliver(&self, notification: &ReminderNotification) -> Result<(), DeliveryError> {
        if !self.permission().is_granted() {
            return Err(DeliveryError::PermissionDenied);
        }
        // The child is not awaited; tokio reaps it once it exits.
        tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(&notification.title)
            .arg(&notification.body)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }
}

/// Permission is never granted; every scan is skipped.
#[derive(Debug, Default)]
pub struct DisabledChannel;

impl NotificationChannel for DisabledChannel {
    fn permission(&self) -> Permission {
        Permission::Denied
    }

    fn request_permission(&self) -> Permission {
        Permission::Denied
    }

    fn deliver(&self, _notification: &ReminderNotification) -> Result<(), DeliveryError> {
        Err(DeliveryError::PermissionDenied)
    }
}

pub fn channel_from_config(config: &NotificationConfig) -> Arc<dyn NotificationChannel> {
    match config.channel {
        ChannelKind::Log => Arc::new(LogChannel::new()),
        ChannelKind::Command => {
            let mut parts = config.command.iter().cloned();
            let program = parts.next().unwrap_or_default();
            Arc::new(CommandChannel::new(program, parts.collect()))
        }
        ChannelKind::Disabled => Arc::new(DisabledChannel),
    }
}
