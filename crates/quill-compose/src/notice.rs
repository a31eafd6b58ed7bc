//! Transient user-facing messages and the upload indicator.

use serde::Serialize;

pub const UPLOADING_IMAGE: &str = "Uploading image";
pub const UPLOAD_FAILED: &str = "Couldn't upload image";

/// Message shown when a picked or dropped file is refused.
pub fn invalid_image_message(max_size_human: &str) -> String {
    format!(
        "This file is invalid. Only image files with maximum size of {} are supported",
        max_size_human
    )
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Where notices and upload indicator changes go.
pub trait Notifier {
    fn notify(&mut self, notice: Notice);

    /// The uploading indicator turned on or off.
    fn uploading_changed(&mut self, _uploading: bool) {}
}

impl<T: Notifier> Notifier for &mut T {
    fn notify(&mut self, notice: Notice) {
        (**self).notify(notice)
    }

    fn uploading_changed(&mut self, uploading: bool) {
        (**self).uploading_changed(uploading)
    }
}

/// Emits notices as tracing events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&mut self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => tracing::info!("{}", notice.message),
            NoticeLevel::Error => tracing::error!("{}", notice.message),
        }
    }

    fn uploading_changed(&mut self, uploading: bool) {
        tracing::debug!(uploading, "upload indicator");
    }
}

/// Something a [`NoticeLog`] saw, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NoticeEvent {
    Notice(Notice),
    Uploading(bool),
}

/// Records everything it is told.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NoticeLog {
    pub events: Vec<NoticeEvent>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.events.iter().filter_map(|e| match e {
            NoticeEvent::Notice(n) => Some(n),
            NoticeEvent::Uploading(_) => None,
        })
    }

    pub fn messages(&self, level: NoticeLevel) -> Vec<&str> {
        self.notices()
            .filter(|n| n.level == level)
            .map(|n| n.message.as_str())
            .collect()
    }

    pub fn uploading_transitions(&self) -> Vec<bool> {
        self.events
            .iter()
            .filter_map(|e| match e {
                NoticeEvent::Uploading(u) => Some(*u),
                NoticeEvent::Notice(_) => None,
            })
            .collect()
    }
}

impl Notifier for NoticeLog {
    fn notify(&mut self, notice: Notice) {
        self.events.push(NoticeEvent::Notice(notice));
    }

    fn uploading_changed(&mut self, uploading: bool) {
        self.events.push(NoticeEvent::Uploading(uploading));
    }
}
