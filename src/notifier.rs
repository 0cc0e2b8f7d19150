use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
	Info,
	Warning,
}

/// A message meant for the person running the export rather than for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
	pub level:   Level,
	pub title:   String,
	pub message: String,
}

impl Notification {
	pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
		Self { level: Level::Info, title: title.into(), message: message.into() }
	}

	pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
		Self { level: Level::Warning, title: title.into(), message: message.into() }
	}
}

pub trait Notifier {
	fn notify(&self, notification: &Notification);
}

/// Delivers notifications through the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
	fn notify(&self, notification: &Notification) {
		match notification.level {
			Level::Info => info!(title = %notification.title, "{}", notification.message),
			Level::Warning => warn!(title = %notification.title, "{}", notification.message),
		}
	}
}
