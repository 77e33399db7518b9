//! Notification collaborator.

use crate::BadgeUnlocked;

/// Receives badge unlocks once the state that produced them is saved.
///
/// Implementations must not block on user acknowledgment.
pub trait Notifier {
    fn badge_unlocked(&mut self, event: BadgeUnlocked);
}

/// Logs unlocks through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn badge_unlocked(&mut self, event: BadgeUnlocked) {
        tracing::info!(threshold = event.threshold(), "badge unlocked: {}", event.0);
    }
}
