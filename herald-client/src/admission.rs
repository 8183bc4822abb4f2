//! Priority-tiered admission into the message arena.
//!
//! Low priority traffic is throttled first so that high priority messages
//! keep headroom while the broker is slow or unreachable.

/// Priority class of a published message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

/// Whether a message of `priority` may take a slot when `in_use` of
/// `capacity` slots are taken.
///
/// Low is admitted below 70% utilisation, medium below 85%, high up to
/// the full capacity.
pub fn admits(capacity: usize, in_use: usize, priority: Priority) -> bool {
    let limit = match priority {
        Priority::Low => capacity * 70 / 100,
        Priority::Medium => capacity * 85 / 100,
        Priority::High => capacity,
    };
    in_use < limit
}
