//! Regeneration sweep: heals blocks that were left alone.

use super::store::{DamageStore, HEAL_EPSILON, Visit};

/// What one regeneration sweep did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegenReport {
    pub visited: usize,
    /// Struck since the last sweep: flag cleared, damage untouched.
    pub graced: usize,
    pub decayed: usize,
    /// Healed below epsilon and removed.
    pub healed: usize,
}

/// Run one regeneration sweep over `store`.
///
/// A record struck since the previous sweep only has its touched flag
/// cleared, which gives it one full interval of grace. Every other record
/// loses `amount` damage and is removed once it drops below
/// [`HEAL_EPSILON`]. A negative `amount` is treated as zero.
pub fn regenerate(store: &DamageStore, amount: f32) -> RegenReport {
    let amount = amount.max(0.0);
    let mut report = RegenReport::default();

    report.visited = store.for_each_record_mut(|_, record| {
        if record.touched {
            record.touched = false;
            report.graced += 1;
            return Visit::Keep;
        }

        record.damage -= amount;
        if record.damage < HEAL_EPSILON {
            report.healed += 1;
            Visit::Remove
        } else {
            report.decayed += 1;
            Visit::Keep
        }
    });

    tracing::debug!(
        "Regeneration sweep: {} records, {} graced, {} decayed, {} healed",
        report.visited,
        report.graced,
        report.decayed,
        report.healed,
    );
    report
}
