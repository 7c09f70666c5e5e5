//! Pure delivery evaluator.
//!
//! `evaluate` maps a command plus the current time to a verdict without
//! side effects; it is safe to call any number of times. The transition
//! engine in `relay-store` is solely responsible for materializing a
//! verdict, exactly once per command, inside its per-command critical
//! section.

use crate::command::{Command, CommandStatus};
use crate::identity::Timestamp;

/// Verdict of the delivery evaluator for a single command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryVerdict {
    /// Queued and within its TTL: deliver to the owning agent.
    Deliver,
    /// Queued but aged past its TTL: expire, never deliver.
    Expire,
    /// No longer queued; the delivery decision was already made.
    Settled,
}

/// Evaluate a command's effective delivery decision at `now`.
///
/// Expiry requires age *strictly greater* than the TTL: a command polled
/// at exactly `created_at + ttl` is still delivered.
pub fn evaluate(command: &Command, now: Timestamp) -> DeliveryVerdict {
    if command.status != CommandStatus::Queued {
        return DeliveryVerdict::Settled;
    }
    if now - command.created_at > chrono::Duration::seconds(command.ttl_secs) {
        DeliveryVerdict::Expire
    } else {
        DeliveryVerdict::Deliver
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandType;
    use crate::identity::new_entity_id;
    use chrono::{Duration, TimeZone, Utc};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn queued(ttl_secs: i64) -> Command {
        Command::new(new_entity_id(), CommandType::Status, None, ttl_secs, t0())
    }

    #[test]
    fn test_fresh_command_delivers() {
        let cmd = queued(30);
        assert_eq!(
            evaluate(&cmd, t0() + Duration::seconds(1)),
            DeliveryVerdict::Deliver
        );
    }

    #[test]
    fn test_stale_command_expires() {
        let cmd = queued(1);
        assert_eq!(
            evaluate(&cmd, t0() + Duration::seconds(2)),
            DeliveryVerdict::Expire
        );
    }

    #[test]
    fn test_boundary_age_still_delivers() {
        let cmd = queued(30);
        assert_eq!(
            evaluate(&cmd, t0() + Duration::seconds(30)),
            DeliveryVerdict::Deliver
        );
        assert_eq!(
            evaluate(&cmd, t0() + Duration::milliseconds(30_001)),
            DeliveryVerdict::Expire
        );
    }

    #[test]
    fn test_settled_statuses_are_never_reevaluated() {
        for status in [
            CommandStatus::InProgress,
            CommandStatus::Acked,
            CommandStatus::Expired,
        ] {
            let mut cmd = queued(1);
            cmd.status = status;
            assert_eq!(
                evaluate(&cmd, t0() + Duration::seconds(100)),
                DeliveryVerdict::Settled
            );
        }
    }

    #[test]
    fn test_evaluate_is_side_effect_free() {
        let cmd = queued(1);
        let now = t0() + Duration::seconds(5);
        let before = cmd.clone();
        let first = evaluate(&cmd, now);
        let second = evaluate(&cmd, now);
        assert_eq!(first, second);
        assert_eq!(cmd, before);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// The verdict for a queued command depends only on whether its
            /// age exceeds the TTL.
            #[test]
            fn prop_verdict_matches_age(ttl in 0i64..86_400, age_ms in 0i64..172_800_000) {
                let cmd = queued(ttl);
                let now = t0() + Duration::milliseconds(age_ms);
                let verdict = evaluate(&cmd, now);
                if age_ms > ttl * 1000 {
                    prop_assert_eq!(verdict, DeliveryVerdict::Expire);
                } else {
                    prop_assert_eq!(verdict, DeliveryVerdict::Deliver);
                }
            }

            /// Non-queued commands are settled regardless of age.
            #[test]
            fn prop_settled_is_sticky(age_ms in 0i64..172_800_000) {
                let mut cmd = queued(1);
                cmd.status = CommandStatus::Expired;
                let now = t0() + Duration::milliseconds(age_ms);
                prop_assert_eq!(evaluate(&cmd, now), DeliveryVerdict::Settled);
            }
        }
    }
}
