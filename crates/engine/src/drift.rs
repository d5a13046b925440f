//! Deterministic hourly drift and catch-up replay.
//!
//! Each (identity, hour) pair maps to a fixed delta:
//!
//! ```text
//! seed  = identity ++ floor(epoch_ms / 3_600_000)
//! hash  = fold(0i32, |h, unit| h * 31 + unit)   over UTF-16 code units, wrapping
//! n     = |hash| mod 10
//! delta = [0,2) → -1   [2,5) → 0   [5,8) → +1   [8,10) → +2
//! ```
//!
//! The hash is not a security primitive. It must stay bit-for-bit stable:
//! a client that replays the same hours twice has to land on the same value.

use chrono::{DateTime, Duration, Utc};
use fieldstate_config::DriftConfig;
use fieldstate_core::Resonance;
use serde::{Deserialize, Serialize};

/// Length of one drift bucket in milliseconds.
pub const HOUR_MS: i64 = 3_600_000;

/// The adjustment one hour applies to resonance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftDelta {
    /// -1 (20% of hours)
    Regress,
    /// 0 (30%)
    Hold,
    /// +1 (30%)
    Rise,
    /// +2 (20%)
    Surge,
}

impl DriftDelta {
    fn from_residue(n: u32) -> Self {
        match n {
            0..=1 => Self::Regress,
            2..=4 => Self::Hold,
            5..=7 => Self::Rise,
            _ => Self::Surge,
        }
    }

    pub fn value(self) -> i64 {
        match self {
            Self::Regress => -1,
            Self::Hold => 0,
            Self::Rise => 1,
            Self::Surge => 2,
        }
    }
}

/// Index of the hour containing `at` (floor division, also before 1970).
pub fn hour_bucket(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis().div_euclid(HOUR_MS)
}

/// 32-bit multiply-accumulate hash over the seed's UTF-16 code units.
pub fn seed_hash(seed: &str) -> i32 {
    seed.encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(unit as i32))
}

/// The delta for `identity` during the hour containing `at`. Pure.
pub fn drift_for(identity: &str, at: DateTime<Utc>) -> DriftDelta {
    let seed = format!("{identity}{}", hour_bucket(at));
    let residue = seed_hash(&seed).unsigned_abs() % 10;
    DriftDelta::from_residue(residue)
}

/// Outcome of one catch-up pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replay {
    /// Value before the first replayed hour.
    pub start: Resonance,
    pub value: Resonance,
    /// Whole hours between the last applied drift and now.
    pub hours_elapsed: u64,
    /// Hours actually applied (at most the catch-up cap).
    pub hours_applied: u32,
    /// New "last drift applied" instant. Whole hours only, so a partial
    /// hour carries over to the next pass.
    pub applied_through: DateTime<Utc>,
}

/// Replays missed hours with a bounded lookback.
#[derive(Debug, Clone, Copy)]
pub struct DriftEngine {
    max_catchup_hours: u32,
}

impl DriftEngine {
    pub fn new(max_catchup_hours: u32) -> Self {
        Self { max_catchup_hours }
    }

    pub fn from_config(config: &DriftConfig) -> Self {
        Self::new(config.max_catchup_hours)
    }

    pub fn max_catchup_hours(&self) -> u32 {
        self.max_catchup_hours
    }

    /// Apply every whole hour elapsed since `last_applied`, oldest first,
    /// clamping after each hour.
    ///
    /// Only the most recent `max_catchup_hours` hours are applied; older
    /// ones are dropped. A `last_applied` in the future counts as zero
    /// elapsed hours and leaves it untouched.
    pub fn replay(
        &self,
        identity: &str,
        start: Resonance,
        last_applied: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Replay {
        let elapsed_ms = (now - last_applied).num_milliseconds();
        let hours_elapsed = elapsed_ms.div_euclid(HOUR_MS).max(0);

        if hours_elapsed == 0 {
            return Replay {
                start,
                value: start,
                hours_elapsed: 0,
                hours_applied: 0,
                applied_through: last_applied,
            };
        }

        let hours_applied = hours_elapsed.min(self.max_catchup_hours as i64);
        let first = hours_elapsed - hours_applied + 1;

        let value = (first..=hours_elapsed).fold(start, |value, k| {
            let hour = last_applied + Duration::milliseconds(k * HOUR_MS);
            value.adjusted(drift_for(identity, hour).value())
        });

        Replay {
            start,
            value,
            hours_elapsed: hours_elapsed as u64,
            hours_applied: hours_applied as u32,
            applied_through: last_applied + Duration::milliseconds(hours_elapsed * HOUR_MS),
        }
    }
}

impl Default for DriftEngine {
    fn default() -> Self {
        Self::from_config(&DriftConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "K44-R∞-A0B-K725-iX";

    /// 2026-01-01T00:00:00Z, an exact hour boundary (bucket 490896).
    fn epoch() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_767_225_600_000).unwrap()
    }

    fn hours(n: i64) -> Duration {
        Duration::hours(n)
    }

    #[test]
    fn hash_matches_reference_values() {
        assert_eq!(seed_hash(""), 0);
        assert_eq!(seed_hash("a"), 97);
        assert_eq!(seed_hash("ab"), 3105);
        assert_eq!(seed_hash(&format!("{ID}490896")), -168_407_234);
        assert_eq!(seed_hash(&format!("{ID}490900")), -168_406_558);
    }

    #[test]
    fn bucket_uses_floor_division() {
        assert_eq!(hour_bucket(epoch()), 490_896);
        assert_eq!(hour_bucket(epoch() + Duration::minutes(59)), 490_896);
        assert_eq!(hour_bucket(epoch() + hours(1)), 490_897);

        let before_epoch = DateTime::from_timestamp_millis(-1).unwrap();
        assert_eq!(hour_bucket(before_epoch), -1);
    }

    #[test]
    fn deltas_match_reference_sequence() {
        let expected = [0, 0, 0, -1, 2, 1];
        for (k, want) in expected.iter().enumerate() {
            let got = drift_for(ID, epoch() + hours(k as i64)).value();
            assert_eq!(got, *want, "hour {k}");
        }
    }

    #[test]
    fn drift_is_pure() {
        for k in 0..200 {
            let at = epoch() + Duration::minutes(k * 17);
            assert_eq!(drift_for(ID, at), drift_for(ID, at));
        }
    }

    #[test]
    fn drift_is_constant_within_an_hour() {
        let at = epoch() + hours(4);
        assert_eq!(drift_for(ID, at), drift_for(ID, at + Duration::minutes(59)));
    }

    #[test]
    fn residue_ranges_map_to_deltas() {
        let values: Vec<i64> = (0..10).map(|n| DriftDelta::from_residue(n).value()).collect();
        assert_eq!(values, vec![-1, -1, 0, 0, 0, 1, 1, 1, 2, 2]);
    }

    #[test]
    fn distribution_is_roughly_stationary() {
        let mut counts = [0usize; 4];
        for k in 0..10_000 {
            let idx = (drift_for(ID, epoch() + hours(k)).value() + 1) as usize;
            counts[idx] += 1;
        }
        // 20% / 30% / 30% / 20%
        assert!((1_800..=2_200).contains(&counts[0]));
        assert!((2_800..=3_200).contains(&counts[1]));
        assert!((2_800..=3_200).contains(&counts[2]));
        assert!((1_800..=2_200).contains(&counts[3]));
    }

    #[test]
    fn replay_of_three_hours() {
        let engine = DriftEngine::new(48);
        let replay = engine.replay(ID, Resonance::clamped(12), epoch(), epoch() + hours(3));

        // hours 490897..=490899 → 0, 0, -1
        assert_eq!(replay.value.value(), 11);
        assert_eq!(replay.hours_elapsed, 3);
        assert_eq!(replay.hours_applied, 3);
        assert_eq!(replay.applied_through, epoch() + hours(3));
    }

    #[test]
    fn replay_equals_sequential_clamped_application() {
        let engine = DriftEngine::new(48);
        let start = Resonance::clamped(50);
        let replay = engine.replay(ID, start, epoch(), epoch() + hours(30));

        let mut expected = start;
        for k in 1..=30 {
            expected = expected.adjusted(drift_for(ID, epoch() + hours(k)).value());
        }
        assert_eq!(replay.value, expected);
    }

    #[test]
    fn clamp_applies_per_hour_not_at_the_end() {
        let engine = DriftEngine::new(48);
        // deltas 0, 0, -1, +2 starting at the floor
        let replay = engine.replay(ID, Resonance::clamped(1), epoch(), epoch() + hours(4));
        assert_eq!(replay.value.value(), 3);

        let unclamped_sum: i64 = (1..=4)
            .map(|k| drift_for(ID, epoch() + hours(k)).value())
            .sum();
        assert_eq!(Resonance::clamped(1 + unclamped_sum).value(), 2);
    }

    #[test]
    fn partial_hours_carry_over() {
        let engine = DriftEngine::new(48);
        let now = epoch() + hours(2) + Duration::minutes(45);
        let replay = engine.replay(ID, Resonance::clamped(20), epoch(), now);
        assert_eq!(replay.hours_elapsed, 2);
        assert_eq!(replay.applied_through, epoch() + hours(2));
    }

    #[test]
    fn less_than_an_hour_is_a_no_op() {
        let engine = DriftEngine::new(48);
        let start = Resonance::clamped(20);
        let replay = engine.replay(ID, start, epoch(), epoch() + Duration::minutes(59));
        assert_eq!(replay.value, start);
        assert_eq!(replay.hours_applied, 0);
        assert_eq!(replay.applied_through, epoch());
    }

    #[test]
    fn future_last_applied_is_a_no_op() {
        let engine = DriftEngine::new(48);
        let start = Resonance::clamped(20);
        let replay = engine.replay(ID, start, epoch() + hours(5), epoch());
        assert_eq!(replay.value, start);
        assert_eq!(replay.hours_elapsed, 0);
        assert_eq!(replay.applied_through, epoch() + hours(5));
    }

    #[test]
    fn catch_up_is_capped() {
        let engine = DriftEngine::new(48);
        let start = Resonance::clamped(40);
        let replay = engine.replay(ID, start, epoch(), epoch() + hours(500));

        assert_eq!(replay.hours_elapsed, 500);
        assert_eq!(replay.hours_applied, 48);
        assert_eq!(replay.applied_through, epoch() + hours(500));

        // Only the most recent 48 hours count
        let mut expected = start;
        for k in 453..=500 {
            expected = expected.adjusted(drift_for(ID, epoch() + hours(k)).value());
        }
        assert_eq!(replay.value, expected);
    }

    #[test]
    fn resonance_stays_in_bounds_for_long_absences() {
        let engine = DriftEngine::new(48);
        for start in [1, 50, 98] {
            for elapsed in [0, 1, 47, 48, 49, 1_000, 10_000] {
                let replay = engine.replay(
                    ID,
                    Resonance::clamped(start),
                    epoch(),
                    epoch() + hours(elapsed),
                );
                let v = replay.value.value();
                assert!((1..=98).contains(&v), "start {start} elapsed {elapsed}: {v}");
                assert!(replay.hours_applied <= 48);
            }
        }
    }

    #[test]
    fn uncapped_engine_replays_everything() {
        let engine = DriftEngine::new(u32::MAX);
        let replay = engine.replay(ID, Resonance::clamped(40), epoch(), epoch() + hours(200));
        assert_eq!(replay.hours_applied, 200);
    }
}
