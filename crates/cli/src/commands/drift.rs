//! `fieldstate drift` — Preview the hourly drift of an identity.

use super::load_config;
use chrono::{DateTime, Duration, DurationRound, Utc};
use fieldstate_core::Resonance;
use fieldstate_engine::drift::{self, drift_for};

/// Longest preview accepted on the command line: one leap year of hours.
pub const MAX_HOURS: u32 = 24 * 366;

/// One previewed hour.
struct Row {
    at: DateTime<Utc>,
    delta: i64,
    value: Resonance,
}

pub async fn run(id: &str, hours: u32, from: Option<u8>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let start = from.unwrap_or(config.resonance.base);
    if !(Resonance::MIN..=Resonance::MAX).contains(&start) {
        return Err(format!(
            "Starting resonance must be between {} and {}",
            Resonance::MIN,
            Resonance::MAX
        )
        .into());
    }
    let start = Resonance::clamped(start as i64);
    let hour_start = Utc::now().duration_trunc(Duration::hours(1))?;

    println!("Drift preview for {id}, starting at {start}");
    println!();
    println!("  {:<18} {:>8} {:>6} {:>10}", "HOUR (UTC)", "BUCKET", "DELTA", "RESONANCE");
    for row in preview(id, hour_start, start, hours) {
        println!(
            "  {:<18} {:>8} {:>+6} {:>10}",
            row.at.format("%Y-%m-%d %H:00"),
            drift::hour_bucket(row.at),
            row.delta,
            row.value.value()
        );
    }
    Ok(())
}

/// Running drift from `hour_start` for up to `hours` hours. Stops early at
/// the end of the representable time range.
fn preview(id: &str, hour_start: DateTime<Utc>, start: Resonance, hours: u32) -> Vec<Row> {
    let mut value = start;
    let mut rows = Vec::new();
    for k in 0..i64::from(hours) {
        let Some(at) = hour_start.checked_add_signed(Duration::hours(k)) else {
            break;
        };
        let delta = drift_for(id, at).value();
        value = value.adjusted(delta);
        rows.push(Row { at, delta, value });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "K44-R∞-A0B-K725-iX";

    fn epoch() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_767_225_600_000).unwrap()
    }

    #[test]
    fn preview_runs_the_drift_forward() {
        let rows = preview(ID, epoch(), Resonance::clamped(62), 3);
        assert_eq!(rows.len(), 3);

        let mut expected = Resonance::clamped(62);
        for (k, row) in rows.iter().enumerate() {
            assert_eq!(row.at, epoch() + Duration::hours(k as i64));
            expected = expected.adjusted(drift_for(ID, row.at).value());
            assert_eq!(row.value, expected);
        }
    }

    #[test]
    fn preview_stops_at_the_end_of_time() {
        let max = DateTime::<Utc>::MAX_UTC.timestamp();
        let last_hour = DateTime::from_timestamp(max - max.rem_euclid(3600), 0).unwrap();
        let start = last_hour - Duration::hours(2);

        let rows = preview(ID, start, Resonance::clamped(62), MAX_HOURS);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows.last().unwrap().at, last_hour);
    }
}
