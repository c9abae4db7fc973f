//! Fixture links and synthetic history for the test modes.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::Rng;

/// Links replayed by `/test` in manual test mode.
pub const FIXTURE_URLS: &[&str] = &[
    "https://vk.com/music/playlist/-147845620_2949",
    "https://vk.com/music/playlist/264577489_28",
    "https://vk.com/music/album/-2000600197_20600197_805b14b56dae3b32e9",
    "https://vk.com/music/album/-2000113136_7113136_2a00a34a604257e4fe",
];

pub const SYNTHETIC_SAMPLES: usize = 25;
pub const SYNTHETIC_STEP_DAYS: i64 = 5;

/// First synthetic sample, 22 Oct 2024 at midnight.
pub fn synthetic_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 10, 22)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// `count` samples `step_days` apart from `start`, with random play counts
/// between 1,000 and 10,000.
pub fn synthetic_samples<R: Rng>(
    rng: &mut R,
    start: NaiveDateTime,
    count: usize,
    step_days: i64,
) -> Vec<(String, NaiveDateTime)> {
    (0..count)
        .map(|i| {
            let at = start + Duration::days(step_days * i as i64);
            (rng.gen_range(1000..=10000u64).to_string(), at)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::is_valid_album_url;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_fixture_urls_are_valid() {
        for url in FIXTURE_URLS {
            assert!(is_valid_album_url(url), "{url}");
        }
    }

    #[test]
    fn test_synthetic_samples() {
        let mut rng = StdRng::seed_from_u64(7);
        let samples = synthetic_samples(&mut rng, synthetic_start(), SYNTHETIC_SAMPLES, SYNTHETIC_STEP_DAYS);

        assert_eq!(samples.len(), 25);
        assert_eq!(samples[0].1, synthetic_start());
        assert_eq!(samples[24].1 - samples[0].1, Duration::days(120));
        for (plays, _) in &samples {
            let plays: u64 = plays.parse().unwrap();
            assert!((1000..=10000).contains(&plays));
        }
    }
}
