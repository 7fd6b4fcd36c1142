//! Property-based tests for core types

use fuzzwatch_core::{elapsed_since, Clock, ManualClock, Theme};
use proptest::prelude::*;
use std::time::Duration;

proptest! {
    /// Elapsed time never goes negative, whichever order the instants are in.
    #[test]
    fn prop_elapsed_since_saturates(offset_ms in -100_000i64..100_000) {
        let then = chrono::Utc::now();
        let now = then + chrono::Duration::milliseconds(offset_ms);
        let elapsed = elapsed_since(now, then);
        if offset_ms <= 0 {
            prop_assert_eq!(elapsed, Duration::ZERO);
        } else {
            prop_assert_eq!(elapsed, Duration::from_millis(offset_ms as u64));
        }
    }

    /// A manual clock only moves when told to, by exactly the amount given.
    #[test]
    fn prop_manual_clock_advances_exactly(steps in prop::collection::vec(0u64..10_000, 0..20)) {
        let clock = ManualClock::starting_now();
        let start = clock.now();
        let mut total = 0u64;
        for step in &steps {
            clock.advance(Duration::from_millis(*step));
            total += step;
        }
        prop_assert_eq!(elapsed_since(clock.now(), start), Duration::from_millis(total));
    }

    /// Any casing of a theme name parses back to the same theme.
    #[test]
    fn prop_theme_parse_ignores_case(index in 0usize..3, upper in any::<bool>()) {
        let theme = Theme::all()[index];
        let text = if upper {
            theme.as_str().to_ascii_uppercase()
        } else {
            theme.to_string()
        };
        prop_assert_eq!(text.parse::<Theme>(), Ok(theme));
    }
}
