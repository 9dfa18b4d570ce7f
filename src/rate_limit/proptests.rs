//! Property-Based Tests for Quota Windows
//!
//! Random sequences of checks, resets and clock advances against a tracker
//! driven by a manual clock.
//!
//! ```bash
//! cargo test --lib rate_limit::proptests
//! ```

use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use crate::rate_limit::clock::ManualClock;
use crate::rate_limit::quota::{Limit, SlidingWindow};

#[derive(Debug, Clone)]
enum Op {
    Check(u32),
    Advance(u64),
    Reset,
}

fn arb_op(capacity: u32) -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (0..=capacity.saturating_mul(2)).prop_map(Op::Check),
        3 => (0u64..20_000).prop_map(Op::Advance),
        1 => Just(Op::Reset),
    ]
}

fn arb_window_and_ops() -> impl Strategy<Value = (u32, u64, Vec<Op>)> {
    (1u32..1_000, 1u64..120).prop_flat_map(|(capacity, window_secs)| {
        (
            Just(capacity),
            Just(window_secs),
            prop::collection::vec(arb_op(capacity), 1..64),
        )
    })
}

proptest! {
    /// The allowance stays within [0, capacity] whatever happens
    #[test]
    fn prop_available_stays_in_bounds((capacity, window_secs, ops) in arb_window_and_ops()) {
        let clock = ManualClock::new();
        let window = SlidingWindow::with_clock(
            capacity,
            Duration::from_secs(window_secs),
            Arc::new(clock.clone()),
        ).unwrap();

        for op in ops {
            match op {
                Op::Check(needed) => { window.check(needed); }
                Op::Advance(millis) => clock.advance(Duration::from_millis(millis)),
                Op::Reset => window.reset(),
            }
            let available = window.available().unwrap();
            prop_assert!(available >= 0.0);
            prop_assert!(available <= f64::from(capacity));
        }
    }

    /// Requests larger than the capacity never pass and change nothing
    #[test]
    fn prop_over_capacity_rejected(
        (capacity, window_secs, ops) in arb_window_and_ops(),
        excess in 1u32..1_000,
    ) {
        let clock = ManualClock::new();
        let window = SlidingWindow::with_clock(
            capacity,
            Duration::from_secs(window_secs),
            Arc::new(clock.clone()),
        ).unwrap();

        for op in ops {
            match op {
                Op::Check(needed) => { window.check(needed); }
                Op::Advance(millis) => clock.advance(Duration::from_millis(millis)),
                Op::Reset => window.reset(),
            }
            let before = window.available();
            prop_assert!(!window.check(capacity + excess));
            prop_assert_eq!(window.available(), before);
        }
    }

    /// A granted check consumes exactly what was asked for
    #[test]
    fn prop_grant_consumes_needed(capacity in 1u32..1_000, needed in 0u32..1_000) {
        let clock = ManualClock::new();
        let window = SlidingWindow::with_clock(
            capacity,
            Duration::from_secs(60),
            Arc::new(clock),
        ).unwrap();

        let granted = window.check(needed);
        prop_assert_eq!(granted, needed <= capacity);
        let expected = if granted { capacity - needed } else { capacity };
        prop_assert_eq!(window.available(), Some(f64::from(expected)));
    }

    /// After a reset the whole capacity can be taken at once
    #[test]
    fn prop_reset_restores_full_capacity((capacity, window_secs, ops) in arb_window_and_ops()) {
        let clock = ManualClock::new();
        let window = SlidingWindow::with_clock(
            capacity,
            Duration::from_secs(window_secs),
            Arc::new(clock.clone()),
        ).unwrap();

        for op in ops {
            if let Op::Check(needed) = op {
                window.check(needed);
            }
        }
        window.reset();
        prop_assert!(window.check(capacity));
    }

    /// Unlimited trackers pass every request
    #[test]
    fn prop_unlimited_passes_everything(needed in any::<u32>(), window_secs in any::<u64>()) {
        let window = SlidingWindow::from_secs(0, window_secs).unwrap();
        prop_assert!(window.check(needed));
        prop_assert!(window.check(needed));
        prop_assert_eq!(window.available(), None);
    }
}
