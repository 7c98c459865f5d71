//! Power curves: how a committed position turns into a power snapshot.
//!
//! Both lock models are implementations of one capability,
//! [`PowerCurve`]: given the position state before and after a transition,
//! produce the corresponding [`Point`]s and any slope-schedule side
//! effects. The checkpoint engine, query service, and delegation routing
//! are written once against this trait.

use soroban_sdk::contracttype;

/// Seconds in one scheduling week. Lock expiries snap down to multiples of
/// this boundary so every scheduled slope change lands on a shared
/// timestamp.
pub const WEEK: u64 = 7 * 86_400;

/// Longest allowed lock duration under the decay curve (four years).
pub const MAX_LOCK_DURATION: u64 = 4 * 365 * 86_400;

// ── Snapshot shapes ──────────────────────────────────────────────────────────

/// An immutable power snapshot recorded at a timestamp.
///
/// Under the decay curve, voting power at time `t >= ts` is
/// `max(0, bias - slope * (t - ts))` and `amount` carries the committed
/// value for non-decaying reward weighting. Under the flat curve `slope`
/// is always zero: `bias` is the literal voting power and `amount` the
/// literal reward power.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Point {
    pub bias: i128,
    pub slope: i128,
    pub ts: u64,
    pub amount: i128,
}

impl Point {
    pub fn zero(ts: u64) -> Self {
        Point {
            bias: 0,
            slope: 0,
            ts,
            amount: 0,
        }
    }

    /// Evaluate the linear voting-power function at `at`, clamped at zero.
    pub fn voting_at(&self, at: u64) -> i128 {
        let dt = at.saturating_sub(self.ts) as i128;
        self.bias
            .saturating_sub(self.slope.saturating_mul(dt))
            .max(0)
    }
}

/// The position image a transition feeds to the engine.
///
/// `end` is the expiry timestamp under the decay curve, and the
/// exit-request timestamp (zero while active) under the flat curve.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LockState {
    pub amount: i128,
    pub end: u64,
}

impl LockState {
    pub fn empty() -> Self {
        LockState { amount: 0, end: 0 }
    }
}

/// A pending adjustment to the global slope schedule: at timestamp `at`,
/// change the aggregate decay rate by `delta`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SlopeAdjustment {
    pub at: u64,
    pub delta: i128,
}

// ── The capability ───────────────────────────────────────────────────────────

pub trait PowerCurve {
    /// Snapshot the power a position state is worth at `now`.
    fn point_at(state: &LockState, now: u64) -> Point;

    /// Schedule side effects of an `old -> new` transition. At most two
    /// adjustments: one re-balancing the old expiry, one registering the
    /// new. Adjustments at non-future timestamps are dropped by the
    /// engine.
    fn schedule_updates(
        old: &LockState,
        new: &LockState,
        old_point: &Point,
        new_point: &Point,
        now: u64,
    ) -> [Option<SlopeAdjustment>; 2];
}

// ── Linear decay ─────────────────────────────────────────────────────────────

/// Time-locked power that decays linearly to zero at the lock's expiry.
pub struct DecayCurve;

impl PowerCurve for DecayCurve {
    fn point_at(state: &LockState, now: u64) -> Point {
        if state.amount > 0 && state.end > now {
            let slope = state.amount / MAX_LOCK_DURATION as i128;
            let bias = slope.saturating_mul((state.end - now) as i128);
            Point {
                bias,
                slope,
                ts: now,
                amount: state.amount,
            }
        } else {
            // Expired: the linear part is gone, but the committed amount
            // still backs reward weighting until exit zeroes it.
            Point {
                bias: 0,
                slope: 0,
                ts: now,
                amount: state.amount.max(0),
            }
        }
    }

    fn schedule_updates(
        old: &LockState,
        new: &LockState,
        old_point: &Point,
        new_point: &Point,
        now: u64,
    ) -> [Option<SlopeAdjustment>; 2] {
        let mut at_old_end = None;
        let mut at_new_end = None;

        if old.end > now {
            // Cancel the decay stop previously scheduled at the old
            // expiry. A same-expiry top-up re-registers the combined
            // slope in place instead.
            let mut delta = old_point.slope;
            if new.end == old.end {
                delta -= new_point.slope;
            }
            at_old_end = Some(SlopeAdjustment {
                at: old.end,
                delta,
            });
        }
        if new.end > now && new.end > old.end {
            at_new_end = Some(SlopeAdjustment {
                at: new.end,
                delta: -new_point.slope,
            });
        }

        [at_old_end, at_new_end]
    }
}

// ── Flat (no decay) ──────────────────────────────────────────────────────────

/// Full power from the moment of staking, constant until exit is
/// requested, then exactly zero.
pub struct FlatCurve;

impl PowerCurve for FlatCurve {
    fn point_at(state: &LockState, now: u64) -> Point {
        if state.amount > 0 && state.end == 0 {
            Point {
                bias: state.amount,
                slope: 0,
                ts: now,
                amount: state.amount,
            }
        } else {
            Point::zero(now)
        }
    }

    fn schedule_updates(
        _old: &LockState,
        _new: &LockState,
        _old_point: &Point,
        _new_point: &Point,
        _now: u64,
    ) -> [Option<SlopeAdjustment>; 2] {
        [None, None]
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;

    #[test]
    fn decay_point_scales_with_remaining_time() {
        let amount = 10 * MAX_LOCK_DURATION as i128;
        let state = LockState {
            amount,
            end: NOW + MAX_LOCK_DURATION,
        };

        let full = DecayCurve::point_at(&state, NOW);
        assert_eq!(full.slope, 10);
        assert_eq!(full.bias, 10 * MAX_LOCK_DURATION as i128);
        assert_eq!(full.amount, amount);

        let halfway = DecayCurve::point_at(&state, NOW + MAX_LOCK_DURATION / 2);
        assert_eq!(halfway.bias, full.bias / 2);
        assert_eq!(halfway.slope, full.slope);
    }

    #[test]
    fn decay_point_is_zero_after_expiry_but_keeps_amount() {
        let state = LockState {
            amount: 1_000,
            end: NOW,
        };
        let point = DecayCurve::point_at(&state, NOW);
        assert_eq!(point.bias, 0);
        assert_eq!(point.slope, 0);
        assert_eq!(point.amount, 1_000);
    }

    #[test]
    fn voting_at_decays_linearly_and_clamps() {
        let point = Point {
            bias: 100,
            slope: 2,
            ts: NOW,
            amount: 0,
        };
        assert_eq!(point.voting_at(NOW), 100);
        assert_eq!(point.voting_at(NOW + 10), 80);
        assert_eq!(point.voting_at(NOW + 50), 0);
        // Past the natural zero the clamp holds without further writes.
        assert_eq!(point.voting_at(NOW + 10_000), 0);
    }

    #[test]
    fn flat_point_is_literal_until_exit() {
        let active = LockState {
            amount: 1_000,
            end: 0,
        };
        let point = FlatCurve::point_at(&active, NOW);
        assert_eq!(point.bias, 1_000);
        assert_eq!(point.slope, 0);
        assert_eq!(point.amount, 1_000);
        assert_eq!(point.voting_at(NOW + 999_999), 1_000);

        let exiting = LockState {
            amount: 1_000,
            end: NOW,
        };
        assert_eq!(FlatCurve::point_at(&exiting, NOW), Point::zero(NOW));
    }

    #[test]
    fn schedule_updates_on_create_register_new_expiry_only() {
        let old = LockState::empty();
        let new = LockState {
            amount: 10 * MAX_LOCK_DURATION as i128,
            end: NOW + 2 * WEEK,
        };
        let old_point = DecayCurve::point_at(&old, NOW);
        let new_point = DecayCurve::point_at(&new, NOW);

        let [first, second] =
            DecayCurve::schedule_updates(&old, &new, &old_point, &new_point, NOW);
        assert_eq!(first, None);
        assert_eq!(
            second,
            Some(SlopeAdjustment {
                at: new.end,
                delta: -10,
            })
        );
    }

    #[test]
    fn schedule_updates_on_same_expiry_top_up_rebalance_in_place() {
        let end = NOW + 4 * WEEK;
        let old = LockState {
            amount: 10 * MAX_LOCK_DURATION as i128,
            end,
        };
        let new = LockState {
            amount: 15 * MAX_LOCK_DURATION as i128,
            end,
        };
        let old_point = DecayCurve::point_at(&old, NOW);
        let new_point = DecayCurve::point_at(&new, NOW);

        let [first, second] =
            DecayCurve::schedule_updates(&old, &new, &old_point, &new_point, NOW);
        // +old_slope cancels, -new_slope re-registers: net -5 at the
        // shared expiry.
        assert_eq!(
            first,
            Some(SlopeAdjustment { at: end, delta: -5 })
        );
        assert_eq!(second, None);
    }

    #[test]
    fn schedule_updates_on_extension_move_the_boundary() {
        let old = LockState {
            amount: 10 * MAX_LOCK_DURATION as i128,
            end: NOW + 2 * WEEK,
        };
        let new = LockState {
            amount: old.amount,
            end: NOW + 6 * WEEK,
        };
        let old_point = DecayCurve::point_at(&old, NOW);
        let new_point = DecayCurve::point_at(&new, NOW);

        let [first, second] =
            DecayCurve::schedule_updates(&old, &new, &old_point, &new_point, NOW);
        assert_eq!(
            first,
            Some(SlopeAdjustment {
                at: old.end,
                delta: 10,
            })
        );
        assert_eq!(
            second,
            Some(SlopeAdjustment {
                at: new.end,
                delta: -10,
            })
        );
    }

    #[test]
    fn schedule_updates_after_expiry_are_empty() {
        let old = LockState {
            amount: 1_000,
            end: NOW - WEEK,
        };
        let new = LockState {
            amount: 0,
            end: NOW - WEEK,
        };
        let old_point = DecayCurve::point_at(&old, NOW);
        let new_point = DecayCurve::point_at(&new, NOW);

        let updates = DecayCurve::schedule_updates(&old, &new, &old_point, &new_point, NOW);
        assert_eq!(updates, [None, None]);
    }
}
