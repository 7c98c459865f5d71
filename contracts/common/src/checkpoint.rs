//! The checkpoint engine: append-only power histories and the transition
//! path that keeps the global aggregate exactly consistent with the sum of
//! per-account effective contributions.
//!
//! Two history shapes are persisted, both growth-on-write arenas of
//! [`Point`]s indexed by a cursor:
//! - one per account, holding that account's *effective* contribution
//!   (its own position plus anything delegated in, minus anything
//!   delegated away);
//! - one global, holding the aggregate.
//!
//! Every mutation flows through [`apply_transition`], which runs inside a
//! single contract invocation — Soroban's transactional storage makes the
//! per-account and global writes visible together or not at all. Queries
//! never mutate state.

use soroban_sdk::{contracttype, Address, Env, Map};

use crate::curve::{LockState, Point, PowerCurve, SlopeAdjustment};
use crate::delegation::{delegatee, PowerAxis};

/// Default bound on schedule entries applied per write.
///
/// Operational contract: the ledger must see at least one write every
/// `max_backfill_steps` week boundaries, otherwise pending slope changes
/// queue up and the aggregate lags until enough writes drain them.
pub const DEFAULT_MAX_BACKFILL_STEPS: u32 = 255;

// ── Storage keys ─────────────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LedgerKey {
    /// Cursor (live length) of an account's point arena. Absent means 0.
    AccountEpoch(Address),
    /// 1-indexed point arena per account.
    AccountPoint(Address, u32),
    /// Cursor of the global arena.
    GlobalEpoch,
    /// 1-indexed global point arena.
    GlobalPoint(u32),
    /// Sorted map: future week-aligned timestamp -> pending slope delta.
    SlopeSchedule,
    /// Init-time override of [`DEFAULT_MAX_BACKFILL_STEPS`].
    BackfillLimit,
    /// Voting-power collector for an account. Absent means self.
    VoteDelegate(Address),
    /// Reward-power collector for an account. Absent means self.
    RewardDelegate(Address),
}

// ── Configuration ────────────────────────────────────────────────────────────

pub fn configure_backfill_limit(env: &Env, steps: u32) {
    env.storage().instance().set(&LedgerKey::BackfillLimit, &steps);
}

fn backfill_limit(env: &Env) -> u32 {
    env.storage()
        .instance()
        .get(&LedgerKey::BackfillLimit)
        .unwrap_or(DEFAULT_MAX_BACKFILL_STEPS)
}

// ── History accessors ────────────────────────────────────────────────────────

/// Index of the most recently appended point for `account` (0 = none).
pub fn account_epoch(env: &Env, account: &Address) -> u32 {
    env.storage()
        .persistent()
        .get(&LedgerKey::AccountEpoch(account.clone()))
        .unwrap_or(0)
}

pub fn account_point(env: &Env, account: &Address, epoch: u32) -> Option<Point> {
    env.storage()
        .persistent()
        .get(&LedgerKey::AccountPoint(account.clone(), epoch))
}

pub fn latest_account_point(env: &Env, account: &Address) -> Option<Point> {
    let epoch = account_epoch(env, account);
    if epoch == 0 {
        return None;
    }
    account_point(env, account, epoch)
}

/// Index of the most recently appended global point (0 = none).
pub fn global_epoch(env: &Env) -> u32 {
    env.storage()
        .persistent()
        .get(&LedgerKey::GlobalEpoch)
        .unwrap_or(0)
}

pub fn global_point(env: &Env, epoch: u32) -> Option<Point> {
    env.storage().persistent().get(&LedgerKey::GlobalPoint(epoch))
}

pub fn latest_global_point(env: &Env) -> Option<Point> {
    let epoch = global_epoch(env);
    if epoch == 0 {
        return None;
    }
    global_point(env, epoch)
}

/// Append a point to the account's arena, overwriting in place when the
/// newest record carries the identical timestamp (same-instant coalescing).
fn write_account_point(env: &Env, account: &Address, point: &Point) {
    let epoch = account_epoch(env, account);
    if epoch > 0 {
        if let Some(newest) = account_point(env, account, epoch) {
            if newest.ts == point.ts {
                env.storage()
                    .persistent()
                    .set(&LedgerKey::AccountPoint(account.clone(), epoch), point);
                return;
            }
        }
    }
    let next = epoch + 1;
    env.storage()
        .persistent()
        .set(&LedgerKey::AccountPoint(account.clone(), next), point);
    env.storage()
        .persistent()
        .set(&LedgerKey::AccountEpoch(account.clone()), &next);
}

fn write_global_point(env: &Env, point: &Point) {
    let epoch = global_epoch(env);
    if epoch > 0 {
        if let Some(newest) = global_point(env, epoch) {
            if newest.ts == point.ts {
                env.storage()
                    .persistent()
                    .set(&LedgerKey::GlobalPoint(epoch), point);
                return;
            }
        }
    }
    let next = epoch + 1;
    env.storage()
        .persistent()
        .set(&LedgerKey::GlobalPoint(next), point);
    env.storage().persistent().set(&LedgerKey::GlobalEpoch, &next);
}

// ── Slope schedule ───────────────────────────────────────────────────────────

fn load_schedule(env: &Env) -> Map<u64, i128> {
    env.storage()
        .instance()
        .get(&LedgerKey::SlopeSchedule)
        .unwrap_or_else(|| Map::new(env))
}

fn store_schedule(env: &Env, schedule: &Map<u64, i128>) {
    env.storage()
        .instance()
        .set(&LedgerKey::SlopeSchedule, schedule);
}

/// Pending slope delta scheduled at exactly `at`, if any.
pub fn scheduled_slope_delta(env: &Env, at: u64) -> Option<i128> {
    load_schedule(env).get(at)
}

fn apply_schedule_updates(env: &Env, updates: [Option<SlopeAdjustment>; 2], now: u64) {
    let mut schedule = load_schedule(env);
    let mut dirty = false;
    for update in updates.into_iter().flatten() {
        if update.at <= now || update.delta == 0 {
            continue;
        }
        let next = schedule
            .get(update.at)
            .unwrap_or(0)
            .saturating_add(update.delta);
        if next == 0 {
            schedule.remove(update.at);
        } else {
            schedule.set(update.at, next);
        }
        dirty = true;
    }
    if dirty {
        store_schedule(env, &schedule);
    }
}

// ── Transition path ──────────────────────────────────────────────────────────

/// Record an `old -> new` position transition for `account`.
///
/// Appends the routed per-account record(s), backfills the global history
/// over any pending schedule boundaries, and writes the new global
/// aggregate, all within the current invocation. Every call appends at
/// least one account record and one global record; nothing is ever
/// removed.
pub fn apply_transition<C: PowerCurve>(
    env: &Env,
    account: &Address,
    old_state: &LockState,
    new_state: &LockState,
) {
    let now = env.ledger().timestamp();
    let old_point = C::point_at(old_state, now);
    let new_point = C::point_at(new_state, now);

    let d_bias = new_point.bias - old_point.bias;
    let d_slope = new_point.slope - old_point.slope;
    let d_amount = new_point.amount - old_point.amount;

    // Account records hold effective (post-delegation) contributions, so
    // each axis's delta lands on whichever account currently collects it.
    let vote_to = delegatee(env, account, PowerAxis::Voting);
    let reward_to = delegatee(env, account, PowerAxis::Reward);
    if vote_to == reward_to {
        bump_account(env, &vote_to, d_bias, d_slope, d_amount, now);
    } else {
        bump_account(env, &vote_to, d_bias, d_slope, 0, now);
        bump_account(env, &reward_to, 0, 0, d_amount, now);
    }

    let mut running = backfill_global(env, now);
    running.bias = running.bias.saturating_add(d_bias).max(0);
    running.slope = running.slope.saturating_add(d_slope).max(0);
    running.amount = running.amount.saturating_add(d_amount).max(0);
    running.ts = now;
    write_global_point(env, &running);

    let updates = C::schedule_updates(old_state, new_state, &old_point, &new_point, now);
    apply_schedule_updates(env, updates, now);
}

/// Fold a signed delta into an account's history at `now`.
///
/// The new record is the previous record evaluated at `now` plus the
/// delta; bias, slope, and amount are clamped at zero (saturation, not an
/// error — see the error-handling contract).
pub(crate) fn bump_account(
    env: &Env,
    account: &Address,
    d_bias: i128,
    d_slope: i128,
    d_amount: i128,
    now: u64,
) {
    let point = match latest_account_point(env, account) {
        Some(prev) => Point {
            bias: prev.voting_at(now).saturating_add(d_bias).max(0),
            slope: prev.slope.saturating_add(d_slope).max(0),
            ts: now,
            amount: prev.amount.saturating_add(d_amount).max(0),
        },
        None => Point {
            bias: d_bias.max(0),
            slope: d_slope.max(0),
            ts: now,
            amount: d_amount.max(0),
        },
    };
    write_account_point(env, account, &point);
}

/// Replay pending schedule boundaries up to `now`, persisting an
/// intermediate global point at every boundary strictly before `now`.
///
/// Returns the running point advanced to `now`, *not yet* persisted — the
/// caller folds the transition delta in and writes it. At most the
/// configured number of entries is consumed per call; any remainder stays
/// queued for the next write.
fn backfill_global(env: &Env, now: u64) -> Point {
    let mut point = match latest_global_point(env) {
        Some(point) => point,
        None => Point::zero(now),
    };

    let mut schedule = load_schedule(env);
    if !schedule.is_empty() {
        let limit = backfill_limit(env);
        let mut steps = 0u32;
        let mut dirty = false;
        while steps < limit {
            let boundary = match schedule.keys().first() {
                Some(boundary) if boundary <= now => boundary,
                _ => break,
            };
            // An entry stranded behind the cursor by an earlier exhausted
            // pass applies at the current timestamp; history never rewinds.
            let at = boundary.max(point.ts);
            let dt = (at - point.ts) as i128;
            point.bias = point
                .bias
                .saturating_sub(point.slope.saturating_mul(dt))
                .max(0);
            point.slope = point
                .slope
                .saturating_add(schedule.get(boundary).unwrap_or(0))
                .max(0);
            point.ts = at;
            schedule.remove(boundary);
            dirty = true;
            if at < now {
                write_global_point(env, &point);
            }
            steps += 1;
        }
        if dirty {
            store_schedule(env, &schedule);
        }
    }

    if point.ts < now {
        let dt = (now - point.ts) as i128;
        point.bias = point
            .bias
            .saturating_sub(point.slope.saturating_mul(dt))
            .max(0);
        point.ts = now;
    }
    point
}

// ── Live queries ─────────────────────────────────────────────────────────────

/// The aggregate voting power in effect right now.
///
/// Replays pending schedule boundaries read-only so the result stays
/// exact between writes.
pub fn current_global_voting(env: &Env, now: u64) -> i128 {
    let mut point = match latest_global_point(env) {
        Some(point) => point,
        None => return 0,
    };
    let schedule = load_schedule(env);
    let limit = backfill_limit(env);
    let mut steps = 0u32;
    for boundary in schedule.keys().iter() {
        if boundary > now || steps >= limit {
            break;
        }
        let at = boundary.max(point.ts);
        let dt = (at - point.ts) as i128;
        point.bias = point
            .bias
            .saturating_sub(point.slope.saturating_mul(dt))
            .max(0);
        point.slope = point
            .slope
            .saturating_add(schedule.get(boundary).unwrap_or(0))
            .max(0);
        point.ts = at;
        steps += 1;
    }
    point.voting_at(now)
}

/// The aggregate reward power in effect right now (amounts never decay).
pub fn current_global_reward(env: &Env) -> i128 {
    latest_global_point(env).map(|p| p.amount).unwrap_or(0)
}

// ── Historical queries ───────────────────────────────────────────────────────

/// The account record in effect at `timepoint`, or `None` before the
/// account's first record.
pub fn find_account_point(env: &Env, account: &Address, timepoint: u64) -> Option<Point> {
    let len = account_epoch(env, account);
    if len == 0 {
        return None;
    }
    // Most lookups target recent history: check the newest record first.
    let newest = account_point(env, account, len)?;
    if newest.ts <= timepoint {
        return Some(newest);
    }
    let found = search(
        len,
        |epoch| account_point(env, account, epoch).unwrap_or_else(|| Point::zero(0)),
        timepoint,
    );
    if found == 0 {
        return None;
    }
    account_point(env, account, found)
}

/// The global record in effect at `timepoint`.
pub fn find_global_point(env: &Env, timepoint: u64) -> Option<Point> {
    let len = global_epoch(env);
    if len == 0 {
        return None;
    }
    let newest = global_point(env, len)?;
    if newest.ts <= timepoint {
        return Some(newest);
    }
    let found = search(
        len,
        |epoch| global_point(env, epoch).unwrap_or_else(|| Point::zero(0)),
        timepoint,
    );
    if found == 0 {
        return None;
    }
    global_point(env, found)
}

/// Greatest 1-based index in `[1, len]` whose timestamp is `<= timepoint`,
/// or 0 when none qualifies. Timestamps are non-decreasing by the history
/// invariant.
fn search<F: Fn(u32) -> Point>(len: u32, get: F, timepoint: u64) -> u32 {
    let mut best = 0u32;
    let mut lo = 1u32;
    let mut hi = len;
    while lo <= hi {
        let mid = lo + (hi - lo) / 2;
        if get(mid).ts <= timepoint {
            best = mid;
            lo = mid + 1;
        } else {
            hi = mid - 1;
        }
    }
    best
}

// ── Tests ────────────────────────────────────────────────────────────────────
