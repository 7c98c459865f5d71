//! Per-axis power delegation: redirect an account's voting or reward
//! contribution to a chosen collector.
//!
//! The two axes are independent. A collector record is stored per account
//! per axis; an absent record means the account collects its own power.
//! Delegating moves the owner's current own contribution between the old
//! and new collector's histories — the aggregate is untouched (a
//! transfer, never a mint), and later transitions on the owner's position
//! route their deltas to the collectors on record.

use soroban_sdk::{contracttype, Address, Env};

use crate::checkpoint::{self, LedgerKey};
use crate::curve::{LockState, PowerCurve};

/// Which power a delegation redirects.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PowerAxis {
    Voting,
    Reward,
}

fn key_for(account: &Address, axis: PowerAxis) -> LedgerKey {
    match axis {
        PowerAxis::Voting => LedgerKey::VoteDelegate(account.clone()),
        PowerAxis::Reward => LedgerKey::RewardDelegate(account.clone()),
    }
}

/// The account currently collecting `account`'s power on `axis` (self by
/// default).
pub fn delegatee(env: &Env, account: &Address, axis: PowerAxis) -> Address {
    env.storage()
        .persistent()
        .get(&key_for(account, axis))
        .unwrap_or_else(|| account.clone())
}

/// Redirect `owner`'s contribution on `axis` to `collector`.
///
/// Returns `false` (and writes nothing) when the collector is unchanged.
/// `state` must be the owner's live position image; its current value
/// under the curve is what moves between the collector records.
pub fn delegate<C: PowerCurve>(
    env: &Env,
    owner: &Address,
    state: &LockState,
    collector: &Address,
    axis: PowerAxis,
) -> bool {
    let current = delegatee(env, owner, axis);
    if current == *collector {
        return false;
    }

    let now = env.ledger().timestamp();
    let own = C::point_at(state, now);
    match axis {
        PowerAxis::Voting => {
            checkpoint::bump_account(env, &current, -own.bias, -own.slope, 0, now);
            checkpoint::bump_account(env, collector, own.bias, own.slope, 0, now);
        }
        PowerAxis::Reward => {
            checkpoint::bump_account(env, &current, 0, 0, -own.amount, now);
            checkpoint::bump_account(env, collector, 0, 0, own.amount, now);
        }
    }

    env.storage()
        .persistent()
        .set(&key_for(owner, axis), collector);
    true
}
