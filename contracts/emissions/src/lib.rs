#![no_std]

//! Epoch emission and supply schedule.
//!
//! Reward modules divide each epoch's newly issued value proportionally to
//! historical power, and consume exactly two read operations from this
//! contract: `emissions_for_epoch` and `supply_at_epoch_start`. Both are
//! pure functions of the epoch number under a precomputed
//! piecewise-geometric growth schedule; the only stored state is the
//! genesis timestamp that anchors epoch numbering.

use soroban_sdk::{contract, contractimpl, symbol_short, Env, Symbol};

// ── Storage key constants ────────────────────────────────────────────────────

const INITIALIZED: Symbol = symbol_short!("INIT");
const GENESIS: Symbol = symbol_short!("GENESIS");

// ── Schedule constants ───────────────────────────────────────────────────────

/// Seconds per reward epoch (two days).
pub const EPOCH_DURATION: u64 = 2 * 86_400;

/// Epochs per growth era (about one year of two-day epochs).
pub const EPOCHS_PER_ERA: u64 = 182;

/// Initial supply: one billion tokens at seven decimal places.
pub const INITIAL_SUPPLY: i128 = 1_000_000_000 * 10_000_000;

/// Upper bound on accepted epoch numbers (one hundred eras). Far beyond
/// any deployment horizon; keeps the compounding loop bounded.
pub const MAX_EPOCH: u64 = 100 * EPOCHS_PER_ERA;

/// Per-epoch geometric growth per era, in parts per billion.
///
/// The published schedule starts at 7% annual growth and descends one
/// point per era to a terminal 3% floor. Each entry is the 182nd root of
/// its annual factor: `(1 + r)^(1/182) - 1`, precomputed.
const ERA_GROWTH_PPB: [i128; 4] = [371_870, 320_210, 268_116, 215_520];
const TERMINAL_GROWTH_PPB: i128 = 162_420;

const PPB: i128 = 1_000_000_000;

// ── Contract errors ──────────────────────────────────────────────────────────

#[soroban_sdk::contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ContractError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    BeforeGenesis = 3,
    EpochTooLarge = 4,
}

// ── Contract ─────────────────────────────────────────────────────────────────

#[contract]
pub struct EmissionsContract;

#[contractimpl]
impl EmissionsContract {
    /// Anchor epoch numbering at `genesis`.
    pub fn initialize(env: Env, genesis: u64) -> Result<(), ContractError> {
        if env.storage().instance().has(&INITIALIZED) {
            return Err(ContractError::AlreadyInitialized);
        }
        env.storage().instance().set(&INITIALIZED, &true);
        env.storage().instance().set(&GENESIS, &genesis);
        Ok(())
    }

    /// The epoch containing the current ledger timestamp.
    pub fn current_epoch(env: Env) -> Result<u64, ContractError> {
        let genesis = Self::genesis(&env)?;
        let now = env.ledger().timestamp();
        if now < genesis {
            return Err(ContractError::BeforeGenesis);
        }
        Ok((now - genesis) / EPOCH_DURATION)
    }

    /// Inclusive start timestamp of `epoch`.
    pub fn epoch_start_time(env: Env, epoch: u64) -> Result<u64, ContractError> {
        let genesis = Self::genesis(&env)?;
        Self::require_in_range(epoch)?;
        Ok(genesis + epoch * EPOCH_DURATION)
    }

    /// Exclusive end timestamp of `epoch`.
    pub fn epoch_end_time(env: Env, epoch: u64) -> Result<u64, ContractError> {
        let genesis = Self::genesis(&env)?;
        Self::require_in_range(epoch)?;
        Ok(genesis + (epoch + 1) * EPOCH_DURATION)
    }

    /// Total supply at the instant `epoch` begins.
    pub fn supply_at_epoch_start(_env: Env, epoch: u64) -> Result<i128, ContractError> {
        Self::require_in_range(epoch)?;
        Ok(supply_at(epoch))
    }

    /// Value newly issued over the course of `epoch`.
    pub fn emissions_for_epoch(_env: Env, epoch: u64) -> Result<i128, ContractError> {
        Self::require_in_range(epoch)?;
        let before = supply_at(epoch);
        Ok(step(before, epoch) - before)
    }

    pub fn is_initialized(env: Env) -> bool {
        env.storage().instance().has(&INITIALIZED)
    }

    // ── Internal helpers ────────────────────────────────────────────────────

    fn genesis(env: &Env) -> Result<u64, ContractError> {
        env.storage()
            .instance()
            .get(&GENESIS)
            .ok_or(ContractError::NotInitialized)
    }

    fn require_in_range(epoch: u64) -> Result<(), ContractError> {
        if epoch > MAX_EPOCH {
            return Err(ContractError::EpochTooLarge);
        }
        Ok(())
    }
}

// ── Schedule math ────────────────────────────────────────────────────────────

/// Growth rate applied across `epoch`, in parts per billion.
fn growth_ppb(epoch: u64) -> i128 {
    let era = (epoch / EPOCHS_PER_ERA) as usize;
    if era < ERA_GROWTH_PPB.len() {
        ERA_GROWTH_PPB[era]
    } else {
        TERMINAL_GROWTH_PPB
    }
}

/// Supply after compounding one epoch's growth onto `supply`.
fn step(supply: i128, epoch: u64) -> i128 {
    supply + supply * growth_ppb(epoch) / PPB
}

/// Supply at the start of `epoch`: the initial supply compounded through
/// every earlier epoch.
fn supply_at(epoch: u64) -> i128 {
    let mut supply = INITIAL_SUPPLY;
    let mut e = 0u64;
    while e < epoch {
        supply = step(supply, e);
        e += 1;
    }
    supply
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test;
