#![no_std]

pub mod events;

use common::checkpoint;
use common::curve::{FlatCurve, LockState};
use common::delegation::{self, PowerAxis};
use soroban_sdk::{
    contract, contractimpl, contracttype, symbol_short, token, Address, Env, Symbol,
};

// ── Storage key constants ────────────────────────────────────────────────────

const INITIALIZED: Symbol = symbol_short!("INIT");
const STAKE_TOKEN: Symbol = symbol_short!("STK_TOK");
const EXIT_DELAY: Symbol = symbol_short!("EXIT_DLY");

// Per-owner persistent storage uses tuple keys: (prefix, owner_address)
const POSITION: Symbol = symbol_short!("POS");

// ── Contract errors ──────────────────────────────────────────────────────────

#[soroban_sdk::contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ContractError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    InvalidInput = 3,
    PositionExists = 4,
    NoPosition = 5,
    ExitAlreadyRequested = 6,
    ExitNotRequested = 7,
    ExitDelayPending = 8,
    TimepointNotPast = 9,
}

// ── Public-facing types ──────────────────────────────────────────────────────

/// A single owner's open stake. At most one per account.
///
/// `requested_at` is zero while the stake is active and carries the
/// exit-request timestamp once the owner begins withdrawing.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Position {
    pub amount: i128,
    pub requested_at: u64,
}

impl Position {
    fn is_exiting(&self) -> bool {
        self.requested_at != 0
    }

    fn lock_state(&self) -> LockState {
        LockState {
            amount: self.amount,
            end: self.requested_at,
        }
    }
}

// ── Contract ─────────────────────────────────────────────────────────────────

#[contract]
pub struct FlexStakingContract;

#[contractimpl]
impl FlexStakingContract {
    // ── Initialisation ──────────────────────────────────────────────────────

    /// Bootstrap the contract.
    ///
    /// * `stake_token` – SAC address of the token users stake.
    /// * `exit_delay`  – seconds between `initiate_exit` and the moment
    ///   `complete_exit` may release custody.
    pub fn initialize(env: Env, stake_token: Address, exit_delay: u64) -> Result<(), ContractError> {
        if env.storage().instance().has(&INITIALIZED) {
            return Err(ContractError::AlreadyInitialized);
        }

        env.storage().instance().set(&INITIALIZED, &true);
        env.storage().instance().set(&STAKE_TOKEN, &stake_token);
        env.storage().instance().set(&EXIT_DELAY, &exit_delay);

        events::publish_initialized(&env, stake_token, exit_delay);

        Ok(())
    }

    // ── Stake lifecycle ─────────────────────────────────────────────────────

    /// Deposit `amount` stake tokens; full power is granted immediately.
    pub fn stake(env: Env, owner: Address, amount: i128) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        owner.require_auth();

        if amount <= 0 {
            return Err(ContractError::InvalidInput);
        }
        if env
            .storage()
            .persistent()
            .has(&(POSITION, owner.clone()))
        {
            return Err(ContractError::PositionExists);
        }

        let stake_token = Self::stake_token(&env)?;
        token::Client::new(&env, &stake_token).transfer(
            &owner,
            &env.current_contract_address(),
            &amount,
        );

        let position = Position {
            amount,
            requested_at: 0,
        };
        checkpoint::apply_transition::<FlatCurve>(
            &env,
            &owner,
            &LockState::empty(),
            &position.lock_state(),
        );
        env.storage()
            .persistent()
            .set(&(POSITION, owner.clone()), &position);

        events::publish_staked(&env, owner, amount);

        Ok(())
    }

    /// Add `amount` tokens to an active stake. Allowed any time before
    /// exit is requested.
    pub fn top_up(env: Env, owner: Address, amount: i128) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        owner.require_auth();

        if amount <= 0 {
            return Err(ContractError::InvalidInput);
        }
        let mut position = Self::position(&env, &owner)?;
        if position.is_exiting() {
            return Err(ContractError::ExitAlreadyRequested);
        }

        let stake_token = Self::stake_token(&env)?;
        token::Client::new(&env, &stake_token).transfer(
            &owner,
            &env.current_contract_address(),
            &amount,
        );

        let old = position.lock_state();
        position.amount = position.amount.saturating_add(amount);
        checkpoint::apply_transition::<FlatCurve>(&env, &owner, &old, &position.lock_state());
        env.storage()
            .persistent()
            .set(&(POSITION, owner.clone()), &position);

        events::publish_topped_up(&env, owner, amount, position.amount);

        Ok(())
    }

    /// Begin withdrawing: both power axes drop to exactly zero now, and
    /// custody is released after the configured delay.
    pub fn initiate_exit(env: Env, owner: Address) -> Result<u64, ContractError> {
        Self::require_initialized(&env)?;
        owner.require_auth();

        let mut position = Self::position(&env, &owner)?;
        if position.is_exiting() {
            return Err(ContractError::ExitAlreadyRequested);
        }

        let now = env.ledger().timestamp();
        let old = position.lock_state();
        position.requested_at = now;
        checkpoint::apply_transition::<FlatCurve>(&env, &owner, &old, &position.lock_state());
        env.storage()
            .persistent()
            .set(&(POSITION, owner.clone()), &position);

        let exit_delay: u64 = env.storage().instance().get(&EXIT_DELAY).unwrap_or(0);
        let unlock_at = now.saturating_add(exit_delay);

        events::publish_exit_requested(&env, owner, position.amount, unlock_at);

        Ok(unlock_at)
    }

    /// Return the committed tokens once the delay has elapsed and destroy
    /// the position.
    pub fn complete_exit(env: Env, owner: Address) -> Result<i128, ContractError> {
        Self::require_initialized(&env)?;
        owner.require_auth();

        let position = Self::position(&env, &owner)?;
        if !position.is_exiting() {
            return Err(ContractError::ExitNotRequested);
        }
        let exit_delay: u64 = env.storage().instance().get(&EXIT_DELAY).unwrap_or(0);
        if env.ledger().timestamp() < position.requested_at.saturating_add(exit_delay) {
            return Err(ContractError::ExitDelayPending);
        }

        // Remove before transfer (checks-effects-interactions).
        env.storage()
            .persistent()
            .remove(&(POSITION, owner.clone()));

        let stake_token = Self::stake_token(&env)?;
        token::Client::new(&env, &stake_token).transfer(
            &env.current_contract_address(),
            &owner,
            &position.amount,
        );

        events::publish_withdrawn(&env, owner, position.amount);

        Ok(position.amount)
    }

    // ── Delegation ──────────────────────────────────────────────────────────

    /// Redirect the owner's power on `axis` to `collector`.
    ///
    /// No-op when the collector is unchanged. Requires an open position
    /// with no exit requested.
    pub fn delegate(
        env: Env,
        owner: Address,
        collector: Address,
        axis: PowerAxis,
    ) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        owner.require_auth();

        let position = Self::position(&env, &owner)?;
        if position.is_exiting() {
            return Err(ContractError::ExitAlreadyRequested);
        }

        let state = position.lock_state();
        if delegation::delegate::<FlatCurve>(&env, &owner, &state, &collector, axis) {
            events::publish_delegated(&env, owner, collector, axis);
        }

        Ok(())
    }

    /// The account currently collecting `account`'s power on `axis`.
    pub fn delegatee_for(env: Env, account: Address, axis: PowerAxis) -> Address {
        delegation::delegatee(&env, &account, axis)
    }

    // ── Queries: voting power ───────────────────────────────────────────────

    /// The account's voting power right now.
    pub fn current_power(env: Env, account: Address) -> i128 {
        let now = env.ledger().timestamp();
        checkpoint::latest_account_point(&env, &account)
            .map(|p| p.voting_at(now))
            .unwrap_or(0)
    }

    /// The account's voting power at a strictly past `timepoint`.
    pub fn past_power(env: Env, account: Address, timepoint: u64) -> Result<i128, ContractError> {
        Self::require_past(&env, timepoint)?;
        Ok(checkpoint::find_account_point(&env, &account, timepoint)
            .map(|p| p.bias.max(0))
            .unwrap_or(0))
    }

    /// The population's voting power right now.
    pub fn current_total_power(env: Env) -> i128 {
        let now = env.ledger().timestamp();
        checkpoint::current_global_voting(&env, now)
    }

    /// The population's voting power at a strictly past `timepoint`.
    pub fn past_total_power(env: Env, timepoint: u64) -> Result<i128, ContractError> {
        Self::require_past(&env, timepoint)?;
        Ok(checkpoint::find_global_point(&env, timepoint)
            .map(|p| p.bias.max(0))
            .unwrap_or(0))
    }

    // ── Queries: reward power ───────────────────────────────────────────────

    /// The account's reward weight right now.
    pub fn current_reward_power(env: Env, account: Address) -> i128 {
        checkpoint::latest_account_point(&env, &account)
            .map(|p| p.amount)
            .unwrap_or(0)
    }

    /// The account's reward weight at a strictly past `timepoint`.
    pub fn past_reward_power(
        env: Env,
        account: Address,
        timepoint: u64,
    ) -> Result<i128, ContractError> {
        Self::require_past(&env, timepoint)?;
        Ok(checkpoint::find_account_point(&env, &account, timepoint)
            .map(|p| p.amount)
            .unwrap_or(0))
    }

    /// The population's reward weight right now.
    pub fn current_total_reward_power(env: Env) -> i128 {
        checkpoint::current_global_reward(&env)
    }

    /// The population's reward weight at a strictly past `timepoint`.
    pub fn past_total_reward_power(env: Env, timepoint: u64) -> Result<i128, ContractError> {
        Self::require_past(&env, timepoint)?;
        Ok(checkpoint::find_global_point(&env, timepoint)
            .map(|p| p.amount)
            .unwrap_or(0))
    }

    // ── Other views ─────────────────────────────────────────────────────────

    pub fn get_position(env: Env, owner: Address) -> Result<Position, ContractError> {
        Self::position(&env, &owner)
    }

    pub fn get_exit_delay(env: Env) -> u64 {
        env.storage().instance().get(&EXIT_DELAY).unwrap_or(0)
    }

    pub fn is_initialized(env: Env) -> bool {
        env.storage().instance().has(&INITIALIZED)
    }

    // ── Internal helpers ────────────────────────────────────────────────────

    fn require_initialized(env: &Env) -> Result<(), ContractError> {
        if !env.storage().instance().has(&INITIALIZED) {
            return Err(ContractError::NotInitialized);
        }
        Ok(())
    }

    /// Historical queries only ever look backward from now.
    fn require_past(env: &Env, timepoint: u64) -> Result<(), ContractError> {
        if timepoint >= env.ledger().timestamp() {
            return Err(ContractError::TimepointNotPast);
        }
        Ok(())
    }

    fn position(env: &Env, owner: &Address) -> Result<Position, ContractError> {
        env.storage()
            .persistent()
            .get(&(POSITION, owner.clone()))
            .ok_or(ContractError::NoPosition)
    }

    fn stake_token(env: &Env) -> Result<Address, ContractError> {
        env.storage()
            .instance()
            .get(&STAKE_TOKEN)
            .ok_or(ContractError::NotInitialized)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
