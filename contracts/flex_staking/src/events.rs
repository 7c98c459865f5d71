#![allow(deprecated)] // events().publish migration tracked separately

use common::delegation::PowerAxis;
use soroban_sdk::{symbol_short, Address, Env};

// ── Event payloads ──────────────────────────────────────────────────────────

/// Fired once when the contract is bootstrapped.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InitializedEvent {
    pub stake_token: Address,
    pub exit_delay: u64,
    pub timestamp: u64,
}

/// Fired when an owner opens a stake.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StakedEvent {
    pub owner: Address,
    pub amount: i128,
    pub timestamp: u64,
}

/// Fired when an owner adds to an active stake.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ToppedUpEvent {
    pub owner: Address,
    pub added: i128,
    pub new_amount: i128,
    pub timestamp: u64,
}

/// Fired when an owner requests exit and power drops to zero.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExitRequestedEvent {
    pub owner: Address,
    pub amount: i128,
    pub unlock_at: u64,
    pub timestamp: u64,
}

/// Fired when custody is returned and the position destroyed.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawnEvent {
    pub owner: Address,
    pub amount: i128,
    pub timestamp: u64,
}

/// Fired when an owner redirects power to a collector.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DelegatedEvent {
    pub owner: Address,
    pub collector: Address,
    pub axis: PowerAxis,
    pub timestamp: u64,
}

// ── Publishers ──────────────────────────────────────────────────────────────

pub fn publish_initialized(env: &Env, stake_token: Address, exit_delay: u64) {
    env.events().publish(
        (symbol_short!("INIT"),),
        InitializedEvent {
            stake_token,
            exit_delay,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_staked(env: &Env, owner: Address, amount: i128) {
    env.events().publish(
        (symbol_short!("STAKED"), owner.clone()),
        StakedEvent {
            owner,
            amount,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_topped_up(env: &Env, owner: Address, added: i128, new_amount: i128) {
    env.events().publish(
        (symbol_short!("TOPPED_UP"), owner.clone()),
        ToppedUpEvent {
            owner,
            added,
            new_amount,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_exit_requested(env: &Env, owner: Address, amount: i128, unlock_at: u64) {
    env.events().publish(
        (symbol_short!("EXIT_REQ"), owner.clone()),
        ExitRequestedEvent {
            owner,
            amount,
            unlock_at,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_withdrawn(env: &Env, owner: Address, amount: i128) {
    env.events().publish(
        (symbol_short!("WITHDRAWN"), owner.clone()),
        WithdrawnEvent {
            owner,
            amount,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_delegated(env: &Env, owner: Address, collector: Address, axis: PowerAxis) {
    env.events().publish(
        (symbol_short!("DELEGATED"), owner.clone()),
        DelegatedEvent {
            owner,
            collector,
            axis,
            timestamp: env.ledger().timestamp(),
        },
    );
}
