extern crate std;

use soroban_sdk::{testutils::Ledger as _, Env};

use crate::{
    ContractError, EmissionsContract, EmissionsContractClient, EPOCHS_PER_ERA, EPOCH_DURATION,
    INITIAL_SUPPLY, MAX_EPOCH,
};

const GENESIS: u64 = 1_700_000_000;

fn setup() -> (Env, EmissionsContractClient<'static>) {
    let env = Env::default();

    let contract_id = env.register(EmissionsContract, ());
    let client = EmissionsContractClient::new(&env, &contract_id);
    client.initialize(&GENESIS);

    (env, client)
}

// ── Initialisation ────────────────────────────────────────────────────────────

#[test]
fn test_initialize() {
    let (_env, client) = setup();
    assert!(client.is_initialized());
}

#[test]
fn test_double_initialize_fails() {
    let (_env, client) = setup();

    let result = client.try_initialize(&GENESIS);
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::AlreadyInitialized),
        _ => unreachable!("Expected AlreadyInitialized error"),
    }
}

// ── Epoch arithmetic ──────────────────────────────────────────────────────────

#[test]
fn test_current_epoch_tracks_ledger_time() {
    let (env, client) = setup();

    env.ledger().set_timestamp(GENESIS);
    assert_eq!(client.current_epoch(), 0);

    env.ledger().set_timestamp(GENESIS + EPOCH_DURATION - 1);
    assert_eq!(client.current_epoch(), 0);

    env.ledger().set_timestamp(GENESIS + 5 * EPOCH_DURATION + 3);
    assert_eq!(client.current_epoch(), 5);
}

#[test]
fn test_current_epoch_before_genesis_fails() {
    let (env, client) = setup();

    env.ledger().set_timestamp(GENESIS - 1);
    let result = client.try_current_epoch();
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::BeforeGenesis),
        _ => unreachable!("Expected BeforeGenesis error"),
    }
}

#[test]
fn test_epoch_bounds() {
    let (_env, client) = setup();

    assert_eq!(client.epoch_start_time(&0), GENESIS);
    assert_eq!(client.epoch_end_time(&0), GENESIS + EPOCH_DURATION);
    assert_eq!(client.epoch_start_time(&7), GENESIS + 7 * EPOCH_DURATION);
    assert_eq!(client.epoch_end_time(&7), client.epoch_start_time(&8));
}

#[test]
fn test_epoch_too_large_fails() {
    let (_env, client) = setup();

    let result = client.try_supply_at_epoch_start(&(MAX_EPOCH + 1));
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::EpochTooLarge),
        _ => unreachable!("Expected EpochTooLarge error"),
    }
}

// ── Supply schedule ───────────────────────────────────────────────────────────

#[test]
fn test_supply_starts_at_initial() {
    let (_env, client) = setup();
    assert_eq!(client.supply_at_epoch_start(&0), INITIAL_SUPPLY);
}

#[test]
fn test_supply_is_strictly_increasing() {
    let (_env, client) = setup();

    let mut previous = client.supply_at_epoch_start(&0);
    for epoch in 1..=10u64 {
        let supply = client.supply_at_epoch_start(&epoch);
        assert!(supply > previous, "supply must grow every epoch");
        previous = supply;
    }
}

#[test]
fn test_emission_equals_supply_delta() {
    let (_env, client) = setup();

    for epoch in [0u64, 1, 50, EPOCHS_PER_ERA - 1, EPOCHS_PER_ERA, 400] {
        let before = client.supply_at_epoch_start(&epoch);
        let after = client.supply_at_epoch_start(&(epoch + 1));
        assert_eq!(client.emissions_for_epoch(&epoch), after - before);
    }
}

#[test]
fn test_first_epoch_emission_is_exact() {
    let (_env, client) = setup();

    // INITIAL_SUPPLY * 371_870 ppb.
    assert_eq!(client.emissions_for_epoch(&0), 3_718_700_000_000);
}

#[test]
fn test_growth_rate_steps_down_across_eras() {
    let (_env, client) = setup();

    // Per-epoch growth in ppb, recovered from the emission itself.
    let rate = |epoch: u64| {
        let supply = client.supply_at_epoch_start(&epoch);
        client.emissions_for_epoch(&epoch) * 1_000_000_000 / supply
    };

    let era_rates = [
        rate(0),
        rate(EPOCHS_PER_ERA),
        rate(2 * EPOCHS_PER_ERA),
        rate(3 * EPOCHS_PER_ERA),
        rate(4 * EPOCHS_PER_ERA),
        rate(6 * EPOCHS_PER_ERA),
    ];
    for pair in era_rates.windows(2) {
        assert!(
            pair[0] >= pair[1],
            "growth never accelerates across eras: {:?}",
            era_rates
        );
    }
    // Strict descent through the published eras, then the terminal floor
    // (up to one ppb of integer-division rounding).
    assert!(era_rates[0] > era_rates[3]);
    assert!((era_rates[4] - era_rates[5]).abs() <= 1);
}

#[test]
fn test_first_era_compounds_to_roughly_seven_percent() {
    let (_env, client) = setup();

    let after_one_era = client.supply_at_epoch_start(&EPOCHS_PER_ERA);
    // (1 + 371_870e-9)^182 ≈ 1.0700; allow a tenth of a percent either way.
    assert!(after_one_era > INITIAL_SUPPLY / 1_000 * 1_069);
    assert!(after_one_era < INITIAL_SUPPLY / 1_000 * 1_071);
}

#[test]
fn test_schedule_is_deterministic() {
    let (_env, client) = setup();
    let (_env2, client2) = setup();

    for epoch in [0u64, 3, 181, 182, 365, 900] {
        assert_eq!(
            client.supply_at_epoch_start(&epoch),
            client2.supply_at_epoch_start(&epoch)
        );
        assert_eq!(
            client.emissions_for_epoch(&epoch),
            client2.emissions_for_epoch(&epoch)
        );
    }
}
