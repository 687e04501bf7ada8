//! Deployment-time constants for the signature proof engine.
//!
//! Kept deliberately tiny and dependency-free, same as the rest of this
//! workspace's `env-config` crate: everything that varies per-proof (the
//! validator set, the message) is a constructor argument, not configuration.

/// Upper bound on validator-set size enforced by `containers::ValidatorSet::new`.
///
/// spec.md §3 fixes `1 <= N <= 65535` for the mainnet profile. The testnet
/// profile clamps this much lower so fixture generators and fuzz harnesses
/// fail fast instead of building multi-gigabyte trees by accident.
#[cfg(feature = "mainnet")]
pub const MAX_VALIDATOR_SET_SIZE: usize = 65_535;

#[cfg(all(feature = "testnet", not(feature = "mainnet")))]
pub const MAX_VALIDATOR_SET_SIZE: usize = 4_096;

#[cfg(not(any(feature = "mainnet", feature = "testnet")))]
pub const MAX_VALIDATOR_SET_SIZE: usize = 65_535;
