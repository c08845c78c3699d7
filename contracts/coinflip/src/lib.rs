#![no_std]

//! # Coinflip
//!
//! A minimal on-chain coin-flip ledger. A single state-changing entrypoint
//! (`flip`) reads the caller's aggregate stats, derives heads/tails from the
//! ledger timestamp, appends an immutable per-flip record, and publishes an
//! event for off-chain indexing.
//!
//! ## Storage layout
//! - `DataKey::Player(address)` → `PlayerStats` — mutable per-player aggregate
//! - `DataKey::Game(address, game_id)` → `Game` — append-only flip records
//!
//! `game_id` is dense per player and starts at 1: the n-th flip by a player is
//! stored at `(player, n)`, and `stats.total_flips` always equals the highest
//! `game_id` written for that player. Game records are never updated after the
//! write; off-chain views (latest flip, rankings, pagination) are built by an
//! indexer consuming `EvFlipped`, not by this contract.

use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, Address, BytesN, Env,
};

// ═══════════════════════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-player aggregate, updated on every flip.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlayerStats {
    pub address: Address,
    /// Total flips ever made. Invariant: `wins + losses == total_flips`.
    pub total_flips: u32,
    pub wins: u32,
    pub losses: u32,
}

/// One resolved flip. Written once, never mutated.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Game {
    pub player: Address,
    /// 1-based, dense per player.
    pub game_id: u32,
    /// Caller's call: 0 = heads, 1 = tails.
    pub prediction: u32,
    /// Derived from the ledger timestamp, not caller-supplied.
    pub outcome: u32,
    pub won: bool,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Admin,
    /// Player aggregate: DataKey::Player(address) → PlayerStats
    Player(Address),
    /// Flip record: DataKey::Game(address, game_id) → Game
    Game(Address, u32),
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Errors
// ═══════════════════════════════════════════════════════════════════════════════

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum CoinflipError {
    InvalidPrediction = 1,
    AdminNotSet = 2,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Events
// ═══════════════════════════════════════════════════════════════════════════════

/// Emitted once per successful flip, carrying a full copy of the stored
/// `Game` record for off-chain indexers.
#[contractevent]
pub struct EvFlipped {
    pub player: Address,
    pub game_id: u32,
    pub prediction: u32,
    pub outcome: u32,
    pub won: bool,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Constants
// ═══════════════════════════════════════════════════════════════════════════════

const HEADS: u32 = 0;
const TAILS: u32 = 1;

// Ledger rate is approximately 5 seconds per ledger on Stellar
const LEDGER_RATE_SECS: u32 = 5;

// TTL expressed in human-readable time units (120 days)
const TTL_SECONDS: u32 = 120 * 24 * 60 * 60; // 10,368,000 seconds

/// TTL for player and game data in ledgers: 120 * 24 * 60 * 60 / 5 = 2,073,600 ledgers
const TTL_LEDGERS: u32 = TTL_SECONDS / LEDGER_RATE_SECS;

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract
// ═══════════════════════════════════════════════════════════════════════════════

#[contract]
pub struct Coinflip;

#[contractimpl]
impl Coinflip {
    /// Initialize with admin address
    pub fn __constructor(env: Env, admin: Address) {
        env.storage().instance().set(&DataKey::Admin, &admin);
    }

    /// Flip the coin. `prediction` must be 0 (heads) or 1 (tails).
    ///
    /// Reads the caller's stats (zeroed on first flip), resolves the outcome
    /// as `ledger timestamp mod 2`, bumps the aggregate, writes the flip
    /// record at `(player, game_id)`, and publishes `EvFlipped`. Returns the
    /// stored record so the caller sees the result without a second query.
    ///
    /// The entropy source is weak: the ledger timestamp is coarse, public,
    /// and steered by whoever closes the ledger. Anyone who can predict the
    /// close time can predict the outcome.
    pub fn flip(env: Env, player: Address, prediction: u32) -> Result<Game, CoinflipError> {
        player.require_auth();

        if prediction != HEADS && prediction != TAILS {
            return Err(CoinflipError::InvalidPrediction);
        }

        let mut stats = Self::read_player_or_default(&env, &player);

        let outcome = (env.ledger().timestamp() % 2) as u32;
        let won = prediction == outcome;

        let game_id = stats.total_flips + 1;
        stats.total_flips = game_id;
        if won {
            stats.wins += 1;
        } else {
            stats.losses += 1;
        }

        let game = Game {
            player: player.clone(),
            game_id,
            prediction,
            outcome,
            won,
        };

        Self::write_player(&env, &stats);
        Self::write_game(&env, &game);

        EvFlipped {
            player,
            game_id,
            prediction,
            outcome,
            won,
        }
        .publish(&env);

        Ok(game)
    }

    /// Get stats for a player. Returns None for a player who has never flipped.
    pub fn get_player(env: Env, player: Address) -> Option<PlayerStats> {
        env.storage().persistent().get(&DataKey::Player(player))
    }

    /// Get one flip record by `(player, game_id)`. Returns None if absent.
    pub fn get_game(env: Env, player: Address, game_id: u32) -> Option<Game> {
        env.storage().persistent().get(&DataKey::Game(player, game_id))
    }

    pub fn get_admin(env: Env) -> Result<Address, CoinflipError> {
        Self::load_admin(&env)
    }

    pub fn set_admin(env: Env, new_admin: Address) -> Result<(), CoinflipError> {
        let admin = Self::load_admin(&env)?;
        admin.require_auth();
        env.storage().instance().set(&DataKey::Admin, &new_admin);
        Ok(())
    }

    pub fn upgrade(env: Env, new_wasm_hash: BytesN<32>) -> Result<(), CoinflipError> {
        let admin = Self::load_admin(&env)?;
        admin.require_auth();
        env.deployer().update_current_contract_wasm(new_wasm_hash);
        Ok(())
    }

    // ─── Internal helpers ──────────────────────────────────────────────────

    /// Explicit get-or-default at the store boundary: a missing entry is a
    /// brand-new player, not an error.
    fn read_player_or_default(env: &Env, player: &Address) -> PlayerStats {
        env.storage()
            .persistent()
            .get(&DataKey::Player(player.clone()))
            .unwrap_or(PlayerStats {
                address: player.clone(),
                total_flips: 0,
                wins: 0,
                losses: 0,
            })
    }

    fn write_player(env: &Env, stats: &PlayerStats) {
        let key = DataKey::Player(stats.address.clone());
        env.storage().persistent().set(&key, stats);
        env.storage()
            .persistent()
            .extend_ttl(&key, TTL_LEDGERS, TTL_LEDGERS);
    }

    fn write_game(env: &Env, game: &Game) {
        let key = DataKey::Game(game.player.clone(), game.game_id);
        env.storage().persistent().set(&key, game);
        env.storage()
            .persistent()
            .extend_ttl(&key, TTL_LEDGERS, TTL_LEDGERS);
    }

    fn load_admin(env: &Env) -> Result<Address, CoinflipError> {
        env.storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(CoinflipError::AdminNotSet)
    }
}
