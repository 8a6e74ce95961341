//! Kill combos and reward formulas
//!
//! Rewards are computed in integer tenths (combo) and percent (coin bonus)
//! so every payout is floored exactly once, on the final product.

use serde::{Deserialize, Serialize};

use crate::consts::{COMBO_BONUS_PER_STEP, COMBO_TIMEOUT_MS};

/// Chain of kills inside a rolling timeout window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Combo {
    /// Kills in the current chain
    pub count: u32,
    /// Session clock (ms) of the most recent kill
    pub last_kill_ms: f64,
}

/// Outcome of registering one kill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComboKill {
    /// Reward multiplier for this kill, in tenths (10 = x1.0)
    pub multiplier_tenths: u64,
    /// Chain length after this kill
    pub count: u32,
    /// Immediate score bonus for extending the chain (0 below two kills)
    pub bonus: u64,
}

impl Combo {
    fn timed_out(&self, now_ms: f64) -> bool {
        now_ms - self.last_kill_ms > COMBO_TIMEOUT_MS
    }

    /// Drop a stale chain
    pub fn expire(&mut self, now_ms: f64) {
        if self.count > 0 && self.timed_out(now_ms) {
            self.count = 0;
        }
    }

    /// Register a kill at `now_ms`
    ///
    /// The multiplier reflects the chain built before this kill; the bonus
    /// reflects the chain including it.
    pub fn register_kill(&mut self, now_ms: f64) -> ComboKill {
        if self.timed_out(now_ms) {
            self.count = 0;
        }
        let multiplier_tenths = multiplier_tenths(self.count);
        self.count += 1;
        self.last_kill_ms = now_ms;

        let bonus = if self.count >= 2 {
            COMBO_BONUS_PER_STEP * self.count as u64
        } else {
            0
        };

        ComboKill {
            multiplier_tenths,
            count: self.count,
            bonus,
        }
    }

    /// Current multiplier (1.0 + 0.1 per chained kill)
    pub fn multiplier(&self) -> f64 {
        multiplier_tenths(self.count) as f64 / 10.0
    }

    /// Whether the HUD should show the combo banner
    pub fn is_displayed(&self) -> bool {
        self.count > 1
    }

    /// Banner opacity: fades out over the last second of the window
    pub fn display_alpha(&self, now_ms: f64) -> f32 {
        let remaining = COMBO_TIMEOUT_MS - (now_ms - self.last_kill_ms);
        (remaining / 1000.0).clamp(0.0, 1.0) as f32
    }
}

/// Multiplier for a chain of `count` kills, in tenths
#[inline]
pub fn multiplier_tenths(count: u32) -> u64 {
    10 + count as u64
}

/// Score and coins granted by one event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reward {
    pub score: u64,
    pub coins: u64,
}

/// What was killed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillTarget {
    Regular { max_health: u32 },
    Boss,
}

/// Boss kill base score
pub const BOSS_KILL_SCORE: u64 = 1000;
/// Regular kill base score per point of max health
pub const KILL_SCORE_PER_HEALTH: u64 = 100;
/// Bomb payout per regular enemy / boss
pub const BOMB_SCORE: u64 = 50;
pub const BOMB_BOSS_SCORE: u64 = 100;

/// Coin multiplier in percent: 100 + 25 (coin-bonus skin) + 10 per upgrade level
pub fn coin_multiplier_pct(skin_bonus: bool, coin_upgrade_level: u32) -> u64 {
    100 + if skin_bonus { 25 } else { 0 } + 10 * coin_upgrade_level as u64
}

/// Coin multiplier as a factor
pub fn coin_multiplier(pct: u64) -> f64 {
    pct as f64 / 100.0
}

/// Reward for a kill by player fire
///
/// Regular: `100*maxHealth*combo` score, `100*maxHealth/20 * coin * combo` coins.
/// Boss: `1000*combo` score, `1000/10 * coin * combo` coins.
pub fn kill_reward(target: KillTarget, combo_tenths: u64, coin_pct: u64) -> Reward {
    let (base_score, coin_divisor) = match target {
        KillTarget::Regular { max_health } => (KILL_SCORE_PER_HEALTH * max_health as u64, 20),
        KillTarget::Boss => (BOSS_KILL_SCORE, 10),
    };
    // base/divisor * pct/100 * tenths/10, floored once
    Reward {
        score: base_score * combo_tenths / 10,
        coins: base_score * coin_pct * combo_tenths / (coin_divisor * 1000),
    }
}

/// Reward for an enemy destroyed by a bomb pickup (no combo)
pub fn bomb_reward(boss: bool, coin_pct: u64) -> Reward {
    let (score, divisor) = if boss {
        (BOMB_BOSS_SCORE, 10)
    } else {
        (BOMB_SCORE, 20)
    };
    Reward {
        score,
        coins: score * coin_pct / (divisor * 100),
    }
}
