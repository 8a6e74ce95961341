//! Persistent meta-progression
//!
//! Coins, unlocks, upgrades and lifetime stats survive between runs in a
//! single JSON record. [`ProgressionStore`] owns the mutation rules: every
//! operation is a silent no-op when its precondition fails, and every
//! successful one is written through to the blob store.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::consts::PLAYER_BASE_SPEED;
use crate::persistence::{BlobStore, StoreError};
use crate::sim::combo::coin_multiplier_pct;
use crate::sim::entity::PowerupKind;
use crate::sim::state::Loadout;

/// Storage key for the progression record
pub const DATA_KEY: &str = "spaceDefenderData";

pub const MIN_SENSITIVITY: f32 = 0.5;
pub const MAX_SENSITIVITY: f32 = 2.0;

// === Catalogs ===

/// Ship cosmetics
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum SkinId {
    #[default]
    Default,
    Red,
    Blue,
    Purple,
    Gold,
    Cyan,
    Rainbow,
}

impl SkinId {
    pub const ALL: [SkinId; 7] = [
        SkinId::Default,
        SkinId::Red,
        SkinId::Blue,
        SkinId::Purple,
        SkinId::Gold,
        SkinId::Cyan,
        SkinId::Rainbow,
    ];

    pub fn price(&self) -> u64 {
        match self {
            SkinId::Default => 0,
            SkinId::Red => 500,
            SkinId::Blue => 750,
            SkinId::Purple => 1000,
            SkinId::Gold => 1500,
            SkinId::Cyan => 2000,
            SkinId::Rainbow => 5000,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SkinId::Default => "Classic Ship",
            SkinId::Red => "Red Fighter",
            SkinId::Blue => "Blue Cruiser",
            SkinId::Purple => "Plasma Ship",
            SkinId::Gold => "Golden Cruiser",
            SkinId::Cyan => "Cyan Interceptor",
            SkinId::Rainbow => "Rainbow Ship",
        }
    }

    /// Hull and accent colours
    pub fn colors(&self) -> (&'static str, &'static str) {
        match self {
            SkinId::Default => ("#4ade80", "#22c55e"),
            SkinId::Red => ("#ef4444", "#dc2626"),
            SkinId::Blue => ("#3b82f6", "#2563eb"),
            SkinId::Purple => ("#a855f7", "#9333ea"),
            SkinId::Gold => ("#fbbf24", "#f59e0b"),
            SkinId::Cyan => ("#06b6d4", "#0891b2"),
            SkinId::Rainbow => ("#ec4899", "#d946ef"),
        }
    }

    /// Grants +25% coins while equipped
    pub fn coin_bonus(&self) -> bool {
        matches!(self, SkinId::Gold)
    }
}

/// Background music tracks
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum TrackId {
    #[default]
    Theme1,
    Theme2,
    Theme3,
    Theme4,
}

impl TrackId {
    pub const ALL: [TrackId; 4] = [
        TrackId::Theme1,
        TrackId::Theme2,
        TrackId::Theme3,
        TrackId::Theme4,
    ];

    pub fn price(&self) -> u64 {
        match self {
            TrackId::Theme1 => 0,
            TrackId::Theme2 => 800,
            TrackId::Theme3 => 1200,
            TrackId::Theme4 => 1500,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TrackId::Theme1 => "Space Odyssey",
            TrackId::Theme2 => "Cyber Warfare",
            TrackId::Theme3 => "Cosmic Journey",
            TrackId::Theme4 => "Epic Battle",
        }
    }

    /// Looping melody (Hz)
    pub fn melody(&self) -> &'static [f32] {
        match self {
            TrackId::Theme1 => &[262.0, 294.0, 330.0, 349.0, 392.0, 440.0, 494.0, 523.0],
            TrackId::Theme2 => &[220.0, 247.0, 277.0, 294.0, 330.0, 370.0, 415.0, 440.0],
            TrackId::Theme3 => &[196.0, 220.0, 247.0, 262.0, 294.0, 330.0, 349.0, 392.0],
            TrackId::Theme4 => &[165.0, 185.0, 208.0, 220.0, 247.0, 277.0, 311.0, 330.0],
        }
    }
}

/// Permanent upgrades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpgradeKind {
    DamageBoost,
    SpeedBoost,
    HealthBoost,
    CoinMultiplier,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 4] = [
        UpgradeKind::DamageBoost,
        UpgradeKind::SpeedBoost,
        UpgradeKind::HealthBoost,
        UpgradeKind::CoinMultiplier,
    ];

    pub fn base_price(&self) -> u64 {
        match self {
            UpgradeKind::DamageBoost => 300,
            UpgradeKind::SpeedBoost => 250,
            UpgradeKind::HealthBoost => 400,
            UpgradeKind::CoinMultiplier => 500,
        }
    }

    pub fn max_level(&self) -> u32 {
        match self {
            UpgradeKind::HealthBoost => 3,
            UpgradeKind::DamageBoost | UpgradeKind::SpeedBoost | UpgradeKind::CoinMultiplier => 5,
        }
    }

    /// Price of the next level when currently at `level`
    pub fn price_at(&self, level: u32) -> u64 {
        self.base_price() * (level as u64 + 1)
    }
}

/// Shop price of one inventory charge
pub fn powerup_price(kind: PowerupKind) -> u64 {
    match kind {
        PowerupKind::Shield | PowerupKind::RapidFire => 100,
        PowerupKind::MultiShot => 150,
        PowerupKind::Health => 200,
        PowerupKind::Bomb => 250,
    }
}

// === Record ===

/// Player-tunable options stored with the progression record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSettings {
    /// Movement speed multiplier
    pub sensitivity: f32,
    pub fullscreen: bool,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            sensitivity: 1.0,
            fullscreen: false,
        }
    }
}

/// Charges of each shop power-up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    pub shield: u32,
    pub rapid_fire: u32,
    pub multi_shot: u32,
    pub health: u32,
    pub bomb: u32,
}

impl Inventory {
    pub fn get(&self, kind: PowerupKind) -> u32 {
        match kind {
            PowerupKind::Shield => self.shield,
            PowerupKind::RapidFire => self.rapid_fire,
            PowerupKind::MultiShot => self.multi_shot,
            PowerupKind::Health => self.health,
            PowerupKind::Bomb => self.bomb,
        }
    }

    fn slot(&mut self, kind: PowerupKind) -> &mut u32 {
        match kind {
            PowerupKind::Shield => &mut self.shield,
            PowerupKind::RapidFire => &mut self.rapid_fire,
            PowerupKind::MultiShot => &mut self.multi_shot,
            PowerupKind::Health => &mut self.health,
            PowerupKind::Bomb => &mut self.bomb,
        }
    }
}

/// Level of each permanent upgrade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upgrades {
    pub damage_boost: u32,
    pub speed_boost: u32,
    pub health_boost: u32,
    pub coin_multiplier: u32,
}

impl Upgrades {
    pub fn get(&self, kind: UpgradeKind) -> u32 {
        match kind {
            UpgradeKind::DamageBoost => self.damage_boost,
            UpgradeKind::SpeedBoost => self.speed_boost,
            UpgradeKind::HealthBoost => self.health_boost,
            UpgradeKind::CoinMultiplier => self.coin_multiplier,
        }
    }

    fn slot(&mut self, kind: UpgradeKind) -> &mut u32 {
        match kind {
            UpgradeKind::DamageBoost => &mut self.damage_boost,
            UpgradeKind::SpeedBoost => &mut self.speed_boost,
            UpgradeKind::HealthBoost => &mut self.health_boost,
            UpgradeKind::CoinMultiplier => &mut self.coin_multiplier,
        }
    }
}

/// Lifetime statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub games_played: u32,
    pub high_score: u64,
    pub max_level: u32,
    pub total_kills: u64,
    pub bosses_killed: u64,
    pub total_coins_earned: u64,
}

/// Totals of one finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub score: u64,
    pub level: u32,
    pub kills: u32,
    pub bosses_killed: u32,
    pub coins_earned: u64,
}

/// The persisted cross-session record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionRecord {
    /// Coin balance
    pub total_coins: u64,
    pub owned_skins: BTreeSet<SkinId>,
    pub equipped_skin: SkinId,
    pub owned_music: BTreeSet<TrackId>,
    pub equipped_music: TrackId,
    pub music_enabled: bool,
    pub settings: PlayerSettings,
    pub inventory_powerups: Inventory,
    pub upgrades: Upgrades,
    pub stats: Stats,
}

impl Default for ProgressionRecord {
    fn default() -> Self {
        Self {
            total_coins: 0,
            owned_skins: BTreeSet::from([SkinId::Default]),
            equipped_skin: SkinId::Default,
            owned_music: BTreeSet::from([TrackId::Theme1]),
            equipped_music: TrackId::Theme1,
            music_enabled: true,
            settings: PlayerSettings::default(),
            inventory_powerups: Inventory::default(),
            upgrades: Upgrades::default(),
            stats: Stats::default(),
        }
    }
}

/// Recursively overlay `patch` onto `base`; objects merge, everything else replaces
fn merge_json(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Drop array elements under `key` that are not a known `T`
fn retain_known<T: serde::de::DeserializeOwned>(
    fields: &mut serde_json::Map<String, Value>,
    key: &str,
) {
    let Some(Value::Array(items)) = fields.get_mut(key) else {
        return;
    };
    let before = items.len();
    items.retain(|item| serde_json::from_value::<T>(item.clone()).is_ok());
    if items.len() < before {
        log::warn!(
            "Dropped {} unknown entries from progression field '{key}'",
            before - items.len()
        );
    }
}

impl ProgressionRecord {
    /// Parse a stored blob, merging it over the defaults field by field
    ///
    /// Fields that fail to deserialize fall back to their defaults; an
    /// unparseable blob yields the defaults.
    pub fn from_json(blob: &str) -> Self {
        let saved: Value = match serde_json::from_str(blob) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Discarding unreadable progression data: {e}");
                return Self::default();
            }
        };

        let defaults = match serde_json::to_value(Self::default()) {
            Ok(v) => v,
            Err(_) => return Self::default(),
        };
        let mut merged = defaults.clone();
        merge_json(&mut merged, saved);

        if let Value::Object(fields) = &mut merged {
            retain_known::<SkinId>(fields, "ownedSkins");
            retain_known::<TrackId>(fields, "ownedMusic");
        }

        // Reset any top-level field that does not fit its type
        if let (Value::Object(fields), Value::Object(default_fields)) = (&mut merged, &defaults) {
            for (key, default_value) in default_fields {
                let Some(value) = fields.get(key) else {
                    continue;
                };
                let mut candidate = defaults.clone();
                if let Value::Object(candidate_fields) = &mut candidate {
                    candidate_fields.insert(key.clone(), value.clone());
                }
                if serde_json::from_value::<Self>(candidate).is_err() {
                    log::warn!("Resetting invalid progression field '{key}'");
                    fields.insert(key.clone(), default_value.clone());
                }
            }
        }

        let mut record = serde_json::from_value::<Self>(merged).unwrap_or_default();
        record.sanitize();
        record
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Repair invariants: free defaults owned, equipped items owned,
    /// upgrade levels capped, sensitivity clamped
    pub fn sanitize(&mut self) {
        self.owned_skins.insert(SkinId::Default);
        self.owned_music.insert(TrackId::Theme1);
        if !self.owned_skins.contains(&self.equipped_skin) {
            self.equipped_skin = SkinId::Default;
        }
        if !self.owned_music.contains(&self.equipped_music) {
            self.equipped_music = TrackId::Theme1;
        }
        for kind in UpgradeKind::ALL {
            let level = self.upgrades.slot(kind);
            *level = (*level).min(kind.max_level());
        }
        self.settings.sensitivity = clamp_sensitivity(self.settings.sensitivity);
    }

    /// Whether every invariant currently holds
    pub fn is_consistent(&self) -> bool {
        self.owned_skins.contains(&SkinId::Default)
            && self.owned_music.contains(&TrackId::Theme1)
            && self.owned_skins.contains(&self.equipped_skin)
            && self.owned_music.contains(&self.equipped_music)
            && UpgradeKind::ALL
                .iter()
                .all(|k| self.upgrades.get(*k) <= k.max_level())
            && (MIN_SENSITIVITY..=MAX_SENSITIVITY).contains(&self.settings.sensitivity)
    }

    /// Coin multiplier in percent (gold skin + coin upgrades)
    pub fn coin_pct(&self) -> u64 {
        coin_multiplier_pct(
            self.equipped_skin.coin_bonus(),
            self.upgrades.get(UpgradeKind::CoinMultiplier),
        )
    }

    /// Simulation parameters for a run
    pub fn loadout(&self) -> Loadout {
        let speed_level = self.upgrades.get(UpgradeKind::SpeedBoost) as f32;
        let damage_level = self.upgrades.get(UpgradeKind::DamageBoost) as f32;
        Loadout {
            skin: self.equipped_skin,
            player_speed: PLAYER_BASE_SPEED * (1.0 + 0.15 * speed_level) * self.settings.sensitivity,
            damage: 1.0 + 0.1 * damage_level,
            coin_pct: self.coin_pct(),
            bonus_lives: self.upgrades.get(UpgradeKind::HealthBoost),
        }
    }
}

fn clamp_sensitivity(value: f32) -> f32 {
    if value.is_nan() {
        return 1.0;
    }
    value.clamp(MIN_SENSITIVITY, MAX_SENSITIVITY)
}

// === Store ===

/// Progression record bound to its backing store
#[derive(Debug)]
pub struct ProgressionStore<S: BlobStore> {
    store: S,
    record: ProgressionRecord,
}

impl<S: BlobStore> ProgressionStore<S> {
    /// Load the record from `store`, falling back to defaults
    pub fn load(store: S) -> Self {
        let record = match store.load(DATA_KEY) {
            Ok(Some(blob)) => {
                let record = ProgressionRecord::from_json(&blob);
                log::info!(
                    "Loaded progression: {} coins, {} games played",
                    record.total_coins,
                    record.stats.games_played
                );
                record
            }
            Ok(None) => ProgressionRecord::default(),
            Err(e) => {
                log::warn!("Failed to load progression: {e}");
                ProgressionRecord::default()
            }
        };
        Self { store, record }
    }

    pub fn record(&self) -> &ProgressionRecord {
        &self.record
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Backing store, for data kept beside the record (settings)
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn coins(&self) -> u64 {
        self.record.total_coins
    }

    pub fn loadout(&self) -> Loadout {
        self.record.loadout()
    }

    /// Write the record through to the store
    pub fn save(&mut self) {
        let result = self
            .record
            .to_json()
            .map_err(StoreError::from)
            .and_then(|json| self.store.save(DATA_KEY, &json));
        if let Err(e) = result {
            log::warn!("Failed to save progression: {e}");
        }
    }

    /// Apply `f`; persist and repair invariants only when it reports a change
    fn mutate(&mut self, f: impl FnOnce(&mut ProgressionRecord) -> bool) -> bool {
        let changed = f(&mut self.record);
        if changed {
            self.record.sanitize();
            self.save();
        }
        changed
    }

    fn spend(record: &mut ProgressionRecord, price: u64) -> bool {
        if record.total_coins < price {
            return false;
        }
        record.total_coins -= price;
        true
    }

    pub fn buy_skin(&mut self, id: SkinId) -> bool {
        let bought = self.mutate(|r| {
            !r.owned_skins.contains(&id) && Self::spend(r, id.price()) && r.owned_skins.insert(id)
        });
        if bought {
            log::info!("Bought skin {:?} for {}", id, id.price());
        }
        bought
    }

    pub fn equip_skin(&mut self, id: SkinId) -> bool {
        self.mutate(|r| {
            if !r.owned_skins.contains(&id) || r.equipped_skin == id {
                return false;
            }
            r.equipped_skin = id;
            true
        })
    }

    pub fn buy_track(&mut self, id: TrackId) -> bool {
        let bought = self.mutate(|r| {
            !r.owned_music.contains(&id) && Self::spend(r, id.price()) && r.owned_music.insert(id)
        });
        if bought {
            log::info!("Bought track {:?} for {}", id, id.price());
        }
        bought
    }

    pub fn equip_track(&mut self, id: TrackId) -> bool {
        self.mutate(|r| {
            if !r.owned_music.contains(&id) || r.equipped_music == id {
                return false;
            }
            r.equipped_music = id;
            true
        })
    }

    pub fn buy_powerup(&mut self, kind: PowerupKind) -> bool {
        let price = powerup_price(kind);
        let bought = self.mutate(|r| {
            if !Self::spend(r, price) {
                return false;
            }
            *r.inventory_powerups.slot(kind) += 1;
            true
        });
        if bought {
            log::info!("Bought {} charge for {}", kind.as_str(), price);
        }
        bought
    }

    /// Next level of `kind` at `basePrice * (level + 1)`
    pub fn buy_upgrade(&mut self, kind: UpgradeKind) -> bool {
        let level = self.record.upgrades.get(kind);
        if level >= kind.max_level() {
            return false;
        }
        let price = kind.price_at(level);
        let bought = self.mutate(|r| {
            if !Self::spend(r, price) {
                return false;
            }
            *r.upgrades.slot(kind) += 1;
            true
        });
        if bought {
            log::info!("Upgraded {:?} to level {} for {}", kind, level + 1, price);
        }
        bought
    }

    /// Consume one inventory charge
    pub fn use_powerup(&mut self, kind: PowerupKind) -> bool {
        self.mutate(|r| {
            let charges = r.inventory_powerups.slot(kind);
            if *charges == 0 {
                return false;
            }
            *charges -= 1;
            true
        })
    }

    pub fn set_sensitivity(&mut self, value: f32) -> bool {
        let value = clamp_sensitivity(value);
        self.mutate(|r| {
            if r.settings.sensitivity == value {
                return false;
            }
            r.settings.sensitivity = value;
            true
        })
    }

    pub fn set_music_enabled(&mut self, enabled: bool) -> bool {
        self.mutate(|r| {
            if r.music_enabled == enabled {
                return false;
            }
            r.music_enabled = enabled;
            true
        })
    }

    pub fn toggle_music(&mut self) -> bool {
        let enabled = !self.record.music_enabled;
        self.set_music_enabled(enabled)
    }

    /// Fold a finished run into lifetime stats and credit its coins
    pub fn record_run(&mut self, run: &RunSummary) -> bool {
        let changed = self.mutate(|r| {
            let stats = &mut r.stats;
            stats.games_played += 1;
            stats.high_score = stats.high_score.max(run.score);
            stats.max_level = stats.max_level.max(run.level);
            stats.total_kills += run.kills as u64;
            stats.bosses_killed += run.bosses_killed as u64;
            stats.total_coins_earned += run.coins_earned;
            r.total_coins += run.coins_earned;
            true
        });
        log::info!(
            "Run recorded: score {}, level {}, +{} coins (balance {})",
            run.score,
            run.level,
            run.coins_earned,
            self.record.total_coins
        );
        changed
    }

    /// Credit coins from an abandoned run without touching stats
    pub fn bank_coins(&mut self, amount: u64) -> bool {
        self.mutate(|r| {
            if amount == 0 {
                return false;
            }
            r.total_coins += amount;
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use proptest::prelude::*;

    fn store_with_coins(coins: u64) -> ProgressionStore<MemoryStore> {
        let record = ProgressionRecord {
            total_coins: coins,
            ..Default::default()
        };
        let blob = record.to_json().unwrap();
        ProgressionStore::load(MemoryStore::new().with_blob(DATA_KEY, &blob))
    }

    #[test]
    fn test_default_record_json_shape() {
        let json: Value = serde_json::to_value(ProgressionRecord::default()).unwrap();
        assert_eq!(json["totalCoins"], 0);
        assert_eq!(json["ownedSkins"], serde_json::json!(["default"]));
        assert_eq!(json["equippedMusic"], "theme1");
        assert_eq!(json["settings"]["sensitivity"], 1.0);
        assert_eq!(json["inventoryPowerups"]["rapidFire"], 0);
        assert_eq!(json["upgrades"]["coinMultiplier"], 0);
        assert_eq!(json["stats"]["totalCoinsEarned"], 0);
    }

    #[test]
    fn test_partial_blob_merges_over_defaults() {
        let blob = r#"{"totalCoins": 420, "stats": {"highScore": 9000}, "upgrades": {"speedBoost": 2}}"#;
        let record = ProgressionRecord::from_json(blob);
        assert_eq!(record.total_coins, 420);
        assert_eq!(record.stats.high_score, 9000);
        assert_eq!(record.stats.games_played, 0);
        assert_eq!(record.upgrades.speed_boost, 2);
        assert_eq!(record.upgrades.damage_boost, 0);
        assert!(record.music_enabled);
        assert!(record.owned_skins.contains(&SkinId::Default));
    }

    #[test]
    fn test_bad_field_falls_back_alone() {
        let blob = r#"{"totalCoins": "lots", "equippedSkin": "red", "ownedSkins": ["red"], "musicEnabled": false}"#;
        let record = ProgressionRecord::from_json(blob);
        assert_eq!(record.total_coins, 0);
        assert_eq!(record.equipped_skin, SkinId::Red);
        assert!(record.owned_skins.contains(&SkinId::Red));
        assert!(record.owned_skins.contains(&SkinId::Default));
        assert!(!record.music_enabled);
    }

    #[test]
    fn test_unknown_catalog_ids_dropped_individually() {
        let blob = r#"{"ownedSkins": ["red", "platinum"], "equippedSkin": "red", "ownedMusic": ["theme3", 4]}"#;
        let record = ProgressionRecord::from_json(blob);
        assert_eq!(
            record.owned_skins,
            BTreeSet::from([SkinId::Default, SkinId::Red])
        );
        assert_eq!(record.equipped_skin, SkinId::Red);
        assert_eq!(
            record.owned_music,
            BTreeSet::from([TrackId::Theme1, TrackId::Theme3])
        );
    }

    #[test]
    fn test_garbage_blob_yields_defaults() {
        assert_eq!(
            ProgressionRecord::from_json("not json {"),
            ProgressionRecord::default()
        );
    }

    #[test]
    fn test_load_repairs_invariants() {
        let blob = r#"{"equippedSkin": "gold", "ownedMusic": [], "upgrades": {"healthBoost": 9}, "settings": {"sensitivity": 7.5}}"#;
        let record = ProgressionRecord::from_json(blob);
        assert_eq!(record.equipped_skin, SkinId::Default);
        assert!(record.owned_music.contains(&TrackId::Theme1));
        assert_eq!(record.upgrades.health_boost, 3);
        assert_eq!(record.settings.sensitivity, 2.0);
        assert!(record.is_consistent());
    }

    #[test]
    fn test_buy_and_equip_skin() {
        let mut store = store_with_coins(2000);
        assert!(!store.equip_skin(SkinId::Gold));
        assert!(store.buy_skin(SkinId::Gold));
        assert_eq!(store.coins(), 500);
        assert!(store.equip_skin(SkinId::Gold));
        assert_eq!(store.record().coin_pct(), 125);
        assert_eq!(store.store().writes(), 2);

        let saved = ProgressionRecord::from_json(store.store().get(DATA_KEY).unwrap());
        assert_eq!(saved.equipped_skin, SkinId::Gold);
    }

    #[test]
    fn test_failed_purchase_is_byte_identical_noop() {
        let mut store = store_with_coins(600);
        assert!(store.buy_skin(SkinId::Red));
        let before = store.record().to_json().unwrap();
        let writes = store.store().writes();

        // Already owned
        assert!(!store.buy_skin(SkinId::Red));
        // Too expensive
        assert!(!store.buy_skin(SkinId::Blue));
        assert!(!store.buy_track(TrackId::Theme2));
        assert!(!store.buy_upgrade(UpgradeKind::CoinMultiplier));
        assert!(!store.buy_powerup(PowerupKind::Bomb));
        // Nothing to consume
        assert!(!store.use_powerup(PowerupKind::Shield));

        assert_eq!(store.record().to_json().unwrap(), before);
        assert_eq!(store.store().writes(), writes);
    }

    #[test]
    fn test_upgrade_pricing_and_cap() {
        let mut store = store_with_coins(100_000);
        let mut spent = 0;
        for level in 0..3 {
            spent += UpgradeKind::HealthBoost.price_at(level);
            assert!(store.buy_upgrade(UpgradeKind::HealthBoost));
        }
        // 400 + 800 + 1200
        assert_eq!(spent, 2400);
        assert_eq!(store.coins(), 100_000 - 2400);
        assert!(!store.buy_upgrade(UpgradeKind::HealthBoost));
        assert_eq!(store.record().upgrades.health_boost, 3);
        assert_eq!(store.loadout().bonus_lives, 3);
    }

    #[test]
    fn test_powerup_inventory() {
        let mut store = store_with_coins(300);
        assert!(store.buy_powerup(PowerupKind::Shield));
        assert!(store.buy_powerup(PowerupKind::MultiShot));
        assert_eq!(store.coins(), 50);
        assert_eq!(store.record().inventory_powerups.get(PowerupKind::Shield), 1);
        assert!(store.use_powerup(PowerupKind::Shield));
        assert!(!store.use_powerup(PowerupKind::Shield));
    }

    #[test]
    fn test_sensitivity_clamped() {
        let mut store = store_with_coins(0);
        assert!(store.set_sensitivity(5.0));
        assert_eq!(store.record().settings.sensitivity, 2.0);
        assert!(!store.set_sensitivity(3.0));
        assert!(store.set_sensitivity(0.1));
        assert_eq!(store.record().settings.sensitivity, 0.5);
    }

    #[test]
    fn test_music_toggle() {
        let mut store = store_with_coins(0);
        assert!(!store.set_music_enabled(true));
        assert!(store.toggle_music());
        assert!(!store.record().music_enabled);
    }

    #[test]
    fn test_record_run_updates_stats() {
        let mut store = store_with_coins(10);
        store.record_run(&RunSummary {
            score: 1200,
            level: 3,
            kills: 12,
            bosses_killed: 0,
            coins_earned: 60,
        });
        store.record_run(&RunSummary {
            score: 800,
            level: 6,
            kills: 20,
            bosses_killed: 1,
            coins_earned: 140,
        });
        let stats = store.record().stats;
        assert_eq!(stats.games_played, 2);
        assert_eq!(stats.high_score, 1200);
        assert_eq!(stats.max_level, 6);
        assert_eq!(stats.total_kills, 32);
        assert_eq!(stats.bosses_killed, 1);
        assert_eq!(stats.total_coins_earned, 200);
        assert_eq!(store.coins(), 210);
    }

    #[test]
    fn test_loadout_from_upgrades() {
        let mut record = ProgressionRecord::default();
        record.upgrades.speed_boost = 2;
        record.upgrades.damage_boost = 5;
        record.upgrades.coin_multiplier = 3;
        record.owned_skins.insert(SkinId::Gold);
        record.equipped_skin = SkinId::Gold;
        record.settings.sensitivity = 2.0;

        let loadout = record.loadout();
        assert!((loadout.player_speed - 7.0 * 1.3 * 2.0).abs() < 1e-4);
        assert!((loadout.damage - 1.5).abs() < 1e-6);
        assert_eq!(loadout.coin_pct, 155);
        assert_eq!(loadout.skin, SkinId::Gold);
    }

    #[derive(Debug, Clone)]
    enum Op {
        BuySkin(usize),
        EquipSkin(usize),
        BuyTrack(usize),
        EquipTrack(usize),
        BuyPowerup(usize),
        UsePowerup(usize),
        BuyUpgrade(usize),
        Sensitivity(f32),
        ToggleMusic,
        Bank(u64),
        Run(u64, u32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..SkinId::ALL.len()).prop_map(Op::BuySkin),
            (0..SkinId::ALL.len()).prop_map(Op::EquipSkin),
            (0..TrackId::ALL.len()).prop_map(Op::BuyTrack),
            (0..TrackId::ALL.len()).prop_map(Op::EquipTrack),
            (0..PowerupKind::ALL.len()).prop_map(Op::BuyPowerup),
            (0..PowerupKind::ALL.len()).prop_map(Op::UsePowerup),
            (0..UpgradeKind::ALL.len()).prop_map(Op::BuyUpgrade),
            (-5.0f32..5.0).prop_map(Op::Sensitivity),
            Just(Op::ToggleMusic),
            (0u64..3000).prop_map(Op::Bank),
            (0u64..5000, 1u32..20).prop_map(|(score, level)| Op::Run(score, level)),
        ]
    }

    proptest! {
        #[test]
        fn prop_invariants_survive_any_sequence(ops in prop::collection::vec(op_strategy(), 1..60)) {
            let mut store = store_with_coins(1000);
            for op in ops {
                let coins_before = store.coins();
                let json_before = store.record().to_json().unwrap();
                let changed = match op {
                    Op::BuySkin(i) => store.buy_skin(SkinId::ALL[i]),
                    Op::EquipSkin(i) => store.equip_skin(SkinId::ALL[i]),
                    Op::BuyTrack(i) => store.buy_track(TrackId::ALL[i]),
                    Op::EquipTrack(i) => store.equip_track(TrackId::ALL[i]),
                    Op::BuyPowerup(i) => store.buy_powerup(PowerupKind::ALL[i]),
                    Op::UsePowerup(i) => store.use_powerup(PowerupKind::ALL[i]),
                    Op::BuyUpgrade(i) => store.buy_upgrade(UpgradeKind::ALL[i]),
                    Op::Sensitivity(v) => store.set_sensitivity(v),
                    Op::ToggleMusic => store.toggle_music(),
                    Op::Bank(amount) => store.bank_coins(amount),
                    Op::Run(score, level) => store.record_run(&RunSummary {
                        score,
                        level,
                        kills: 3,
                        bosses_killed: 0,
                        coins_earned: score / 20,
                    }),
                };
                prop_assert!(store.record().is_consistent());
                if !changed {
                    prop_assert_eq!(store.coins(), coins_before);
                    prop_assert_eq!(store.record().to_json().unwrap(), json_before);
                }
            }

            // Whatever was written reloads to the same record
            if let Some(blob) = store.store().get(DATA_KEY) {
                let mut reloaded = ProgressionRecord::from_json(blob);
                let current = store.record();
                prop_assert!((reloaded.settings.sensitivity - current.settings.sensitivity).abs() < 1e-6);
                reloaded.settings = current.settings;
                prop_assert_eq!(&reloaded, current);
            }
        }
    }
}
