//! Timed status effects

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    /// Cannot move or act
    Stun,
    /// Movement speed reduced by `magnitude` (0.0 - 1.0)
    Slow,
}

/// A status effect with an explicit duration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub duration_ms: u64,
    #[serde(default)]
    pub magnitude: f32,
}

impl StatusEffect {
    pub fn stun(duration_ms: u64) -> Self {
        Self { kind: StatusKind::Stun, duration_ms, magnitude: 1.0 }
    }

    pub fn slow(duration_ms: u64, magnitude: f32) -> Self {
        Self {
            kind: StatusKind::Slow,
            duration_ms,
            magnitude: magnitude.clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveEffect {
    effect: StatusEffect,
    expires_at_ms: u64,
}

/// Status effects currently applied to one entity
#[derive(Debug, Clone, Default)]
pub struct StatusEffects {
    active: Vec<ActiveEffect>,
}

impl StatusEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an effect. Reapplying a kind keeps the later expiry and the
    /// stronger magnitude.
    pub fn apply(&mut self, effect: StatusEffect, now_ms: u64) {
        let expires_at_ms = now_ms.saturating_add(effect.duration_ms);
        if let Some(existing) = self.active.iter_mut().find(|a| a.effect.kind == effect.kind) {
            existing.expires_at_ms = existing.expires_at_ms.max(expires_at_ms);
            existing.effect.magnitude = existing.effect.magnitude.max(effect.magnitude);
            return;
        }
        self.active.push(ActiveEffect { effect, expires_at_ms });
    }

    /// Drop expired effects, returning how many ended
    pub fn update(&mut self, now_ms: u64) -> usize {
        let before = self.active.len();
        self.active.retain(|a| a.expires_at_ms > now_ms);
        let ended = before - self.active.len();
        if ended > 0 {
            log::trace!("{} status effect(s) expired at {}ms", ended, now_ms);
        }
        ended
    }

    pub fn has(&self, kind: StatusKind, now_ms: u64) -> bool {
        self.active
            .iter()
            .any(|a| a.effect.kind == kind && a.expires_at_ms > now_ms)
    }

    pub fn is_stunned(&self, now_ms: u64) -> bool {
        self.has(StatusKind::Stun, now_ms)
    }

    /// Movement multiplier after slows and stuns
    pub fn speed_multiplier(&self, now_ms: u64) -> f32 {
        if self.is_stunned(now_ms) {
            return 0.0;
        }
        self.active
            .iter()
            .filter(|a| a.effect.kind == StatusKind::Slow && a.expires_at_ms > now_ms)
            .map(|a| 1.0 - a.effect.magnitude)
            .fold(1.0, f32::min)
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}
