//! Agent states, the distance classifier and the transition validator

use serde::{Deserialize, Serialize};
use std::fmt;

/// Behavioral state of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    #[default]
    Idle,
    Patrol,
    Chase,
    Attack,
    Charge,
    Hurt,
    Stunned,
    Die,
}

impl AgentState {
    pub const COUNT: usize = 8;

    pub const ALL: [AgentState; Self::COUNT] = [
        AgentState::Idle,
        AgentState::Patrol,
        AgentState::Chase,
        AgentState::Attack,
        AgentState::Charge,
        AgentState::Hurt,
        AgentState::Stunned,
        AgentState::Die,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    #[inline]
    fn bit(self) -> u8 {
        1 << self.index()
    }

    /// States that only their own expiry (or death) may leave
    pub fn is_uninterruptible(self) -> bool {
        matches!(self, AgentState::Hurt | AgentState::Stunned | AgentState::Charge)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AgentState::Idle => "idle",
            AgentState::Patrol => "patrol",
            AgentState::Chase => "chase",
            AgentState::Attack => "attack",
            AgentState::Charge => "charge",
            AgentState::Hurt => "hurt",
            AgentState::Stunned => "stunned",
            AgentState::Die => "die",
        }
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the classifier looks at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierInput {
    /// Squared distance to the target (infinite when the target is dead)
    pub distance_sq: f32,
    pub attack_range: f32,
    pub detection_range: f32,
    pub basic_attack_ready: bool,
    pub has_patrol_route: bool,
}

/// Propose the next state from distance and readiness. First match wins.
pub fn classify(input: &ClassifierInput) -> AgentState {
    let attack_sq = input.attack_range * input.attack_range;
    let detect_sq = input.detection_range * input.detection_range;

    if input.distance_sq <= attack_sq && input.basic_attack_ready {
        AgentState::Attack
    } else if input.distance_sq <= detect_sq {
        AgentState::Chase
    } else if input.has_patrol_route {
        AgentState::Patrol
    } else {
        AgentState::Idle
    }
}

/// Who asked for a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionCause {
    Classifier,
    Ability,
    Damage,
    Stun,
    /// A state's own timer ran out
    Expiry,
    Death,
}

/// Verdict of [`TransitionTable::validate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionDecision {
    /// Already in the requested state
    NoOp,
    Direct,
    /// Enter `intermediate` and hold for `delay_ms` before re-evaluating
    Via {
        intermediate: AgentState,
        delay_ms: u64,
    },
    Rejected,
}

impl TransitionDecision {
    /// Whether the agent ends up in a different state
    pub fn changes_state(self) -> bool {
        matches!(self, TransitionDecision::Direct | TransitionDecision::Via { .. })
    }
}

/// Legal direct transitions for one species.
///
/// Rows are bitsets indexed by [`AgentState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TransitionTableDef", into = "TransitionTableDef")]
pub struct TransitionTable {
    legal: [u8; AgentState::COUNT],
    intermediate: AgentState,
    delay_ms: u64,
}

impl TransitionTable {
    pub const DEFAULT_DELAY_MS: u64 = 150;

    /// A table with no legal pairs
    pub fn empty() -> Self {
        Self {
            legal: [0; AgentState::COUNT],
            intermediate: AgentState::Idle,
            delay_ms: Self::DEFAULT_DELAY_MS,
        }
    }

    pub fn allow(&mut self, from: AgentState, to: AgentState) -> &mut Self {
        self.legal[from.index()] |= to.bit();
        self
    }

    pub fn allow_all(&mut self, from: AgentState, targets: &[AgentState]) -> &mut Self {
        for &to in targets {
            self.allow(from, to);
        }
        self
    }

    pub fn with_intermediate(mut self, intermediate: AgentState, delay_ms: u64) -> Self {
        self.intermediate = intermediate;
        self.delay_ms = delay_ms;
        self
    }

    #[inline]
    pub fn is_legal(&self, from: AgentState, to: AgentState) -> bool {
        self.legal[from.index()] & to.bit() != 0
    }

    pub fn intermediate(&self) -> AgentState {
        self.intermediate
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    /// Decide how `from -> to` is carried out
    pub fn validate(&self, from: AgentState, to: AgentState, cause: TransitionCause) -> TransitionDecision {
        if from == to {
            return TransitionDecision::NoOp;
        }
        if from == AgentState::Die {
            return TransitionDecision::Rejected;
        }
        if to == AgentState::Die {
            return TransitionDecision::Direct;
        }
        if from.is_uninterruptible() {
            return if cause == TransitionCause::Expiry {
                TransitionDecision::Direct
            } else {
                TransitionDecision::Rejected
            };
        }
        if matches!(cause, TransitionCause::Damage | TransitionCause::Stun) {
            return TransitionDecision::Direct;
        }
        if self.is_legal(from, to) {
            return TransitionDecision::Direct;
        }
        if from == self.intermediate {
            return TransitionDecision::Rejected;
        }
        TransitionDecision::Via {
            intermediate: self.intermediate,
            delay_ms: self.delay_ms,
        }
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        use AgentState::*;

        let mut table = Self::empty();
        table
            .allow_all(Idle, &[Patrol, Chase, Attack])
            .allow_all(Patrol, &[Idle, Chase, Attack])
            .allow_all(Chase, &[Idle, Patrol, Attack, Charge])
            .allow_all(Attack, &[Idle, Chase]);
        table
    }
}

/// One row of the legal table as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRule {
    pub from: AgentState,
    pub to: Vec<AgentState>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TransitionTableDef {
    #[serde(default)]
    intermediate: AgentState,
    #[serde(default = "default_delay_ms")]
    delay_ms: u64,
    #[serde(default)]
    legal: Vec<TransitionRule>,
}

fn default_delay_ms() -> u64 {
    TransitionTable::DEFAULT_DELAY_MS
}

impl From<TransitionTableDef> for TransitionTable {
    fn from(def: TransitionTableDef) -> Self {
        let mut table = if def.legal.is_empty() {
            TransitionTable::default()
        } else {
            let mut table = TransitionTable::empty();
            for rule in &def.legal {
                table.allow_all(rule.from, &rule.to);
            }
            table
        };
        table.intermediate = def.intermediate;
        table.delay_ms = def.delay_ms;
        table
    }
}

impl From<TransitionTable> for TransitionTableDef {
    fn from(table: TransitionTable) -> Self {
        let legal = AgentState::ALL
            .iter()
            .filter_map(|&from| {
                let to: Vec<AgentState> = AgentState::ALL
                    .iter()
                    .copied()
                    .filter(|&to| table.is_legal(from, to))
                    .collect();
                (!to.is_empty()).then_some(TransitionRule { from, to })
            })
            .collect();
        Self {
            intermediate: table.intermediate,
            delay_ms: table.delay_ms,
            legal,
        }
    }
}

/// Current and previous state of one agent
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    current: AgentState,
    previous: Option<AgentState>,
    entered_at_ms: u64,
}

impl StateMachine {
    pub fn new(initial: AgentState, now_ms: u64) -> Self {
        Self {
            current: initial,
            previous: None,
            entered_at_ms: now_ms,
        }
    }

    #[inline]
    pub fn current(&self) -> AgentState {
        self.current
    }

    #[inline]
    pub fn previous(&self) -> Option<AgentState> {
        self.previous
    }

    #[inline]
    pub fn is_in(&self, state: AgentState) -> bool {
        self.current == state
    }

    pub fn time_in_state(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.entered_at_ms)
    }

    /// Switch without validation, returning the state left
    pub fn force_transition(&mut self, to: AgentState, now_ms: u64) -> AgentState {
        let from = self.current;
        self.previous = Some(from);
        self.current = to;
        self.entered_at_ms = now_ms;
        from
    }

    pub fn reset(&mut self, initial: AgentState, now_ms: u64) {
        *self = Self::new(initial, now_ms);
    }
}
