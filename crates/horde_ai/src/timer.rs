//! Per-agent deferred actions
//!
//! Nothing here holds a callback. A scheduled entry is plain data naming what
//! should happen; the agent interprets it when it comes due. Every token
//! carries the occupant epoch it was issued under, so recycling an agent
//! (which bumps the epoch) makes all of its old tokens inert.

use crate::cooldown::AbilityId;
use crate::state_machine::AgentState;

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// Cooldown elapsed
    AbilityReady(AbilityId),
    /// Windup elapsed; resolve or start the ability
    Windup(AbilityId),
    /// A timed state ran out
    StateExpiry(AgentState),
    /// Intermediate-state hold ended
    TransitionResume,
    /// Death animation window ended; release to pool
    DeathExit,
}

/// Identifies one scheduled action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    seq: u32,
    epoch: u32,
}

impl TimerToken {
    pub fn epoch(&self) -> u32 {
        self.epoch
    }
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    token: TimerToken,
    due_ms: u64,
    action: Deferred,
}

/// Pending actions for one agent
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    pending: Vec<Scheduled>,
    epoch: u32,
    next_seq: u32,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` at `now_ms + delay_ms`
    pub fn schedule(&mut self, now_ms: u64, delay_ms: u64, action: Deferred) -> TimerToken {
        let token = TimerToken {
            seq: self.next_seq,
            epoch: self.epoch,
        };
        self.next_seq = self.next_seq.wrapping_add(1);
        self.pending.push(Scheduled {
            token,
            due_ms: now_ms.saturating_add(delay_ms),
            action,
        });
        token
    }

    pub fn cancel(&mut self, token: TimerToken) -> bool {
        match self.pending.iter().position(|s| s.token == token) {
            Some(index) => {
                self.pending.remove(index);
                true
            }
            None => false,
        }
    }

    /// Cancel every pending action matching `predicate`
    pub fn cancel_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&Deferred) -> bool,
    {
        let before = self.pending.len();
        self.pending.retain(|s| !predicate(&s.action));
        before - self.pending.len()
    }

    /// Remove and return the earliest action due at `now_ms`.
    ///
    /// Ties go to whichever was scheduled first.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(TimerToken, Deferred)> {
        let mut best: Option<(usize, u64, u32)> = None;
        for (index, scheduled) in self.pending.iter().enumerate() {
            if scheduled.due_ms > now_ms {
                continue;
            }
            let key = (scheduled.due_ms, scheduled.token.seq);
            match best {
                Some((_, due, seq)) if (due, seq) <= key => {}
                _ => best = Some((index, key.0, key.1)),
            }
        }
        let (index, _, _) = best?;
        let scheduled = self.pending.remove(index);
        Some((scheduled.token, scheduled.action))
    }

    /// Whether a token belongs to the current occupant
    #[inline]
    pub fn is_current(&self, token: TimerToken) -> bool {
        token.epoch == self.epoch
    }

    /// Drop everything and move to a new epoch
    pub fn invalidate(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.pending.clear();
    }

    pub fn is_pending<F>(&self, mut predicate: F) -> bool
    where
        F: FnMut(&Deferred) -> bool,
    {
        self.pending.iter().any(|s| predicate(&s.action))
    }

    /// Due time of the earliest pending action
    pub fn next_due(&self) -> Option<u64> {
        self.pending.iter().map(|s| s.due_ms).min()
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_due_in_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(0, 300, Deferred::DeathExit);
        timers.schedule(0, 100, Deferred::AbilityReady(AbilityId::Basic));
        timers.schedule(0, 100, Deferred::TransitionResume);

        assert_eq!(timers.pop_due(50), None);
        assert_eq!(timers.pop_due(100).map(|(_, a)| a), Some(Deferred::AbilityReady(AbilityId::Basic)));
        assert_eq!(timers.pop_due(100).map(|(_, a)| a), Some(Deferred::TransitionResume));
        assert_eq!(timers.pop_due(299), None);
        assert_eq!(timers.next_due(), Some(300));
        assert_eq!(timers.pop_due(1_000).map(|(_, a)| a), Some(Deferred::DeathExit));
        assert!(timers.is_empty());
    }

    #[test]
    fn test_cancel() {
        let mut timers = TimerQueue::new();
        let token = timers.schedule(0, 10, Deferred::Windup(AbilityId::Slam));
        timers.schedule(0, 10, Deferred::StateExpiry(AgentState::Hurt));
        assert!(timers.cancel(token));
        assert!(!timers.cancel(token));
        assert_eq!(timers.cancel_where(|a| matches!(a, Deferred::StateExpiry(_))), 1);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_invalidate_bumps_epoch() {
        let mut timers = TimerQueue::new();
        let old = timers.schedule(0, 10, Deferred::DeathExit);
        timers.invalidate();
        assert!(timers.is_empty());
        assert!(!timers.is_current(old));

        let fresh = timers.schedule(0, 10, Deferred::DeathExit);
        assert!(timers.is_current(fresh));
        assert_eq!(fresh.epoch(), old.epoch() + 1);
    }
}
