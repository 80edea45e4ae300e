use crate::model::{LevelChangeResult, LevelState, LevelingSettings};

//
// ─── POLICY ────────────────────────────────────────────────────────────────────
//

/// Streak-based difficulty adjustment.
///
/// `correct_to_level_up` consecutive correct answers move the level up by one;
/// a single incorrect answer moves it down by one and clears the streak. The
/// level never leaves `[min_level, max_level]`.
///
/// The policy is stateless: callers own the [`LevelState`] and get a new one
/// back from every call. Solo sessions and every multiplayer seat share this
/// one implementation.
///
/// # Examples
///
/// ```
/// # use quiz_core::AdaptiveLevelPolicy;
/// # use quiz_core::model::LevelChangeResult;
/// let policy = AdaptiveLevelPolicy::default();
/// let state = policy.start(10);
///
/// let (state, first) = policy.record_answer(state, true);
/// assert_eq!(first, LevelChangeResult::NoChange { level: 10, streak: 1 });
///
/// let (state, second) = policy.record_answer(state, true);
/// assert_eq!(second, LevelChangeResult::LeveledUp { from: 10, to: 11 });
/// assert_eq!(state.consecutive_correct(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdaptiveLevelPolicy {
    settings: LevelingSettings,
}

impl AdaptiveLevelPolicy {
    #[must_use]
    pub fn new(settings: LevelingSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> LevelingSettings {
        self.settings
    }

    #[must_use]
    pub fn min_level(&self) -> u32 {
        self.settings.min_level()
    }

    #[must_use]
    pub fn max_level(&self) -> u32 {
        self.settings.max_level()
    }

    /// Initial state for a session entered at `level` (clamped).
    #[must_use]
    pub fn start(&self, level: u32) -> LevelState {
        self.reset(level)
    }

    /// Clamp `to_level` into bounds and zero the streak.
    #[must_use]
    pub fn reset(&self, to_level: u32) -> LevelState {
        LevelState::new(self.settings.clamp(to_level), 0)
    }

    /// Apply one answer outcome.
    #[must_use]
    pub fn record_answer(&self, state: LevelState, correct: bool) -> (LevelState, LevelChangeResult) {
        // Tolerate states built under wider bounds.
        let level = self.settings.clamp(state.level());

        if correct {
            let streak = state.consecutive_correct().saturating_add(1);
            if streak < self.settings.correct_to_level_up() {
                return (
                    LevelState::new(level, streak),
                    LevelChangeResult::NoChange { level, streak },
                );
            }
            self.level_up(level)
        } else {
            self.level_down(level)
        }
    }

    fn level_up(&self, level: u32) -> (LevelState, LevelChangeResult) {
        let max = self.settings.max_level();
        if level < max {
            let to = level + 1;
            (
                LevelState::new(to, 0),
                LevelChangeResult::LeveledUp { from: level, to },
            )
        } else {
            (
                LevelState::new(max, 0),
                LevelChangeResult::AtMaxLevel { level: max },
            )
        }
    }

    fn level_down(&self, level: u32) -> (LevelState, LevelChangeResult) {
        let min = self.settings.min_level();
        if level > min {
            let to = level - 1;
            (
                LevelState::new(to, 0),
                LevelChangeResult::LeveledDown { from: level, to },
            )
        } else {
            (
                LevelState::new(min, 0),
                LevelChangeResult::AtMinLevel { level: min },
            )
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> AdaptiveLevelPolicy {
        AdaptiveLevelPolicy::default()
    }

    #[test]
    fn two_correct_level_up_once() {
        let p = policy();
        let s = p.start(5);
        let (s, first) = p.record_answer(s, true);
        assert_eq!(first, LevelChangeResult::NoChange { level: 5, streak: 1 });
        assert_eq!(s.consecutive_correct(), 1);

        let (s, second) = p.record_answer(s, true);
        assert_eq!(second, LevelChangeResult::LeveledUp { from: 5, to: 6 });
        assert_eq!(s.level(), 6);
        assert_eq!(s.consecutive_correct(), 0);
    }

    #[test]
    fn incorrect_levels_down_and_clears_streak() {
        let p = policy();
        let (s, _) = p.record_answer(p.start(5), true);
        let (s, change) = p.record_answer(s, false);
        assert_eq!(change, LevelChangeResult::LeveledDown { from: 5, to: 4 });
        assert_eq!(s.consecutive_correct(), 0);
        assert_eq!(s.level(), 4);
    }

    #[test]
    fn ceiling_is_absorbing_upwards() {
        let p = policy();
        let s = p.start(65);
        let (s, first) = p.record_answer(s, true);
        assert_eq!(first, LevelChangeResult::NoChange { level: 65, streak: 1 });
        let (s, second) = p.record_answer(s, true);
        assert_eq!(second, LevelChangeResult::AtMaxLevel { level: 65 });
        assert_eq!(s.level(), 65);
        assert_eq!(s.consecutive_correct(), 0);
    }

    #[test]
    fn floor_is_absorbing_downwards() {
        let p = policy();
        let (s, change) = p.record_answer(p.start(1), false);
        assert_eq!(change, LevelChangeResult::AtMinLevel { level: 1 });
        assert_eq!(s.level(), 1);
        assert_eq!(s.consecutive_correct(), 0);
    }

    #[test]
    fn reset_clamps_and_zeroes_streak() {
        let p = policy();
        assert_eq!(p.reset(0).level(), 1);
        assert_eq!(p.reset(200).level(), 65);
        let (s, _) = p.record_answer(p.start(9), true);
        assert_eq!(s.consecutive_correct(), 1);
        let s = p.reset(12);
        assert_eq!((s.level(), s.consecutive_correct()), (12, 0));
    }

    #[test]
    fn streak_never_reaches_threshold_between_calls() {
        let p = policy();
        let mut s = p.start(30);
        for i in 0..20 {
            let (next, _) = p.record_answer(s, i % 5 != 0);
            assert!(next.consecutive_correct() < p.settings().correct_to_level_up());
            s = next;
        }
    }

    #[test]
    fn bounds_hold_for_long_mixed_sequences() {
        let p = AdaptiveLevelPolicy::new(LevelingSettings::new(3, 7, 2).unwrap());
        let mut s = p.start(5);
        // Deterministic pseudo-random walk.
        let mut seed = 0x2545_f491_u32;
        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let (next, change) = p.record_answer(s, seed % 3 != 0);
            assert!((3..=7).contains(&next.level()));
            assert_eq!(change.current_level(), next.level());
            s = next;
        }
    }

    #[test]
    fn custom_threshold() {
        let p = AdaptiveLevelPolicy::new(LevelingSettings::new(1, 65, 3).unwrap());
        let (s, a) = p.record_answer(p.start(2), true);
        let (s, b) = p.record_answer(s, true);
        let (_, c) = p.record_answer(s, true);
        assert!(!a.did_level_change());
        assert!(!b.did_level_change());
        assert_eq!(c, LevelChangeResult::LeveledUp { from: 2, to: 3 });
    }

    #[test]
    fn out_of_range_state_is_clamped_before_moving() {
        let p = AdaptiveLevelPolicy::new(LevelingSettings::new(1, 10, 2).unwrap());
        let wide = LevelState::new(40, 0);
        let (s, change) = p.record_answer(wide, false);
        assert_eq!(change, LevelChangeResult::LeveledDown { from: 10, to: 9 });
        assert_eq!(s.level(), 9);
    }
}
