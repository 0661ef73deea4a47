//! D&D 5e progression rules used when deriving sheet values.
//!
//! Everything here is a pure function of its arguments. The normalizer never
//! trusts derived numbers from an export; it recomputes them with these.

use serde::{Deserialize, Serialize};

/// Minimum XP for levels 2 through 20, ascending. Anything below the first
/// entry is level 1.
pub const XP_THRESHOLDS: [u32; 19] = [
    300, 900, 2_700, 6_500, 14_000, 23_000, 34_000, 48_000, 64_000, 85_000, 100_000, 120_000,
    140_000, 165_000, 195_000, 225_000, 265_000, 305_000, 355_000,
];

/// Highest level reachable through experience.
pub const MAX_LEVEL: u8 = 20;

/// Character level for an experience total.
///
/// Reaching a threshold exactly grants that level. Totals past the last
/// threshold stay at level 20.
pub fn level_for_xp(xp: u32) -> u8 {
    // Thresholds are sorted, so the count at or below `xp` is the number of
    // levels gained past 1.
    let gained = XP_THRESHOLDS.partition_point(|&threshold| threshold <= xp);
    1 + gained as u8
}

/// Ability modifier for a score, rounding toward negative infinity.
///
/// D&D 5e: score 8-9 = -1, 10-11 = 0, 12-13 = +1, etc.
pub fn ability_modifier(score: i32) -> i32 {
    score.saturating_sub(10).div_euclid(2)
}

/// Proficiency bonus for a character level.
pub fn proficiency_bonus(level: u8) -> i32 {
    match level {
        0 => 2, // Invalid level, but default to minimum
        1..=4 => 2,
        5..=8 => 3,
        9..=12 => 4,
        13..=16 => 5,
        _ => 6,
    }
}

/// Skill proficiency tier as exported: 0 = none, 1 = proficient,
/// 2 = expertise.
///
/// Expertise is a tier of its own rather than a flag on top of proficiency,
/// so the bonus is the proficiency bonus times the tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ProficiencyTier {
    #[default]
    None,
    Proficient,
    Expertise,
}

impl ProficiencyTier {
    /// Decode the numeric flag. Only the exact values 1 and 2 count; half
    /// proficiency (0.5) and anything else read as no proficiency.
    pub fn from_flag(flag: Option<f64>) -> Self {
        match flag {
            Some(v) if v == 1.0 => ProficiencyTier::Proficient,
            Some(v) if v == 2.0 => ProficiencyTier::Expertise,
            _ => ProficiencyTier::None,
        }
    }

    /// How many times the proficiency bonus applies.
    pub fn multiplier(&self) -> i32 {
        match self {
            ProficiencyTier::None => 0,
            ProficiencyTier::Proficient => 1,
            ProficiencyTier::Expertise => 2,
        }
    }

    pub fn bonus(&self, proficiency_bonus: i32) -> i32 {
        proficiency_bonus.saturating_mul(self.multiplier())
    }

    /// Expertise implies proficiency.
    pub fn is_proficient(&self) -> bool {
        !matches!(self, ProficiencyTier::None)
    }

    pub fn is_expertise(&self) -> bool {
        matches!(self, ProficiencyTier::Expertise)
    }
}

/// Total for a skill check before any dice are rolled. Saturates at the
/// `i32` bounds.
pub fn skill_total(ability_mod: i32, tier: ProficiencyTier, level: u8, misc_bonus: i32) -> i32 {
    ability_mod
        .saturating_add(tier.bonus(proficiency_bonus(level)))
        .saturating_add(misc_bonus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_extreme_scores_saturate() {
        assert_eq!(ability_modifier(i32::MIN), (i32::MIN).div_euclid(2));
        assert_eq!(ability_modifier(i32::MAX), (i32::MAX - 10) / 2);
        assert_eq!(
            skill_total(3, ProficiencyTier::Proficient, 1, i32::MAX),
            i32::MAX
        );
        assert_eq!(
            skill_total(i32::MIN / 2, ProficiencyTier::None, 1, i32::MIN),
            i32::MIN
        );
    }

    #[test]
    fn test_level_for_xp_boundaries() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(299), 1);
        assert_eq!(level_for_xp(300), 2);
        assert_eq!(level_for_xp(899), 2);
        assert_eq!(level_for_xp(900), 3);
        assert_eq!(level_for_xp(354_999), 19);
        assert_eq!(level_for_xp(355_000), 20);
        assert_eq!(level_for_xp(1_000_000), 20);
        assert_eq!(level_for_xp(u32::MAX), MAX_LEVEL);
    }

    #[test]
    fn test_every_threshold_grants_its_level() {
        for (i, threshold) in XP_THRESHOLDS.iter().enumerate() {
            let level = i as u8 + 2;
            assert_eq!(level_for_xp(*threshold), level);
            assert_eq!(level_for_xp(threshold - 1), level - 1);
        }
    }

    #[test]
    fn test_ability_modifier() {
        assert_eq!(ability_modifier(10), 0);
        assert_eq!(ability_modifier(11), 0);
        assert_eq!(ability_modifier(9), -1); // 9 -> -1, not 0
        assert_eq!(ability_modifier(7), -2);
        assert_eq!(ability_modifier(1), -5);
        assert_eq!(ability_modifier(20), 5);
        assert_eq!(ability_modifier(30), 10);
    }

    #[test]
    fn test_proficiency_bonus() {
        assert_eq!(proficiency_bonus(1), 2);
        assert_eq!(proficiency_bonus(4), 2);
        assert_eq!(proficiency_bonus(5), 3);
        assert_eq!(proficiency_bonus(9), 4);
        assert_eq!(proficiency_bonus(13), 5);
        assert_eq!(proficiency_bonus(17), 6);
        assert_eq!(proficiency_bonus(20), 6);
    }

    #[test]
    fn test_tier_from_flag() {
        assert_eq!(ProficiencyTier::from_flag(None), ProficiencyTier::None);
        assert_eq!(ProficiencyTier::from_flag(Some(0.0)), ProficiencyTier::None);
        assert_eq!(ProficiencyTier::from_flag(Some(0.5)), ProficiencyTier::None);
        assert_eq!(
            ProficiencyTier::from_flag(Some(1.0)),
            ProficiencyTier::Proficient
        );
        assert_eq!(
            ProficiencyTier::from_flag(Some(2.0)),
            ProficiencyTier::Expertise
        );
        assert_eq!(ProficiencyTier::from_flag(Some(3.0)), ProficiencyTier::None);
    }

    #[test]
    fn test_skill_total_expertise_doubles() {
        // +3 ability, level 1 (bonus 2)
        assert_eq!(skill_total(3, ProficiencyTier::None, 1, 0), 3);
        assert_eq!(skill_total(3, ProficiencyTier::Proficient, 1, 0), 5);
        assert_eq!(skill_total(3, ProficiencyTier::Expertise, 1, 0), 7);
        assert_eq!(skill_total(3, ProficiencyTier::Proficient, 1, 2), 7);
        assert_eq!(skill_total(-1, ProficiencyTier::Expertise, 5, 0), 5);
    }

    proptest! {
        #[test]
        fn prop_level_is_monotonic(a in any::<u32>(), b in any::<u32>()) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(level_for_xp(lo) <= level_for_xp(hi));
            prop_assert!((1..=MAX_LEVEL).contains(&level_for_xp(hi)));
        }

        #[test]
        fn prop_modifier_is_floored_half(score in 1i32..=30) {
            let expected = ((score - 10) as f64 / 2.0).floor() as i32;
            prop_assert_eq!(ability_modifier(score), expected);
        }

        #[test]
        fn prop_proficiency_bonus_formula(level in 1u8..=20) {
            prop_assert_eq!(proficiency_bonus(level), (level as i32 - 1) / 4 + 2);
        }
    }
}
