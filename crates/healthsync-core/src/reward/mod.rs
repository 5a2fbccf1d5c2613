//! Gamification: completion rewards and achievements.

mod achievements;
mod issuer;

pub use achievements::{
    evaluate_achievements, find_achievement, Achievement, AchievementCategory,
    AchievementContext, AchievementEvaluator, Requirement, CATALOG,
};
pub use issuer::{
    apply_completion_reward, GamificationAccount, RewardConfig, RewardDelta, RewardIssuer,
};
