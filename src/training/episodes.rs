use crate::models::{round_to, EpisodeReward};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Centre of the per-episode noise; below 0.5 for a slight upward bias
const NOISE_BIAS: f64 = 0.45;
const NOISE_SCALE: f64 = 20.0;
/// Reward added at the final episode, scaled linearly by progress
const TREND_SCALE: f64 = 10.0;

/// Generates mock per-episode training rewards as a drifting random walk
pub struct EpisodeRewardGenerator<R: Rng = StdRng> {
    rng: R,
}

impl EpisodeRewardGenerator<StdRng> {
    pub fn new(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> EpisodeRewardGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Generate `episode_count` rewards, episodes numbered from 1
    ///
    /// The walk itself keeps full precision; only emitted rewards are rounded.
    pub fn generate(&mut self, episode_count: u32) -> Vec<EpisodeReward> {
        let mut reward = self.rng.gen::<f64>() * 100.0 - 50.0;
        let total = episode_count as f64;

        let rewards: Vec<EpisodeReward> = (1..=episode_count)
            .map(|episode| {
                let noise = (self.rng.gen::<f64>() - NOISE_BIAS) * NOISE_SCALE;
                let trend = (episode as f64 / total) * TREND_SCALE;
                reward += noise + trend;

                EpisodeReward {
                    episode,
                    total_reward: round_to(reward, 2),
                }
            })
            .collect();

        tracing::debug!(
            episodes = episode_count,
            last_reward = rewards.last().map(|r| r.total_reward),
            "Generated episode rewards"
        );

        rewards
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_episode_numbers_are_sequential() {
        for n in [1, 10, 50, 1000] {
            let rewards = EpisodeRewardGenerator::new(42).generate(n);
            assert_eq!(rewards.len(), n as usize);
            for (i, r) in rewards.iter().enumerate() {
                assert_eq!(r.episode, i as u32 + 1);
            }
        }
    }

    #[test]
    fn test_zero_episodes() {
        assert!(EpisodeRewardGenerator::new(1).generate(0).is_empty());
    }

    #[test]
    fn test_trend_term() {
        // All draws are 0.0: seed -50, noise -9 per episode, trend 5 then 10
        let mut gen = EpisodeRewardGenerator::with_rng(StepRng::new(0, 0));
        let rewards = gen.generate(2);

        assert_eq!(rewards[0].total_reward, -54.0);
        assert_eq!(rewards[1].total_reward, -53.0);
    }

    #[test]
    fn test_rewards_are_rounded_to_cents() {
        let rewards = EpisodeRewardGenerator::new(3).generate(100);
        for r in &rewards {
            assert_eq!(r.total_reward, round_to(r.total_reward, 2));
        }
    }

    #[test]
    fn test_long_runs_trend_upward() {
        // Expected drift per episode is +1 from noise plus the progress term
        for seed in 0..10 {
            let rewards = EpisodeRewardGenerator::new(seed).generate(500);
            let first = rewards.first().unwrap().total_reward;
            let last = rewards.last().unwrap().total_reward;
            assert!(last > first, "seed {}: {} -> {}", seed, first, last);
        }
    }
}
