//! Spawn selection - farthest-point sampling away from room occupants

use rand::Rng;

use crate::ws::protocol::Vec3;

/// Minimum distance assumed when the room has no occupants
const EMPTY_ROOM_DISTANCE: f32 = 1000.0;

/// Spawn placement parameters
#[derive(Debug, Clone, Copy)]
pub struct SpawnConfig {
    /// Number of random candidates scored per placement
    pub candidates: usize,
    /// Candidates are drawn from `[-half_extent, half_extent)` on x and z
    pub half_extent: f32,
    /// Respawn offset magnitude subtracted from x and z
    pub jitter: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            candidates: 20,
            half_extent: 50.0,
            jitter: 6.0,
        }
    }
}

/// Picks spawn points that maximize the distance to other players
#[derive(Debug, Clone, Copy)]
pub struct SpawnSelector {
    config: SpawnConfig,
}

impl SpawnSelector {
    pub fn new(config: SpawnConfig) -> Self {
        Self { config }
    }

    /// Sample candidates and return the one farthest from every occupant
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R, occupants: &[Vec3]) -> Vec3 {
        let candidates: Vec<Vec3> = (0..self.config.candidates)
            .map(|_| self.sample(rng))
            .collect();

        match Self::farthest(&candidates, occupants) {
            Some(best) => best,
            // Only reachable with zero candidates configured
            None => self.sample(rng),
        }
    }

    /// Spawn point for a respawn: a selected point shifted by a random offset
    pub fn select_with_jitter<R: Rng + ?Sized>(&self, rng: &mut R, occupants: &[Vec3]) -> Vec3 {
        let mut spawn = self.select(rng, occupants);
        if self.config.jitter > 0.0 {
            spawn.x -= rng.gen_range(0.0..self.config.jitter);
            spawn.z -= rng.gen_range(0.0..self.config.jitter);
        }
        spawn
    }

    /// Greedy farthest-point choice. Ties keep the first candidate.
    pub fn farthest(candidates: &[Vec3], occupants: &[Vec3]) -> Option<Vec3> {
        let mut best = None;
        let mut best_score = f32::NEG_INFINITY;

        for candidate in candidates {
            let score = min_distance(candidate, occupants);
            if score > best_score {
                best_score = score;
                best = Some(*candidate);
            }
        }

        best
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        let h = self.config.half_extent;
        if h <= 0.0 {
            return Vec3::default();
        }
        Vec3::new(rng.gen_range(-h..h), 0.0, rng.gen_range(-h..h))
    }
}

/// Distance from `point` to the nearest occupant in the horizontal plane
pub fn min_distance(point: &Vec3, occupants: &[Vec3]) -> f32 {
    occupants
        .iter()
        .map(|other| point.planar_distance(other))
        .fold(EMPTY_ROOM_DISTANCE, f32::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn picks_the_candidate_farthest_from_occupants() {
        let occupants = [Vec3::new(0.0, 0.0, 0.0)];
        let candidates = [
            Vec3::new(5.0, 0.0, 0.0),
            Vec3::new(-40.0, 0.0, 30.0),
            Vec3::new(10.0, 0.0, 10.0),
        ];

        let best = SpawnSelector::farthest(&candidates, &occupants).unwrap();
        assert_eq!(best, Vec3::new(-40.0, 0.0, 30.0));
    }

    #[test]
    fn ties_keep_first_candidate() {
        let occupants = [Vec3::new(0.0, 0.0, 0.0)];
        let candidates = [Vec3::new(3.0, 0.0, 4.0), Vec3::new(-4.0, 0.0, -3.0)];

        let best = SpawnSelector::farthest(&candidates, &occupants).unwrap();
        assert_eq!(best, candidates[0]);
    }

    #[test]
    fn empty_room_accepts_first_sample() {
        let candidates = [Vec3::new(1.0, 0.0, 1.0), Vec3::new(45.0, 0.0, 45.0)];
        assert_eq!(
            SpawnSelector::farthest(&candidates, &[]),
            Some(candidates[0])
        );
        assert_eq!(SpawnSelector::farthest(&[], &[]), None);
    }

    #[test]
    fn samples_stay_inside_the_arena() {
        let selector = SpawnSelector::new(SpawnConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..100 {
            let spawn = selector.select(&mut rng, &[]);
            assert!((-50.0..50.0).contains(&spawn.x));
            assert!((-50.0..50.0).contains(&spawn.z));
            assert_eq!(spawn.y, 0.0);
        }
    }

    #[test]
    fn chosen_spawn_beats_at_least_half_of_the_candidates() {
        let occupant = [Vec3::new(12.0, 0.0, -8.0)];
        let config = SpawnConfig::default();
        let selector = SpawnSelector::new(config);

        // Replay the same seed to recover the candidates the selector scored.
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let chosen = selector.select(&mut rng, &occupant);

            let mut replay = ChaCha8Rng::seed_from_u64(seed);
            let candidates: Vec<Vec3> = (0..config.candidates)
                .map(|_| selector.sample(&mut replay))
                .collect();

            let chosen_score = min_distance(&chosen, &occupant);
            let beaten = candidates
                .iter()
                .filter(|c| min_distance(c, &occupant) <= chosen_score)
                .count();
            assert!(beaten * 2 >= candidates.len());
            assert_eq!(beaten, candidates.len());
        }
    }

    #[test]
    fn jitter_only_moves_backwards_within_bounds() {
        let selector = SpawnSelector::new(SpawnConfig::default());
        let occupant = [Vec3::new(0.0, 0.0, 0.0)];

        let mut plain_rng = ChaCha8Rng::seed_from_u64(3);
        let plain = selector.select(&mut plain_rng, &occupant);

        let mut jitter_rng = ChaCha8Rng::seed_from_u64(3);
        let jittered = selector.select_with_jitter(&mut jitter_rng, &occupant);

        let dx = plain.x - jittered.x;
        let dz = plain.z - jittered.z;
        assert!((0.0..6.0).contains(&dx));
        assert!((0.0..6.0).contains(&dz));
    }
}
