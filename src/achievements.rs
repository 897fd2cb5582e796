//! Kill tallies and one-shot score milestones.

use crate::entities::EnemyTier;

/// `(name, score threshold)`, in ascending order.
pub const MILESTONES: [(&str, u32); 3] = [("Rookie", 1000), ("Ace", 5000), ("Sky Master", 10_000)];

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Achievements {
    pub fighters: u32,
    pub bombers: u32,
    pub motherships: u32,
    /// One flag per entry of [`MILESTONES`].
    pub reached: [bool; MILESTONES.len()],
}

impl Achievements {
    pub fn record_kill(&mut self, tier: EnemyTier) {
        match tier {
            EnemyTier::Fighter => self.fighters += 1,
            EnemyTier::Bomber => self.bombers += 1,
            EnemyTier::Mothership => self.motherships += 1,
        }
    }

    pub fn kills(&self, tier: EnemyTier) -> u32 {
        match tier {
            EnemyTier::Fighter => self.fighters,
            EnemyTier::Bomber => self.bombers,
            EnemyTier::Mothership => self.motherships,
        }
    }

    pub fn total_kills(&self) -> u32 {
        self.fighters + self.bombers + self.motherships
    }

    /// Mark every milestone `score` has reached and return the names of the
    /// ones unlocked by this call.
    pub fn check_milestones(&mut self, score: u32) -> Vec<&'static str> {
        let mut unlocked = Vec::new();
        for (i, (name, threshold)) in MILESTONES.iter().enumerate() {
            if !self.reached[i] && score >= *threshold {
                self.reached[i] = true;
                unlocked.push(*name);
            }
        }
        unlocked
    }
}
