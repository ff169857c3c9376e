use crate::config::IntermitterConfig;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bout {
    Crawl,
    Feed,
    /// Motionless, with the remaining pause time in s.
    Pause(f64),
}

/// Chooses between crawling, feeding and pausing at the end of each stride or bite.
#[derive(Debug, Clone)]
pub struct Intermitter {
    bout: Bout,
    pause_probability: f64,
    pause_duration: f64,
    eeb: f64,
    rng: ChaCha8Rng,
}

impl Intermitter {
    #[must_use]
    pub fn new(config: &IntermitterConfig, seed: u64) -> Self {
        Self {
            bout: Bout::Crawl,
            pause_probability: config.pause_probability,
            pause_duration: config.pause_duration,
            eeb: config.eeb,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    #[must_use]
    pub fn bout(&self) -> Bout {
        self.bout
    }

    /// Exploration/exploitation bias: the probability of feeding when on food.
    #[must_use]
    pub fn eeb(&self) -> f64 {
        self.eeb
    }

    pub fn set_eeb(&mut self, eeb: f64) {
        self.eeb = eeb.clamp(0.0, 1.0);
    }

    fn choose(&mut self, on_food: bool) -> Bout {
        if self.rng.gen::<f64>() < self.pause_probability {
            return Bout::Pause(self.pause_duration);
        }
        if on_food && self.rng.gen::<f64>() < self.eeb {
            Bout::Feed
        } else {
            Bout::Crawl
        }
    }

    /// Advances the bout after a tick of `dt` s. `cycle_done` is set when the
    /// running effector completed a stride or bite during the tick.
    pub fn update(&mut self, dt: f64, cycle_done: bool, on_food: bool) {
        self.bout = match self.bout {
            Bout::Pause(remaining) if remaining - dt > 0.0 => Bout::Pause(remaining - dt),
            Bout::Pause(_) => self.choose(on_food),
            // Leaving food ends a feeding bout at once.
            Bout::Feed if !on_food => Bout::Crawl,
            _ if cycle_done => self.choose(on_food),
            bout => bout,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(intermitter: &mut Intermitter, on_food: bool, cycles: usize) -> Vec<Bout> {
        (0..cycles)
            .map(|_| {
                intermitter.update(0.1, true, on_food);
                intermitter.bout()
            })
            .collect()
    }

    #[test]
    fn test_same_seed_same_bouts() {
        let config = IntermitterConfig::default();
        let a = run(&mut Intermitter::new(&config, 7), true, 200);
        let b = run(&mut Intermitter::new(&config, 7), true, 200);
        assert_eq!(a, b);
    }

    #[test]
    fn test_never_feeds_off_food() {
        let mut i = Intermitter::new(&IntermitterConfig::default(), 1);
        assert!(run(&mut i, false, 500).iter().all(|b| *b != Bout::Feed));
    }

    #[test]
    fn test_full_eeb_always_feeds_on_food() {
        let config = IntermitterConfig {
            pause_probability: 0.0,
            eeb: 1.0,
            ..Default::default()
        };
        let mut i = Intermitter::new(&config, 3);
        assert!(run(&mut i, true, 100).iter().all(|b| *b == Bout::Feed));
    }

    #[test]
    fn test_pause_runs_out() {
        let config = IntermitterConfig {
            pause_probability: 1.0,
            pause_duration: 0.25,
            ..Default::default()
        };
        let mut i = Intermitter::new(&config, 3);
        i.update(0.1, true, false);
        assert_eq!(i.bout(), Bout::Pause(0.25));
        i.update(0.1, false, false);
        i.update(0.1, false, false);
        assert!(matches!(i.bout(), Bout::Pause(r) if r < 0.1));
        i.update(0.1, false, false);
        assert_eq!(i.bout(), Bout::Pause(0.25));
    }

    #[test]
    fn test_eeb_is_clamped() {
        let mut i = Intermitter::new(&IntermitterConfig::default(), 0);
        i.set_eeb(3.0);
        assert_eq!(i.eeb(), 1.0);
    }
}
