//! Monte-Carlo check of the draw engine against the displayed odds.
use prize_draw_core::{DrawSession, PrizeMap, draw};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Serialize;

/// Parameters for a simulation run.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub draws: u32,
    pub visits: u32,
    pub seed: u64,
}

/// Expected against observed share for one prize, both in percent.
#[derive(Debug, Clone, Serialize)]
pub struct PrizeTally {
    pub prize: String,
    pub stock: u32,
    pub hits: u32,
    pub expected: f64,
    pub observed: f64,
}

impl PrizeTally {
    #[must_use]
    pub fn drift(&self) -> f64 {
        (self.observed - self.expected).abs()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub seed: u64,
    pub draws: u32,
    pub visits: u32,
    pub multiplier: f64,
    pub rows: Vec<PrizeTally>,
}

impl SimulationReport {
    /// Largest absolute gap between observed and expected, in percentage points.
    #[must_use]
    pub fn max_drift(&self) -> f64 {
        self.rows.iter().map(PrizeTally::drift).fold(0.0, f64::max)
    }
}

/// Draw `config.draws` times against the session's current inventory without
/// consuming it, so every sample sees the same odds.
#[must_use]
pub fn run_simulation(session: &DrawSession, config: SimulationConfig) -> SimulationReport {
    let inventory = session.displayed_inventory();
    let weights = session.weights();
    let draw_config = session.config();
    let mut rng = ChaCha20Rng::seed_from_u64(config.seed);

    let mut hits: PrizeMap<u32> = inventory.map_values(|_, _| 0);
    for _ in 0..config.draws {
        let outcome = draw(inventory, weights, config.visits, draw_config, &mut rng);
        if let Some(count) = hits.get_mut(&outcome.prize) {
            *count += 1;
        } else {
            hits.insert(outcome.prize, 1);
        }
    }

    let total = f64::from(config.draws.max(1));
    let expected = session.prob_rows(config.visits);
    let rows = hits
        .iter()
        .map(|(prize, &count)| {
            let row = expected.iter().find(|row| row.prize == prize);
            PrizeTally {
                prize: prize.to_string(),
                stock: row.map_or(0, |row| row.stock),
                hits: count,
                expected: row.map_or(0.0, |row| row.probability),
                observed: f64::from(count) / total * 100.0,
            }
        })
        .collect();

    log::debug!(
        "simulated {} draws at {} visits with seed {}",
        config.draws,
        config.visits,
        config.seed
    );
    SimulationReport {
        seed: config.seed,
        draws: config.draws,
        visits: config.visits,
        multiplier: draw_config.multiplier(config.visits),
        rows,
    }
}
