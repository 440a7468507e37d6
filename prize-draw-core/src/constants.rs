//! Fixed names and default tuning for the draw.

/// Prize name returned when nothing can be awarded.
pub const LOSE_SENTINEL: &str = "はずれ";

/// Attraction tag recorded when a visitor redeems a draw.
pub const PRIZE_REDEMPTION_TAG: &str = "prize";

pub const GRAND_PRIZE: &str = "大当たり";
pub const SECOND_PRIZE: &str = "中当たり";
pub const THIRD_PRIZE: &str = "小当たり";

/// Initial stock in draw order.
pub const DEFAULT_INITIAL_STOCK: [(&str, u32); 4] = [
    (GRAND_PRIZE, 3),
    (SECOND_PRIZE, 30),
    (THIRD_PRIZE, 99),
    (LOSE_SENTINEL, 418),
];

pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Visits required before the first draw.
pub const DEFAULT_THRESHOLD: u32 = 3;
/// Boost growth per visit beyond the threshold.
pub const DEFAULT_BETA: f64 = 0.15;
/// Boost ceiling.
pub const DEFAULT_MCAP: f64 = 2.0;

/// Gain targets ordered from top prize down.
pub const DEFAULT_GAIN_TARGETS: [&str; 3] = [GRAND_PRIZE, SECOND_PRIZE, THIRD_PRIZE];
pub const DEFAULT_LOSE_NAMES: [&str; 1] = [LOSE_SENTINEL];
