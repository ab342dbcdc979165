use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Inclusive plausibility ranges for numeric fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub price_min: f64,
    pub price_max: f64,
    pub sqm_min: f64,
    pub sqm_max: f64,
    pub rooms_min: u32,
    pub rooms_max: u32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            price_min: 50.0,
            price_max: 10_000_000.0,
            sqm_min: 10.0,
            sqm_max: 2000.0,
            rooms_min: 1,
            rooms_max: 10,
        }
    }
}

impl Bounds {
    pub fn price_ok(&self, price: f64) -> bool {
        price.is_finite() && (self.price_min..=self.price_max).contains(&price)
    }

    pub fn sqm_ok(&self, sqm: f64) -> bool {
        sqm.is_finite() && (self.sqm_min..=self.sqm_max).contains(&sqm)
    }

    pub fn rooms_ok(&self, rooms: u32) -> bool {
        (self.rooms_min..=self.rooms_max).contains(&rooms)
    }

    pub fn check(&self) -> Result<()> {
        ensure!(
            self.price_min <= self.price_max,
            "price bounds reversed: {} > {}",
            self.price_min,
            self.price_max
        );
        ensure!(
            self.sqm_min <= self.sqm_max,
            "sqm bounds reversed: {} > {}",
            self.sqm_min,
            self.sqm_max
        );
        ensure!(
            self.rooms_min <= self.rooms_max,
            "rooms bounds reversed: {} > {}",
            self.rooms_min,
            self.rooms_max
        );
        Ok(())
    }
}
