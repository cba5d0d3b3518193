//! Demand-tiered pricing.

use serde::Serialize;

/// Price in USD before any demand adjustment.
pub const BASE_PRICE: f64 = 10.0;

/// Demand bands, lowest first. Each band is closed below and open above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
    Discount,
    Standard,
    Surge,
    HighSurge,
}

impl PriceTier {
    /// Tier for a raw, unrounded demand estimate. Negative demand is a discount.
    pub fn for_demand(demand: f64) -> Self {
        if demand < 50.0 {
            PriceTier::Discount
        } else if demand < 150.0 {
            PriceTier::Standard
        } else if demand < 300.0 {
            PriceTier::Surge
        } else {
            PriceTier::HighSurge
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            PriceTier::Discount => 0.9,
            PriceTier::Standard => 1.0,
            PriceTier::Surge => 1.2,
            PriceTier::HighSurge => 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricingResult {
    pub tier: PriceTier,
    pub multiplier: f64,
    pub base_price: f64,
    pub final_price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingPolicy {
    base_price: f64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            base_price: BASE_PRICE,
        }
    }
}

impl PricingPolicy {
    pub fn price_for(&self, demand: f64) -> PricingResult {
        let tier = PriceTier::for_demand(demand);
        let multiplier = tier.multiplier();
        PricingResult {
            tier,
            multiplier,
            base_price: self.base_price,
            final_price: self.base_price * multiplier,
        }
    }
}

/// Round to two decimal places, ties to even on the exact binary value.
/// Goes through the decimal rendering so very large values stay finite.
pub fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers() {
        let cases = [
            (0.0, 0.9),
            (49.999, 0.9),
            (50.0, 1.0),
            (149.99, 1.0),
            (150.0, 1.2),
            (299.999, 1.2),
            (300.0, 1.5),
            (1.0e9, 1.5),
        ];
        let policy = PricingPolicy::default();
        for (demand, expected) in cases {
            assert_eq!(policy.price_for(demand).multiplier, expected, "demand {demand}");
        }
    }

    #[test]
    fn test_negative_demand_is_discounted() {
        let result = PricingPolicy::default().price_for(-25.0);
        assert_eq!(result.tier, PriceTier::Discount);
        assert_eq!(result.multiplier, 0.9);
    }

    #[test]
    fn test_final_price_matches_multiplier() {
        let policy = PricingPolicy::default();
        for demand in [10.0, 100.0, 200.0, 500.0] {
            let result = policy.price_for(demand);
            assert_eq!(result.base_price, BASE_PRICE);
            assert_eq!(round2(result.final_price), round2(BASE_PRICE * result.multiplier));
        }
        assert_eq!(round2(policy.price_for(10.0).final_price), 9.0);
        assert_eq!(round2(policy.price_for(200.0).final_price), 12.0);
        assert_eq!(round2(policy.price_for(500.0).final_price), 15.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(120.0), 120.0);
        assert_eq!(round2(87.654), 87.65);
        assert_eq!(round2(-3.456), -3.46);
    }

    #[test]
    fn test_round2_ties_to_even() {
        assert_eq!(round2(120.125), 120.12);
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        // 2.675 and 1.005 sit just below the tie in binary
        assert_eq!(round2(2.675), 2.67);
        assert_eq!(round2(1.005), 1.0);
    }

    #[test]
    fn test_round2_large_values_stay_finite() {
        assert_eq!(round2(1e307), 1e307);
        assert!(round2(f64::MAX).is_finite());
    }
}
