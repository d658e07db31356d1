//! Hash rate to electrical power conversion.
//!
//! The estimate is a fleet-weighted J/TH figure applied to network hash rate.
//! The model tables are rough industry estimates and only meant for a
//! dashboard-grade order of magnitude.

use serde::Serialize;

use crate::round2;

/// Fraction of global hash rate located in the contiguous US.
pub const CONUS_SHARE: f64 = 0.378;

const TERAHASHES_PER_EXAHASH: f64 = 1e6;
const WATTS_PER_GIGAWATT: f64 = 1e9;
const MEGAWATTS_PER_GIGAWATT: f64 = 1e3;

/// One machine class in the deployed fleet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FleetModel {
    pub model: &'static str,
    /// J/TH.
    pub efficiency: f64,
    /// Share of deployed hash rate.
    pub weight: f64,
}

const fn fleet_model(model: &'static str, efficiency: f64, weight: f64) -> FleetModel {
    FleetModel {
        model,
        efficiency,
        weight,
    }
}

pub const FLEET: [FleetModel; 10] = [
    fleet_model("Antminer S19j Pro", 30.5, 0.15),
    fleet_model("Antminer S19 XP", 21.5, 0.20),
    fleet_model("Antminer S19k Pro", 23.0, 0.10),
    fleet_model("Antminer S21", 17.5, 0.15),
    fleet_model("Antminer S21 Pro", 15.0, 0.05),
    fleet_model("Antminer T21", 19.0, 0.08),
    fleet_model("WhatsMiner M50S", 26.0, 0.07),
    fleet_model("WhatsMiner M60S", 18.5, 0.08),
    fleet_model("Legacy (S9/older)", 75.0, 0.05),
    fleet_model("Other/Canaan", 22.0, 0.07),
];

/// Share of CONUS hash rate per state.
pub const STATE_DISTRIBUTION: [(&str, f64); 48] = [
    ("Texas", 0.285),
    ("Georgia", 0.105),
    ("New York", 0.095),
    ("Kentucky", 0.050),
    ("Pennsylvania", 0.045),
    ("Wyoming", 0.040),
    ("Ohio", 0.035),
    ("North Carolina", 0.030),
    ("Nebraska", 0.025),
    ("Tennessee", 0.025),
    ("Mississippi", 0.020),
    ("Missouri", 0.020),
    ("Washington", 0.020),
    ("South Carolina", 0.020),
    ("Oklahoma", 0.020),
    ("North Dakota", 0.015),
    ("Montana", 0.015),
    ("Indiana", 0.015),
    ("Virginia", 0.015),
    ("Arkansas", 0.015),
    ("Florida", 0.012),
    ("Illinois", 0.010),
    ("Michigan", 0.008),
    ("Colorado", 0.008),
    ("Oregon", 0.007),
    ("Alabama", 0.007),
    ("Louisiana", 0.006),
    ("Iowa", 0.005),
    ("Kansas", 0.005),
    ("Utah", 0.005),
    ("Minnesota", 0.004),
    ("Nevada", 0.004),
    ("Arizona", 0.004),
    ("New Mexico", 0.003),
    ("Wisconsin", 0.003),
    ("West Virginia", 0.003),
    ("South Dakota", 0.002),
    ("Maine", 0.002),
    ("Idaho", 0.002),
    ("New Hampshire", 0.002),
    ("Maryland", 0.002),
    ("Connecticut", 0.001),
    ("New Jersey", 0.001),
    ("Massachusetts", 0.001),
    ("Delaware", 0.001),
    ("Vermont", 0.001),
    ("Rhode Island", 0.0005),
    ("California", 0.0005),
];

/// Power draw in GW, each rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerEstimate {
    pub conus_gw: f64,
    pub global_gw: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatePower {
    pub state: &'static str,
    pub share: f64,
    pub power_mw: f64,
}

/// Fleet-weighted efficiency in J/TH, unrounded.
pub fn weighted_efficiency() -> f64 {
    FLEET
        .iter()
        .map(|model| model.efficiency * model.weight)
        .sum()
}

pub fn estimate_power(hashrate_ehs: f64) -> PowerEstimate {
    let efficiency = weighted_efficiency();
    let hashrate_ths = hashrate_ehs * TERAHASHES_PER_EXAHASH;

    let conus_watts = hashrate_ths * CONUS_SHARE * efficiency;
    let global_watts = hashrate_ths * efficiency;

    PowerEstimate {
        conus_gw: round2(conus_watts / WATTS_PER_GIGAWATT),
        global_gw: round2(global_watts / WATTS_PER_GIGAWATT),
    }
}

/// Splits CONUS power across states, largest share first.
pub fn state_breakdown(conus_gw: f64) -> Vec<StatePower> {
    let mut states: Vec<StatePower> = STATE_DISTRIBUTION
        .iter()
        .map(|&(state, share)| StatePower {
            state,
            share,
            power_mw: round1(conus_gw * MEGAWATTS_PER_GIGAWATT * share),
        })
        .collect();
    states.sort_by(|left, right| right.share.total_cmp(&left.share));
    states
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fleet_weights_sum_to_one() {
        let total: f64 = FLEET.iter().map(|model| model.weight).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn weighted_efficiency_matches_fleet_table() {
        assert!((weighted_efficiency() - 24.66).abs() < 1e-9);
    }

    #[test]
    fn six_hundred_exahash_draws_about_fifteen_gigawatts() {
        let estimate = estimate_power(600.0);

        assert_eq!(estimate.global_gw, 14.8);
        assert_eq!(estimate.conus_gw, 5.59);
    }

    #[test]
    fn zero_hash_rate_draws_nothing() {
        assert_eq!(
            estimate_power(0.0),
            PowerEstimate {
                conus_gw: 0.0,
                global_gw: 0.0
            }
        );
    }

    #[test]
    fn state_breakdown_is_sorted_and_keeps_table_order_for_ties() {
        let states = state_breakdown(10.0);

        assert_eq!(states.len(), 48);
        assert_eq!(states[0].state, "Texas");
        assert_eq!(states[0].power_mw, 2850.0);
        assert!(states
            .windows(2)
            .all(|pair| pair[0].share >= pair[1].share));

        let tied: Vec<&str> = states
            .iter()
            .filter(|state| state.share == 0.025)
            .map(|state| state.state)
            .collect();
        assert_eq!(tied, vec!["Nebraska", "Tennessee"]);
    }
}
