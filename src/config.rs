//! Runtime settings, from flags or `RENTAL_*` environment variables.

use clap::Parser;
use rust_decimal::Decimal;

use crate::domain::DEFAULT_DAILY_FINE;
use crate::lifecycle::RentalPolicy;

/// rental-lifecycle - rental marketplace lifecycle engine
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "rental-lifecycle")]
#[command(version, about, long_about = None)]
pub struct AppConfig {
    /// Capacity of the store actor's request channel
    #[arg(long, env = "RENTAL_CHANNEL_CAPACITY", default_value_t = 32)]
    pub channel_capacity: usize,

    /// Tracing filter used when RUST_LOG is unset
    #[arg(long, env = "RENTAL_LOG", default_value = "info")]
    pub log_filter: String,

    /// Fine charged per overdue day on new rentals
    #[arg(long, env = "RENTAL_DAILY_FINE", default_value_t = DEFAULT_DAILY_FINE)]
    pub daily_fine: Decimal,

    /// Longest rental a renter can book, in days
    #[arg(long, env = "RENTAL_MAX_DAYS", default_value_t = 60)]
    pub max_rental_days: u32,

    /// Log the overdue set every N seconds; off when unset
    #[arg(long, env = "RENTAL_OVERDUE_SWEEP_SECS")]
    pub overdue_sweep_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 32,
            log_filter: "info".to_string(),
            daily_fine: DEFAULT_DAILY_FINE,
            max_rental_days: 60,
            overdue_sweep_secs: None,
        }
    }
}

impl From<&AppConfig> for RentalPolicy {
    fn from(config: &AppConfig) -> Self {
        Self {
            daily_fine: config.daily_fine,
            max_days: config.max_rental_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_flagless_parse() {
        let parsed = AppConfig::try_parse_from(["rental-lifecycle"]).unwrap();
        // RENTAL_* variables in the environment would override the defaults.
        if std::env::vars().all(|(k, _)| !k.starts_with("RENTAL_")) {
            assert_eq!(parsed, AppConfig::default());
        }
        assert_eq!(RentalPolicy::from(&AppConfig::default()), RentalPolicy::default());
    }

    #[test]
    fn flags_override_defaults() {
        let parsed = AppConfig::try_parse_from([
            "rental-lifecycle",
            "--daily-fine",
            "25.50",
            "--max-rental-days",
            "14",
            "--overdue-sweep-secs",
            "30",
        ])
        .unwrap();

        let policy = RentalPolicy::from(&parsed);
        assert_eq!(policy.daily_fine.to_string(), "25.50");
        assert_eq!(policy.max_days, 14);
        assert_eq!(parsed.overdue_sweep_secs, Some(30));
    }
}
