use std::collections::HashMap;

use soudan_domain::FeeRate;

/// Runtime configuration resolved from the environment once at startup.
/// Values are validated in `soudan_utils::config`; this struct carries the
/// parsed forms the use cases consume.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: usize,
    /// Platform cut of every captured payment
    pub fee_rate: FeeRate,
    /// How long a hold stays exclusive while the guest pays (minutes)
    pub default_reservation_ttl_minutes: i64,
    /// Grace window for voucher-style pending payments (minutes)
    pub pending_voucher_grace_minutes: i64,
    /// Aging floor per ISO-2 country code, with a default for the rest (days)
    pub payout_delay_days_by_country: HashMap<String, i64>,
    pub payout_default_delay_days: i64,
    /// Added on top of the session start when scheduling a transfer (minutes)
    pub payout_safety_delay_minutes: i64,
    /// Platform-default booking policy, overridable per expert
    pub default_booking_policy: soudan_domain::BookingPolicy,
    /// Inbound envelope signing keys; `next` tolerates key rotation
    pub signing_key_current: String,
    pub signing_key_next: Option<String>,
    pub sweep_reservations_interval_secs: u64,
    pub sweep_transfers_interval_secs: u64,
    pub reminders_interval_secs: u64,
    pub webhook_retention_hours: i64,
    pub disable_internal_jobs: bool,
    /// Reminder emission; None keeps the job off
    pub reminders: Option<RemindersSettings>,
}

#[derive(Debug, Clone)]
pub struct RemindersSettings {
    pub webhook_url: String,
    pub lead_minutes: i64,
}

impl Config {
    pub fn new() -> anyhow::Result<Self> {
        let app_config = &soudan_utils::config::APP_CONFIG;

        let fee_rate = FeeRate::from_fraction(app_config.fee_rate)
            .map_err(|e| anyhow::anyhow!("Invalid fee rate: {e}"))?;

        let default_booking_policy = soudan_domain::BookingPolicy {
            time_slot_interval: app_config.booking_policy.time_slot_interval,
            booking_window_days: app_config.booking_policy.booking_window_days,
            minimum_notice: app_config.booking_policy.minimum_notice_minutes,
            before_event_buffer: app_config.booking_policy.before_event_buffer_minutes,
            after_event_buffer: app_config.booking_policy.after_event_buffer_minutes,
        };
        default_booking_policy
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid default booking policy: {e}"))?;

        Ok(Self {
            port: app_config.http_port,
            fee_rate,
            default_reservation_ttl_minutes: app_config.default_reservation_ttl_minutes,
            pending_voucher_grace_minutes: app_config.pending_voucher_grace_minutes,
            payout_delay_days_by_country: app_config
                .payout
                .delay_days_by_country
                .iter()
                .map(|(country, days)| (country.to_ascii_uppercase(), *days))
                .collect(),
            payout_default_delay_days: app_config.payout.default_delay_days,
            payout_safety_delay_minutes: app_config.payout.safety_delay_minutes,
            default_booking_policy,
            signing_key_current: app_config.signing_keys.current.clone(),
            signing_key_next: app_config.signing_keys.next.clone(),
            sweep_reservations_interval_secs: app_config.cron.sweep_reservations_interval_secs,
            sweep_transfers_interval_secs: app_config.cron.sweep_transfers_interval_secs,
            reminders_interval_secs: app_config.cron.reminders_interval_secs,
            webhook_retention_hours: app_config.cron.webhook_retention_hours,
            disable_internal_jobs: app_config.cron.disable_internal_jobs,
            reminders: app_config.reminders.as_ref().map(|r| RemindersSettings {
                webhook_url: r.webhook_url.clone(),
                lead_minutes: r.lead_minutes,
            }),
        })
    }

    /// The aging floor for an expert's country, falling back to the default.
    pub fn payout_delay_days(&self, country: &soudan_domain::CountryCode) -> i64 {
        self.payout_delay_days_by_country
            .get(country.as_str())
            .copied()
            .unwrap_or(self.payout_default_delay_days)
    }
}

#[cfg(test)]
mod tests {
    use soudan_domain::CountryCode;

    use super::*;

    #[test]
    fn payout_delay_lookup_falls_back_to_default() {
        let mut config = Config::new().unwrap();
        config
            .payout_delay_days_by_country
            .insert("PT".to_string(), 7);
        config.payout_default_delay_days = 14;

        assert_eq!(config.payout_delay_days(&CountryCode::new("PT").unwrap()), 7);
        assert_eq!(
            config.payout_delay_days(&CountryCode::new("DE").unwrap()),
            14
        );
    }
}
