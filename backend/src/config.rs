//! Data-access configuration loaded via OrthoConfig.
//!
//! Every value is optional; unset values fall back to the defaults of
//! [`CacheTtls`] and [`CommitPolicy`].

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{CacheTtls, CommitPolicy};

/// Cache lifetimes and commit retry settings.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "HELPDESK")]
pub struct HelpdeskSettings {
    /// Lifetime of cached doctor ticket statistics, in seconds.
    pub doctor_stats_ttl_secs: Option<u64>,
    /// Lifetime of cached doctor subject lists, in seconds.
    pub doctor_subjects_ttl_secs: Option<u64>,
    /// Lifetime of cached doctor subject details, in seconds.
    pub doctor_subjects_detail_ttl_secs: Option<u64>,
    /// Lifetime of the cached subject catalogue, in seconds.
    pub all_subjects_ttl_secs: Option<u64>,
    /// Lifetime of the cached analytics dashboard, in seconds.
    pub admin_analytics_ttl_secs: Option<u64>,
    /// Attempts per commit, including the first. Zero is treated as one.
    pub commit_max_attempts: Option<u32>,
    /// Delay before the first commit retry, in milliseconds.
    pub commit_initial_backoff_ms: Option<u64>,
    /// Upper bound on the delay between commit retries, in milliseconds.
    pub commit_max_backoff_ms: Option<u64>,
    /// Deadline for one commit attempt, in milliseconds.
    pub commit_timeout_ms: Option<u64>,
}

fn secs_or(value: Option<u64>, fallback: Duration) -> Duration {
    value.map_or(fallback, Duration::from_secs)
}

fn millis_or(value: Option<u64>, fallback: Duration) -> Duration {
    value.map_or(fallback, Duration::from_millis)
}

impl HelpdeskSettings {
    /// Cache lifetimes with defaults applied.
    pub fn cache_ttls(&self) -> CacheTtls {
        let defaults = CacheTtls::default();
        CacheTtls {
            doctor_stats: secs_or(self.doctor_stats_ttl_secs, defaults.doctor_stats),
            doctor_subjects: secs_or(self.doctor_subjects_ttl_secs, defaults.doctor_subjects),
            doctor_subjects_detail: secs_or(
                self.doctor_subjects_detail_ttl_secs,
                defaults.doctor_subjects_detail,
            ),
            all_subjects: secs_or(self.all_subjects_ttl_secs, defaults.all_subjects),
            admin_analytics: secs_or(self.admin_analytics_ttl_secs, defaults.admin_analytics),
        }
    }

    /// Commit policy with defaults applied.
    pub fn commit_policy(&self) -> CommitPolicy {
        let defaults = CommitPolicy::default();
        let initial_backoff = millis_or(self.commit_initial_backoff_ms, defaults.initial_backoff);
        CommitPolicy {
            max_attempts: self.commit_max_attempts.map_or(defaults.max_attempts, |n| n.max(1)),
            initial_backoff,
            max_backoff: millis_or(self.commit_max_backoff_ms, defaults.max_backoff)
                .max(initial_backoff),
            commit_timeout: millis_or(self.commit_timeout_ms, defaults.commit_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for configuration parsing and defaults.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 9] = [
        "HELPDESK_DOCTOR_STATS_TTL_SECS",
        "HELPDESK_DOCTOR_SUBJECTS_TTL_SECS",
        "HELPDESK_DOCTOR_SUBJECTS_DETAIL_TTL_SECS",
        "HELPDESK_ALL_SUBJECTS_TTL_SECS",
        "HELPDESK_ADMIN_ANALYTICS_TTL_SECS",
        "HELPDESK_COMMIT_MAX_ATTEMPTS",
        "HELPDESK_COMMIT_INITIAL_BACKOFF_MS",
        "HELPDESK_COMMIT_MAX_BACKOFF_MS",
        "HELPDESK_COMMIT_TIMEOUT_MS",
    ];

    fn load_from_empty_args() -> HelpdeskSettings {
        HelpdeskSettings::load_from_iter([OsString::from("helpdesk")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(settings.cache_ttls(), CacheTtls::default());
        assert_eq!(settings.commit_policy(), CommitPolicy::default());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("HELPDESK_DOCTOR_STATS_TTL_SECS", Some("60".to_owned())),
            ("HELPDESK_DOCTOR_SUBJECTS_TTL_SECS", None),
            ("HELPDESK_DOCTOR_SUBJECTS_DETAIL_TTL_SECS", None),
            ("HELPDESK_ALL_SUBJECTS_TTL_SECS", Some("7200".to_owned())),
            ("HELPDESK_ADMIN_ANALYTICS_TTL_SECS", None),
            ("HELPDESK_COMMIT_MAX_ATTEMPTS", Some("5".to_owned())),
            ("HELPDESK_COMMIT_INITIAL_BACKOFF_MS", Some("10".to_owned())),
            ("HELPDESK_COMMIT_MAX_BACKOFF_MS", None),
            ("HELPDESK_COMMIT_TIMEOUT_MS", Some("250".to_owned())),
        ]);

        let settings = load_from_empty_args();
        let ttls = settings.cache_ttls();
        assert_eq!(ttls.doctor_stats, Duration::from_secs(60));
        assert_eq!(ttls.all_subjects, Duration::from_secs(7200));
        assert_eq!(ttls.doctor_subjects, CacheTtls::default().doctor_subjects);

        let policy = settings.commit_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_backoff, Duration::from_millis(10));
        assert_eq!(policy.max_backoff, CommitPolicy::default().max_backoff);
        assert_eq!(policy.commit_timeout, Duration::from_millis(250));
    }

    #[rstest]
    #[case(Some(0), None, None, 1, Duration::from_millis(50))]
    #[case(None, Some(500), Some(100), 3, Duration::from_millis(500))]
    fn policy_values_are_clamped(
        #[case] attempts: Option<u32>,
        #[case] initial_ms: Option<u64>,
        #[case] max_ms: Option<u64>,
        #[case] expected_attempts: u32,
        #[case] expected_initial: Duration,
    ) {
        let settings = HelpdeskSettings {
            commit_max_attempts: attempts,
            commit_initial_backoff_ms: initial_ms,
            commit_max_backoff_ms: max_ms,
            ..HelpdeskSettings::default()
        };

        let policy = settings.commit_policy();
        assert_eq!(policy.max_attempts, expected_attempts);
        assert_eq!(policy.initial_backoff, expected_initial);
        assert!(policy.max_backoff >= policy.initial_backoff);
    }
}
