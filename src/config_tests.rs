use crate::config::Config;
use std::env;
use std::sync::Mutex;
use std::sync::OnceLock;

// Global lock to prevent race conditions when modifying environment variables in tests
static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn get_env_lock() -> &'static Mutex<()> {
    ENV_LOCK.get_or_init(|| Mutex::new(()))
}

fn set(key: &str, value: &str) {
    // SAFETY: every test touching the environment holds ENV_LOCK
    unsafe { env::set_var(key, value) }
}

fn unset(key: &str) {
    // SAFETY: every test touching the environment holds ENV_LOCK
    unsafe { env::remove_var(key) }
}

#[test]
fn test_config_overrides_from_env() {
    let _guard = get_env_lock().lock().unwrap();
    set("DATABASE_URL", "sqlite://data/test.db");
    set("QUOTE_BUCKET_MINUTES", "15");
    set("PROVIDER_TIMEOUT_SECS", "5");
    set("NOTIFY_DRY_RUN", "true");

    let config = Config::from_env().unwrap();

    assert_eq!(config.store.database_url, "sqlite://data/test.db");
    assert_eq!(config.watch.quote_bucket, chrono::Duration::minutes(15));
    assert_eq!(config.provider.timeout_secs, 5);
    assert!(config.mail.dry_run);

    // Cleanup
    for key in ["DATABASE_URL", "QUOTE_BUCKET_MINUTES", "PROVIDER_TIMEOUT_SECS", "NOTIFY_DRY_RUN"] {
        unset(key);
    }
}

#[test]
fn test_config_rejects_malformed_numbers() {
    let _guard = get_env_lock().lock().unwrap();
    set("SMTP_PORT", "twenty-five");

    let err = Config::from_env().unwrap_err();
    assert!(format!("{:#}", err).contains("SMTP_PORT"));

    unset("SMTP_PORT");
}

#[test]
fn test_config_defaults() {
    let _guard = get_env_lock().lock().unwrap();

    let config = Config::from_env().unwrap();

    assert_eq!(config.mail.smtp_port, 25);
    assert_eq!(config.watch.exchange_timezone, chrono_tz::America::New_York);
    assert_eq!(config.provider.max_retries, 3);
}
