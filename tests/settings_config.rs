// tests/settings_config.rs
use offer_curator::config::settings::ENV_CONFIG_PATH;
use offer_curator::config::{AppConfig, CuratorSettings, Secrets};
use std::{env, fs};

const SECRET_VARS: [&str; 5] = [
    "SHOPEE_PARTNER_ID",
    "SHOPEE_API_KEY",
    "TELEGRAM_BOT_TOKEN",
    "TELEGRAM_CHAT_ID",
    "GEMINI_API_KEY",
];

#[serial_test::serial]
#[test]
fn default_uses_env_then_config_dir_then_builtin() {
    // Isolate CWD so the repo's own config/ is not picked up.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_CONFIG_PATH);

    // 1) nothing on disk -> built-in defaults
    let s = CuratorSettings::load_default().unwrap();
    assert_eq!(s.posts_per_run, 3);
    assert_eq!(s.request_delay_ms, 2_000);

    // 2) ./config/curator.toml
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(tmp.path().join("config/curator.toml"), "posts_per_run = 5\n").unwrap();
    let s = CuratorSettings::load_default().unwrap();
    assert_eq!(s.posts_per_run, 5);

    // 3) env path wins
    let p_env = tmp.path().join("other.toml");
    fs::write(&p_env, "posts_per_run = 1\ndry_run = true\n").unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    let s = CuratorSettings::load_default().unwrap();
    assert_eq!(s.posts_per_run, 1);
    assert!(s.dry_run);

    // 4) env path to a missing file is an error, not a silent fallback
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
    assert!(CuratorSettings::load_default().is_err());

    env::remove_var(ENV_CONFIG_PATH);
    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn app_config_needs_something_to_search() {
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    let cfg_path = tmp.path().join("curator.toml");
    fs::write(&cfg_path, "dry_run = true\nai_enabled = false\n").unwrap();
    env::set_var(ENV_CONFIG_PATH, cfg_path.display().to_string());
    for k in SECRET_VARS {
        env::remove_var(k);
    }
    env::set_var("SHOPEE_PARTNER_ID", "12345");
    env::set_var("SHOPEE_API_KEY", "k");

    let err = AppConfig::load().unwrap_err();
    assert!(err.to_string().contains("nothing to search"));

    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/keywords.txt"),
        "# ofertas\nfone bluetooth\n\nAir Fryer\nFONE BLUETOOTH\n",
    )
    .unwrap();
    let cfg = AppConfig::load().unwrap();
    assert_eq!(cfg.keywords, vec!["fone bluetooth", "Air Fryer"]);
    assert!(cfg.secrets.telegram.is_none());
    assert!(cfg.secrets.gemini_api_key.is_none());
    assert_eq!(cfg.secrets.shopee_partner_id, 12345);

    for k in SECRET_VARS {
        env::remove_var(k);
    }
    env::remove_var(ENV_CONFIG_PATH);
    env::set_current_dir(&old).unwrap();
}

#[test]
fn live_run_requires_telegram_and_gemini() {
    let settings = CuratorSettings::default();
    let only_shopee = |k: &str| match k {
        "SHOPEE_PARTNER_ID" => Some("1".to_string()),
        "SHOPEE_API_KEY" => Some("k".to_string()),
        _ => None,
    };
    let err = Secrets::from_lookup(&settings, only_shopee).unwrap_err();
    assert!(err.to_string().contains("TELEGRAM_BOT_TOKEN"));

    let all = |k: &str| Some(format!("value-for-{k}")).filter(|_| k != "SHOPEE_PARTNER_ID").or(Some("7".into()));
    let s = Secrets::from_lookup(&settings, all).unwrap();
    assert!(s.telegram.is_some());
    assert!(s.gemini_api_key.is_some());
    // Debug output never carries the values.
    assert!(!format!("{s:?}").contains("value-for-"));
}
