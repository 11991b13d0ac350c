//! Config file loading, overrides and runtime paths.

use std::collections::HashMap;
use std::path::PathBuf;

use pdzs::config::{load_env_file, Config, RuntimePaths, CONFIG_PATH_ENV};

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn missing_file_yields_defaults() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let config = Config::load_from(&tmp.path().join("absent.toml")).expect("defaults");
    assert_eq!(config.telegram.bot_token_env, "PDZS_BOT_TOKEN");
    assert!(config.storage.database.is_none());
    assert_eq!(config.limits.max_text_length, 4096);
    assert_eq!(config.limits.max_caption_length, 1024);
}

#[test]
fn file_values_override_defaults() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let path = tmp.path().join("config.toml");
    std::fs::write(
        &path,
        "[telegram]\nbot_token_env = \"MY_TOKEN\"\n\n[storage]\ndatabase = \"/var/lib/pdzs/settings.db\"\n\n[limits]\nmax_caption_length = 2048\n",
    )
    .expect("write config");

    let config = Config::load_from(&path).expect("parses");
    assert_eq!(config.telegram.bot_token_env, "MY_TOKEN");
    assert_eq!(
        config.storage.database,
        Some(PathBuf::from("/var/lib/pdzs/settings.db"))
    );
    assert_eq!(config.limits.max_caption_length, 2048);
    assert_eq!(config.limits.max_text_length, 4096);
}

#[test]
fn malformed_file_is_an_error() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, "[limits]\nmax_text_length = \"lots\"\n").expect("write config");
    assert!(Config::load_from(&path).is_err());
}

#[test]
fn env_overrides_apply() {
    let mut config = Config::default();
    config.apply_overrides(env_of(&[
        ("PDZS_DATABASE", "/tmp/other.db"),
        ("PDZS_BOT_TOKEN_ENV", "ALT_TOKEN"),
    ]));
    assert_eq!(config.storage.database, Some(PathBuf::from("/tmp/other.db")));
    assert_eq!(config.telegram.bot_token_env, "ALT_TOKEN");
}

#[test]
fn config_path_can_come_from_env() {
    let path = Config::config_path_with(env_of(&[(CONFIG_PATH_ENV, "/etc/pdzs.toml")]))
        .expect("path");
    assert_eq!(path, PathBuf::from("/etc/pdzs.toml"));
}

#[test]
fn bot_token_is_trimmed_and_required() {
    let config = Config::default();
    let token = config
        .bot_token(env_of(&[("PDZS_BOT_TOKEN", " 123:abc \n")]))
        .expect("token");
    assert_eq!(token, "123:abc");

    assert!(config.bot_token(env_of(&[])).is_err());
    assert!(config.bot_token(env_of(&[("PDZS_BOT_TOKEN", "   ")])).is_err());
}

#[test]
fn database_defaults_under_runtime_root() {
    let paths = RuntimePaths::under("/home/me/.pdzs");
    let mut config = Config::default();
    assert_eq!(
        config.database_path(&paths),
        PathBuf::from("/home/me/.pdzs/pdzs.db")
    );
    config.storage.database = Some(PathBuf::from("/data/pdzs.db"));
    assert_eq!(config.database_path(&paths), PathBuf::from("/data/pdzs.db"));
    assert_eq!(paths.logs_dir, PathBuf::from("/home/me/.pdzs/logs"));
}

#[test]
fn env_file_is_optional() {
    let tmp = tempfile::tempdir().expect("temp dir");
    assert!(!load_env_file(&tmp.path().join(".env")).expect("missing is fine"));

    let path = tmp.path().join(".env");
    std::fs::write(&path, "PDZS_CONFIG_TEST_MARKER=loaded\n").expect("write env");
    assert!(load_env_file(&path).expect("loads"));
    assert_eq!(
        std::env::var("PDZS_CONFIG_TEST_MARKER").as_deref(),
        Ok("loaded")
    );
}
