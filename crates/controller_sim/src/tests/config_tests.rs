use super::*;

use std::{
    collections::HashMap,
    env, fs,
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

static TEMP_SEQ: AtomicUsize = AtomicUsize::new(0);

fn temp_config(contents: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let dir = env::temp_dir().join(format!("controller_sim_test_{suffix}_{seq}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("controller.toml");
    fs::write(&path, contents).expect("write config");
    path
}

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn missing_file_uses_firmware_layout() {
    let settings =
        load_settings_from(Path::new("/nonexistent/controller.toml"), no_env).expect("settings");
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.bind_addr, "127.0.0.1:8080");
    assert_eq!(settings.digital_outputs, vec![12, 14]);
}

#[test]
fn file_values_and_env_overrides_apply_in_order() {
    let path = temp_config(
        r#"
bind_addr = "0.0.0.0:9000"
digital_outputs = [2]
"#,
    );
    let settings = load_settings_from(&path, no_env).expect("settings");
    assert_eq!(settings.bind_addr, "0.0.0.0:9000");
    assert_eq!(settings.digital_outputs, vec![2]);
    assert_eq!(settings.variables, vec!["tSET", "rhSET"]);

    let env = HashMap::from([
        ("SIM_BIND", "127.0.0.1:7000"),
        ("APP__BIND_ADDR", "127.0.0.1:7001"),
    ]);
    let settings = load_settings_from(&path, |key| env.get(key).map(|v| v.to_string()))
        .expect("settings");
    assert_eq!(settings.bind_addr, "127.0.0.1:7001");

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn rejects_inverted_pwm_range() {
    let path = temp_config(
        r#"
[[pwm_channels]]
channel = 5
min = 10
max = 10
"#,
    );
    let err = load_settings_from(&path, no_env).expect_err("invalid range");
    assert!(err.to_string().contains("pwm channel 5"));

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}
