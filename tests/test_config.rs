//! Tests for YAML client configuration

use waypoint::config::ClientConfig;
use waypoint::media::Charset;

#[test]
fn test_config_empty_document_is_default() {
    let cfg = ClientConfig::from_yaml_str("{}").unwrap();
    assert_eq!(cfg, ClientConfig::default());
    assert_eq!(cfg.user_agent, None);
    assert_eq!(cfg.default_charset, Charset::UsAscii);
}

#[test]
fn test_config_full_document() {
    let cfg = ClientConfig::from_yaml_str(
        "user_agent: \"waypoint/0.1\"\ndefault_charset: \"utf-8\"\n",
    )
    .unwrap();
    assert_eq!(cfg.user_agent.as_deref(), Some("waypoint/0.1"));
    assert_eq!(cfg.default_charset, Charset::Utf8);
}

#[test]
fn test_config_charset_accepts_aliases() {
    let cfg = ClientConfig::from_yaml_str("default_charset: latin-1\n").unwrap();
    assert_eq!(cfg.default_charset, Charset::Iso8859_1);
}

#[test]
fn test_config_rejects_unknown_charset() {
    assert!(ClientConfig::from_yaml_str("default_charset: ebcdic\n").is_err());
}

#[test]
fn test_config_rejects_unknown_fields() {
    assert!(ClientConfig::from_yaml_str("listen_addr: \"0.0.0.0:80\"\n").is_err());
}

#[test]
fn test_config_loads_from_file() -> anyhow::Result<()> {
    let path = std::env::temp_dir().join("waypoint_test_config.yaml");
    std::fs::write(&path, "user_agent: \"waypoint/0.1\"\n")?;
    let cfg = ClientConfig::from_yaml_file(&path)?;
    std::fs::remove_file(&path)?;
    assert_eq!(cfg.user_agent.as_deref(), Some("waypoint/0.1"));
    assert_eq!(cfg.default_charset, Charset::UsAscii);
    Ok(())
}

#[test]
fn test_config_missing_file_reports_path() {
    let err = ClientConfig::from_yaml_file("/definitely/not/here.yaml").unwrap_err();
    assert!(err.to_string().contains("/definitely/not/here.yaml"));
}

#[test]
fn test_config_clone() {
    let cfg1 = ClientConfig::from_yaml_str("user_agent: \"a/1\"\n").unwrap();
    let cfg2 = cfg1.clone();
    assert_eq!(cfg1, cfg2);
}
