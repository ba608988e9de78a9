//! Unit tests for `AppError` display and conversions.

use pushpin_bot::AppError;

#[test]
fn display_prefixes_identify_the_variant() {
    let cases = [
        (AppError::Config("bad".into()), "config: bad"),
        (AppError::Slack("down".into()), "slack: down"),
        (AppError::NotFound("gone".into()), "not found: gone"),
        (AppError::Forbidden("nope".into()), "forbidden: nope"),
        (AppError::PinLimit("full".into()), "pin limit: full"),
        (AppError::Platform("ratelimited".into()), "platform: ratelimited"),
        (AppError::Enumeration("partial".into()), "enumeration: partial"),
        (AppError::Unauthorized("owner".into()), "unauthorized: owner"),
        (AppError::Expired("closed".into()), "expired: closed"),
        (AppError::Io("disk".into()), "io: disk"),
    ];
    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn toml_errors_become_config_errors() {
    let toml_err = toml::from_str::<toml::Value>("= broken").expect_err("invalid toml");
    let err = AppError::from(toml_err);
    assert!(matches!(err, AppError::Config(msg) if msg.starts_with("invalid config")));
}

#[test]
fn io_errors_become_io_errors() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let err = AppError::from(io_err);
    assert_eq!(err, AppError::Io("missing".into()));
}

#[test]
fn errors_implement_std_error() {
    fn assert_error<E: std::error::Error + Send + Sync + 'static>(_: &E) {}
    assert_error(&AppError::Slack("x".into()));
}
