use quota_window::{
    Limit, LimitRegistry, ManualClock, QuotaError, RegistryConfig, SlidingWindow,
};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn test_named_limit_lifecycle() {
    init_tracing();
    let clock = ManualClock::new();
    let registry = LimitRegistry::with_clock(Arc::new(clock.clone()));

    registry
        .create_named("limit1", 10, Duration::from_secs(10))
        .unwrap();
    assert!(matches!(
        registry.create_named("limit1", 10, Duration::from_secs(10)),
        Err(QuotaError::AlreadyExists(_))
    ));

    assert!(registry.check("limit1", 10).unwrap());
    assert!(matches!(
        registry.check("limit2", 10),
        Err(QuotaError::NotFound(_))
    ));
    assert!(!registry.check("limit1", 10).unwrap());

    registry.reset("limit1").unwrap();
    assert!(registry.check("limit1", 10).unwrap());

    clock.advance(Duration::from_secs(5));
    assert!(registry.check("limit1", 5).unwrap());
    assert!(!registry.check("limit1", 1).unwrap());
}

#[test]
fn test_shared_handle_sees_registry_state() {
    let clock = ManualClock::new();
    let registry = LimitRegistry::with_clock(Arc::new(clock));
    registry
        .create_named("uploads", 3, Duration::from_secs(30))
        .unwrap();

    let handle = registry.get("uploads").unwrap();
    assert!(handle.check(2));
    assert!(!registry.check("uploads", 2).unwrap());
    assert!(registry.check("uploads", 1).unwrap());
    assert!(!handle.check(1));
}

#[test]
fn test_unnamed_and_named_are_separate() {
    let registry = LimitRegistry::new();
    registry
        .create_named("api", 1, Duration::from_secs(60))
        .unwrap();

    let unnamed = SlidingWindow::from_secs(1, 60).unwrap();
    assert!(unnamed.check(1));
    assert!(registry.check("api", 1).unwrap());
    assert!(!unnamed.check(1));
    assert!(!registry.check("api", 1).unwrap());
}

#[test]
fn test_process_wide_registry() {
    quota_window::create_named("named-limits-it", 2, 60).unwrap();

    assert!(quota_window::check("named-limits-it", 2).unwrap());
    assert!(!quota_window::check("named-limits-it", 1).unwrap());
    quota_window::reset("named-limits-it").unwrap();
    assert!(quota_window::check("named-limits-it", 1).unwrap());

    assert_eq!(
        quota_window::check("named-limits-it-missing", 1),
        Err(QuotaError::NotFound("named-limits-it-missing".to_string()))
    );
    assert_eq!(
        quota_window::create_named("", 2, 60),
        Err(QuotaError::InvalidName(String::new()))
    );
}

#[test]
fn test_registry_from_config_file() {
    init_tracing();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "limits": {{
                "search": {{ "capacity": 2, "window_secs": 60 }},
                "health": {{ "capacity": 0 }}
            }}
        }}"#
    )
    .unwrap();

    let config = RegistryConfig::load_from_path(file.path()).unwrap();
    let registry = LimitRegistry::from_config(&config).unwrap();

    assert_eq!(registry.names(), vec!["health".to_string(), "search".to_string()]);
    assert!(registry.check("search", 2).unwrap());
    assert!(!registry.check("search", 1).unwrap());
    for _ in 0..10 {
        assert!(registry.check("health", 100).unwrap());
    }

    let stats = serde_json::to_value(registry.stats()).unwrap();
    assert_eq!(stats["search"]["capacity"], 2);
    assert_eq!(stats["health"]["unlimited"], true);
    assert!(stats["health"]["available"].is_null());
}
