#![allow(clippy::unwrap_used, reason = "test assertions")]

use super::*;
use crate::auth::token::Sha256TokenHasher;
use crate::store::StoreLimits;
use crate::metrics::{GaugeSource, MetricsCollector};
use chrono::Duration;
use std::sync::Arc;
use relaygate_types::models::{CreateConfigRequest, TargetProtocol};

fn shop() -> CreateConfigRequest {
    CreateConfigRequest {
        name: "Shop".to_string(),
        subdomain: "shop".to_string(),
        target_url: "https://shop.example.com".to_string(),
        protocol: TargetProtocol::Https,
        enabled: true,
        default_proxy: None,
        description: None,
    }
}

fn store_with_config() -> (ConfigStore, String) {
    let store = ConfigStore::new(StoreLimits { max_configs: 10, max_tokens_per_config: 3 });
    let cfg = store.add(shop()).unwrap();
    (store, cfg.id)
}

fn force_expired(store: &ConfigStore, token_id: &str) {
    let inner = store.inner.read();
    inner.tokens.get(token_id).unwrap().lock().expires_at = Some(Utc::now() - Duration::seconds(1));
}

fn named(name: &str) -> CreateTokenRequest {
    CreateTokenRequest { name: name.to_string(), ..Default::default() }
}

#[test]
fn test_create_returns_raw_secret_once() {
    let (store, cfg) = store_with_config();
    let created = store.create_token(&cfg, named("ci"), &Sha256TokenHasher).unwrap();

    assert!(created.token.starts_with("rg_"));
    assert_eq!(created.info.token_prefix, &created.token[..8]);
    assert_eq!(created.info.status, TokenStatus::Active);
    assert_eq!(created.info.created_by, "admin");

    let listed = store.list_tokens(&cfg).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.info.id);
    // the listing view has no way to carry the secret or its hash
    let json = serde_json::to_string(&listed[0]).unwrap();
    assert!(!json.contains(&created.token));
    assert!(!json.contains("token_hash"));
}

#[test]
fn test_create_checks() {
    let (store, cfg) = store_with_config();
    let hasher = Sha256TokenHasher;

    let err = store.create_token("ghost", named("ci"), &hasher).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ConfigNotFound);

    let err = store.create_token(&cfg, named("   "), &hasher).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationFailed);

    let past = CreateTokenRequest {
        name: "old".to_string(),
        expires_at: Some(Utc::now() - Duration::hours(1)),
        ..Default::default()
    };
    let err = store.create_token(&cfg, past, &hasher).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationFailed);
    assert_eq!(err.detail("field").and_then(|v| v.as_str()), Some("expires_at"));

    for i in 0..3 {
        store.create_token(&cfg, named(&format!("t{i}")), &hasher).unwrap();
    }
    let err = store.create_token(&cfg, named("one-too-many"), &hasher).unwrap_err();
    assert_eq!(err.code(), ErrorCode::MaxTokensExceeded);
}

#[test]
fn test_authenticate_by_status() {
    let (store, cfg) = store_with_config();
    let hasher = Sha256TokenHasher;
    let created = store.create_token(&cfg, named("ci"), &hasher).unwrap();
    let hash = hasher.hash(&created.token);

    let token = store.authenticate(&hash, None).unwrap();
    assert_eq!(token.usage_count, 1);
    assert!(token.last_used.is_some());

    assert_eq!(store.authenticate("unknown", None).unwrap_err().code(), ErrorCode::Unauthorized);

    let err = store.authenticate(&hash, Some("another-config")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::PermissionDenied);
    assert_eq!(store.get_token(&cfg, &created.info.id).unwrap().usage_count, 1);
    assert_eq!(store.authenticate(&hash, Some(&cfg)).unwrap().usage_count, 2);

    store
        .update_token(
            &cfg,
            &created.info.id,
            UpdateTokenRequest { enabled: Some(false), ..Default::default() },
        )
        .unwrap();
    assert_eq!(store.authenticate(&hash, None).unwrap_err().code(), ErrorCode::TokenDisabled);
}

#[test]
fn test_expired_beats_disabled() {
    let (store, cfg) = store_with_config();
    let hasher = Sha256TokenHasher;
    let created = store.create_token(&cfg, named("ci"), &hasher).unwrap();

    // force an already-past expiry onto a disabled token
    force_expired(&store, &created.info.id);
    store.inner.read().tokens.get(&created.info.id).unwrap().lock().enabled = false;

    let err = store.authenticate(&hasher.hash(&created.token), None).unwrap_err();
    assert_eq!(err.code(), ErrorCode::TokenExpired);
    assert_eq!(store.get_token(&cfg, &created.info.id).unwrap().status, TokenStatus::Expired);
}

#[test]
fn test_concurrent_usage_is_not_lost() {
    let (store, cfg) = store_with_config();
    let hasher = Sha256TokenHasher;
    let created = store.create_token(&cfg, named("ci"), &hasher).unwrap();
    let hash = hasher.hash(&created.token);

    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..250 {
                    store.authenticate(&hash, None).unwrap();
                }
            });
        }
    });

    assert_eq!(store.get_token(&cfg, &created.info.id).unwrap().usage_count, 2000);
}

#[test]
fn test_update_token_validation() {
    let (store, cfg) = store_with_config();
    let created = store.create_token(&cfg, named("ci"), &Sha256TokenHasher).unwrap();
    let id = created.info.id;

    let renamed = store
        .update_token(
            &cfg,
            &id,
            UpdateTokenRequest { name: Some(" deploy ".to_string()), ..Default::default() },
        )
        .unwrap();
    assert_eq!(renamed.name, "deploy");

    let err = store
        .update_token(
            &cfg,
            &id,
            UpdateTokenRequest {
                expires_at: Some(Utc::now() - Duration::minutes(5)),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationFailed);

    let err = store.update_token(&cfg, "ghost", UpdateTokenRequest::default()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::TokenNotFound);
}

#[test]
fn test_tokens_are_scoped_to_their_config() {
    let (store, cfg) = store_with_config();
    let other = store
        .add(CreateConfigRequest {
            name: "Blog".to_string(),
            subdomain: "blog".to_string(),
            target_url: "blog.example.com".to_string(),
            protocol: TargetProtocol::Http,
            enabled: true,
            default_proxy: None,
            description: None,
        })
        .unwrap();
    let created = store.create_token(&cfg, named("ci"), &Sha256TokenHasher).unwrap();

    let err = store.delete_token(&other.id, &created.info.id).unwrap_err();
    assert_eq!(err.code(), ErrorCode::TokenNotFound);
    assert!(store.list_tokens(&other.id).unwrap().is_empty());

    store.delete_token(&cfg, &created.info.id).unwrap();
    assert!(store.list_tokens(&cfg).unwrap().is_empty());
}

#[test]
fn test_deleting_config_revokes_tokens() {
    let (store, cfg) = store_with_config();
    let hasher = Sha256TokenHasher;
    let created = store.create_token(&cfg, named("ci"), &hasher).unwrap();

    store.delete(&cfg).unwrap();
    assert_eq!(store.token_total(), 0);
    assert_eq!(
        store.authenticate(&hasher.hash(&created.token), None).unwrap_err().code(),
        ErrorCode::Unauthorized
    );
}

#[test]
fn test_active_token_gauge_follows_expiry() {
    let metrics = MetricsCollector::new(std::time::Duration::from_secs(30));
    let store = Arc::new(ConfigStore::default().with_metrics(Arc::clone(&metrics)));
    let gauges: Arc<dyn GaugeSource> = Arc::clone(&store) as Arc<dyn GaugeSource>;
    metrics.attach_gauge_source(Arc::downgrade(&gauges));

    let cfg = store.add(shop()).unwrap();
    let created = store.create_token(&cfg.id, named("ci"), &Sha256TokenHasher).unwrap();
    assert_eq!(metrics.snapshot().active_tokens, 1);

    // no store mutation between expiry and the read
    force_expired(&store, &created.info.id);
    let snap = metrics.snapshot();
    assert_eq!(snap.active_tokens, 0);
    assert_eq!(snap.total_tokens, 1);
}

#[test]
fn test_foreign_tenant_sees_only_permission_denied() {
    let (store, cfg) = store_with_config();
    let hasher = Sha256TokenHasher;
    let disabled = store.create_token(&cfg, named("off"), &hasher).unwrap();
    let expired = store.create_token(&cfg, named("old"), &hasher).unwrap();
    store
        .update_token(
            &cfg,
            &disabled.info.id,
            UpdateTokenRequest { enabled: Some(false), ..Default::default() },
        )
        .unwrap();
    force_expired(&store, &expired.info.id);

    for raw in [&disabled.token, &expired.token] {
        let err = store.authenticate(&hasher.hash(raw), Some("another-config")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::PermissionDenied);
        assert!(err.detail("token_id").is_none());
    }
    // the owner still gets the precise answer
    let err = store.authenticate(&hasher.hash(&expired.token), Some(&cfg)).unwrap_err();
    assert_eq!(err.code(), ErrorCode::TokenExpired);
}
