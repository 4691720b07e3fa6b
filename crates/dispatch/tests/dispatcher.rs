//! Integration tests for the dispatch pipeline against a scripted gateway.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use courier_core::types::{CampaignType, NotificationType};
use courier_db::models::device_token::RegisterDeviceToken;
use courier_db::models::preference::UpdatePreference;
use courier_db::repositories::{DeviceTokenRepo, PreferenceRepo};
use courier_dispatch::{
    events, CampaignSeed, CampaignTracker, DeviceTokenRegistry, DispatchError, DispatchRequest,
    NotificationDispatcher, PreferenceFilter, SkipReason,
};
use courier_gateway::{
    FailureKind, MulticastOutcome, PushGateway, PushMessage, SendFailure, TokenOutcome,
    TopicChangeOutcome,
};
use sqlx::PgPool;

/// Gateway double with per-token scripted failures. Tokens not named in the
/// script succeed.
struct MockGateway {
    failures: HashMap<String, FailureKind>,
    calls: AtomicUsize,
}

impl MockGateway {
    fn succeeding() -> Self {
        Self::with_failures([])
    }

    fn with_failures(failures: impl IntoIterator<Item = (&'static str, FailureKind)>) -> Self {
        Self {
            failures: failures
                .into_iter()
                .map(|(t, k)| (t.to_string(), k))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn outcome_for(&self, token: &str) -> Result<String, SendFailure> {
        match self.failures.get(token) {
            Some(kind) => Err(SendFailure::new(*kind, format!("scripted {kind:?}"))),
            None => Ok(format!("msg-{token}")),
        }
    }
}

#[async_trait]
impl PushGateway for MockGateway {
    fn is_initialized(&self) -> bool {
        true
    }

    async fn send_single(&self, token: &str, _: &PushMessage) -> Result<String, SendFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome_for(token)
    }

    async fn send_multicast(&self, tokens: &[String], _: &PushMessage) -> MulticastOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut outcome = MulticastOutcome::default();
        for token in tokens {
            outcome.push(TokenOutcome {
                token: token.clone(),
                result: self.outcome_for(token),
            });
        }
        outcome
    }

    async fn send_to_topic(&self, topic: &str, _: &PushMessage) -> Result<String, SendFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("msg-topic-{topic}"))
    }

    async fn subscribe(&self, tokens: &[String], _: &str) -> TopicChangeOutcome {
        TopicChangeOutcome {
            success_count: tokens.len(),
            failure_count: 0,
        }
    }

    async fn unsubscribe(&self, tokens: &[String], _: &str) -> TopicChangeOutcome {
        TopicChangeOutcome {
            success_count: tokens.len(),
            failure_count: 0,
        }
    }
}

async fn create_user(pool: &PgPool, username: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO users (username) VALUES ($1) RETURNING id")
        .bind(username)
        .fetch_one(pool)
        .await
        .unwrap()
}

fn dispatcher(pool: &PgPool, gateway: Arc<MockGateway>) -> NotificationDispatcher {
    NotificationDispatcher::new(pool.clone(), gateway)
}

fn request() -> DispatchRequest {
    DispatchRequest::new(NotificationType::System, "Hello", "World")
}

async fn notification_status(pool: &PgPool, id: i64) -> String {
    sqlx::query_scalar("SELECT status FROM notifications WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Per-user dispatch
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn partial_delivery_marks_sent_and_prunes_dead_token(pool: PgPool) {
    let user = create_user(&pool, "alice").await;
    DeviceTokenRepo::upsert(&pool, user, "tok-live", "ANDROID", None)
        .await
        .unwrap();
    DeviceTokenRepo::upsert(&pool, user, "tok-dead", "IOS", None)
        .await
        .unwrap();

    let gateway = Arc::new(MockGateway::with_failures([(
        "tok-dead",
        FailureKind::Unregistered,
    )]));
    let result = dispatcher(&pool, gateway)
        .dispatch_to_user(user, &request(), None)
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.devices_count, 2);
    assert_eq!(result.success_count, 1);
    assert_eq!(result.failure_count, 1);
    assert_eq!(result.invalid_tokens, vec!["tok-dead".to_string()]);

    // One device delivered, so the history row settles to SENT.
    let id = result.notification_id.unwrap();
    assert_eq!(notification_status(&pool, id).await, "SENT");

    // Exactly the dead token is deactivated.
    let active = DeviceTokenRepo::active_tokens_for(&pool, user).await.unwrap();
    assert_eq!(active, vec!["tok-live".to_string()]);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn all_sends_failing_marks_failed(pool: PgPool) {
    let user = create_user(&pool, "alice").await;
    DeviceTokenRepo::upsert(&pool, user, "tok-1", "WEB", None)
        .await
        .unwrap();

    let gateway = Arc::new(MockGateway::with_failures([("tok-1", FailureKind::Other)]));
    let result = dispatcher(&pool, gateway)
        .dispatch_to_user(user, &request(), None)
        .await
        .unwrap();

    assert!(!result.success);
    let id = result.notification_id.unwrap();
    assert_eq!(notification_status(&pool, id).await, "FAILED");

    // Transient failure: the token survives.
    let active = DeviceTokenRepo::active_tokens_for(&pool, user).await.unwrap();
    assert_eq!(active, vec!["tok-1".to_string()]);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn user_without_devices_is_skipped_silently(pool: PgPool) {
    let user = create_user(&pool, "alice").await;
    let gateway = Arc::new(MockGateway::succeeding());

    let result = dispatcher(&pool, gateway.clone())
        .dispatch_to_user(user, &request(), None)
        .await
        .unwrap();

    assert_eq!(result.skipped, Some(SkipReason::NoDevices));
    assert!(result.notification_id.is_none());
    assert_eq!(gateway.call_count(), 0);

    // No history row is written for a skipped dispatch.
    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
        .bind(user)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn disabled_preferences_suppress_before_gateway_contact(pool: PgPool) {
    let user = create_user(&pool, "alice").await;
    DeviceTokenRepo::upsert(&pool, user, "tok-1", "WEB", None)
        .await
        .unwrap();
    PreferenceRepo::update(
        &pool,
        user,
        &UpdatePreference {
            enabled: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let gateway = Arc::new(MockGateway::succeeding());
    let result = dispatcher(&pool, gateway.clone())
        .dispatch_to_user(user, &request(), None)
        .await
        .unwrap();

    assert_eq!(result.skipped, Some(SkipReason::Preferences));
    assert_eq!(gateway.call_count(), 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn category_flag_gates_only_its_types(pool: PgPool) {
    let user = create_user(&pool, "alice").await;
    DeviceTokenRepo::upsert(&pool, user, "tok-1", "WEB", None)
        .await
        .unwrap();
    PreferenceRepo::update(
        &pool,
        user,
        &UpdatePreference {
            sale_notifications: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let gateway = Arc::new(MockGateway::succeeding());
    let d = dispatcher(&pool, gateway);

    let sale = DispatchRequest::new(NotificationType::SaleCreated, "Sale", "x");
    let result = d.dispatch_to_user(user, &sale, None).await.unwrap();
    assert_eq!(result.skipped, Some(SkipReason::Preferences));

    // System notifications still flow.
    let result = d.dispatch_to_user(user, &request(), None).await.unwrap();
    assert!(result.success);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn default_preferences_allow_every_type(pool: PgPool) {
    let user = create_user(&pool, "alice").await;
    let all = [
        NotificationType::SaleCreated,
        NotificationType::SaleUpdated,
        NotificationType::SaleDeleted,
        NotificationType::ProductLowStock,
        NotificationType::ProductCreated,
        NotificationType::ReportGenerated,
        NotificationType::MlPrediction,
        NotificationType::System,
        NotificationType::Custom,
    ];
    for ty in all {
        assert!(
            PreferenceFilter::should_send(&pool, user, ty).await.unwrap(),
            "default preferences must allow {ty:?}"
        );
    }
}

// ---------------------------------------------------------------------------
// Batch dispatch and campaigns
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn campaign_statistics_reflect_per_user_outcomes(pool: PgPool) {
    // 10 users with one token each; 3 of the tokens are scripted to fail.
    let mut user_ids = Vec::new();
    let mut failures = Vec::new();
    for i in 0..10 {
        let user = create_user(&pool, &format!("user{i}")).await;
        let token = format!("tok-{i}");
        DeviceTokenRepo::upsert(&pool, user, &token, "ANDROID", None)
            .await
            .unwrap();
        user_ids.push(user);
        if i < 3 {
            failures.push((token, FailureKind::Other));
        }
    }

    let gateway = Arc::new(MockGateway {
        failures: failures
            .iter()
            .map(|(t, k)| (t.clone(), *k))
            .collect(),
        calls: AtomicUsize::new(0),
    });

    let batch = dispatcher(&pool, gateway)
        .dispatch_to_users(
            &user_ids,
            &request(),
            Some(CampaignSeed {
                title: "Launch".into(),
                description: None,
                campaign_type: CampaignType::Manual,
                created_by: None,
            }),
        )
        .await
        .unwrap();

    assert_eq!(batch.total_users, 10);
    assert_eq!(batch.successful_users, 7);
    assert_eq!(batch.failed_users, 3);
    assert_eq!(batch.skipped_users, 0);

    let campaign = courier_db::repositories::CampaignRepo::get(&pool, batch.campaign_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(campaign.is_completed);
    assert_eq!(campaign.total_users, 10);
    assert_eq!(campaign.successful_sends, 7);
    assert_eq!(campaign.failed_sends, 3);
    assert_eq!(campaign.success_rate(), 70.0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn batch_drops_unknown_users_and_skips_tokenless_ones(pool: PgPool) {
    let with_token = create_user(&pool, "alice").await;
    let without_token = create_user(&pool, "bob").await;
    DeviceTokenRepo::upsert(&pool, with_token, "tok-a", "WEB", None)
        .await
        .unwrap();

    let gateway = Arc::new(MockGateway::succeeding());
    let batch = dispatcher(&pool, gateway)
        .dispatch_to_users(&[with_token, without_token, 999_999], &request(), None)
        .await
        .unwrap();

    // The unknown id never enters the batch; the tokenless user is skipped.
    assert_eq!(batch.total_users, 2);
    assert_eq!(batch.successful_users, 1);
    assert_eq!(batch.skipped_users, 1);
    assert_eq!(batch.failed_users, 0);
    assert!(batch.campaign_id.is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn campaign_blast_targets_users_with_active_tokens(pool: PgPool) {
    let reachable = create_user(&pool, "alice").await;
    let unreachable = create_user(&pool, "bob").await;
    DeviceTokenRepo::upsert(&pool, reachable, "tok-a", "WEB", None)
        .await
        .unwrap();
    DeviceTokenRepo::upsert(&pool, unreachable, "tok-b", "WEB", None)
        .await
        .unwrap();
    DeviceTokenRepo::deactivate(&pool, "tok-b").await.unwrap();

    let campaign = courier_db::repositories::CampaignRepo::create(
        &pool, "Blast", None, "MANUAL", None, 0,
    )
    .await
    .unwrap();

    let gateway = Arc::new(MockGateway::succeeding());
    let d = dispatcher(&pool, gateway);
    let batch = CampaignTracker::send_campaign_to_all_devices(&d, campaign.id, &request())
        .await
        .unwrap();

    assert_eq!(batch.total_users, 1);
    assert_eq!(batch.successful_users, 1);

    let finalized = courier_db::repositories::CampaignRepo::get(&pool, campaign.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(finalized.total_users, 1);
    assert_eq!(finalized.successful_sends, 1);
    assert_eq!(finalized.success_rate(), 100.0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn finalizing_unknown_campaign_blast_errors(pool: PgPool) {
    let gateway = Arc::new(MockGateway::succeeding());
    let d = dispatcher(&pool, gateway);
    let err = CampaignTracker::send_campaign_to_all_devices(&d, 404, &request())
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::CampaignNotFound(404)));
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn register_rejects_permanently_invalid_token(pool: PgPool) {
    let user = create_user(&pool, "alice").await;
    let gateway = MockGateway::with_failures([("tok-bad", FailureKind::Unregistered)]);

    let err = DeviceTokenRegistry::register(
        &pool,
        &gateway,
        user,
        &RegisterDeviceToken {
            token: "tok-bad".into(),
            platform: None,
            device_name: None,
        },
        true,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, DispatchError::InvalidToken(_)));
    // Nothing persisted on rejection.
    assert!(DeviceTokenRepo::list_for_user(&pool, user, false)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_rejects_token_on_any_validation_failure(pool: PgPool) {
    let user = create_user(&pool, "alice").await;
    // Not permanently classified, but still zero successes.
    let gateway = MockGateway::with_failures([("tok-flaky", FailureKind::Other)]);

    let err = DeviceTokenRegistry::register(
        &pool,
        &gateway,
        user,
        &RegisterDeviceToken {
            token: "tok-flaky".into(),
            platform: Some(courier_core::types::Platform::Ios),
            device_name: Some("iPhone".into()),
        },
        true,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, DispatchError::InvalidToken(_)));
    assert!(DeviceTokenRepo::list_for_user(&pool, user, false)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_with_uninitialized_gateway_rejects_validated_tokens(pool: PgPool) {
    let user = create_user(&pool, "alice").await;
    let gateway = courier_gateway::FcmGateway::disabled();
    let request = RegisterDeviceToken {
        token: "tok-unverifiable".into(),
        platform: None,
        device_name: None,
    };

    let err = DeviceTokenRegistry::register(&pool, &gateway, user, &request, true)
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::InvalidToken(_)));

    // Skipping validation still registers.
    let token = DeviceTokenRegistry::register(&pool, &gateway, user, &request, false)
        .await
        .unwrap();
    assert!(token.is_active);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unregistering_unknown_token_returns_false(pool: PgPool) {
    assert!(!DeviceTokenRegistry::unregister(&pool, "never-seen")
        .await
        .unwrap());
}

// ---------------------------------------------------------------------------
// Domain events
// ---------------------------------------------------------------------------

async fn create_admin(pool: &PgPool, username: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO users (username, role) VALUES ($1, 'admin') RETURNING id")
        .bind(username)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "../db/migrations")]
async fn low_stock_event_notifies_admins_only(pool: PgPool) {
    let admin = create_admin(&pool, "boss").await;
    let user = create_user(&pool, "alice").await;
    DeviceTokenRepo::upsert(&pool, admin, "tok-admin", "ANDROID", None)
        .await
        .unwrap();
    DeviceTokenRepo::upsert(&pool, user, "tok-alice", "ANDROID", None)
        .await
        .unwrap();

    let gateway = Arc::new(MockGateway::succeeding());
    let result = events::notify_product_low_stock(&dispatcher(&pool, gateway), 7, "Widget", 3)
        .await
        .unwrap();

    assert_eq!(result.total_users, 1);
    assert_eq!(result.successful_users, 1);

    let (owner, ty): (i64, String) =
        sqlx::query_as("SELECT user_id, notification_type FROM notifications")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(owner, admin);
    assert_eq!(ty, "PRODUCT_LOW_STOCK");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn prediction_event_targets_the_requesting_user(pool: PgPool) {
    let _admin = create_admin(&pool, "boss").await;
    let user = create_user(&pool, "alice").await;
    DeviceTokenRepo::upsert(&pool, user, "tok-alice", "ANDROID", None)
        .await
        .unwrap();

    let gateway = Arc::new(MockGateway::succeeding());
    let result = events::notify_ml_prediction(
        &dispatcher(&pool, gateway),
        user,
        serde_json::json!({ "model": "sales-v2", "horizon_days": 30 }),
    )
    .await
    .unwrap();

    assert_eq!(result.total_users, 1);
    assert_eq!(result.successful_users, 1);

    let (owner, ty): (i64, String) =
        sqlx::query_as("SELECT user_id, notification_type FROM notifications")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(owner, user);
    assert_eq!(ty, "ML_PREDICTION");
}
