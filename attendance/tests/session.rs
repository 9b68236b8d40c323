use async_trait::async_trait;
use attendance::reply::{MSG_ADMIN_DISABLED, MSG_OUTSIDE_TIME, MSG_SUBMITTED};
use attendance::{
    AttemptOutcome, AttemptState, AttendanceBackend, AttendanceSession, BackendError,
    BusinessRule, Failure, LocationError, LocationProvider, SessionSettings, SubmitReply,
    TransitionError,
};
use chrono::{DateTime, FixedOffset, TimeZone};
use futures::future::join_all;
use geofence::{AttendancePolicy, Center, Coordinate, Denial};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const CENTER: Coordinate = Coordinate {
    lat: 28.6139,
    lng: 77.2090,
};
const AT_CENTER: Coordinate = Coordinate {
    lat: 28.61391,
    lng: 77.20901,
};
const TWENTY_FIVE_M_NORTH: Coordinate = Coordinate {
    lat: 28.61412,
    lng: 77.2090,
};

fn ist() -> FixedOffset {
    FixedOffset::east_opt(330 * 60).unwrap()
}

fn monday() -> DateTime<FixedOffset> {
    ist().with_ymd_and_hms(2025, 9, 8, 10, 0, 0).unwrap()
}

fn tuesday() -> DateTime<FixedOffset> {
    ist().with_ymd_and_hms(2025, 9, 9, 10, 0, 0).unwrap()
}

fn sunday() -> DateTime<FixedOffset> {
    ist().with_ymd_and_hms(2025, 9, 7, 10, 0, 0).unwrap()
}

struct MockLocation {
    at: Result<Coordinate, LocationError>,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockLocation {
    fn at(at: Coordinate) -> Arc<Self> {
        Arc::new(Self {
            at: Ok(at),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    fn slow(at: Coordinate, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            at: Ok(at),
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationProvider for MockLocation {
    async fn current_location(&self) -> Result<Coordinate, LocationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.at.clone()
    }
}

#[derive(Default)]
struct MockBackend {
    replies: Mutex<VecDeque<Result<SubmitReply, BackendError>>>,
    delay: Duration,
    button: Option<bool>,
    recent: Vec<serde_json::Value>,
    submits: AtomicUsize,
}

impl MockBackend {
    fn replying(replies: Vec<Result<SubmitReply, BackendError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            button: Some(true),
            ..Self::default()
        }
    }

    fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }
}

fn message(text: &str) -> SubmitReply {
    SubmitReply {
        message: text.to_string(),
        ..SubmitReply::default()
    }
}

#[async_trait]
impl AttendanceBackend for MockBackend {
    async fn submit_attendance(&self, _at: Coordinate) -> Result<SubmitReply, BackendError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(message(MSG_SUBMITTED)))
    }

    async fn button_status(&self) -> Result<bool, BackendError> {
        self.button
            .ok_or_else(|| BackendError::Transport("connection refused".into()))
    }

    async fn recent_attendance(&self) -> Result<Vec<serde_json::Value>, BackendError> {
        Ok(self.recent.clone())
    }
}

fn session(
    location: Arc<MockLocation>,
    backend: Arc<MockBackend>,
) -> AttendanceSession<Arc<MockLocation>, Arc<MockBackend>> {
    AttendanceSession::new(
        "tutor-1",
        Center::new("Main Center", Some(CENTER)),
        AttendancePolicy::default(),
        location,
        backend,
        SessionSettings {
            location_timeout: Duration::from_millis(500),
            submit_timeout: Duration::from_millis(500),
            utc_offset: ist(),
        },
    )
}

#[tokio::test]
async fn test_mark_at_center_is_recorded() {
    let location = MockLocation::at(AT_CENTER);
    let backend = Arc::new(MockBackend::replying(vec![]));
    let s = session(location.clone(), backend.clone());

    let outcome = s.mark_attendance(monday(), &CancellationToken::new()).await;
    match outcome {
        Ok(AttemptOutcome::Marked(receipt)) => {
            assert_eq!(receipt.message, MSG_SUBMITTED);
            assert_eq!(receipt.marked_on, monday().date_naive());
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(backend.submits(), 1);
    assert_eq!(s.state().name(), "marked");
}

#[tokio::test]
async fn test_concurrent_marks_submit_once() {
    let location = MockLocation::at(AT_CENTER);
    let backend = Arc::new(MockBackend {
        delay: Duration::from_millis(50),
        ..MockBackend::replying(vec![])
    });
    let s = session(location.clone(), backend.clone());
    let cancel = CancellationToken::new();

    let outcomes = join_all((0..5).map(|_| s.mark_attendance(monday(), &cancel))).await;

    let marked = outcomes
        .iter()
        .filter(|o| matches!(o, Ok(AttemptOutcome::Marked(_))))
        .count();
    let in_progress = outcomes
        .iter()
        .filter(|o| matches!(o, Ok(AttemptOutcome::InProgress)))
        .count();
    assert_eq!(marked, 1);
    assert_eq!(in_progress, 4);
    assert_eq!(backend.submits(), 1);
    assert_eq!(location.calls(), 1);
}

#[tokio::test]
async fn test_marked_short_circuits_without_evaluating() {
    let location = MockLocation::at(AT_CENTER);
    let backend = Arc::new(MockBackend::replying(vec![]));
    let s = session(location.clone(), backend.clone());
    let cancel = CancellationToken::new();

    s.mark_attendance(monday(), &cancel).await.unwrap();
    let again = s.mark_attendance(monday(), &cancel).await.unwrap();
    let retried = s.retry(monday(), &cancel).await.unwrap();

    assert!(matches!(again, AttemptOutcome::AlreadyMarked(_)));
    assert!(matches!(retried, AttemptOutcome::AlreadyMarked(_)));
    assert_eq!(location.calls(), 1);
    assert_eq!(backend.submits(), 1);
}

#[tokio::test]
async fn test_next_day_can_mark_again() {
    let location = MockLocation::at(AT_CENTER);
    let backend = Arc::new(MockBackend::replying(vec![]));
    let s = session(location, backend.clone());
    let cancel = CancellationToken::new();

    s.mark_attendance(monday(), &cancel).await.unwrap();
    let outcome = s.mark_attendance(tuesday(), &cancel).await.unwrap();

    assert!(matches!(outcome, AttemptOutcome::Marked(ref r) if r.marked_on == tuesday().date_naive()));
    assert_eq!(backend.submits(), 2);
}

#[tokio::test]
async fn test_out_of_range_is_denied_without_submitting() {
    let location = MockLocation::at(TWENTY_FIVE_M_NORTH);
    let backend = Arc::new(MockBackend::replying(vec![]));
    let s = session(location, backend.clone());

    let outcome = s
        .mark_attendance(monday(), &CancellationToken::new())
        .await
        .unwrap();
    match outcome {
        AttemptOutcome::Denied(Denial::OutOfRange { distance_m, radius_m }) => {
            assert!(distance_m > 20.0);
            assert_eq!(radius_m, 20.0);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(backend.submits(), 0);
    assert_eq!(s.state().name(), "denied");
}

#[tokio::test]
async fn test_sunday_is_denied_before_location() {
    let location = MockLocation::at(AT_CENTER);
    let backend = Arc::new(MockBackend::replying(vec![]));
    let s = session(location.clone(), backend.clone());

    let outcome = s
        .mark_attendance(sunday(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, AttemptOutcome::Denied(Denial::SundayBlocked));
    assert_eq!(location.calls(), 0);
    assert_eq!(backend.submits(), 0);
}

#[tokio::test]
async fn test_location_error_is_location_unavailable() {
    let location = Arc::new(MockLocation {
        at: Err(LocationError::PermissionDenied),
        delay: Duration::ZERO,
        calls: AtomicUsize::new(0),
    });
    let backend = Arc::new(MockBackend::replying(vec![]));
    let s = session(location, backend.clone());

    let outcome = s
        .mark_attendance(monday(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, AttemptOutcome::Denied(Denial::LocationUnavailable));
    assert_eq!(backend.submits(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_location_timeout_is_location_unavailable() {
    let location = MockLocation::slow(AT_CENTER, Duration::from_secs(60));
    let backend = Arc::new(MockBackend::replying(vec![]));
    let s = session(location, backend.clone());

    let outcome = s
        .mark_attendance(monday(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, AttemptOutcome::Denied(Denial::LocationUnavailable));
    assert_eq!(backend.submits(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_submit_timeout_is_transient_and_retryable() {
    let location = MockLocation::at(AT_CENTER);
    let backend = Arc::new(MockBackend {
        delay: Duration::from_secs(60),
        ..MockBackend::replying(vec![])
    });
    let s = session(location, backend.clone());

    let outcome = s
        .mark_attendance(monday(), &CancellationToken::new())
        .await
        .unwrap();

    match outcome {
        AttemptOutcome::Failed(failure) => assert!(failure.is_retryable()),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(s.state().name(), "failed");
}

#[tokio::test]
async fn test_transient_failure_then_retry_succeeds() {
    let location = MockLocation::at(AT_CENTER);
    let backend = Arc::new(MockBackend::replying(vec![Err(BackendError::Server {
        status: 502,
        message: "Bad Gateway".into(),
    })]));
    let s = session(location, backend.clone());
    let cancel = CancellationToken::new();

    let first = s.mark_attendance(monday(), &cancel).await.unwrap();
    assert!(matches!(first, AttemptOutcome::Failed(Failure::Transient { .. })));

    let second = s.retry(monday(), &cancel).await.unwrap();
    assert!(matches!(second, AttemptOutcome::Marked(_)));
    assert_eq!(backend.submits(), 2);
}

#[tokio::test]
async fn test_admin_disabled_requires_refresh() {
    let location = MockLocation::at(AT_CENTER);
    let backend = Arc::new(MockBackend {
        button: Some(false),
        ..MockBackend::replying(vec![Ok(message(MSG_ADMIN_DISABLED))])
    });
    let s = session(location.clone(), backend.clone());
    let cancel = CancellationToken::new();

    let outcome = s.mark_attendance(monday(), &cancel).await.unwrap();
    match outcome {
        AttemptOutcome::Failed(Failure::BusinessRule { rule, message }) => {
            assert_eq!(rule, BusinessRule::AdminDisabled);
            assert_eq!(message, MSG_ADMIN_DISABLED);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(s.staleness().admin_enabled);
    assert_eq!(
        s.mark_attendance(monday(), &cancel).await,
        Err(TransitionError::ResyncRequired)
    );

    let policy = s.refresh_policy().await.unwrap();
    assert!(!policy.admin_enabled);
    assert!(!s.staleness().any());
    assert_eq!(s.state(), AttemptState::Idle);

    let calls_before = location.calls();
    let outcome = s.mark_attendance(monday(), &cancel).await.unwrap();
    assert_eq!(outcome, AttemptOutcome::Denied(Denial::AdminDisabled));
    assert_eq!(location.calls(), calls_before);
    assert_eq!(backend.submits(), 1);
}

#[tokio::test]
async fn test_outside_time_adopts_assigned_window() {
    let location = MockLocation::at(AT_CENTER);
    let backend = Arc::new(MockBackend::replying(vec![Ok(SubmitReply {
        message: MSG_OUTSIDE_TIME.to_string(),
        attendance: None,
        assigned_time: Some("16:00-18:00".to_string()),
    })]));
    let s = session(location, backend);
    let cancel = CancellationToken::new();

    let outcome = s.mark_attendance(monday(), &cancel).await.unwrap();
    assert!(matches!(
        outcome,
        AttemptOutcome::Failed(Failure::BusinessRule {
            rule: BusinessRule::OutsideAssignedTime { .. },
            ..
        })
    ));
    assert!(s.staleness().window);
    assert_eq!(
        s.policy().window.map(|w| w.to_string()),
        Some("16:00-18:00".to_string())
    );

    s.refresh_policy().await.unwrap();
    let outcome = s.mark_attendance(monday(), &cancel).await.unwrap();
    assert!(matches!(
        outcome,
        AttemptOutcome::Denied(Denial::OutsideWindow { .. })
    ));
}

#[tokio::test]
async fn test_refresh_falls_back_to_enabled() {
    let backend = Arc::new(MockBackend {
        button: None,
        ..MockBackend::default()
    });
    let s = session(MockLocation::at(AT_CENTER), backend);
    assert!(matches!(s.refresh_policy().await, Err(BackendError::Transport(_))));
    assert!(s.policy().admin_enabled);
}

#[tokio::test]
async fn test_failed_refresh_keeps_business_failure() {
    let location = MockLocation::at(AT_CENTER);
    let backend = Arc::new(MockBackend {
        button: None,
        ..MockBackend::replying(vec![Ok(message(MSG_ADMIN_DISABLED))])
    });
    let s = session(location, backend.clone());
    let cancel = CancellationToken::new();

    let outcome = s.mark_attendance(monday(), &cancel).await.unwrap();
    assert!(matches!(outcome, AttemptOutcome::Failed(Failure::BusinessRule { .. })));

    assert!(s.refresh_policy().await.is_err());
    assert!(s.staleness().admin_enabled);
    assert_eq!(s.state().name(), "failed");
    assert_eq!(
        s.mark_attendance(monday(), &cancel).await,
        Err(TransitionError::ResyncRequired)
    );
    assert_eq!(backend.submits(), 1);
}

#[tokio::test]
async fn test_cancel_during_submission_returns_to_idle() {
    let location = MockLocation::at(AT_CENTER);
    let backend = Arc::new(MockBackend {
        delay: Duration::from_millis(300),
        ..MockBackend::replying(vec![])
    });
    let s = session(location, backend);
    let cancel = CancellationToken::new();

    let (outcome, _) = tokio::join!(s.mark_attendance(monday(), &cancel), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
    });

    assert_eq!(outcome, Ok(AttemptOutcome::Cancelled));
    assert_eq!(s.state(), AttemptState::Idle);
}

#[tokio::test]
async fn test_cancel_during_location_returns_to_idle() {
    let location = MockLocation::slow(AT_CENTER, Duration::from_millis(300));
    let backend = Arc::new(MockBackend::replying(vec![]));
    let s = session(location, backend.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = s.mark_attendance(monday(), &cancel).await;

    assert_eq!(outcome, Ok(AttemptOutcome::Cancelled));
    assert_eq!(s.state(), AttemptState::Idle);
    assert_eq!(backend.submits(), 0);
}

#[tokio::test]
async fn test_sync_today_marks_from_recent() {
    let location = MockLocation::at(AT_CENTER);
    let backend = Arc::new(MockBackend {
        recent: vec![json!({ "_id": "a1", "status": "present" })],
        ..MockBackend::replying(vec![])
    });
    let s = session(location.clone(), backend.clone());

    assert_eq!(s.sync_today(monday()).await, Ok(true));
    let outcome = s
        .mark_attendance(monday(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(matches!(outcome, AttemptOutcome::AlreadyMarked(_)));
    assert_eq!(location.calls(), 0);
    assert_eq!(backend.submits(), 0);
}

#[tokio::test]
async fn test_sync_today_empty_is_not_marked() {
    let backend = Arc::new(MockBackend::replying(vec![]));
    let s = session(MockLocation::at(AT_CENTER), backend);
    assert_eq!(s.sync_today(monday()).await, Ok(false));
    assert_eq!(s.state(), AttemptState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_attempt_during_location_returns_to_idle() {
    let location = MockLocation::slow(AT_CENTER, Duration::from_secs(5));
    let backend = Arc::new(MockBackend::replying(vec![]));
    let s = session(location.clone(), backend.clone());
    let cancel = CancellationToken::new();

    let dropped = tokio::time::timeout(
        Duration::from_millis(10),
        s.mark_attendance(monday(), &cancel),
    )
    .await;
    assert!(dropped.is_err());
    assert_eq!(s.state(), AttemptState::Idle);

    let outcome = s.mark_attendance(monday(), &cancel).await.unwrap();
    assert_eq!(outcome, AttemptOutcome::Denied(Denial::LocationUnavailable));
    assert_eq!(location.calls(), 2);
    assert_eq!(backend.submits(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_attempt_during_submission_returns_to_idle() {
    let location = MockLocation::at(AT_CENTER);
    let backend = Arc::new(MockBackend {
        delay: Duration::from_secs(5),
        ..MockBackend::replying(vec![])
    });
    let s = session(location, backend.clone());

    let dropped = tokio::time::timeout(
        Duration::from_millis(100),
        s.mark_attendance(monday(), &CancellationToken::new()),
    )
    .await;

    assert!(dropped.is_err());
    assert_eq!(s.state(), AttemptState::Idle);
    assert_eq!(backend.submits(), 1);
}

#[tokio::test]
async fn test_session_cancel_abandons_submission() {
    let location = MockLocation::at(AT_CENTER);
    let backend = Arc::new(MockBackend {
        delay: Duration::from_millis(200),
        ..MockBackend::replying(vec![])
    });
    let s = session(location, backend.clone());
    let cancel = CancellationToken::new();

    assert!(!s.cancel());
    let (outcome, cancelled) = tokio::join!(s.mark_attendance(monday(), &cancel), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        s.cancel()
    });

    assert!(cancelled);
    assert_eq!(outcome, Ok(AttemptOutcome::Cancelled));
    assert_eq!(s.state(), AttemptState::Idle);

    let again = s.mark_attendance(monday(), &cancel).await.unwrap();
    assert!(matches!(again, AttemptOutcome::Marked(_)));
    assert_eq!(backend.submits(), 2);
}

#[tokio::test]
async fn test_sync_today_during_submission_leaves_attempt_to_decide() {
    let location = MockLocation::at(AT_CENTER);
    let backend = Arc::new(MockBackend {
        delay: Duration::from_millis(100),
        recent: vec![json!({ "_id": "a1", "status": "present" })],
        ..MockBackend::replying(vec![])
    });
    let s = session(location, backend.clone());

    let cancel = CancellationToken::new();
    let (outcome, synced) = tokio::join!(
        s.mark_attendance(monday(), &cancel),
        async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let state = s.state();
            (state, s.sync_today(monday()).await)
        }
    );

    let (state_during_sync, synced) = synced;
    assert_eq!(state_during_sync, AttemptState::Submitting);
    assert_eq!(synced, Ok(true));
    match outcome {
        Ok(AttemptOutcome::Marked(receipt)) => assert_eq!(receipt.message, MSG_SUBMITTED),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(backend.submits(), 1);
}
