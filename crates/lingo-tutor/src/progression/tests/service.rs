use std::sync::Arc;

use super::common::*;
use crate::accounts::UserId;
use crate::progression::{
    BadgeId, MessageLength, ProgressionError, ProgressionRepository, ProgressionService,
};

#[tokio::test]
async fn empty_message_earns_base_xp() {
    let (service, _, user) = build_service().await;

    let update = service
        .record_message(user, MessageLength::new(0).expect("valid length"))
        .await
        .expect("recorded");

    assert_eq!(update.xp_earned, 10);
    assert_eq!(update.cumulative_xp, 10);
    assert!(!update.leveled_up);
}

#[tokio::test]
async fn long_message_levels_up_and_awards_first_badge() {
    let (service, store, user) = build_service().await;

    let update = service
        .record_message(user, MessageLength::new(180).expect("valid length"))
        .await
        .expect("recorded");
    assert_eq!(update.xp_earned, 100);
    assert_eq!(update.previous_level, "Beginner");
    assert_eq!(update.current_level, "Novice");
    assert!(update.leveled_up);

    let awarded = service.award_badges(user).await.expect("badges checked");
    let ids: Vec<&str> = awarded.iter().map(|badge| badge.id.0.as_str()).collect();
    assert_eq!(ids, vec!["first-100-xp", "level-up"]);

    let state = store
        .progression(user)
        .await
        .expect("readable")
        .expect("learner exists");
    assert!(state.badges_held.contains(&BadgeId::new("first-100-xp")));
}

#[tokio::test]
async fn boundary_is_inclusive_at_one_hundred() {
    let (service, store, user) = build_service().await;
    let thresholds = service.engine().thresholds().clone();

    let before = store
        .record_message_experience(user, 99, &thresholds)
        .await
        .expect("recorded");
    assert_eq!(before.state.level_label, "Beginner");

    let after = store
        .record_message_experience(user, 1, &thresholds)
        .await
        .expect("recorded");
    assert_eq!(after.previous_level, "Beginner");
    assert_eq!(after.state.cumulative_xp, 100);
    assert_eq!(after.state.level_label, "Novice");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_messages_never_lose_an_increment() {
    let (service, store, user) = build_service().await;
    let service = Arc::new(service);

    // 10 + floor(80 * 0.5) = 50 XP each.
    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .record_message(user, MessageLength::new(80).expect("valid length"))
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.expect("task joins").expect("recorded");
    }

    let state = store
        .progression(user)
        .await
        .expect("readable")
        .expect("learner exists");
    assert_eq!(state.cumulative_xp, 100);
    assert_eq!(state.messages_sent, 2);
    assert_eq!(state.level_label, "Novice");
}

#[tokio::test]
async fn badges_are_awarded_once() {
    let (service, store, user) = build_service().await;

    service
        .record_message(user, MessageLength::new(180).expect("valid length"))
        .await
        .expect("recorded");
    let first = service.award_badges(user).await.expect("checked");
    assert!(!first.is_empty());

    service
        .record_message(user, MessageLength::new(12).expect("valid length"))
        .await
        .expect("recorded");
    let second = service.award_badges(user).await.expect("checked");
    assert!(second.is_empty());

    let awards = store.badge_awards(user).await.expect("readable");
    let first_100 = awards
        .iter()
        .filter(|award| award.badge_id == BadgeId::new("first-100-xp"))
        .count();
    assert_eq!(first_100, 1);
}

#[tokio::test]
async fn profile_reports_next_level_and_badges() {
    let (service, _, user) = build_service().await;
    service
        .record_message(user, MessageLength::new(180).expect("valid length"))
        .await
        .expect("recorded");
    service.award_badges(user).await.expect("checked");

    let profile = service.profile(user).await.expect("profile");
    assert_eq!(profile.current_level, "Novice");
    assert_eq!(profile.level_rank, 1);
    assert_eq!(profile.next.next_level.as_deref(), Some("Apprentice"));
    assert_eq!(profile.next.xp_needed, 100);
    assert_eq!(profile.badges.len(), 2);
}

#[test]
fn negative_lengths_are_rejected() {
    assert!(matches!(
        MessageLength::new(-1),
        Err(ProgressionError::InvalidInput(_))
    ));
    assert_eq!(MessageLength::of_text("¿qué?").get(), 5);
}

#[tokio::test]
async fn unknown_learner_is_not_found() {
    let (service, _, _) = build_service().await;

    let err = service
        .record_message(UserId(404), MessageLength::new(5).expect("valid length"))
        .await
        .expect_err("missing learner");
    assert!(matches!(err, ProgressionError::UserNotFound(UserId(404))));
}

#[tokio::test]
async fn repository_outage_surfaces_as_persistence_error() {
    let service = ProgressionService::new(Arc::new(UnavailableRepository), engine());

    let err = service
        .record_message(UserId(1), MessageLength::new(5).expect("valid length"))
        .await
        .expect_err("backend down");
    assert!(matches!(err, ProgressionError::Persistence(_)));
}
