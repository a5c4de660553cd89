use std::collections::BTreeSet;

use crate::progression::{
    calculate_xp, evaluate_badges, resolve_level, BadgeId, EligibilityCriterion,
    LevelDefinition, LevelThresholds, ProgressSnapshot, ProgressionConfig, ProgressionEngine,
    ThresholdError, XpPolicy,
};

fn ladder() -> Vec<LevelDefinition> {
    ProgressionConfig::standard().levels
}

#[test]
fn empty_message_still_earns_base_xp() {
    assert_eq!(calculate_xp(0), 10);
}

#[test]
fn per_character_bonus_is_floored() {
    assert_eq!(calculate_xp(1), 10);
    assert_eq!(calculate_xp(3), 11);
    assert_eq!(calculate_xp(180), 100);
}

#[test]
fn custom_policy_applies_its_own_rate() {
    let policy = XpPolicy {
        base_xp: 5,
        xp_per_char: 1.25,
    };
    assert_eq!(policy.calculate(4), 10);
    assert!(!XpPolicy {
        base_xp: 5,
        xp_per_char: f64::NAN
    }
    .is_valid());
}

#[test]
fn boundaries_are_inclusive() {
    let levels = ladder();
    assert_eq!(resolve_level(0, &levels).expect("floor").1.label, "Beginner");
    assert_eq!(resolve_level(99, &levels).expect("floor").1.label, "Beginner");
    assert_eq!(resolve_level(100, &levels).expect("novice").1.label, "Novice");
    assert_eq!(resolve_level(1_499, &levels).expect("master").1.label, "Master");
    assert_eq!(
        resolve_level(u64::MAX, &levels).expect("top").1.label,
        "Grandmaster"
    );
}

#[test]
fn equal_minimums_resolve_to_the_later_entry() {
    let levels = vec![
        LevelDefinition::new("Beginner", 0),
        LevelDefinition::new("Silver", 50),
        LevelDefinition::new("Gold", 50),
    ];
    let thresholds = LevelThresholds::new(levels).expect("ties are allowed");
    assert_eq!(thresholds.resolve(50).expect("resolves").label, "Gold");
    assert_eq!(thresholds.resolve_rank(75).expect("resolves"), 2);
}

#[test]
fn resolving_below_every_threshold_fails_fast() {
    let levels = vec![LevelDefinition::new("Novice", 100)];
    assert_eq!(
        resolve_level(10, &levels),
        Err(ThresholdError::BelowFloor { xp: 10 })
    );
}

#[test]
fn malformed_tables_are_rejected() {
    assert_eq!(LevelThresholds::new(Vec::new()), Err(ThresholdError::Empty));
    assert!(matches!(
        LevelThresholds::new(vec![LevelDefinition::new("Novice", 100)]),
        Err(ThresholdError::MissingFloor { .. })
    ));
    assert!(matches!(
        LevelThresholds::new(vec![
            LevelDefinition::new("Beginner", 0),
            LevelDefinition::new("Expert", 700),
            LevelDefinition::new("Adept", 400),
        ]),
        Err(ThresholdError::NonMonotonic { .. })
    ));
    assert_eq!(
        LevelThresholds::new(vec![
            LevelDefinition::new("Beginner", 0),
            LevelDefinition::new("Beginner", 10),
        ]),
        Err(ThresholdError::DuplicateLabel("Beginner".to_string()))
    );
}

#[test]
fn duplicate_badges_fail_config_validation() {
    let mut config = ProgressionConfig::standard();
    let first = config.badges[0].clone();
    config.badges.push(first);
    assert_eq!(
        ProgressionEngine::new(config).err(),
        Some(ThresholdError::DuplicateBadge("first-100-xp".to_string()))
    );
}

#[test]
fn next_level_reports_remaining_xp() {
    let thresholds = LevelThresholds::new(ladder()).expect("valid ladder");
    let next = thresholds.next_level(130);
    assert_eq!(next.next_level.as_deref(), Some("Apprentice"));
    assert_eq!(next.xp_needed, 70);

    let top = thresholds.next_level(2_000);
    assert_eq!(top.next_level, None);
    assert_eq!(top.xp_needed, 0);
}

#[test]
fn reaching_100_xp_qualifies_for_first_badge_and_novice() {
    let engine = ProgressionEngine::standard().expect("valid rules");
    let mut state = engine.initial_state();

    let earned = engine
        .apply_message_progression(&mut state, 180)
        .expect("message applies");

    assert_eq!(earned, 100);
    assert_eq!(state.cumulative_xp, 100);
    assert_eq!(state.level_label, "Novice");
    assert_eq!(state.messages_sent, 1);
    let qualified = engine
        .evaluate_badges(&state, &BTreeSet::new())
        .expect("evaluates");
    assert_eq!(
        qualified,
        vec![BadgeId::new("first-100-xp"), BadgeId::new("level-up")]
    );
}

#[test]
fn held_badges_never_requalify() {
    let engine = ProgressionEngine::standard().expect("valid rules");
    let snapshot = ProgressSnapshot {
        cumulative_xp: 500,
        messages_sent: 60,
        level_rank: 3,
    };
    let held: BTreeSet<BadgeId> = [BadgeId::new("first-100-xp"), BadgeId::new("chatterbox")]
        .into_iter()
        .collect();

    let qualified = evaluate_badges(engine.badge_rules(), &snapshot, &held);
    assert_eq!(qualified, vec![BadgeId::new("level-up")]);
}

#[test]
fn criteria_deserialize_from_configuration() {
    let criterion: EligibilityCriterion =
        serde_json::from_str(r#"{"kind":"messages_at_least","messages":50}"#).expect("parses");
    assert_eq!(
        criterion,
        EligibilityCriterion::MessagesAtLeast { messages: 50 }
    );
    assert!(!criterion.is_met(&ProgressSnapshot {
        cumulative_xp: 0,
        messages_sent: 49,
        level_rank: 0,
    }));
}

#[test]
fn experience_saturates_at_the_top_level() {
    let engine = ProgressionEngine::standard().expect("valid rules");
    let mut state = engine.initial_state();
    state.cumulative_xp = u64::MAX - 5;

    engine
        .apply_experience(&mut state, 10)
        .expect("saturating add resolves");
    assert_eq!(state.cumulative_xp, u64::MAX);
    assert_eq!(state.level_label, "Grandmaster");
}
