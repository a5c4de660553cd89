use lingo_tutor::progression::{
    BadgeId, MessageLength, ProgressionConfig, ProgressionEngine, ThresholdError,
};

const CUSTOM_RULES: &str = r#"{
    "xp": { "base_xp": 5, "xp_per_char": 1.0 },
    "levels": [
        { "label": "Seedling", "minimum_xp": 0 },
        { "label": "Sprout", "minimum_xp": 25 },
        { "label": "Tree", "minimum_xp": 60 }
    ],
    "badges": [
        {
            "badge": { "id": "talkative", "name": "Talkative", "description": "Three messages", "icon": "🗣" },
            "criterion": { "kind": "messages_at_least", "messages": 3 }
        },
        {
            "badge": { "id": "grown", "name": "Fully Grown", "description": "Reached Tree", "icon": "🌳" },
            "criterion": { "kind": "level_rank_at_least", "rank": 2 }
        }
    ]
}"#;

#[test]
fn ladder_and_badges_come_from_configuration() {
    let config: ProgressionConfig = serde_json::from_str(CUSTOM_RULES).expect("rules parse");
    let engine = ProgressionEngine::new(config).expect("rules validate");
    let mut state = engine.initial_state();
    assert_eq!(state.level_label, "Seedling");

    let lengths = ["hello", "how are you", "I am learning to speak"];
    let mut earned = Vec::new();
    for text in lengths {
        let length = MessageLength::of_text(text);
        earned.push(
            engine
                .apply_message_progression(&mut state, length.get())
                .expect("applies"),
        );
    }

    assert_eq!(earned, vec![10, 16, 27]);
    assert_eq!(state.cumulative_xp, 53);
    assert_eq!(state.level_label, "Sprout");
    assert_eq!(
        engine
            .evaluate_badges(&state, &state.badges_held)
            .expect("evaluates"),
        vec![BadgeId::new("talkative")]
    );
}

#[test]
fn rules_without_a_zero_floor_are_refused() {
    let config: ProgressionConfig = serde_json::from_str(
        r#"{ "levels": [ { "label": "Sprout", "minimum_xp": 25 } ] }"#,
    )
    .expect("rules parse");
    assert!(matches!(
        ProgressionEngine::new(config),
        Err(ThresholdError::MissingFloor { .. })
    ));
}
