use clap::Args;
use lingo_tutor::accounts::{AccountService, NewAccount};
use lingo_tutor::config::load_progression_file;
use lingo_tutor::error::AppError;
use lingo_tutor::progression::{
    EligibilityCriterion, MessageLength, ProgressionConfig, ProgressionEngine, ProgressionService,
};
use lingo_tutor::storage::MemoryStore;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct SimulateArgs {
    /// Message lengths (characters) to replay, in order
    #[arg(long, value_delimiter = ',', required = true, allow_negative_numbers = true)]
    pub(crate) lengths: Vec<i64>,
    /// Progression rules JSON (defaults to the built-in ladder and badges)
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct TableArgs {
    /// Progression rules JSON (defaults to the built-in ladder and badges)
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
}

/// One replayed message and what it earned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SimulationStep {
    pub(crate) message_length: u64,
    pub(crate) xp_earned: u64,
    pub(crate) cumulative_xp: u64,
    pub(crate) level: String,
    pub(crate) leveled_up: bool,
    pub(crate) new_badges: Vec<String>,
}

pub(crate) async fn run_simulation(args: SimulateArgs) -> Result<(), AppError> {
    let engine = load_engine(args.rules)?;
    let steps = simulate(engine, &args.lengths).await?;
    println!("{}", render_simulation(&steps));
    Ok(())
}

pub(crate) fn run_table(args: TableArgs) -> Result<(), AppError> {
    let engine = load_engine(args.rules)?;
    println!("{}", render_table(&engine));
    Ok(())
}

fn load_engine(rules: Option<PathBuf>) -> Result<ProgressionEngine, AppError> {
    let config = match rules {
        Some(path) => load_progression_file(path)?,
        None => ProgressionConfig::standard(),
    };
    Ok(ProgressionEngine::new(config)?)
}

/// Replay `lengths` for a fresh in-memory learner through the same services the
/// HTTP surface uses.
pub(crate) async fn simulate(
    engine: ProgressionEngine,
    lengths: &[i64],
) -> Result<Vec<SimulationStep>, AppError> {
    let engine = Arc::new(engine);
    let store = Arc::new(MemoryStore::new());
    let accounts = AccountService::new(store.clone(), engine.clone());
    let progression = ProgressionService::new(store, engine);

    let learner = accounts
        .register(NewAccount {
            username: "demo".to_string(),
            email: "demo@example.com".to_string(),
            language_level: "A1".to_string(),
            preferred_language: "English".to_string(),
            is_admin: false,
        })
        .await?;

    let mut steps = Vec::with_capacity(lengths.len());
    for &length in lengths {
        let length = MessageLength::new(length)?;
        let update = progression.record_message(learner.id, length).await?;
        let badges = progression.award_badges(learner.id).await?;
        steps.push(SimulationStep {
            message_length: length.get(),
            xp_earned: update.xp_earned,
            cumulative_xp: update.cumulative_xp,
            level: update.current_level,
            leveled_up: update.leveled_up,
            new_badges: badges.into_iter().map(|badge| badge.name).collect(),
        });
    }
    Ok(steps)
}

pub(crate) fn render_simulation(steps: &[SimulationStep]) -> String {
    let mut out = String::from("Message | Length |   XP | Total | Level        | New badges\n");
    out.push_str("--------+--------+------+-------+--------------+-----------\n");
    for (index, step) in steps.iter().enumerate() {
        let level = if step.leveled_up {
            format!("{} ↑", step.level)
        } else {
            step.level.clone()
        };
        out.push_str(&format!(
            "{:>7} | {:>6} | {:>4} | {:>5} | {:<12} | {}\n",
            index + 1,
            step.message_length,
            step.xp_earned,
            step.cumulative_xp,
            level,
            step.new_badges.join(", ")
        ));
    }
    if let Some(last) = steps.last() {
        out.push_str(&format!(
            "\nFinal: {} XP, level {}\n",
            last.cumulative_xp, last.level
        ));
    }
    out
}

pub(crate) fn render_table(engine: &ProgressionEngine) -> String {
    let policy = engine.xp_policy();
    let mut out = format!(
        "XP per message: {} + floor(length x {})\n\nLevels\n",
        policy.base_xp, policy.xp_per_char
    );
    for (rank, level) in engine.thresholds().levels().iter().enumerate() {
        out.push_str(&format!(
            "  {:>2}. {:<12} from {:>5} XP\n",
            rank, level.label, level.minimum_xp
        ));
    }
    out.push_str("\nBadges\n");
    for rule in engine.badge_rules() {
        let requirement = match &rule.criterion {
            EligibilityCriterion::ExperienceAtLeast { xp } => format!("{xp} XP"),
            EligibilityCriterion::MessagesAtLeast { messages } => format!("{messages} messages"),
            EligibilityCriterion::LevelRankAtLeast { rank } => format!("level rank {rank}"),
        };
        out.push_str(&format!(
            "  {} {:<14} {}\n",
            rule.badge.icon, rule.badge.name, requirement
        ));
    }
    out
}
