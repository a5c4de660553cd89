use serde::{Deserialize, Serialize};

pub type LessonId = u32;
pub type QuestionId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    pub description: String,
    #[serde(flatten)]
    pub body: LessonBody,
}

/// Lesson payload, serialized as `{"type": ..., "content": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum LessonBody {
    Dialog(DialogScenario),
    Quiz(Quiz),
}

/// Role-play the tutor opens with the learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialogScenario {
    pub scenario: String,
    pub bot_role: String,
    pub initial_message: String,
    /// Messages after which the tutor summarizes feedback.
    pub feedback_after_messages: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quiz {
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizQuestion {
    pub id: QuestionId,
    pub question: String,
    pub options: Vec<String>,
    #[serde(skip_serializing)]
    pub correct_answer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuizAnswer {
    pub lesson_id: LessonId,
    pub question_id: QuestionId,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerCheck {
    pub is_correct: bool,
    /// Only revealed after a wrong answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LessonError {
    #[error("lesson {0} not found")]
    LessonNotFound(LessonId),
    #[error("lesson {0} is not a quiz")]
    NotAQuiz(LessonId),
    #[error("question {question} not found in lesson {lesson}")]
    QuestionNotFound {
        lesson: LessonId,
        question: QuestionId,
    },
}

/// Read-only lesson library served to learners.
#[derive(Debug, Clone)]
pub struct LessonCatalog {
    lessons: Vec<Lesson>,
    tips: Vec<String>,
}

impl LessonCatalog {
    pub fn new(lessons: Vec<Lesson>, tips: Vec<String>) -> Self {
        Self { lessons, tips }
    }

    pub fn standard() -> Self {
        Self::new(standard_lessons(), LEARNING_TIPS.iter().map(|tip| tip.to_string()).collect())
    }

    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn tips(&self) -> &[String] {
        &self.tips
    }

    pub fn lesson(&self, id: LessonId) -> Result<&Lesson, LessonError> {
        self.lessons
            .iter()
            .find(|lesson| lesson.id == id)
            .ok_or(LessonError::LessonNotFound(id))
    }

    /// Compare a submitted answer with the stored one, ignoring surrounding whitespace.
    pub fn check_answer(&self, answer: &QuizAnswer) -> Result<AnswerCheck, LessonError> {
        let quiz = match &self.lesson(answer.lesson_id)?.body {
            LessonBody::Quiz(quiz) => quiz,
            LessonBody::Dialog(_) => return Err(LessonError::NotAQuiz(answer.lesson_id)),
        };
        let question = quiz
            .questions
            .iter()
            .find(|question| question.id == answer.question_id)
            .ok_or(LessonError::QuestionNotFound {
                lesson: answer.lesson_id,
                question: answer.question_id,
            })?;

        let is_correct = answer.answer.trim() == question.correct_answer;
        Ok(AnswerCheck {
            is_correct,
            correct_answer: (!is_correct).then(|| question.correct_answer.clone()),
        })
    }
}

const LEARNING_TIPS: [&str; 10] = [
    "Practice speaking every day, even if it's just for a few minutes",
    "Watch movies and TV shows in the language you're learning",
    "Use language learning apps to build vocabulary",
    "Find a language exchange partner to practice with",
    "Read books and articles in the target language",
    "Listen to podcasts and music in the language",
    "Keep a vocabulary notebook",
    "Set specific, achievable goals",
    "Don't be afraid to make mistakes",
    "Immerse yourself in the language as much as possible",
];

fn question(id: QuestionId, prompt: &str, options: [&str; 4], correct: &str) -> QuizQuestion {
    QuizQuestion {
        id,
        question: prompt.to_string(),
        options: options.iter().map(|option| option.to_string()).collect(),
        correct_answer: correct.to_string(),
    }
}

fn standard_lessons() -> Vec<Lesson> {
    vec![
        Lesson {
            id: 1,
            title: "Coffee Shop Conversation".to_string(),
            description: "Practice ordering coffee and having a casual conversation at a coffee shop"
                .to_string(),
            body: LessonBody::Dialog(DialogScenario {
                scenario: "You're at a coffee shop. The barista greets you.".to_string(),
                bot_role: "barista".to_string(),
                initial_message:
                    "Hi there! Welcome to our coffee shop. What can I get for you today?"
                        .to_string(),
                feedback_after_messages: 5,
            }),
        },
        Lesson {
            id: 2,
            title: "Basic Grammar Quiz".to_string(),
            description: "Test your knowledge of basic grammar rules".to_string(),
            body: LessonBody::Quiz(Quiz {
                questions: vec![
                    question(
                        1,
                        "Which sentence is grammatically correct?",
                        [
                            "I am going to the store yesterday",
                            "I went to the store yesterday",
                            "I going to the store yesterday",
                            "I goes to the store yesterday",
                        ],
                        "I went to the store yesterday",
                    ),
                    question(
                        2,
                        "Choose the correct article: ___ apple is red.",
                        ["a", "an", "the", "none"],
                        "an",
                    ),
                    question(
                        3,
                        "Which is the correct past tense of 'go'?",
                        ["goed", "went", "gone", "going"],
                        "went",
                    ),
                ],
            }),
        },
        Lesson {
            id: 3,
            title: "Vocabulary Quiz".to_string(),
            description: "Test your knowledge of common vocabulary".to_string(),
            body: LessonBody::Quiz(Quiz {
                questions: vec![
                    question(
                        1,
                        "What is the opposite of 'hot'?",
                        ["warm", "cold", "cool", "freezing"],
                        "cold",
                    ),
                    question(
                        2,
                        "Which word means 'very happy'?",
                        ["sad", "angry", "delighted", "tired"],
                        "delighted",
                    ),
                    question(
                        3,
                        "What is a synonym for 'big'?",
                        ["small", "tiny", "huge", "little"],
                        "huge",
                    ),
                ],
            }),
        },
    ]
}
