//! Canned lessons: a dialog scenario, two quizzes and a list of study tips.

pub mod catalog;
pub mod router;

pub use catalog::{
    AnswerCheck, DialogScenario, Lesson, LessonBody, LessonCatalog, LessonError, LessonId, Quiz,
    QuizAnswer, QuizQuestion,
};
pub use router::lesson_router;
