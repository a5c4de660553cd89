//! Language-learning tutor backend: accounts, tutor chat sessions, canned lessons,
//! admin analytics and the XP / level / badge progression engine that rewards
//! learners for every message they send.

pub mod accounts;
pub mod admin;
pub mod chat;
pub mod config;
pub mod error;
pub mod i18n;
pub mod lessons;
pub mod progression;
pub mod storage;
pub mod telemetry;
