//! Operator endpoints: usage analytics, badge catalog seeding and the log tail.

pub mod domain;
pub mod logs;
pub mod repository;
pub mod router;
pub mod service;


pub use domain::{BasicStats, TopUser};
pub use repository::AdminRepository;
pub use router::{admin_router, CALLER_HEADER};
pub use service::{AdminError, AdminService, DEFAULT_TOP_USERS};
