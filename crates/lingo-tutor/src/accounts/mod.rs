//! Learner accounts. Credentials and tokens are issued elsewhere; this module owns
//! the profile record that progression state hangs off.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{AccountView, NewAccount, UserAccount, UserId};
pub use repository::AccountRepository;
pub use router::account_router;
pub use service::{AccountService, AccountServiceError};
