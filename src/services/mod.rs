//! Services layer - Business logic
//!
//! This module contains the business logic of the ArtSpark gallery backend.
//! Services are responsible for:
//! - Implementing business rules
//! - Coordinating between repositories
//! - Handling validation and error cases

pub mod artwork;
pub mod contact;
pub mod password;
pub mod review;
pub mod stats;
pub mod token;
pub mod user;

pub use artwork::{ArtworkService, ArtworkServiceError, IMAGE_URL_PREFIX};
pub use contact::{ContactService, ContactServiceError};
pub use password::{hash_password, random_secret, verify_password};
pub use review::{ReviewService, ReviewServiceError};
pub use stats::{StatsService, StatsServiceError};
pub use token::{Claims, TokenError, TokenService};
pub use user::{LoginInput, LoginResult, UserService, UserServiceError, INVALID_CREDENTIALS};
