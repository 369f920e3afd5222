pub mod auth;
pub mod cookies;
pub mod domain;
pub mod interviews;
pub mod ports;
pub mod query;
pub mod session;
pub mod testing;

pub use auth::{AuthResult, AuthService, FailureKind};
pub use cookies::{RequestCookies, ResponseCookies};
pub use domain::{
    Feedback, FeedbackLookupParams, IdentityUser, Interview, LatestInterviewsParams,
    SessionClaims, SignInParams, SignUpParams, User,
};
pub use interviews::InterviewQueries;
pub use ports::{Document, DocumentStore, IdentityProvider, PortError, PortResult};
pub use query::{Direction, Filter, FilterOp, Query};
pub use session::{SessionManager, SESSION_COOKIE, SESSION_TTL_SECONDS};
