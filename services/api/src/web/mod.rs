pub mod auth;
pub mod interviews;
pub mod middleware;
pub mod state;

// Re-export the handlers the server binary wires into the router.
pub use auth::{me_handler, sign_in_handler, sign_out_handler, sign_up_handler};
pub use interviews::{
    home_feed_handler, interview_detail_handler, latest_interviews_handler, my_interviews_handler,
};
pub use middleware::require_auth;
