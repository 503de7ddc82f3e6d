pub mod disengagement_rules;
pub mod engagement_config;
pub mod engagement_session;
pub mod engagement_status;
pub mod identity_registry;
pub mod session_attendance;
pub mod snapshot;
pub mod tracked_identity;
