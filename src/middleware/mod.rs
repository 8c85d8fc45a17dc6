pub mod gate;

pub use gate::require_auth;
