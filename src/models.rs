pub mod academic;
pub mod auth;
pub mod billing;
pub mod donation;
pub mod masjid;
pub mod membership;
pub mod profile;
