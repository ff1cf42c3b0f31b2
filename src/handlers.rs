pub mod academic;
pub mod admins;
pub mod auth;
pub mod billing;
pub mod donations;
pub mod masjid;
pub mod profile;
pub mod public;
