pub mod academic_service;
pub mod auth;
pub mod billing_service;
pub mod donation_service;
pub mod masjid_service;
pub mod payment_gateway;
pub mod profile_service;
pub mod storage;
