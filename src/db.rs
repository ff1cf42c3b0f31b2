pub mod user_repo;
pub use user_repo::UserRepository;
pub mod masjid_repo;
pub use masjid_repo::MasjidRepository;
pub mod membership_repo;
pub use membership_repo::MembershipRepository;
pub mod academic_repo;
pub use academic_repo::AcademicRepository;
pub mod billing_repo;
pub use billing_repo::BillingRepository;
pub mod donation_repo;
pub use donation_repo::DonationRepository;
pub mod profile_repo;
pub use profile_repo::ProfileRepository;
