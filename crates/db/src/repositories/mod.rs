pub mod campaign_repo;
pub mod device_token_repo;
pub mod notification_repo;
pub mod preference_repo;
pub mod user_repo;

pub use campaign_repo::CampaignRepo;
pub use device_token_repo::DeviceTokenRepo;
pub use notification_repo::NotificationRepo;
pub use preference_repo::PreferenceRepo;
pub use user_repo::UserRepo;
