pub mod campaign;
pub mod device_token;
pub mod notification;
pub mod preference;
pub mod user;
