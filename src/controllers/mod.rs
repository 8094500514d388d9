pub mod home_controller;
pub mod cbot_controller;
pub mod account_controller;
pub mod broker_controller;
