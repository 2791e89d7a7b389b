pub mod auth;
pub mod crm;
pub mod damaged;
pub mod dashboard;
pub mod inventory;
pub mod notification;
