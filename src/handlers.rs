// src/handlers.rs

pub mod auth;
pub mod customers;
pub mod damaged;
pub mod dashboard;
pub mod notifications;
pub mod products;
pub mod variants;
