pub mod aggregator;
pub mod auth;
pub mod customer_service;
pub mod damage_service;
pub mod dashboard_service;
pub mod notification_service;
pub mod product_service;
pub mod purchase_service;
pub mod stock_service;
