pub mod contact_service;
pub mod contract_service;
pub mod dashboard_service;
pub mod email_service;
pub mod engagement_service;
pub mod notification_service;
pub mod product_service;
pub mod suggestion_service;
