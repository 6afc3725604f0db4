pub mod send_service;
pub mod tracking_service;
