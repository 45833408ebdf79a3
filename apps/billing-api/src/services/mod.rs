//! Billing services.
//!
//! - [`sale_service`]: records sales and changes their status
//! - [`notification`]: post-commit invoice delivery
//! - [`document`]: invoice rendering

pub mod document;
pub mod notification;
pub mod sale_service;
