pub mod document;
pub mod health;
pub mod notification;
pub mod template;
pub mod tracking;
pub mod workflow;
