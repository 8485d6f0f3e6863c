//! HTTP request handlers for the SensorThings API.

pub mod entities;
pub mod health;
pub mod landing;
