//! Domain layer - product records, nutrition services, and collaborator traits

pub mod model;
pub mod repository;
pub mod service;
