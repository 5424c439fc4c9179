//! Infrastructure layer - concrete collaborators backed by external services

pub mod open_food_facts;

pub use open_food_facts::{OpenFoodFactsClient, DEFAULT_LOOKUP_BASE_URL};
