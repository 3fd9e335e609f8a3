//! HTTP front end for the crop recommender

pub mod api;
pub mod config;
