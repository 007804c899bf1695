//! HTTP delivery transport

pub mod client;

pub use client::{DeliveryClient, DeliveryClientBuilder};
