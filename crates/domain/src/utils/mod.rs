//! Small helpers shared by the domain types

pub mod duration;
