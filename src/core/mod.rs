pub mod activity;
pub mod area;
pub mod cell;
pub mod config;
pub mod connections;
pub mod engine;
pub mod random;
pub mod segment;
pub mod selection;
pub mod shared;
pub mod snapshot;
pub mod synapses;
pub mod types;
