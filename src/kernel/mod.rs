pub mod controller;
pub mod event;
pub mod phase;
pub mod reactor;
pub mod scheduler;
pub mod settings;
pub mod snapshot;
pub mod state;
pub mod telemetry;
pub mod time;
pub mod tokenizer;
