pub mod approval;
pub mod availability;
pub mod capacity;
pub mod cost;
pub mod drivers;
pub mod orchestrator;
pub mod reports;
pub mod requests;
pub mod route;
pub mod trips;
pub mod validation;
