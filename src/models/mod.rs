pub mod calendar;
pub mod driver;
pub mod fleet;
pub mod quote;
pub mod request;
pub mod trip;
pub mod truck;
