//! Bus records: domain types, persistence seam and the service that ties each
//! record to its stored image.

pub mod domain;
pub mod repository;
pub mod service;

pub use service::BusService;
