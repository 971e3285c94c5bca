//! Request-to-predicate translation and pagination

pub mod filter;
pub mod pagination;

pub use filter::{parse_timestamp, Constraint, FilterParams, IncidentFilter};
pub use pagination::{page_count, paginate, Page, PageRequest};
