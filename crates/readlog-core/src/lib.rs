pub mod config;
pub mod controller;
pub mod datetime;
pub mod error;
pub mod feedback;
pub mod filter;
pub mod form;
pub mod http;
pub mod record;
pub mod session;
pub mod stats;

pub use controller::{
  ListController,
  Phase
};
pub use error::{
  ApiError,
  Conflict
};
pub use feedback::{
  ConfirmRequest,
  Severity,
  Toast
};
pub use filter::{
  FilterCriteria,
  SortOrder
};
pub use form::{
  FormDraft,
  FormField
};
pub use http::{
  ApiClient,
  Transport
};
pub use record::Record;
pub use session::{
  Feedback,
  ListSession
};
