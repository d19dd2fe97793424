//! Configuration utility types.
//!
//! | Module        | Purpose                                 |
//! |---------------|-----------------------------------------|
//! | `error`       | Configuration error types               |
//! | `field`       | Field paths used in diagnostics         |
//! | `one_or_many` | Single value or list config values      |

mod error;
pub mod field;
mod one_or_many;

pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};
pub use field::FieldPath;
pub use one_or_many::OneOrMany;
