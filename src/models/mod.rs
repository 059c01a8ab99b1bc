//! Models Module
//!
//! Request/response DTOs and the stored payload representation.

mod item;
mod requests;
mod responses;

pub use item::{PayloadFormat, StoredItem};
pub use requests::{GetQuery, PutObject, PutRequest};
pub use responses::{HealthResponse, PutResponse, PutResponseObject};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
