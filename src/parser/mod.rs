//! Inbound request validation.
//!
//! Gatekeeps malformed or out-of-scope video URLs before any extraction work
//! begins. Validation is synchronous, side-effect-free and never touches the
//! network.

mod error;
mod url;

pub use error::{MAX_URL_LENGTH, ParseError};
pub use self::url::{ValidatedUrl, validate_video_url};
