//! Slide-count guard. Runs after rasterisation and before any upload.

use crate::config::MAX_SLIDES;
use crate::error::ConvertError;

/// Reject documents with more than [`MAX_SLIDES`] pages.
///
/// Exactly `MAX_SLIDES` pages is allowed; zero pages is not an error here
/// (an empty deck simply publishes nothing).
pub fn check_page_count(count: usize) -> Result<(), ConvertError> {
    check_page_count_against(count, MAX_SLIDES)
}

pub(crate) fn check_page_count_against(count: usize, max: usize) -> Result<(), ConvertError> {
    if count > max {
        return Err(ConvertError::TooManyPages { count, max });
    }
    Ok(())
}
