mod rating;
mod secret;

pub use rating::{Rating, RatingConversionError, RATING_CEILING, RATING_FLOOR, STARTING_RATING};
pub use secret::Secret;
