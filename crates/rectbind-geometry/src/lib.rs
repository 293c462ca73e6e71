//! Geometry primitives exposed through rectbind
//!
//! The only entity is [`Rectangle`], an axis-aligned rectangle described by two
//! opposite corners. Corners are stored exactly as given: nothing reorders them,
//! so an "inverted" rectangle reports negative length, height or area.

pub mod rectangle;

pub use rectangle::Rectangle;
