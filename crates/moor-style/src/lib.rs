#![forbid(unsafe_code)]

//! Color and style model: default/16/256/24-bit colors with downsampling,
//! mixing and ANSI SGR emission, plus the `Style` the rest of the pager
//! attaches to every rendered cell.

pub mod color;
pub mod style;

pub use color::{Color, ColorCount};
pub use style::{AttrMask, Style};
