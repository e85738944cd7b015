//! Individual extraction steps

pub mod chars;
pub mod denoise;
pub mod deskew;
pub mod dilate;
pub mod glyph;
pub mod lines;
pub mod load;
pub mod regions;
pub mod threshold;
