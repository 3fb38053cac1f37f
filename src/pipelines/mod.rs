//! Render pipelines and the uniforms they share.
//!
//! - `garment` builds the pipeline every garment primitive is drawn with
//! - `light` holds the studio lighting uniform and its bind group

pub mod garment;
pub mod light;
