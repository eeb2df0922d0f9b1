//! Presentation: egui widgets over the data layer's result shapes.

pub mod panels;
pub mod plot;
pub mod table;
