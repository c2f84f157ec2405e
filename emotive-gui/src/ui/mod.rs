//! UI module organization for the Emotive GUI.

pub mod cards;
pub mod controls;
pub mod video;
