//! InkPink: a micro-studio for 8-bit flash tattoos.
//!
//! A 32×32 pixel board over a faint flash template, with a bounded undo
//! timeline and a mock wallet/XP progression layer that activates invisibly
//! as the artist paints.

#![allow(dead_code)] // API surface kept for the claim flow and future tools

pub mod app;
pub mod board;
pub mod grid;
pub mod history;
#[macro_use]
pub mod i18n;
pub mod io;
#[macro_use]
pub mod logger;
pub mod pixels;
pub mod progression;
pub mod render;
pub mod scheduler;
pub mod theme;
pub mod throttle;
