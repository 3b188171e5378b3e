//! Inkview - image viewer for electrophoretic panels
//!
//! Decodes an image, fits it to the panel, runs it through the
//! `eink-pipeline` filter stages and presents it on an i.MX EPDC framebuffer
//! or an in-memory simulator.
//! This library exposes modules for integration testing.

pub mod error;
pub mod loader;
pub mod models;
pub mod panel;
pub mod viewer;
