//! Flutter bridge for the xbase core.

pub mod api;
