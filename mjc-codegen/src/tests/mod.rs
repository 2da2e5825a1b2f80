//! Tests for the whole backend, driven through the public API

mod end_to_end;
mod properties;
