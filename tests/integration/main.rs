//! Integration tests against a live database and a running server.
//!
//! All tests are ignored by default. Run with:
//! `DATABASE_URL=postgres://... cargo test --test integration -- --ignored`

mod api_tests;
mod db;
mod reservation_tests;
