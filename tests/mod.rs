//! Test module organization
//!
//! This module re-exports test helpers for use in test files.

mod helpers;

#[allow(unused_imports)]
pub use helpers::{
    build_test_config, build_test_registry, create_test_api_server, make_expired_token,
    make_token, ritual_payload, test_api_schema, valid_register_request, DUMMY_PUBLIC_KEY,
    DUMMY_SECRET, DUMMY_SIGNATURE, DUMMY_USERNAME, DUMMY_UUID,
};
