/*!
# Vanith DevKit - Stubs and utilities for feed development

Helpers for exercising the feed without the real community backend:
- Stub HTTP backend serving canned `/api/all` payloads
- Builders for snapshot payloads (stats, activities, staff rosters)
- A test harness with request expectations and header assertions
*/

pub mod backend_stub;
pub mod fixtures;
pub mod test_utils;

pub use backend_stub::{RecordedRequest, StubBackend, StubResponse};
pub use fixtures::PayloadBuilder;
pub use test_utils::TestHarness;
