//! Integration tests: the full scan pipeline against in-memory collaborators.

mod mock_platform;
mod scan_pipeline;
