//! Integration suite entry point.

mod mock_bus;

mod device_tests;
mod pipeline_tests;
