//! Integration tests against loopback WebSocket and HTTP servers

mod support;

mod config_test;
mod feed_test;
mod rest_test;
