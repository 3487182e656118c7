//! Network tests for ws2mpd

mod bridge_tests;
