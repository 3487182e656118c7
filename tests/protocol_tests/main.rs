//! Protocol tests for ws2mpd

mod command_tests;
