//! Classifier Tests

use ws2mpd::protocol::{classify, is_noidle, CommandKind, ResponseKind};

#[test]
fn test_binary_commands() {
    assert_eq!(CommandKind::of("albumart song.flac 0"), CommandKind::Binary);
    assert_eq!(CommandKind::of("readpicture song.flac 8192"), CommandKind::Binary);
    assert_eq!(classify("albumart \"a b.mp3\" 0"), ResponseKind::Binary);
}

#[test]
fn test_tagged_normal_commands() {
    assert_eq!(CommandKind::of("password hunter2"), CommandKind::Password);
    assert_eq!(CommandKind::of("idle"), CommandKind::Idle);
    assert_eq!(CommandKind::of("idle player"), CommandKind::Idle);

    assert_eq!(classify("password hunter2"), ResponseKind::Normal);
    assert_eq!(classify("idle"), ResponseKind::Normal);
}

#[test]
fn test_everything_else_is_normal() {
    for command in ["status", "currentsong", "noidle", "playlistinfo", "", "idleness"] {
        assert_eq!(CommandKind::of(command), CommandKind::Normal, "{:?}", command);
        assert_eq!(classify(command), ResponseKind::Normal);
    }
}

#[test]
fn test_classifier_never_yields_welcome() {
    for command in ["", "OK MPD 0.23.5", "welcome"] {
        assert_ne!(classify(command), ResponseKind::Welcome);
    }
}

#[test]
fn test_is_noidle() {
    assert!(is_noidle("noidle"));
    assert!(is_noidle("noidle\n"));
    assert!(!is_noidle("idle"));
    assert!(!is_noidle("noidle player"));
}
