use crate::{DefaultPathResolver, PathResolver, next_segment_path, timestamped_file_name};

use std::fs;

use tempfile::tempdir;

/// WHAT: Rotation appends the first free segment number
/// WHY: A rotated segment must never land on an existing file
#[test]
#[allow(clippy::unwrap_used)]
fn given_existing_segments_when_rotating_then_first_free_number_used() {
    // Given: take.wav and take_1.wav already on disk
    let dir = tempdir().unwrap();
    let current = dir.path().join("take.wav");
    fs::write(&current, b"").unwrap();
    fs::write(dir.path().join("take_1.wav"), b"").unwrap();

    // When: Rotating from take.wav
    let next = next_segment_path(&current);

    // Then: take_2.wav is chosen
    assert_eq!(next, dir.path().join("take_2.wav"));
}

/// WHAT: Rotating a rotated segment continues its numbering
/// WHY: Repeated resets should read take_1, take_2, not take_1_1
#[test]
#[allow(clippy::unwrap_used)]
fn given_numbered_segment_when_rotating_then_number_incremented() {
    // Given: The current segment is take_2.wav
    let dir = tempdir().unwrap();
    let current = dir.path().join("take_2.wav");

    // When: Rotating
    let next = next_segment_path(&current);

    // Then: take_3.wav
    assert_eq!(next, dir.path().join("take_3.wav"));
}

/// WHAT: Rotation keeps the original extension
/// WHY: Container type must not change between segments
#[test]
fn given_custom_extension_when_rotating_then_extension_kept() {
    // Given: A .wave target
    let current = std::path::Path::new("/recordings/meeting.wave");

    // When: Rotating
    let next = next_segment_path(current);

    // Then: Same extension, next number
    assert_eq!(next, std::path::Path::new("/recordings/meeting_1.wave"));
}

/// WHAT: A generated name rotates to a new segment number
/// WHY: The millisecond field must not be mistaken for a segment number, or
/// rotation would take the name of a later recording
#[test]
#[allow(clippy::unwrap_used)]
fn given_generated_name_when_rotating_then_segment_suffix_appended() {
    // Given: A recording with a generated timestamped name
    let dir = tempdir().unwrap();
    let name = timestamped_file_name();
    let stem = name.trim_end_matches(".wav");
    let current = dir.path().join(&name);

    // When: Rotating
    let next = next_segment_path(&current);

    // Then: The whole timestamp is kept and _1 appended
    assert_eq!(next, dir.path().join(format!("{}_1.wav", stem)));
}

/// WHAT: A timestamp with millisecond 123 keeps its digits on rotation
/// WHY: recording_..._123 must never rotate onto recording_..._124
#[test]
fn given_timestamp_ending_in_digits_when_rotating_then_digits_untouched() {
    // Given: A generated name whose last field is the millisecond count
    let current = std::path::Path::new("/recordings/recording_20261016-120000-123.wav");

    // When: Rotating
    let next = next_segment_path(current);

    // Then: A segment suffix is added instead of bumping 123
    assert_eq!(
        next,
        std::path::Path::new("/recordings/recording_20261016-120000-123_1.wav")
    );
}

/// WHAT: The largest segment number does not overflow
/// WHY: Rotation runs on the state thread and must never panic
#[test]
fn given_max_segment_number_when_rotating_then_new_suffix_appended() {
    // Given: A stem already at u64::MAX
    let current = std::path::Path::new("/recordings/take_18446744073709551615.wav");

    // When: Rotating
    let next = next_segment_path(current);

    // Then: The number stays in the stem and a fresh suffix starts at 1
    assert_eq!(
        next,
        std::path::Path::new("/recordings/take_18446744073709551615_1.wav")
    );
}

/// WHAT: A segment number beyond u32 still increments
/// WHY: Long-running sessions are not limited to 32-bit segment counts
#[test]
fn given_large_segment_number_when_rotating_then_number_incremented() {
    // Given: take_4294967295.wav
    let current = std::path::Path::new("/recordings/take_4294967295.wav");

    // When: Rotating
    let next = next_segment_path(current);

    // Then: take_4294967296.wav
    assert_eq!(
        next,
        std::path::Path::new("/recordings/take_4294967296.wav")
    );
}

/// WHAT: A directory target gets a generated file name
/// WHY: Callers may pass only where recordings should go
#[test]
#[allow(clippy::unwrap_used)]
fn given_directory_when_resolving_then_timestamped_file_inside() {
    // Given: A resolver and an existing directory
    let dir = tempdir().unwrap();
    let resolver = DefaultPathResolver::new(None);

    // When: Resolving the directory
    let path = resolver.resolve(Some(dir.path())).unwrap();

    // Then: A recording_*.wav file inside it
    assert_eq!(path.parent(), Some(dir.path()));
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("recording_"), "{}", name);
    assert!(name.ends_with(".wav"), "{}", name);
    assert!(!path.exists());
}

/// WHAT: Missing parent directories are created
/// WHY: The output directory is created lazily by the session
#[test]
#[allow(clippy::unwrap_used)]
fn given_nested_missing_dirs_when_resolving_then_parents_created() {
    // Given: A target two levels below a fresh directory
    let dir = tempdir().unwrap();
    let target = dir.path().join("a").join("b").join("take.wav");
    let resolver = DefaultPathResolver::new(None);

    // When: Resolving
    let path = resolver.resolve(Some(&target)).unwrap();

    // Then: Path unchanged and parent exists
    assert_eq!(path, target);
    assert!(dir.path().join("a").join("b").is_dir());
}

/// WHAT: No target uses the configured base directory
/// WHY: Configuration decides where unnamed recordings go
#[test]
#[allow(clippy::unwrap_used)]
fn given_base_dir_when_resolving_without_target_then_file_in_base_dir() {
    // Given: A resolver rooted at a not-yet-existing directory
    let dir = tempdir().unwrap();
    let base = dir.path().join("recordings");
    let resolver = DefaultPathResolver::new(Some(base.clone()));

    // When: Resolving without a target
    let path = resolver.resolve(None).unwrap();

    // Then: File placed in the base directory, which now exists
    assert_eq!(path.parent(), Some(base.as_path()));
    assert!(base.is_dir());
}
