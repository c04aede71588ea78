use std::path::PathBuf;

use scanpipe_core::hyperstack::ChannelColor;
use scanpipe_core::layout::LayoutKind;
use scanpipe_core::pipeline::config::{
    BatchConfig, DifferenceSource, LayoutChoice, PlaneMode, ProjectionPolicy,
};
use scanpipe_core::pipeline::ScanStage;

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

#[test]
fn test_plane_mode_display() {
    assert_eq!(format!("{}", PlaneMode::Auto), "Auto");
    assert_eq!(format!("{}", PlaneMode::Single), "Single plane");
    assert_eq!(format!("{}", PlaneMode::Multi), "Multi plane");
}

#[test]
fn test_layout_display() {
    assert_eq!(format!("{}", LayoutChoice::Auto), "Auto");
    assert_eq!(format!("{}", LayoutKind::Olympus), "Olympus (OIF)");
    assert_eq!(format!("{}", LayoutKind::Bruker), "Bruker (OME-TIFF)");
}

#[test]
fn test_policy_and_source_display() {
    assert_eq!(format!("{}", ProjectionPolicy::Fail), "Fail");
    assert_eq!(format!("{}", ProjectionPolicy::Skip), "Skip");
    assert_eq!(format!("{}", DifferenceSource::Raw), "Raw");
    assert_eq!(format!("{}", DifferenceSource::Filtered), "Filtered");
}

#[test]
fn test_scan_stage_display() {
    assert_eq!(format!("{}", ScanStage::Assemble), "Assembling stack");
    assert_eq!(format!("{}", ScanStage::Difference), "Difference movies");
}

#[test]
fn test_channel_color_display_round_trips() {
    for color in [
        ChannelColor::Red,
        ChannelColor::Green,
        ChannelColor::Blue,
        ChannelColor::Grays,
        ChannelColor::Cyan,
        ChannelColor::Magenta,
        ChannelColor::Yellow,
    ] {
        assert_eq!(color.to_string().parse::<ChannelColor>().unwrap(), color);
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

#[test]
fn test_batch_config_defaults() {
    let config = BatchConfig::new("/data/exp");
    assert_eq!(config.root, PathBuf::from("/data/exp"));
    assert_eq!(config.difference_number, 0);
    assert_eq!(config.channel_colors, vec![ChannelColor::Select]);
    assert_eq!(config.plane_mode, PlaneMode::Auto);
    assert_eq!(config.layout, LayoutChoice::Auto);
    assert_eq!(config.difference_source, DifferenceSource::Raw);
    assert_eq!(config.projection_policy, ProjectionPolicy::Fail);
    assert_eq!(config.median_radius, 1);
    assert!(config.filtered_pass);
}

#[test]
fn test_plane_mode_resolution() {
    assert!(PlaneMode::Auto.is_single_plane(1));
    assert!(!PlaneMode::Auto.is_single_plane(5));
    assert!(PlaneMode::Single.is_single_plane(5));
    assert!(!PlaneMode::Multi.is_single_plane(1));
}

#[test]
fn test_layout_choice_fixed() {
    assert_eq!(LayoutChoice::Auto.fixed(), None);
    assert_eq!(LayoutChoice::Olympus.fixed(), Some(LayoutKind::Olympus));
    assert_eq!(LayoutChoice::Bruker.fixed(), Some(LayoutKind::Bruker));
}

// ---------------------------------------------------------------------------
// TOML
// ---------------------------------------------------------------------------

#[test]
fn test_minimal_toml_fills_defaults() {
    let config: BatchConfig = toml::from_str(
        r#"
        root = "/data/exp"
        channel_colors = ["Green", "Magenta"]
        "#,
    )
    .unwrap();
    assert_eq!(config.channel_colors, vec![ChannelColor::Green, ChannelColor::Magenta]);
    assert_eq!(config.median_radius, 1);
    assert!(config.filtered_pass);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_toml_round_trip() {
    let mut config = BatchConfig::new("/data/exp");
    config.difference_number = 4;
    config.channel_colors = vec![ChannelColor::Red, ChannelColor::Cyan, ChannelColor::Grays];
    config.plane_mode = PlaneMode::Single;
    config.layout = LayoutChoice::Olympus;
    config.difference_source = DifferenceSource::Filtered;
    config.projection_policy = ProjectionPolicy::Skip;

    let text = toml::to_string_pretty(&config).unwrap();
    let back: BatchConfig = toml::from_str(&text).unwrap();

    assert_eq!(back.difference_number, 4);
    assert_eq!(back.channel_colors, config.channel_colors);
    assert_eq!(back.plane_mode, PlaneMode::Single);
    assert_eq!(back.layout, LayoutChoice::Olympus);
    assert_eq!(back.difference_source, DifferenceSource::Filtered);
    assert_eq!(back.projection_policy, ProjectionPolicy::Skip);
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn test_validate_requires_first_channel_color() {
    let config = BatchConfig::new("/data/exp");
    assert_eq!(config.validate().unwrap_err().kind(), "ConfigError");

    let mut config = BatchConfig::new("/data/exp");
    config.channel_colors.clear();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_allows_unassigned_later_channels() {
    let mut config = BatchConfig::new("/data/exp");
    config.channel_colors = vec![ChannelColor::Green, ChannelColor::Select];
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_caps_channel_count() {
    let mut config = BatchConfig::new("/data/exp");
    config.channel_colors = vec![ChannelColor::Red; 4];
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_filtered_difference_needs_filter_pass() {
    let mut config = BatchConfig::new("/data/exp");
    config.channel_colors = vec![ChannelColor::Green];
    config.difference_number = 2;
    config.difference_source = DifferenceSource::Filtered;
    config.filtered_pass = false;
    assert!(config.validate().is_err());

    config.difference_number = 0;
    assert!(config.validate().is_ok());
}
