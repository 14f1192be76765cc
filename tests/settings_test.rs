use canvas_image::error::AppError;
use canvas_image::image_loader::{DataMode, ImageLoader, LimitProfile};
use canvas_image::settings::{LoaderSettings, load_settings, save_settings};
use std::path::PathBuf;

#[test]
fn missing_settings_file_is_none() {
    let dir = tempfile::tempdir().expect("tempdir");
    let loaded = load_settings(&dir.path().join("settings.json")).expect("load should not fail");

    assert!(loaded.is_none());
}

#[test]
fn settings_round_trip_through_loader() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("settings.json");

    let source = ImageLoader::default();
    source
        .set_limit_profile(LimitProfile::Relaxed)
        .expect("profile switch");
    let settings = LoaderSettings::from_loader(&source).expect("snapshot settings");
    save_settings(&path, &settings).expect("save settings");

    let loaded = load_settings(&path)
        .expect("load settings")
        .expect("settings file should exist");
    assert_eq!(loaded, settings);

    let target = ImageLoader::default();
    loaded.apply_to(&target).expect("apply settings");

    assert_eq!(target.get_limit_profile().expect("profile"), LimitProfile::Relaxed);
    assert_eq!(
        target.get_advanced_limits().expect("limits"),
        source.get_advanced_limits().expect("limits")
    );
}

#[test]
fn partial_settings_fill_in_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{ "limit_profile": "strict" }"#).expect("write settings");

    let loaded = load_settings(&path)
        .expect("load settings")
        .expect("settings file should exist");

    assert_eq!(loaded.limit_profile, "strict");
    assert!(loaded.advanced.is_none());
    assert_eq!(loaded.data_mode(), DataMode::Image);
}

#[test]
fn malformed_settings_are_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{ not json").expect("write settings");

    assert!(matches!(load_settings(&path), Err(AppError::Settings(_))));
}

#[test]
fn unknown_profile_is_rejected_on_apply() {
    let settings = LoaderSettings {
        limit_profile: "turbo".to_string(),
        ..LoaderSettings::default()
    };

    let result = settings.apply_to(&ImageLoader::default());

    assert!(matches!(result, Err(AppError::Image(_))));
}

#[test]
fn saved_data_mode_reaches_new_images() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("settings.json");
    let saved = LoaderSettings {
        data_mode: DataMode::Mime.as_u32(),
        ..LoaderSettings::default()
    };
    save_settings(&path, &saved).expect("save settings");

    let loader = ImageLoader::default();
    load_settings(&path)
        .expect("load settings")
        .expect("settings file should exist")
        .apply_to(&loader)
        .expect("apply settings");

    let snapshot = LoaderSettings::from_loader(&loader).expect("snapshot settings");
    assert_eq!(snapshot.data_mode, 2);
    assert_eq!(snapshot, saved);

    let mut img = loader.new_image().expect("new image");
    assert_eq!(img.data_mode(), DataMode::Mime);

    let cmyk = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/cmyk.jpg");
    img.set_src(&loader, cmyk);

    assert!(img.complete());
    assert!(img.pixels().is_none());
    assert!(img.mime_data().is_some());
}
