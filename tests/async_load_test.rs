use canvas_image::image_loader::{DataMode, Image, ImageLoader, SharedImage};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn shared_with_counter() -> (SharedImage, Arc<AtomicUsize>) {
    let fired = Arc::new(AtomicUsize::new(0));
    let mut img = Image::new();

    let on_load = fired.clone();
    img.set_onload(move || {
        on_load.fetch_add(1, Ordering::SeqCst);
    });
    let on_error = fired.clone();
    img.set_onerror(move |_| {
        on_error.fetch_add(1, Ordering::SeqCst);
    });

    (SharedImage::new(img), fired)
}

#[tokio::test]
async fn superseded_result_is_discarded() {
    let loader = ImageLoader::default();
    let mut img = Image::new();

    let ticket_a = img.begin_load(fixture("clock.png"));
    let ticket_b = img.begin_load(fixture("cmyk.jpg"));

    let result_a = loader
        .load_async(fixture("clock.png").into(), ticket_a.data_mode())
        .await;
    let result_b = loader
        .load_async(fixture("cmyk.jpg").into(), ticket_b.data_mode())
        .await;

    assert!(!img.finish_load(ticket_a, result_a));
    assert_eq!(img.width(), 0);

    assert!(img.finish_load(ticket_b, result_b));
    assert_eq!((img.width(), img.height()), (190, 45));
}

#[tokio::test]
async fn shared_image_loads_asynchronously() {
    let loader = ImageLoader::default();
    let (shared, fired) = shared_with_counter();

    let applied = shared.set_src_async(&loader, fixture("clock.png")).await;

    assert!(applied);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    let dims = shared
        .with_image(|img| (img.complete(), img.width(), img.height()))
        .expect("lock should be healthy");
    assert_eq!(dims, (true, 320, 320));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn overlapping_assignments_resolve_to_the_last_one() {
    let loader = ImageLoader::default();
    let (shared, fired) = shared_with_counter();

    let first = shared.set_src_async(&loader, fixture("clock.png"));
    let second = async {
        tokio::task::yield_now().await;
        shared.set_src_async(&loader, fixture("oom.png")).await
    };
    let (a_applied, b_applied) = tokio::join!(first, second);

    assert!(b_applied);
    assert_eq!(fired.load(Ordering::SeqCst), a_applied as usize + 1);

    let dims = shared
        .with_image(|img| (img.width(), img.height()))
        .expect("lock should be healthy");
    assert_eq!(dims, (35, 37));
}

#[tokio::test]
async fn async_mime_mode_matches_sync() {
    let loader = ImageLoader::default();
    let shared = SharedImage::default();
    shared
        .with_image(|img| img.set_data_mode(DataMode::Mime))
        .expect("lock should be healthy");

    assert!(shared.set_src_async(&loader, fixture("cmyk.jpg")).await);

    let (has_pixels, has_mime) = shared
        .with_image(|img| (img.pixels().is_some(), img.mime_data().is_some()))
        .expect("lock should be healthy");
    assert!(!has_pixels);
    assert!(has_mime);
}
