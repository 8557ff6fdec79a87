//! Handle lifecycle tests against the software provider

use std::sync::Arc;
use std::thread;

use cvbridge::sys::{CvSize, CV_STS_BAD_SIZE, CV_STS_ERROR, CV_STS_NO_MEM, IPL_DEPTH_8U};
use cvbridge::{
    Bridge, BridgeConfig, Capture, ClipSpec, Depth, Error, ExecutorConfig, ExecutorError, Handle,
    Image, ImageKind, MemStorage, NativeApi, NativeStatus, Ownership, Point, Rect, Seq, SeqKind, Size,
    SoftwareBackend,
};

type Driver = thread::JoinHandle<Result<(), ExecutorError>>;

/// Start a bridge whose pump runs on a spawned "pinned" thread
fn start(backend: SoftwareBackend) -> (Bridge, Arc<SoftwareBackend>, Driver) {
    let backend = Arc::new(backend);
    let config = BridgeConfig {
        executor: ExecutorConfig {
            name: "test".to_string(),
            stall_warning_ms: 0,
            ..Default::default()
        },
        ..Default::default()
    };
    let (bridge, pump) = Bridge::start(config, backend.clone());
    let driver = thread::Builder::new()
        .name("pinned".to_string())
        .spawn(move || pump.drive())
        .unwrap();
    (bridge, backend, driver)
}

/// Drop the last bridge and wait for the pump to stop
fn finish(bridge: Bridge, driver: Driver) {
    drop(bridge);
    driver.join().unwrap().unwrap();
}

#[test]
fn test_image_size_matches_request() {
    let (bridge, backend, driver) = start(SoftwareBackend::new());

    let image = Image::new(&bridge, Size::new(4, 4), Depth::U8, 3).unwrap();
    assert_eq!(image.size().unwrap(), Size::new(4, 4));
    assert_eq!(image.handle().ownership(), Ownership::Owned);

    let info = image.info().unwrap();
    assert_eq!(info.channels, 3);
    assert_eq!(info.depth, Depth::U8);
    assert_eq!(info.width_step, 12);
    assert_eq!(info.roi, None);

    image.release().unwrap();
    assert_eq!(backend.stats().live_images, 0);
    assert_eq!(backend.stats().images_released, 1);

    finish(bridge, driver);
}

#[test]
fn test_row_padding_to_four_bytes() {
    let (bridge, _backend, driver) = start(SoftwareBackend::new());

    let image = Image::new(&bridge, Size::new(5, 2), Depth::U8, 3).unwrap();
    let info = image.info().unwrap();
    assert_eq!(info.width_step, 16);
    assert_eq!(info.image_size, 32);
    drop(image);

    finish(bridge, driver);
}

#[test]
fn test_roi_changes_reported_size() {
    let (bridge, _backend, driver) = start(SoftwareBackend::new());

    let mut image = Image::new(&bridge, Size::new(8, 6), Depth::U8, 1).unwrap();
    image.set_roi(Rect::new(2, 1, 4, 3)).unwrap();
    assert_eq!(image.size().unwrap(), Size::new(4, 3));
    assert_eq!(image.info().unwrap().roi, Some(Rect::new(2, 1, 4, 3)));

    // Clipped to the image
    image.set_roi(Rect::new(6, 4, 10, 10)).unwrap();
    assert_eq!(image.size().unwrap(), Size::new(2, 2));

    image.reset_roi().unwrap();
    assert_eq!(image.size().unwrap(), Size::new(8, 6));
    drop(image);

    finish(bridge, driver);
}

#[test]
fn test_coi_creates_full_roi() {
    let (bridge, _backend, driver) = start(SoftwareBackend::new());

    let mut image = Image::new(&bridge, Size::new(3, 3), Depth::U8, 3).unwrap();
    image.set_coi(2).unwrap();
    let info = image.info().unwrap();
    assert_eq!(info.coi, 2);
    assert_eq!(info.roi, Some(Rect::new(0, 0, 3, 3)));

    let err = image.set_coi(4).unwrap_err();
    assert!(matches!(err, Error::OperationFailed { operation: "cvSetImageCOI", .. }));
    drop(image);

    finish(bridge, driver);
}

#[test]
fn test_clone_is_independent() {
    let (bridge, backend, driver) = start(SoftwareBackend::new());

    let mut image = Image::new(&bridge, Size::new(6, 6), Depth::U8, 1).unwrap();
    image.set_roi(Rect::new(1, 1, 2, 2)).unwrap();
    let copy = image.try_clone().unwrap();
    assert_eq!(copy.size().unwrap(), Size::new(2, 2));
    assert_eq!(backend.stats().live_images, 2);

    image.release().unwrap();
    assert_eq!(copy.size().unwrap(), Size::new(2, 2));
    drop(copy);
    assert_eq!(backend.stats().live_images, 0);

    finish(bridge, driver);
}

#[test]
fn test_drop_releases_owned_image() {
    let (bridge, backend, driver) = start(SoftwareBackend::new());

    {
        let _image = Image::new(&bridge, Size::new(2, 2), Depth::F32, 1).unwrap();
        assert_eq!(backend.stats().live_images, 1);
    }
    assert_eq!(backend.stats().live_images, 0);
    assert_eq!(backend.stats().images_released, 1);

    finish(bridge, driver);
}

#[test]
fn test_create_release_cycles_under_limit() {
    let (bridge, backend, driver) = start(SoftwareBackend::new().with_image_limit(2));

    for _ in 0..200 {
        let image = Image::new(&bridge, Size::new(16, 16), Depth::U8, 3).unwrap();
        image.release().unwrap();
    }
    assert_eq!(backend.stats().live_images, 0);

    let a = Image::new(&bridge, Size::new(1, 1), Depth::U8, 1).unwrap();
    let b = Image::new(&bridge, Size::new(1, 1), Depth::U8, 1).unwrap();
    let err = Image::new(&bridge, Size::new(1, 1), Depth::U8, 1).unwrap_err();
    assert!(matches!(
        err,
        Error::AllocationFailed {
            kind: "image",
            operation: "cvCreateImage",
            status: Some(NativeStatus {
                code: CV_STS_NO_MEM,
                ..
            }),
        }
    ));

    // The failure leaves the bridge usable
    drop(a);
    let c = Image::new(&bridge, Size::new(1, 1), Depth::U8, 1).unwrap();
    drop((b, c));

    finish(bridge, driver);
}

#[test]
fn test_invalid_size_is_reported() {
    let (bridge, _backend, driver) = start(SoftwareBackend::new());

    let err = Image::new(&bridge, Size::new(0, 4), Depth::U8, 1).unwrap_err();
    assert!(matches!(
        err,
        Error::AllocationFailed {
            operation: "cvCreateImage",
            status: Some(NativeStatus {
                code: CV_STS_BAD_SIZE,
                ..
            }),
            ..
        }
    ));

    finish(bridge, driver);
}

#[test]
fn test_status_from_panicked_call_is_not_carried_over() {
    let (bridge, backend, driver) = start(SoftwareBackend::new());

    let result = bridge.run("cvCreateImage", |api| unsafe {
        api.create_image(CvSize { width: 0, height: 0 }, IPL_DEPTH_8U, 1);
        panic!("failed after setting a native status");
    });
    assert!(matches!(
        result,
        Err(Error::Executor(ExecutorError::Panicked { .. }))
    ));

    let image = Image::new(&bridge, Size::new(2, 2), Depth::U8, 1).unwrap();
    assert_eq!(image.size().unwrap(), Size::new(2, 2));
    drop(image);
    assert_eq!(backend.stats().live_images, 0);

    finish(bridge, driver);
}

#[test]
fn test_status_is_reported_once_and_reset() {
    let (bridge, _backend, driver) = start(SoftwareBackend::new());

    let err = bridge
        .run("cvSetErrStatus", |api| unsafe { api.set_err_status(CV_STS_ERROR) })
        .unwrap_err();
    assert!(matches!(err, Error::OperationFailed { code: CV_STS_ERROR, .. }));

    let status = bridge
        .run("cvGetErrStatus", |api| unsafe { api.get_err_status() })
        .unwrap();
    assert_eq!(status, 0);

    finish(bridge, driver);
}

#[test]
fn test_create_with_failed_status_releases_result() {
    let (bridge, backend, driver) = start(SoftwareBackend::new());

    let err = bridge
        .create::<ImageKind, _>("cvCreateImage", |api| unsafe {
            let image = api.create_image(CvSize { width: 2, height: 2 }, IPL_DEPTH_8U, 1);
            api.set_err_status(CV_STS_ERROR);
            image
        })
        .unwrap_err();
    assert!(matches!(
        err,
        Error::OperationFailed {
            operation: "cvCreateImage",
            code: CV_STS_ERROR,
            ..
        }
    ));
    assert_eq!(backend.stats().live_images, 0);
    assert_eq!(backend.stats().images_released, 1);

    finish(bridge, driver);
}

#[test]
fn test_sequence_of_points() {
    let (bridge, backend, driver) = start(SoftwareBackend::new());

    let storage = MemStorage::new(&bridge).unwrap();
    let mut seq = Seq::of_points(&storage).unwrap();
    assert_eq!(seq.handle().ownership(), Ownership::Pooled);
    assert!(seq.is_empty().unwrap());

    let points = [Point::new(1, 2), Point::new(3, 4), Point::new(-5, 6)];
    for p in points {
        seq.push_point(p).unwrap();
    }
    assert_eq!(seq.len().unwrap(), 3);
    assert_eq!(seq.points().unwrap(), points.to_vec());
    assert_eq!(seq.point_at(2).unwrap(), Point::new(-5, 6));
    assert_eq!(seq.size().unwrap(), Size::new(3, 1));
    assert!(seq.next().unwrap().is_none());
    assert_eq!(backend.stats().live_sequences, 1);

    drop(seq);
    storage.release().unwrap();
    assert_eq!(backend.stats().live_storages, 0);
    assert_eq!(backend.stats().live_sequences, 0);

    finish(bridge, driver);
}

#[test]
fn test_sequence_bounds_and_element_size() {
    let (bridge, _backend, driver) = start(SoftwareBackend::new());

    let storage = MemStorage::new(&bridge).unwrap();
    let mut seq = Seq::new(&storage, 0, 4).unwrap();
    seq.push_bytes(&[1, 2, 3, 4]).unwrap();

    assert_eq!(seq.element_at(0).unwrap(), vec![1, 2, 3, 4]);
    assert!(matches!(
        seq.element_at(1),
        Err(Error::IndexOutOfBounds { index: 1, len: 1 })
    ));
    assert!(matches!(
        seq.push_bytes(&[1, 2]),
        Err(Error::ElementSize {
            expected: 4,
            actual: 2
        })
    ));
    assert!(matches!(seq.point_at(0), Err(Error::ElementSize { .. })));
    assert!(matches!(
        Seq::new(&storage, 0, 0),
        Err(Error::InvalidArgument(_))
    ));

    drop(seq);
    drop(storage);
    finish(bridge, driver);
}

#[test]
fn test_clear_storage_drops_sequences() {
    let (bridge, backend, driver) = start(SoftwareBackend::new());

    let mut storage = MemStorage::with_block_size(&bridge, 256).unwrap();
    {
        let mut seq = Seq::polygon(&storage).unwrap();
        for i in 0..100 {
            seq.push_point(Point::new(i, i)).unwrap();
        }
        assert_eq!(seq.len().unwrap(), 100);
    }
    assert_eq!(backend.stats().live_sequences, 1);

    storage.clear().unwrap();
    assert_eq!(backend.stats().live_sequences, 0);
    assert_eq!(backend.stats().live_storages, 1);

    let seq = Seq::of_points(&storage).unwrap();
    assert_eq!(seq.len().unwrap(), 0);
    drop(seq);
    drop(storage);

    assert!(matches!(
        MemStorage::with_block_size(&bridge, -1),
        Err(Error::InvalidArgument(_))
    ));

    finish(bridge, driver);
}

#[test]
fn test_pooled_release_after_storage_release_is_noop() {
    let (bridge, backend, driver) = start(SoftwareBackend::new());

    let storage = MemStorage::new(&bridge).unwrap();
    let seq = Seq::of_points(&storage).unwrap();
    let raw = seq.handle().as_raw();
    drop(seq);
    storage.release().unwrap();

    let stale = unsafe { Handle::<SeqKind>::from_raw(&bridge, raw.as_ptr(), Ownership::Pooled) }
        .unwrap();
    stale.release().unwrap();
    assert_eq!(backend.stats().live_storages, 0);

    finish(bridge, driver);
}

#[test]
fn test_from_raw_validation() {
    let (bridge, _backend, driver) = start(SoftwareBackend::new());

    let null = unsafe { Handle::<SeqKind>::from_raw(&bridge, std::ptr::null_mut(), Ownership::Borrowed) };
    assert!(matches!(null, Err(Error::InvalidHandle { kind: "sequence", .. })));

    let storage = MemStorage::new(&bridge).unwrap();
    let seq = Seq::of_points(&storage).unwrap();
    let owned = unsafe { Handle::<SeqKind>::from_raw(&bridge, seq.handle().as_raw().as_ptr(), Ownership::Owned) };
    assert!(matches!(owned, Err(Error::InvalidHandle { .. })));

    drop(seq);
    drop(storage);
    finish(bridge, driver);
}

#[test]
fn test_into_raw_skips_release() {
    let (bridge, backend, driver) = start(SoftwareBackend::new());

    let image = Image::new(&bridge, Size::new(2, 2), Depth::U8, 1).unwrap();
    let raw = image.into_handle().into_raw();
    assert_eq!(backend.stats().live_images, 1);

    let adopted = unsafe { Handle::<ImageKind>::from_raw(&bridge, raw, Ownership::Owned) }.unwrap();
    Image::from_handle(adopted).release().unwrap();
    assert_eq!(backend.stats().live_images, 0);

    finish(bridge, driver);
}

#[test]
fn test_capture_frames_are_borrowed() {
    let backend = SoftwareBackend::new().with_camera(0, ClipSpec::new(8, 6).with_frames(2));
    let (bridge, backend, driver) = start(backend);

    let mut capture = Capture::from_camera(&bridge, 0).unwrap();
    let kept = {
        let frame = capture.query_frame().unwrap().unwrap();
        assert_eq!(frame.handle().ownership(), Ownership::Borrowed);
        assert_eq!(frame.size().unwrap(), Size::new(8, 6));
        frame.to_image().unwrap()
    };
    {
        let frame = capture.query_frame().unwrap().unwrap();
        let pixels = frame.to_dynamic().unwrap().to_rgb8();
        // Second frame: blue channel starts at 16, green at 80, red at 144
        assert_eq!(pixels.get_pixel(0, 0).0, [144, 80, 16]);
    }
    assert!(capture.query_frame().unwrap().is_none());

    // Dropped frames freed nothing; the copy is an ordinary image
    assert_eq!(backend.stats().images_released, 0);
    assert_eq!(backend.stats().live_images, 1);
    assert_eq!(kept.size().unwrap(), Size::new(8, 6));

    capture.release().unwrap();
    assert_eq!(backend.stats().live_captures, 0);
    assert_eq!(kept.size().unwrap(), Size::new(8, 6));
    drop(kept);

    finish(bridge, driver);
}

#[test]
fn test_clip_capture_by_name() {
    let backend = SoftwareBackend::new().with_clip("clip.avi", ClipSpec::new(4, 4).with_channels(1));
    let (bridge, _backend, driver) = start(backend);

    let mut capture = Capture::from_file(&bridge, "clip.avi").unwrap();
    let info = capture.query_frame().unwrap().unwrap().info().unwrap();
    assert_eq!(info.channels, 1);
    drop(capture);

    finish(bridge, driver);
}

#[test]
fn test_unknown_capture_source() {
    let (bridge, _backend, driver) = start(SoftwareBackend::new());

    assert!(matches!(
        Capture::from_camera(&bridge, 3),
        Err(Error::AllocationFailed {
            kind: "capture",
            operation: "cvCreateCameraCapture",
            status: None,
        })
    ));
    assert!(matches!(
        Capture::from_file(&bridge, "missing.avi"),
        Err(Error::AllocationFailed {
            kind: "capture",
            operation: "cvCreateFileCapture",
            status: None,
        })
    ));
    assert!(matches!(
        Capture::from_file(&bridge, "bad\0name"),
        Err(Error::InvalidString(_))
    ));

    finish(bridge, driver);
}

#[test]
fn test_all_native_calls_on_pinned_thread() {
    let (bridge, backend, driver) = start(SoftwareBackend::new());
    let pinned = driver.thread().id();

    let callers: Vec<_> = (0..10)
        .map(|i| {
            let bridge = bridge.clone();
            thread::spawn(move || {
                for _ in 0..10 {
                    let image = Image::new(&bridge, Size::new(i + 1, 3), Depth::U8, 1).unwrap();
                    assert_eq!(image.size().unwrap(), Size::new(i + 1, 3));
                    image.release().unwrap();
                }
            })
        })
        .collect();
    for caller in callers {
        caller.join().unwrap();
    }

    assert_eq!(backend.foreign_thread_calls(), 0);
    assert_eq!(backend.owner_thread(), Some(pinned));
    assert_eq!(bridge.executor().pinned_thread(), Some(pinned));
    assert_eq!(backend.stats().images_released, 100);

    finish(bridge, driver);
}

#[test]
fn test_handles_move_between_threads() {
    let (bridge, backend, driver) = start(SoftwareBackend::new());

    let image = Image::new(&bridge, Size::new(3, 3), Depth::U8, 3).unwrap();
    let size = thread::spawn(move || {
        let size = image.size().unwrap();
        image.release().unwrap();
        size
    })
    .join()
    .unwrap();
    assert_eq!(size, Size::new(3, 3));
    assert_eq!(backend.stats().live_images, 0);
    assert_eq!(backend.foreign_thread_calls(), 0);

    finish(bridge, driver);
}
