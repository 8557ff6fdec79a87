//! Pass-through operations, windows and image files against the software
//! provider

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cvbridge::highgui::{self, LoadMode, Window, WindowFlags};
use cvbridge::ops::{self, ColorConversion, MorphOp, RetrievalMode, Shape, StructuringElement};
use cvbridge::sys::{CV_STS_NOT_IMPLEMENTED, CV_STS_UNMATCHED_SIZES};
use cvbridge::{
    Bridge, BridgeConfig, Depth, Error, ExecutorConfig, ExecutorError, Image, MemStorage, Point,
    Scalar, Seq, Size, Slice, SoftwareBackend,
};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use pretty_assertions::assert_eq;

type Driver = thread::JoinHandle<Result<(), ExecutorError>>;

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

fn finish(bridge: Bridge, driver: Driver) {
    drop(bridge);
    driver.join().unwrap().unwrap();
}

fn gray(bridge: &Bridge, width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> Image {
    let host = GrayImage::from_fn(width, height, |x, y| Luma([f(x, y)]));
    Image::from_dynamic(bridge, &DynamicImage::ImageLuma8(host)).unwrap()
}

fn gray_pixels(image: &Image) -> Vec<u8> {
    image.to_dynamic().unwrap().to_luma8().into_raw()
}

fn assert_not_implemented(result: Result<impl std::fmt::Debug, Error>, entry: &str) {
    match result {
        Err(Error::OperationFailed {
            operation, code, ..
        }) => {
            assert_eq!(operation, entry);
            assert_eq!(code, CV_STS_NOT_IMPLEMENTED);
        }
        other => panic!("expected {entry} to be unimplemented, got {other:?}"),
    }
}

/// Create calls that fail report no object, with the native status attached
fn assert_create_not_implemented(result: Result<impl std::fmt::Debug, Error>, entry: &str) {
    match result {
        Err(Error::AllocationFailed {
            operation,
            status: Some(status),
            ..
        }) => {
            assert_eq!(operation, entry);
            assert_eq!(status.code, CV_STS_NOT_IMPLEMENTED);
        }
        other => panic!("expected {entry} to return no object, got {other:?}"),
    }
}

#[test]
fn test_copy_with_mask() {
    let (bridge, _backend, driver) = start(SoftwareBackend::new());

    let src = gray(&bridge, 4, 2, |x, y| (10 * y + x) as u8 + 1);
    let mut dst = Image::new(&bridge, Size::new(4, 2), Depth::U8, 1).unwrap();
    let mask = gray(&bridge, 4, 2, |x, _| if x < 2 { 255 } else { 0 });

    ops::copy(&src, &mut dst, Some(&mask)).unwrap();
    assert_eq!(gray_pixels(&dst), vec![1, 2, 0, 0, 11, 12, 0, 0]);

    ops::copy(&src, &mut dst, None).unwrap();
    assert_eq!(gray_pixels(&dst), gray_pixels(&src));

    drop((src, dst, mask));
    finish(bridge, driver);
}

#[test]
fn test_copy_into_roi() {
    let (bridge, _backend, driver) = start(SoftwareBackend::new());

    let src = gray(&bridge, 2, 2, |_, _| 9);
    let mut dst = Image::new(&bridge, Size::new(4, 4), Depth::U8, 1).unwrap();
    dst.set_roi(cvbridge::Rect::new(1, 1, 2, 2)).unwrap();
    ops::copy(&src, &mut dst, None).unwrap();
    dst.reset_roi().unwrap();

    let pixels = gray_pixels(&dst);
    assert_eq!(pixels.iter().filter(|&&p| p == 9).count(), 4);
    assert_eq!(pixels[5], 9);
    assert_eq!(pixels[0], 0);

    drop((src, dst));
    finish(bridge, driver);
}

#[test]
fn test_mismatched_sizes_fail_and_bridge_recovers() {
    let (bridge, _backend, driver) = start(SoftwareBackend::new());

    let src = gray(&bridge, 4, 4, |_, _| 1);
    let mut small = Image::new(&bridge, Size::new(2, 2), Depth::U8, 1).unwrap();
    let err = ops::copy(&src, &mut small, None).unwrap_err();
    assert!(matches!(
        err,
        Error::OperationFailed {
            operation: "cvCopy",
            code: CV_STS_UNMATCHED_SIZES,
            ..
        }
    ));

    // Status was reset: the next call succeeds
    let mut same = Image::new(&bridge, Size::new(4, 4), Depth::U8, 1).unwrap();
    ops::copy(&src, &mut same, None).unwrap();

    drop((src, small, same));
    finish(bridge, driver);
}

#[test]
fn test_and_or() {
    let (bridge, _backend, driver) = start(SoftwareBackend::new());

    let a = gray(&bridge, 2, 1, |x, _| if x == 0 { 0b1100 } else { 0b1010 });
    let b = gray(&bridge, 2, 1, |_, _| 0b0110);
    let mut dst = Image::new(&bridge, Size::new(2, 1), Depth::U8, 1).unwrap();

    ops::and(&a, &b, &mut dst, None).unwrap();
    assert_eq!(gray_pixels(&dst), vec![0b0100, 0b0010]);

    ops::or(&a, &b, &mut dst, None).unwrap();
    assert_eq!(gray_pixels(&dst), vec![0b1110, 0b1110]);

    drop((a, b, dst));
    finish(bridge, driver);
}

#[test]
fn test_convert_scale_saturates() {
    let (bridge, _backend, driver) = start(SoftwareBackend::new());

    let src = gray(&bridge, 3, 1, |x, _| [10, 100, 200][x as usize]);
    let mut dst = Image::new(&bridge, Size::new(3, 1), Depth::U8, 1).unwrap();
    ops::convert_scale(&src, &mut dst, 2.0, 1.0).unwrap();
    assert_eq!(gray_pixels(&dst), vec![21, 201, 255]);

    ops::convert_scale(&src, &mut dst, 1.0, -50.0).unwrap();
    assert_eq!(gray_pixels(&dst), vec![0, 50, 150]);

    drop((src, dst));
    finish(bridge, driver);
}

#[test]
fn test_split_into_bgr_planes() {
    let (bridge, _backend, driver) = start(SoftwareBackend::new());

    let host = RgbImage::from_fn(3, 2, |x, y| Rgb([x as u8, y as u8, 7]));
    let src = Image::from_dynamic(&bridge, &DynamicImage::ImageRgb8(host)).unwrap();
    assert_eq!(src.info().unwrap().channels, 3);

    let mut planes = (0..3)
        .map(|_| Image::new(&bridge, Size::new(3, 2), Depth::U8, 1))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    ops::split(&src, &mut planes).unwrap();

    // Native order is BGR
    assert_eq!(gray_pixels(&planes[0]), vec![7; 6]);
    assert_eq!(gray_pixels(&planes[1]), vec![0, 0, 0, 1, 1, 1]);
    assert_eq!(gray_pixels(&planes[2]), vec![0, 1, 2, 0, 1, 2]);

    assert!(matches!(
        ops::split(&src, &mut []),
        Err(Error::InvalidArgument(_))
    ));

    drop((src, planes));
    finish(bridge, driver);
}

#[test]
fn test_host_round_trip() {
    let (bridge, _backend, driver) = start(SoftwareBackend::new());

    let host = DynamicImage::ImageRgb8(RgbImage::from_fn(5, 3, |x, y| {
        Rgb([x as u8 * 40, y as u8 * 80, 200])
    }));
    let image = Image::from_dynamic(&bridge, &host).unwrap();
    assert_eq!(image.info().unwrap().width_step, 16);
    assert_eq!(image.to_dynamic().unwrap().to_rgb8(), host.to_rgb8());

    drop(image);
    finish(bridge, driver);
}

#[test]
fn test_algorithmic_calls_report_failure() {
    let (bridge, _backend, driver) = start(SoftwareBackend::new());

    let src = gray(&bridge, 8, 8, |x, _| (x * 30) as u8);
    let mut dst = Image::new(&bridge, Size::new(8, 8), Depth::U8, 1).unwrap();
    let mut half = Image::new(&bridge, Size::new(8, 8).halved(), Depth::U8, 1).unwrap();

    assert_not_implemented(
        ops::cvt_color(&src, &mut dst, ColorConversion::Gray2Bgr),
        "cvCvtColor",
    );
    assert_not_implemented(
        ops::threshold(&src, &mut dst, 128.0, 255.0, ops::ThresholdType::Binary),
        "cvThreshold",
    );
    assert_not_implemented(
        ops::threshold_otsu(&src, &mut dst, 255.0, ops::ThresholdType::Binary),
        "cvThreshold",
    );
    assert_not_implemented(
        ops::pyr_down(&src, &mut half, ops::PyramidFilter::Gaussian5x5),
        "cvPyrDown",
    );
    assert_not_implemented(
        ops::pyr_up(&half, &mut dst, ops::PyramidFilter::Gaussian5x5),
        "cvPyrUp",
    );
    assert_not_implemented(ops::dilate(&src, &mut dst, None, 1), "cvDilate");
    assert_not_implemented(ops::erode(&src, &mut dst, None, 1), "cvErode");
    assert_not_implemented(
        ops::morphology_ex(&src, &mut dst, None, None, MorphOp::Open, 1),
        "cvMorphologyEx",
    );
    assert_not_implemented(
        ops::line(
            &mut dst,
            Point::new(0, 0),
            Point::new(7, 7),
            Scalar::all(255.0),
            1,
            ops::LineType::Eight,
            0,
        ),
        "cvLine",
    );
    assert_not_implemented(
        ops::rectangle(
            &mut dst,
            Point::new(1, 1),
            Point::new(5, 5),
            Scalar::all(255.0),
            ops::FILLED,
            ops::LineType::Four,
            0,
        ),
        "cvRectangle",
    );
    assert_not_implemented(
        ops::circle(
            &mut dst,
            Point::new(4, 4),
            2,
            Scalar::all(255.0),
            1,
            ops::LineType::AntiAliased,
            0,
        ),
        "cvCircle",
    );
    assert_not_implemented(
        ops::poly_line(
            &mut dst,
            &[vec![Point::new(0, 0), Point::new(3, 0), Point::new(3, 3)]],
            true,
            Scalar::rgb(255.0, 0.0, 0.0),
            1,
            ops::LineType::Eight,
            0,
        ),
        "cvPolyLine",
    );

    // Still serving after a run of failures
    ops::copy(&src, &mut dst, None).unwrap();
    assert_eq!(gray_pixels(&dst), gray_pixels(&src));

    drop((src, dst, half));
    finish(bridge, driver);
}

#[test]
fn test_contour_calls_report_failure() {
    let (bridge, _backend, driver) = start(SoftwareBackend::new());

    let mut binary = gray(&bridge, 8, 8, |x, y| if (2..6).contains(&x) && (2..6).contains(&y) { 255 } else { 0 });
    let storage = MemStorage::new(&bridge).unwrap();

    assert_not_implemented(
        ops::find_contours(
            &mut binary,
            &storage,
            RetrievalMode::External,
            ops::ChainApprox::Simple,
            Point::default(),
        ),
        "cvFindContours",
    );

    let mut square = Seq::polygon(&storage).unwrap();
    for p in [(0, 0), (4, 0), (4, 4), (0, 4)] {
        square.push_point(Point::new(p.0, p.1)).unwrap();
    }
    assert_create_not_implemented(
        ops::approx_poly(&square, &storage, ops::PolyApprox::DouglasPeucker, 1.0, false),
        "cvApproxPoly",
    );
    assert_not_implemented(ops::contour_area(&square, Slice::WHOLE, false), "cvContourArea");
    assert_not_implemented(ops::arc_length(&square, Slice::WHOLE, None), "cvArcLength");
    assert_not_implemented(ops::contour_perimeter(&square), "cvArcLength");
    assert_not_implemented(ops::check_contour_convexity(&square), "cvCheckContourConvexity");

    drop(square);
    drop((binary, storage));
    finish(bridge, driver);
}

#[test]
fn test_structuring_elements() {
    let (bridge, backend, driver) = start(SoftwareBackend::new());

    let rect = StructuringElement::new(&bridge, 3, 3, Point::new(1, 1), Shape::Rect).unwrap();
    let cross = StructuringElement::new(&bridge, 5, 5, Point::new(2, 2), Shape::Cross).unwrap();
    let custom =
        StructuringElement::custom(&bridge, 2, 2, Point::new(0, 0), &[1, 0, 0, 1]).unwrap();
    assert_eq!(backend.stats().live_kernels, 3);

    assert!(matches!(
        StructuringElement::custom(&bridge, 2, 2, Point::new(0, 0), &[1, 0, 0]),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        StructuringElement::new(&bridge, 3, 3, Point::new(3, 0), Shape::Rect),
        Err(Error::AllocationFailed {
            kind: "structuring element",
            status: Some(_),
            ..
        })
    ));
    assert_create_not_implemented(
        StructuringElement::new(&bridge, 3, 3, Point::new(1, 1), Shape::Ellipse),
        "cvCreateStructuringElementEx",
    );

    rect.release().unwrap();
    drop((cross, custom));
    assert_eq!(backend.stats().live_kernels, 0);

    finish(bridge, driver);
}

#[test]
fn test_window_lifecycle_and_keys() {
    let (bridge, backend, driver) = start(SoftwareBackend::new());

    let window = Window::new(&bridge, "preview", WindowFlags::Normal).unwrap();
    assert_eq!(window.name(), "preview");
    let frame = gray(&bridge, 6, 4, |_, _| 0);
    window.show(&frame).unwrap();
    window.show(&frame).unwrap();

    let info = backend.window("preview").unwrap();
    assert_eq!(info.frames_shown, 2);
    assert_eq!(info.last_size, Some((6, 4)));
    assert_eq!(info.flags, WindowFlags::Normal.raw());

    backend.push_key(27);
    assert_eq!(highgui::wait_key(&bridge, Duration::ZERO).unwrap(), Some(27));
    assert_eq!(highgui::wait_key(&bridge, Duration::from_millis(1)).unwrap(), None);

    drop(window);
    assert!(backend.window_names().is_empty());

    let a = Window::new(&bridge, "a", WindowFlags::AutoSize).unwrap();
    let b = Window::new(&bridge, "b", WindowFlags::AutoSize).unwrap();
    assert_eq!(backend.stats().open_windows, 2);
    highgui::destroy_all_windows(&bridge).unwrap();
    assert_eq!(backend.stats().open_windows, 0);
    a.destroy().unwrap();
    drop(b);

    drop(frame);
    finish(bridge, driver);
}

#[test]
fn test_save_and_load_image_file() {
    let (bridge, _backend, driver) = start(SoftwareBackend::new());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.png");

    let host = DynamicImage::ImageRgb8(RgbImage::from_fn(5, 3, |x, y| {
        Rgb([x as u8 * 50, 0, y as u8 * 100])
    }));
    let image = Image::from_dynamic(&bridge, &host).unwrap();
    highgui::save_image(&path, &image).unwrap();
    assert!(path.exists());

    let color = highgui::load_image(&bridge, &path, LoadMode::Color).unwrap();
    assert_eq!(color.size().unwrap(), Size::new(5, 3));
    assert_eq!(color.to_dynamic().unwrap().to_rgb8(), host.to_rgb8());

    let grayscale = highgui::load_image(&bridge, &path, LoadMode::Grayscale).unwrap();
    assert_eq!(grayscale.info().unwrap().channels, 1);

    assert!(matches!(
        highgui::load_image(&bridge, dir.path().join("missing.png"), LoadMode::Unchanged),
        Err(Error::AllocationFailed {
            kind: "image",
            operation: "cvLoadImage",
            ..
        })
    ));
    assert!(matches!(
        highgui::save_image(dir.path().join("frame.nosuchformat"), &image),
        Err(Error::OperationFailed {
            operation: "cvSaveImage",
            ..
        })
    ));

    drop((image, color, grayscale));
    finish(bridge, driver);
}
