//! Tests for drawing detections onto images.
//!
//! Labels use the bundled font. Label geometry is checked against the size the
//! annotator measures, in columns and rows the text never reaches.

mod common;

use detectdesk::annotate::{Annotator, BOX_THICKNESS};
use image::{GenericImageView, Rgba};

use common::*;

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

#[test]
fn test_no_detections_leaves_image_untouched() {
    let image = solid_image(64, 48, [10, 20, 30]);
    let annotated = test_annotator().annotate(&image, &[], &LegendSource::default());

    assert!(annotated.detections.is_empty());
    assert_eq!(annotated.image, image);
}

#[test]
fn test_records_follow_input_order() {
    // 1. Two detections, the second class has no legend color
    let legend = LegendSource::from_texts("person:red\ncar", None);
    let raw = vec![
        RawDetection::new([50.0, 50.0, 90.0, 90.0], 0.8, 1),
        RawDetection::new([10.9, 10.2, 40.7, 40.5], 0.9, 0),
    ];

    // 2. Annotate
    let annotated = test_annotator().annotate(&solid_image(100, 100, [0, 0, 0]), &raw, &legend);

    // 3. One record per detection, same order, truncated boxes
    assert_eq!(
        annotated.detections,
        vec![
            Detection {
                class_name: "car".to_string(),
                confidence: 0.8,
                bbox: [50, 50, 90, 90],
                color: "blue".to_string(),
            },
            Detection {
                class_name: "person".to_string(),
                confidence: 0.9,
                bbox: [10, 10, 40, 40],
                color: "red".to_string(),
            },
        ]
    );
}

#[test]
fn test_box_outline_thickness() {
    let legend = LegendSource::from_texts("person:red", None);
    let raw = [RawDetection::new([10.0, 40.0, 60.0, 90.0], 0.5, 0)];
    let annotated = test_annotator().annotate(&solid_image(100, 100, [0, 0, 0]), &raw, &legend);
    let image = &annotated.image;

    // Left edge, halfway down: four pixels of outline growing inwards
    for x in 10..10 + BOX_THICKNESS as u32 {
        assert_eq!(image.get_pixel(x, 65), RED, "x = {}", x);
    }
    assert_eq!(image.get_pixel(10 + BOX_THICKNESS as u32, 65), BLACK);
    assert_eq!(image.get_pixel(9, 65), BLACK);
    // Right and bottom edges are inclusive
    assert_eq!(image.get_pixel(60, 65), RED);
    assert_eq!(image.get_pixel(35, 90), RED);
    assert_eq!(image.get_pixel(35, 91), BLACK);
}

#[test]
fn test_label_background_above_box() {
    // 1. Measure the label the annotator will draw
    let annotator = test_annotator();
    let (w, h) = annotator.label_size("person: 0.50");
    assert!(w > 0 && h > 0);

    // 2. Annotate a box far enough down that the label is not clamped
    let legend = LegendSource::from_texts("person:red", None);
    let raw = [RawDetection::new([10.0, 60.0, 60.0, 110.0], 0.5, 0)];
    let annotated = annotator.annotate(&solid_image(w + 100, 120, [0, 0, 0]), &raw, &legend);
    let image = &annotated.image;

    // 3. Background spans x1..=x1 + w + 10 and top..=y1 with top = y1 - h - 5
    let top = 60 - h - 5;
    let right = 10 + w + 10;
    assert_eq!(image.get_pixel(10, top), RED);
    assert_eq!(image.get_pixel(right, top), RED);
    assert_eq!(image.get_pixel(right, 60), RED);
    assert_eq!(image.get_pixel(right + 1, top), BLACK);
    assert_eq!(image.get_pixel(right, top - 1), BLACK);
}

#[test]
fn test_label_clamped_at_top_edge() {
    let annotator = test_annotator();
    let (w, _) = annotator.label_size("car: 0.50");
    let legend = LegendSource::from_texts("person\ncar", None);
    let raw = [RawDetection::new([5.0, 3.0, 30.0, 30.0], 0.5, 1)];
    let annotated = annotator.annotate(&solid_image(w + 50, 50, [0, 0, 0]), &raw, &legend);

    // The label starts at row 0 and ends on the box's top edge
    let right = 5 + w + 10;
    assert_eq!(annotated.image.get_pixel(right, 0), BLUE);
    assert_eq!(annotated.image.get_pixel(right, 3), BLUE);
    assert_eq!(annotated.image.get_pixel(right, 4), BLACK);
}

#[test]
fn test_label_text_is_drawn_in_white() {
    // 1. Red label, whose background has no green at all
    let annotator = test_annotator();
    let (w, h) = annotator.label_size("person: 0.50");
    let legend = LegendSource::from_texts("person:red", None);
    let raw = [RawDetection::new([10.0, 60.0, 60.0, 110.0], 0.5, 0)];
    let annotated = annotator.annotate(&solid_image(w + 100, 120, [0, 0, 0]), &raw, &legend);
    let image = &annotated.image;

    // 2. Count near-white pixels inside the label background
    let top = 60 - h - 5;
    let white = (10..=10 + w + 10)
        .flat_map(|x| (top..60).map(move |y| (x, y)))
        .filter(|&(x, y)| {
            let pixel = image.get_pixel(x, y);
            pixel[0] > 200 && pixel[1] > 200 && pixel[2] > 200
        })
        .count();
    assert!(white > 0, "no text pixels in the label");

    // 3. Text stays inside the label: nothing white above it
    assert!((0..image.width()).all(|x| image.get_pixel(x, top - 1) == BLACK));
}

#[test]
fn test_unknown_class_id_gets_generated_name() {
    let legend = LegendSource::from_texts("person", None);
    let raw = [RawDetection::new([1.0, 1.0, 5.0, 5.0], 0.3, 5)];
    let annotated = test_annotator().annotate(&solid_image(20, 20, [0, 0, 0]), &raw, &legend);

    assert_eq!(annotated.detections[0].class_name, "Class 5");
    assert_eq!(annotated.detections[0].color, PaletteColor::for_index(5).name());
}

#[test]
fn test_label_size_is_measured() -> anyhow::Result<()> {
    let annotator = Annotator::bundled()?;
    let (short, short_height) = annotator.label_size("car: 0.91");
    let (long, _) = annotator.label_size("person: 0.91");

    assert!(short > 0 && short_height > 0);
    assert!(long > short);
    assert_eq!(annotator.label_size(""), (0, 0));
    Ok(())
}

#[test]
fn test_input_image_is_not_modified() {
    let image = solid_image(50, 50, [0, 0, 0]);
    let before = image.clone();
    let raw = [RawDetection::new([1.0, 30.0, 40.0, 45.0], 0.7, 0)];
    let annotated = test_annotator().annotate(&image, &raw, &LegendSource::default());

    assert_eq!(image, before);
    assert_ne!(annotated.image, before);
}
