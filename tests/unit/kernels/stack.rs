use super::*;

fn list() -> ImageListArtifact {
    ImageListArtifact {
        items: vec![
            ImageArtifact::filled(2, 1, [255, 0, 0, 255]).unwrap(),
            ImageArtifact::filled(1, 2, [0, 0, 255, 255]).unwrap(),
        ],
    }
}

#[test]
fn vertical_stack_sums_heights() {
    let out = stack_images(&list(), StackAxis::Vertical).unwrap();
    assert_eq!((out.width(), out.height()), (2, 3));
    let px = |x: usize, y: usize| &out.pixels()[(y * 2 + x) * 4..(y * 2 + x) * 4 + 4];
    assert_eq!(px(1, 0), [255, 0, 0, 255]);
    assert_eq!(px(0, 2), [0, 0, 255, 255]);
    assert_eq!(px(1, 2), [0, 0, 0, 0]);
}

#[test]
fn horizontal_stack_sums_widths() {
    let out = stack_images(&list(), StackAxis::Horizontal).unwrap();
    assert_eq!((out.width(), out.height()), (3, 2));
    let px = |x: usize, y: usize| &out.pixels()[(y * 3 + x) * 4..(y * 3 + x) * 4 + 4];
    assert_eq!(px(2, 1), [0, 0, 255, 255]);
    assert_eq!(px(0, 1), [0, 0, 0, 0]);
}

#[test]
fn empty_list_is_an_execution_error() {
    let err = stack_images(&ImageListArtifact::default(), StackAxis::Vertical).unwrap_err();
    assert_eq!(err.message(), "Stack vertical: empty imageList.");
}

#[test]
fn oversized_stack_is_an_execution_error() {
    assert_eq!(summed_extent([3, 4, 5], "Stack vertical").unwrap(), 12);
    let err = summed_extent([u32::MAX, 1], "Stack horizontal").unwrap_err();
    assert!(matches!(err, MillError::Execution(_)));
    assert_eq!(err.message(), "Stack horizontal: stacked size overflows.");
}
