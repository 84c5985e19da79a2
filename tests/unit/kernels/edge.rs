use super::*;

#[test]
fn filled_square_keeps_only_its_ring() {
    let mut v = vec![0u8; 25];
    for y in 1..4 {
        for x in 1..4 {
            v[y * 5 + x] = 255;
        }
    }
    let out = edge_from_mask(&MaskArtifact::new(5, 5, v).unwrap()).unwrap();
    assert_eq!(out.count_set(), 8);
    assert_eq!(out.values()[12], 0);
}

#[test]
fn full_mask_outline_is_the_image_border() {
    let out = edge_from_mask(&MaskArtifact::new(4, 3, vec![1; 12]).unwrap()).unwrap();
    assert_eq!(out.count_set(), 10);
    assert!(out.values().iter().all(|v| *v == 0 || *v == MASK_ON));
}
