use super::*;

fn mask(rows: &[&str]) -> MaskArtifact {
    let w = rows[0].len() as u32;
    let values = rows
        .iter()
        .flat_map(|r| r.bytes().map(|b| if b == b'#' { 1 } else { 0 }))
        .collect();
    MaskArtifact::new(w, rows.len() as u32, values).unwrap()
}

#[test]
fn small_regions_are_erased_large_kept() {
    let m = mask(&["#...", "...#", "..##", "...."]);
    let out = remove_small_components(&m, 2).unwrap();
    assert_eq!(out.count_set(), 3);
    assert_eq!(out.values()[0], 0);
    assert_eq!(out.values()[7], MASK_ON);
}

#[test]
fn diagonal_neighbours_are_separate_components() {
    let m = mask(&["#.", ".#"]);
    assert_eq!(remove_small_components(&m, 2).unwrap().count_set(), 0);
}

#[test]
fn min_area_of_one_only_normalizes() {
    let m = mask(&["#.", ".#"]);
    let out = remove_small_components(&m, 1).unwrap();
    assert_eq!(out.values(), &[MASK_ON, 0, 0, MASK_ON]);
}
