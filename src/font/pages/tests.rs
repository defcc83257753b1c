use super::PageBits;

#[test]
fn new_tracker_is_unsized() {
    let bits = PageBits::new();
    assert!(bits.is_empty());
    assert!(!bits.contains(0));
}

#[test]
fn resize_rounds_to_word_granularity() {
    let mut bits = PageBits::new();

    // Codepoints 0..=255 are one page; one word covers it.
    bits.resize_for(255);
    assert_eq!(bits.word_count(), 1);

    // 32 pages still fit one 32-bit word.
    bits.resize_for(32 * 256 - 1);
    assert_eq!(bits.word_count(), 1);

    // The 33rd page needs a second word.
    bits.resize_for(32 * 256);
    assert_eq!(bits.word_count(), 2);
}

#[test]
fn insert_and_contains() {
    let mut bits = PageBits::new();
    bits.resize_for(0xFFFF);

    assert!(!bits.contains(0));
    bits.insert(0);
    assert!(bits.contains(0));

    bits.insert(37);
    assert!(bits.contains(37));
    assert!(!bits.contains(36));
    assert!(!bits.contains(38));
}

#[test]
fn out_of_range_pages_are_ignored() {
    let mut bits = PageBits::new();
    bits.resize_for(255);

    assert!(!bits.contains(5000));
    bits.insert(5000);
    assert!(!bits.contains(5000));
    assert_eq!(bits.word_count(), 1);
}

#[test]
fn resize_clears_previous_bits() {
    let mut bits = PageBits::new();
    bits.resize_for(0xFFFF);
    bits.insert(3);

    bits.resize_for(0xFFFF);
    assert!(!bits.contains(3));
}

#[test]
fn clear_drops_coverage() {
    let mut bits = PageBits::new();
    bits.resize_for(255);
    bits.insert(0);

    bits.clear();
    assert!(bits.is_empty());
    assert!(!bits.contains(0));
}
