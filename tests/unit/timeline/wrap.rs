use super::*;

#[test]
fn heading_groups_three_words_per_line() {
    assert_eq!(
        wrap_heading("Rust ownership in seven short minutes", 3),
        vec!["Rust ownership in", "seven short minutes"]
    );
}

#[test]
fn heading_keeps_explicit_breaks() {
    assert_eq!(
        wrap_heading("Part one\nthe borrow checker explained", 3),
        vec!["Part one", "the borrow checker", "explained"]
    );
}

#[test]
fn caption_wraps_greedily() {
    assert_eq!(
        wrap_caption("the quick brown fox jumps over the lazy dog", 15),
        vec!["the quick brown", "fox jumps over", "the lazy dog"]
    );
}

#[test]
fn caption_overlong_word_stands_alone() {
    assert_eq!(
        wrap_caption("a supercalifragilistic b", 5),
        vec!["a", "supercalifragilistic", "b"]
    );
    assert!(wrap_caption("   ", 10).is_empty());
}
