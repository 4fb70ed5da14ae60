use tahfiz::quran::{Mushaf, QuranReference, VerseRange, SURAH_COUNT, TOTAL_PAGES, TOTAL_VERSES};

#[test]
fn test_verse_counts_match_canonical_text() {
    let quran = Mushaf::new();
    assert_eq!(quran.verse_count(1), Some(7), "Al-Fatihah has 7 verses");
    assert_eq!(quran.verse_count(2), Some(286), "Al-Baqarah has 286 verses");
    assert_eq!(quran.verse_count(18), Some(110), "Al-Kahf has 110 verses");
    assert_eq!(quran.verse_count(36), Some(83), "Ya-Sin has 83 verses");
    assert_eq!(quran.verse_count(112), Some(4), "Al-Ikhlas has 4 verses");
    assert_eq!(quran.verse_count(114), Some(6), "An-Nas has 6 verses");
    assert_eq!(quran.verse_count(0), None);
    assert_eq!(quran.verse_count(115), None);

    let total: u32 = (1..=SURAH_COUNT)
        .map(|s| quran.verse_count(s).unwrap() as u32)
        .sum();
    assert_eq!(total, TOTAL_VERSES, "Verse counts must sum to 6236");
}

#[test]
fn test_surah_names() {
    let quran = Mushaf::new();
    assert_eq!(quran.surah_name(1), Some("الفاتحة"));
    assert_eq!(quran.surah_name(2), Some("البقرة"));
    assert_eq!(quran.surah_name(114), Some("الناس"));
    assert_eq!(quran.surah_name(0), None);
}

#[test]
fn test_verse_count_in_range_valid() {
    let quran = Mushaf::new();
    // end - start + 1 for every valid range
    assert_eq!(quran.verse_count_in_range(1, 1, 7), 7);
    assert_eq!(quran.verse_count_in_range(2, 10, 20), 11);
    assert_eq!(quran.verse_count_in_range(114, 3, 3), 1);
}

#[test]
fn test_verse_count_in_range_invalid_returns_zero() {
    let quran = Mushaf::new();
    assert_eq!(quran.verse_count_in_range(1, 5, 3), 0, "start > end");
    assert_eq!(quran.verse_count_in_range(1, 0, 3), 0, "start < 1");
    assert_eq!(quran.verse_count_in_range(1, 1, 8), 0, "end > total");
    assert_eq!(quran.verse_count_in_range(999, 1, 3), 0, "unknown surah");
}

#[test]
fn test_verse_count_across_surahs() {
    let quran = Mushaf::new();
    // 113 (5 verses) + 114 (6 verses)
    assert_eq!(quran.verse_count_across_surahs(113, 1, 114, 6), 11);
    // tail of Al-Baqarah + head of Al-Imran
    assert_eq!(quran.verse_count_across_surahs(2, 280, 3, 10), 17);
    // 112 + 113 + 114 in full
    assert_eq!(quran.verse_count_across_surahs(112, 1, 114, 6), 15);
    // degenerate to single surah
    assert_eq!(quran.verse_count_across_surahs(18, 1, 18, 10), 10);
}

#[test]
fn test_verse_count_across_surahs_invalid_returns_zero() {
    let quran = Mushaf::new();
    assert_eq!(
        quran.verse_count_across_surahs(114, 1, 113, 5),
        0,
        "start surah after end surah"
    );
    assert_eq!(quran.verse_count_across_surahs(113, 9, 114, 6), 0, "bad start verse");
    assert_eq!(quran.verse_count_across_surahs(113, 1, 114, 9), 0, "bad end verse");
}

#[test]
fn test_validate_range() {
    let quran = Mushaf::new();
    assert!(quran.validate_range(&VerseRange::single(2, 1, 286)));
    assert!(quran.validate_range(&VerseRange::spanning(113, 1, 114, 6)));
    assert!(!quran.validate_range(&VerseRange::single(2, 200, 100)));
    assert!(!quran.validate_range(&VerseRange::spanning(114, 1, 113, 5)));
}

#[test]
fn test_format_range_phrasing() {
    let quran = Mushaf::new();
    let single_verse = quran.format_range(&VerseRange::single(112, 1, 1));
    assert_eq!(single_verse, "سورة الإخلاص الآية 1");

    let multi_verse = quran.format_range(&VerseRange::single(112, 1, 4));
    assert_eq!(multi_verse, "سورة الإخلاص من الآية 1 إلى الآية 4");

    let multi_surah = quran.format_range(&VerseRange::spanning(113, 1, 114, 6));
    assert_eq!(multi_surah, "من سورة الفلق الآية 1 إلى سورة الناس الآية 6");
}

#[test]
fn test_page_lookup() {
    let quran = Mushaf::new();
    assert_eq!(quran.first_page(1), Some(1));
    assert_eq!(quran.first_page(2), Some(2));
    assert_eq!(quran.first_page(114), Some(604));
    assert_eq!(quran.surah_for_page(1), Some(1));
    assert_eq!(quran.surah_for_page(3), Some(2), "page 3 is inside Al-Baqarah");
    assert_eq!(quran.surah_for_page(50), Some(3), "Al-Imran starts on page 50");
    assert_eq!(quran.surah_for_page(TOTAL_PAGES + 1), None);
}

#[test]
fn test_range_overlap() {
    let a = VerseRange::single(2, 1, 50);
    let b = VerseRange::single(2, 50, 100);
    let c = VerseRange::single(3, 1, 10);
    assert!(a.overlaps(&b));
    assert!(!a.overlaps(&c));
    assert!(VerseRange::spanning(2, 280, 3, 10).overlaps(&c));
}
