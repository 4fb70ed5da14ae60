//! Static mushaf reference data and verse-range arithmetic.
//!
//! Verse counts follow the Hafs numbering; pages follow the 604-page layout
//! of the standard Madinah mushaf. Every range computation in the engine
//! funnels through this table.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

pub const SURAH_COUNT: u16 = 114;
pub const TOTAL_PAGES: u16 = 604;
pub const TOTAL_VERSES: u32 = 6236;

/// (Arabic name, verse count, first page in the 604-page mushaf)
static SURAHS: [(&str, u16, u16); 114] = [
    ("الفاتحة", 7, 1),
    ("البقرة", 286, 2),
    ("آل عمران", 200, 50),
    ("النساء", 176, 77),
    ("المائدة", 120, 106),
    ("الأنعام", 165, 128),
    ("الأعراف", 206, 151),
    ("الأنفال", 75, 177),
    ("التوبة", 129, 187),
    ("يونس", 109, 208),
    ("هود", 123, 221),
    ("يوسف", 111, 235),
    ("الرعد", 43, 249),
    ("إبراهيم", 52, 255),
    ("الحجر", 99, 262),
    ("النحل", 128, 267),
    ("الإسراء", 111, 282),
    ("الكهف", 110, 293),
    ("مريم", 98, 305),
    ("طه", 135, 312),
    ("الأنبياء", 112, 322),
    ("الحج", 78, 332),
    ("المؤمنون", 118, 342),
    ("النور", 64, 350),
    ("الفرقان", 77, 359),
    ("الشعراء", 227, 367),
    ("النمل", 93, 377),
    ("القصص", 88, 385),
    ("العنكبوت", 69, 396),
    ("الروم", 60, 404),
    ("لقمان", 34, 411),
    ("السجدة", 30, 415),
    ("الأحزاب", 73, 418),
    ("سبأ", 54, 428),
    ("فاطر", 45, 434),
    ("يس", 83, 440),
    ("الصافات", 182, 446),
    ("ص", 88, 453),
    ("الزمر", 75, 458),
    ("غافر", 85, 467),
    ("فصلت", 54, 477),
    ("الشورى", 53, 483),
    ("الزخرف", 89, 489),
    ("الدخان", 59, 496),
    ("الجاثية", 37, 499),
    ("الأحقاف", 35, 502),
    ("محمد", 38, 507),
    ("الفتح", 29, 511),
    ("الحجرات", 18, 515),
    ("ق", 45, 518),
    ("الذاريات", 60, 520),
    ("الطور", 49, 523),
    ("النجم", 62, 526),
    ("القمر", 55, 528),
    ("الرحمن", 78, 531),
    ("الواقعة", 96, 534),
    ("الحديد", 29, 537),
    ("المجادلة", 22, 542),
    ("الحشر", 24, 545),
    ("الممتحنة", 13, 549),
    ("الصف", 14, 551),
    ("الجمعة", 11, 553),
    ("المنافقون", 11, 554),
    ("التغابن", 18, 556),
    ("الطلاق", 12, 558),
    ("التحريم", 12, 560),
    ("الملك", 30, 562),
    ("القلم", 52, 564),
    ("الحاقة", 52, 566),
    ("المعارج", 44, 568),
    ("نوح", 28, 570),
    ("الجن", 28, 572),
    ("المزمل", 20, 574),
    ("المدثر", 56, 575),
    ("القيامة", 40, 577),
    ("الإنسان", 31, 578),
    ("المرسلات", 50, 580),
    ("النبأ", 40, 582),
    ("النازعات", 46, 583),
    ("عبس", 42, 585),
    ("التكوير", 29, 586),
    ("الانفطار", 19, 587),
    ("المطففين", 36, 587),
    ("الانشقاق", 25, 589),
    ("البروج", 22, 590),
    ("الطارق", 17, 591),
    ("الأعلى", 19, 591),
    ("الغاشية", 26, 592),
    ("الفجر", 30, 593),
    ("البلد", 20, 594),
    ("الشمس", 15, 595),
    ("الليل", 21, 595),
    ("الضحى", 11, 596),
    ("الشرح", 8, 596),
    ("التين", 8, 597),
    ("العلق", 19, 597),
    ("القدر", 5, 598),
    ("البينة", 8, 598),
    ("الزلزلة", 8, 599),
    ("العاديات", 11, 599),
    ("القارعة", 11, 600),
    ("التكاثر", 8, 600),
    ("العصر", 3, 601),
    ("الهمزة", 9, 601),
    ("الفيل", 5, 601),
    ("قريش", 4, 602),
    ("الماعون", 7, 602),
    ("الكوثر", 3, 602),
    ("الكافرون", 6, 603),
    ("النصر", 3, 603),
    ("المسد", 5, 603),
    ("الإخلاص", 4, 604),
    ("الفلق", 5, 604),
    ("الناس", 6, 604),
];

lazy_static! {
    /// page (1-based) → number of the surah that page belongs to
    static ref PAGE_SURAH_INDEX: Vec<u16> = {
        let mut index = vec![0u16; TOTAL_PAGES as usize + 1];
        let mut surah = 1usize;
        for page in 1..=TOTAL_PAGES {
            while surah < SURAHS.len() && SURAHS[surah].2 <= page {
                surah += 1;
            }
            index[page as usize] = surah as u16;
        }
        index
    };
}

/// An inclusive verse range. Single-surah ranges have start_surah == end_surah.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseRange {
    pub start_surah: u16,
    pub start_verse: u16,
    pub end_surah: u16,
    pub end_verse: u16,
}

impl VerseRange {
    pub fn single(surah: u16, start_verse: u16, end_verse: u16) -> Self {
        VerseRange {
            start_surah: surah,
            start_verse,
            end_surah: surah,
            end_verse,
        }
    }

    pub fn spanning(start_surah: u16, start_verse: u16, end_surah: u16, end_verse: u16) -> Self {
        VerseRange {
            start_surah,
            start_verse,
            end_surah,
            end_verse,
        }
    }

    pub fn is_single_surah(&self) -> bool {
        self.start_surah == self.end_surah
    }

    /// Ordering key of the first verse, for mushaf-order comparisons.
    pub fn start_key(&self) -> (u16, u16) {
        (self.start_surah, self.start_verse)
    }

    pub fn end_key(&self) -> (u16, u16) {
        (self.end_surah, self.end_verse)
    }

    pub fn overlaps(&self, other: &VerseRange) -> bool {
        self.start_key() <= other.end_key() && other.start_key() <= self.end_key()
    }

    pub fn contains(&self, surah: u16, verse: u16) -> bool {
        self.start_key() <= (surah, verse) && (surah, verse) <= self.end_key()
    }
}

/// Read-only mushaf reference data, injected wherever range math is needed
/// so tests can substitute alternate tables.
pub trait QuranReference: Send + Sync {
    /// Verse count of a surah; None outside 1..=114.
    fn verse_count(&self, surah: u16) -> Option<u16>;

    /// Arabic surah name; None outside 1..=114.
    fn surah_name(&self, surah: u16) -> Option<&'static str>;

    /// First page of a surah in the 604-page mushaf.
    fn first_page(&self, surah: u16) -> Option<u16>;

    /// Surah a given page belongs to.
    fn surah_for_page(&self, page: u16) -> Option<u16>;

    /// Verses in [start_verse, end_verse] of one surah.
    /// Returns 0 for invalid ranges (start < 1, end > total, start > end);
    /// this is a validation signal, not an error.
    fn verse_count_in_range(&self, surah: u16, start_verse: u16, end_verse: u16) -> u32 {
        let total = match self.verse_count(surah) {
            Some(t) => t,
            None => return 0,
        };
        if start_verse < 1 || end_verse > total || start_verse > end_verse {
            return 0;
        }
        (end_verse - start_verse + 1) as u32
    }

    /// Verses across a possibly multi-surah range. Returns 0 for invalid
    /// ranges, including start_surah > end_surah.
    fn verse_count_across_surahs(
        &self,
        start_surah: u16,
        start_verse: u16,
        end_surah: u16,
        end_verse: u16,
    ) -> u32 {
        if start_surah > end_surah {
            return 0;
        }
        if start_surah == end_surah {
            return self.verse_count_in_range(start_surah, start_verse, end_verse);
        }
        let first_total = match self.verse_count(start_surah) {
            Some(t) => t,
            None => return 0,
        };
        let head = self.verse_count_in_range(start_surah, start_verse, first_total);
        let tail = self.verse_count_in_range(end_surah, 1, end_verse);
        if head == 0 || tail == 0 {
            return 0;
        }
        let mut count = head + tail;
        for surah in (start_surah + 1)..end_surah {
            count += match self.verse_count(surah) {
                Some(t) => t as u32,
                None => return 0,
            };
        }
        count
    }

    fn range_verse_count(&self, range: &VerseRange) -> u32 {
        self.verse_count_across_surahs(
            range.start_surah,
            range.start_verse,
            range.end_surah,
            range.end_verse,
        )
    }

    fn validate_range(&self, range: &VerseRange) -> bool {
        self.range_verse_count(range) > 0
    }

    /// Human-readable Arabic rendering of a range. Single-verse phrasing
    /// differs from multi-verse.
    fn format_range(&self, range: &VerseRange) -> String {
        let start_name = self.surah_name(range.start_surah).unwrap_or("؟");
        if range.is_single_surah() {
            if range.start_verse == range.end_verse {
                format!("سورة {} الآية {}", start_name, range.start_verse)
            } else {
                format!(
                    "سورة {} من الآية {} إلى الآية {}",
                    start_name, range.start_verse, range.end_verse
                )
            }
        } else {
            let end_name = self.surah_name(range.end_surah).unwrap_or("؟");
            format!(
                "من سورة {} الآية {} إلى سورة {} الآية {}",
                start_name, range.start_verse, end_name, range.end_verse
            )
        }
    }
}

/// In-memory implementation backed by the static tables above.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mushaf;

impl Mushaf {
    pub fn new() -> Self {
        Mushaf
    }
}

impl QuranReference for Mushaf {
    fn verse_count(&self, surah: u16) -> Option<u16> {
        if surah < 1 || surah > SURAH_COUNT {
            return None;
        }
        Some(SURAHS[surah as usize - 1].1)
    }

    fn surah_name(&self, surah: u16) -> Option<&'static str> {
        if surah < 1 || surah > SURAH_COUNT {
            return None;
        }
        Some(SURAHS[surah as usize - 1].0)
    }

    fn first_page(&self, surah: u16) -> Option<u16> {
        if surah < 1 || surah > SURAH_COUNT {
            return None;
        }
        Some(SURAHS[surah as usize - 1].2)
    }

    fn surah_for_page(&self, page: u16) -> Option<u16> {
        if page < 1 || page > TOTAL_PAGES {
            return None;
        }
        Some(PAGE_SURAH_INDEX[page as usize])
    }
}
