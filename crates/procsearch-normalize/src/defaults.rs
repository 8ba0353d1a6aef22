//! Built-in seed rules used when the rule store has never been written.
//!
//! These cover the vocabulary the aggregated sources most commonly disagree
//! on: color wording, brand spellings, and quantity units across Korean and
//! English. Learned variants are layered on top via `add_variant` and
//! persisted; the seed set itself is only written once, on first run.

use procsearch_core::types::{NormalizationRule, RuleCategory, RuleTable};

fn rule(standard: &str, variants: &[&str], category: RuleCategory, confidence: f32) -> NormalizationRule {
    NormalizationRule {
        standard_term: standard.to_string(),
        variants: variants.iter().map(|v| (*v).to_string()).collect(),
        category,
        confidence,
    }
}

pub fn default_rules() -> RuleTable {
    let colors = vec![
        rule("흰색", &["화이트", "white", "WHITE", "백색", "하얀색", "화이트색"], RuleCategory::Colors, 0.9),
        rule("검은색", &["블랙", "black", "BLACK", "흑색", "까만색", "블랙색"], RuleCategory::Colors, 0.9),
        rule("파란색", &["블루", "blue", "BLUE", "청색", "파랑", "블루색"], RuleCategory::Colors, 0.9),
        rule("빨간색", &["레드", "red", "RED", "적색", "빨강", "레드색"], RuleCategory::Colors, 0.9),
        rule("노란색", &["옐로우", "yellow", "YELLOW", "황색", "노랑"], RuleCategory::Colors, 0.9),
        rule("초록색", &["그린", "green", "GREEN", "녹색", "초록"], RuleCategory::Colors, 0.9),
        rule("회색", &["그레이", "gray", "GRAY", "grey", "GREY"], RuleCategory::Colors, 0.9),
        rule("갈색", &["브라운", "brown", "BROWN"], RuleCategory::Colors, 0.9),
        rule("보라색", &["퍼플", "purple", "PURPLE", "자주색", "보라"], RuleCategory::Colors, 0.9),
        rule("분홍색", &["핑크", "pink", "PINK", "분홍"], RuleCategory::Colors, 0.9),
    ];

    let brands = vec![
        rule("삼성", &["Samsung", "SAMSUNG", "삼성전자"], RuleCategory::Brands, 0.95),
        rule("엘지", &["LG", "엘지전자", "LG전자"], RuleCategory::Brands, 0.95),
        rule("한국HP", &["HP Korea", "한국휴렛팩커드", "HP", "hp"], RuleCategory::Brands, 0.95),
        rule("애플", &["Apple", "APPLE", "apple"], RuleCategory::Brands, 0.95),
        rule("마이크로소프트", &["Microsoft", "MS", "microsoft"], RuleCategory::Brands, 0.95),
        rule("소니", &["Sony", "SONY", "sony"], RuleCategory::Brands, 0.95),
        rule("인텔", &["Intel", "INTEL", "intel"], RuleCategory::Brands, 0.95),
        rule("레노버", &["Lenovo", "LENOVO", "lenovo"], RuleCategory::Brands, 0.95),
        rule("델", &["Dell", "DELL", "dell"], RuleCategory::Brands, 0.95),
        rule("아수스", &["ASUS", "asus", "Asus"], RuleCategory::Brands, 0.95),
        rule("샤오미", &["Xiaomi", "XIAOMI", "xiaomi"], RuleCategory::Brands, 0.95),
        rule("에이서", &["Acer", "ACER", "acer"], RuleCategory::Brands, 0.95),
    ];

    let units = vec![
        rule("개", &["EA", "ea", "대", "매", "장", "piece", "pieces"], RuleCategory::Units, 0.85),
        rule("세트", &["SET", "set", "조", "셋"], RuleCategory::Units, 0.85),
        rule("박스", &["BOX", "box", "상자", "Box"], RuleCategory::Units, 0.85),
        rule("킬로그램", &["kg", "킬로", "키로", "KG", "Kg"], RuleCategory::Units, 0.85),
        rule("그램", &["g", "gram", "grams", "G"], RuleCategory::Units, 0.85),
        rule("미터", &["m", "메터", "meter", "meters", "M"], RuleCategory::Units, 0.85),
        rule("센티미터", &["cm", "센티", "CM", "Cm"], RuleCategory::Units, 0.85),
        rule("밀리미터", &["mm", "밀리", "MM", "Mm"], RuleCategory::Units, 0.85),
        rule("리터", &["L", "l", "liter", "liters"], RuleCategory::Units, 0.85),
        rule("밀리리터", &["ml", "mL", "ML"], RuleCategory::Units, 0.85),
        rule("와트", &["W", "w", "watt", "watts"], RuleCategory::Units, 0.85),
        rule("볼트", &["V", "v", "volt", "volts"], RuleCategory::Units, 0.85),
        rule("암페어", &["A", "a", "amp", "amps"], RuleCategory::Units, 0.85),
        rule("인치", &["inch", "inches", "\"", "''"], RuleCategory::Units, 0.85),
        rule("시간", &["hour", "hours", "hr", "hrs", "h"], RuleCategory::Units, 0.85),
    ];

    let mut table = RuleTable::new();
    table.insert(RuleCategory::Colors, colors);
    table.insert(RuleCategory::Brands, brands);
    table.insert(RuleCategory::Units, units);
    table
}
