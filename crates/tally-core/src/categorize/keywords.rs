//! Built-in global keyword dictionary
//!
//! Maps canonical category names to merchant/description keywords. A hit
//! only counts when the user has a category whose name contains one of the
//! entry's `names`, so the table never invents categories.

use serde::{Deserialize, Serialize};

use crate::models::CategoryKind;

/// One dictionary entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordGroup {
    /// Category names (lowercase) this entry resolves to
    pub names: Vec<String>,
    pub kind: CategoryKind,
    /// Keywords searched for in normalized descriptions
    pub keywords: Vec<String>,
}

type Entry = (&'static [&'static str], CategoryKind, &'static [&'static str]);

const BUILTIN: &[Entry] = &[
    (
        &["продукты", "groceries", "супермаркет"],
        CategoryKind::Expense,
        &[
            "пятерочка", "перекресток", "магнит", "лента", "ашан", "вкусвилл", "дикси",
            "metro cash", "spar", "auchan", "walmart", "kroger", "whole foods", "trader joe",
            "safeway", "supermarket", "grocery", "продукты", "супермаркет",
        ],
    ),
    (
        &["транспорт", "transport"],
        CategoryKind::Expense,
        &[
            "такси", "метро", "автобус", "электричка", "тройка", "бензин", "азс", "лукойл",
            "роснефть", "газпромнефть", "парковка", "uber", "lyft", "yandex go", "taxi", "shell",
            "chevron", "parking", "fuel",
        ],
    ),
    (
        &["кафе", "ресторан", "dining", "restaurant"],
        CategoryKind::Expense,
        &[
            "кафе", "ресторан", "кофейня", "пицца", "суши", "шоколадница", "макдоналдс",
            "вкусно и точка", "бургер кинг", "яндекс еда", "delivery club", "starbucks",
            "mcdonalds", "burger king", "kfc", "coffee", "cafe", "restaurant", "pizza",
        ],
    ),
    (
        &["развлечения", "entertainment"],
        CategoryKind::Expense,
        &[
            "кино", "театр", "концерт", "боулинг", "кинопоиск", "okko", "ivi", "netflix",
            "spotify", "steam", "playstation", "youtube premium", "cinema", "theatre", "concert",
        ],
    ),
    (
        &["одежда", "clothing"],
        CategoryKind::Expense,
        &[
            "одежда", "обувь", "спортмастер", "gloria jeans", "lamoda", "zara", "uniqlo",
            "adidas", "nike", "clothing", "shoes",
        ],
    ),
    (
        &["здоровье", "медицина", "health"],
        CategoryKind::Expense,
        &[
            "аптека", "клиника", "стоматология", "врач", "больница", "анализы", "инвитро",
            "ригла", "pharmacy", "clinic", "doctor", "dental", "hospital", "medical",
        ],
    ),
    (
        &["коммунальные", "жкх", "utilities"],
        CategoryKind::Expense,
        &[
            "жкх", "квартплата", "электроэнергия", "мосэнергосбыт", "водоканал", "управляющая",
            "electricity", "water bill", "utility",
        ],
    ),
    (
        &["связь", "интернет", "communication"],
        CategoryKind::Expense,
        &[
            "мтс", "билайн", "мегафон", "теле2", "ростелеком", "интернет", "internet", "verizon",
            "comcast", "mobile",
        ],
    ),
    (
        &["образование", "education"],
        CategoryKind::Expense,
        &[
            "школа", "университет", "курсы", "учебник", "skillbox", "нетология", "coursera",
            "udemy", "school", "university", "tuition", "course",
        ],
    ),
    (
        &["красота", "beauty"],
        CategoryKind::Expense,
        &[
            "салон", "парикмахерская", "маникюр", "барбершоп", "косметика", "летуаль",
            "золотое яблоко", "sephora", "salon", "barber", "spa",
        ],
    ),
    (
        &["дом", "home"],
        CategoryKind::Expense,
        &["икея", "леруа", "hoff", "ikea", "leroy merlin", "obi", "home depot", "lowes"],
    ),
    (
        &["животные", "питомцы", "pets"],
        CategoryKind::Expense,
        &["ветеринар", "зоомагазин", "четыре лапы", "корм", "petshop", "vet"],
    ),
    (
        &["зарплата", "salary"],
        CategoryKind::Income,
        &["зарплата", "заработная плата", "аванс", "оклад", "salary", "payroll"],
    ),
    (
        &["фриланс", "подработка", "freelance"],
        CategoryKind::Income,
        &["фриланс", "гонорар", "freelance", "upwork", "fiverr", "invoice"],
    ),
    (
        &["кэшбэк", "кешбэк", "cashback"],
        CategoryKind::Income,
        &["кэшбэк", "кешбэк", "cashback", "бонусы", "возврат", "refund"],
    ),
];

/// The built-in dictionary as owned config
pub fn default_dictionary() -> Vec<KeywordGroup> {
    BUILTIN
        .iter()
        .map(|(names, kind, keywords)| KeywordGroup {
            names: names.iter().map(|s| s.to_string()).collect(),
            kind: *kind,
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorize::text::normalize;

    #[test]
    fn test_dictionary_is_normalized() {
        // Keywords and names must survive normalization unchanged, otherwise
        // they can never match a normalized description
        for group in default_dictionary() {
            for word in group.names.iter().chain(group.keywords.iter()) {
                assert_eq!(&normalize(word), word, "not normalized: {}", word);
            }
        }
    }

    #[test]
    fn test_dictionary_covers_income_and_expense() {
        let dictionary = default_dictionary();
        assert!(dictionary.iter().any(|g| g.kind == CategoryKind::Income));
        assert!(dictionary.iter().any(|g| g.kind == CategoryKind::Expense));
        assert!(dictionary
            .iter()
            .any(|g| g.names.contains(&"salary".to_string())));
    }
}
