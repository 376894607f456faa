//! Built-in debate topic catalog, grouped by category.
//!
//! Data only; callers render their own pickers and may pass any custom
//! topic string when creating a room.

pub const CATEGORIES: [&str; 6] = [
    "politics",
    "technology",
    "environment",
    "ethics",
    "education",
    "economics",
];

/// Suggested topics for a category; empty for unknown categories.
pub fn suggested_topics(category: &str) -> &'static [&'static str] {
    match category {
        "politics" => &[
            "Democracy is the best form of government",
            "Voting should be mandatory",
            "Term limits should exist for all politicians",
            "Social media should be regulated by governments",
            "Universal basic income should be implemented",
        ],
        "technology" => &[
            "AI will create more jobs than it destroys",
            "Social media does more harm than good",
            "Privacy is more important than security",
            "Cryptocurrency should replace traditional currency",
            "Remote work is better than office work",
        ],
        "environment" => &[
            "Nuclear energy is the solution to climate change",
            "Meat consumption should be heavily taxed",
            "Electric vehicles should be mandatory by 2030",
            "Individual actions can solve climate change",
            "Developed nations should pay for climate damage",
        ],
        "ethics" => &[
            "The death penalty should be abolished",
            "Euthanasia should be legal",
            "Animal testing should be banned",
            "Genetic engineering of humans is ethical",
            "Censorship is ever justified",
        ],
        "education" => &[
            "University education should be free",
            "Standardized testing should be eliminated",
            "Homework should be banned",
            "AI tools should be allowed in education",
            "Gap years should be encouraged",
        ],
        "economics" => &[
            "Billionaires should not exist",
            "Minimum wage should be doubled",
            "Free trade benefits everyone",
            "Automation requires wealth redistribution",
            "Student debt should be forgiven",
        ],
        _ => &[],
    }
}
