use crate::constants::{BONUS_ROLE_TAG, DEFAULT_ROLE_EMOJI};
use crate::types::Question;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::OnceLock;

// Built-in content: trivia pools, the role emoji table and role greetings. Kept separate so
// copy edits stay isolated from the game flow.

const ROLE_EMOJI: &[(&str, &str)] = &[
    ("developer", "🧑‍💻"),
    ("dev", "🧑‍💻"),
    ("hr", "👩‍💼"),
    ("devops", "🔧"),
    ("designer", "🎨"),
    ("pm", "📋"),
    ("ceo", "👔"),
    ("tester", "🐛"),
    ("qa", "🐛"),
    ("ba", "📊"),
    ("sales", "💼"),
    ("bod", "👑"),
];

const GREETINGS: &[(&str, &[&str])] = &[
    (
        "developer",
        &[
            "May your deploys ship bug-free and your merges never conflict! 🚀",
            "New year, green builds, long deadlines and vanishing bugs! 💻",
            "May every git push land on the first try, no force push needed! 🎯",
        ],
    ),
    (
        "hr",
        &[
            "May every hire be a great fit and every week drama-free! 🎯",
            "New year, candidates lining up and a happy team! 🧧",
            "May your KPIs beat target and every team be fully staffed! 💪",
        ],
    ),
    (
        "devops",
        &[
            "May production never catch fire at 2am this year! 🔥",
            "Four nines of uptime, silent alerts and good sleep! 😴",
            "Green servers, automatic deploys and no rollbacks! 🟢",
        ],
    ),
    (
        "designer",
        &[
            "Pixel perfect work, approved on the first round! 🎨",
            "Bursting creativity and a Figma that never lags! ✨",
            "May nobody ask you to make the logo bigger this year! 😂",
        ],
    ),
    (
        "pm",
        &[
            "No scope creep and every timeline on schedule! 📊",
            "Happy stakeholders and short meetings all year! 🎯",
            "Every sprint hits velocity and every retro is a party! 🏃",
        ],
    ),
    (
        "ceo",
        &[
            "Double the revenue and a cheerful team! 📈",
            "Plenty of funding and a vision come true! 🚀",
            "A smooth IPO and a call from Forbes! 💰",
        ],
    ),
    (
        "tester",
        &[
            "Find bugs fast and may the fixes land even faster! 🐛",
            "Every test case passes and regressions drop to zero! ✅",
            "Smooth automation and goodbye to manual runs! 🤖",
        ],
    ),
];

const DEFAULT_GREETINGS: &[&str] = &[
    "Wishing you fortune, prosperity and everything you hope for! 🧧",
    "A year of luck, wealth and smooth work! 💰",
    "Happy New Year! Good health and money flowing in like water! 🎉",
];

/// Case-insensitive role match: the normalized role and a table key match when either contains
/// the other. The longest matching key wins, table order decides ties. A blank role matches
/// nothing.
pub fn match_role_key<'a, I>(role: &str, keys: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let normalized = role.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }
    keys.into_iter()
        .filter(|key| normalized.contains(key) || key.contains(normalized.as_str()))
        .fold(None, |best: Option<&'a str>, key| match best {
            Some(current) if current.len() >= key.len() => Some(current),
            _ => Some(key),
        })
}

pub fn emoji_for_role(role: &str) -> &'static str {
    match_role_key(role, ROLE_EMOJI.iter().map(|(key, _)| *key))
        .and_then(|key| ROLE_EMOJI.iter().find(|(k, _)| *k == key))
        .map(|(_, emoji)| *emoji)
        .unwrap_or(DEFAULT_ROLE_EMOJI)
}

pub fn greeting_for_role<R: Rng + ?Sized>(role: &str, rng: &mut R) -> &'static str {
    let group = match_role_key(role, GREETINGS.iter().map(|(key, _)| *key))
        .and_then(|key| GREETINGS.iter().find(|(k, _)| *k == key))
        .map(|(_, lines)| *lines)
        .unwrap_or(DEFAULT_GREETINGS);
    group.choose(rng).copied().unwrap_or(DEFAULT_GREETINGS[0])
}

fn question(prompt: &str, options: &[&str], correct_index: usize, explanation: &str) -> Question {
    Question {
        prompt: prompt.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct_index,
        explanation: Some(explanation.to_string()),
    }
}

fn build_base_pool() -> Vec<Question> {
    vec![
        question(
            "Why are red and gold the traditional Tết colours?",
            &["They stand for luck and prosperity", "They are easy to see", "Nobody knows", "Shops sell them"],
            0,
            "Red brings luck, gold brings prosperity.",
        ),
        question(
            "What is lucky money traditionally kept in?",
            &["A red envelope", "A plastic bag", "A paper box", "Any of these"],
            0,
            "The red envelope is the most traditional.",
        ),
        question(
            "When do adults usually give lucky money to children?",
            &["New Year's Eve", "The first morning", "The whole first week", "All of the above"],
            3,
            "Lucky money can be given throughout the first week of the new year.",
        ),
        question(
            "Which amounts are considered luckiest?",
            &["Even numbers", "Odd numbers", "Ending in 8 or 9", "It does not matter"],
            2,
            "8 stands for fortune and 9 for longevity.",
        ),
        question(
            "How many kinds of fruit go on the five-fruit tray?",
            &["3", "5", "7", "Depends on the family"],
            1,
            "Five fruits for the five blessings.",
        ),
        question(
            "Which leaves wrap bánh chưng?",
            &["Banana leaves", "Dong leaves", "Bamboo leaves", "Lotus leaves"],
            1,
            "Dong leaves give the cake its green colour.",
        ),
        question(
            "Which day officially starts Tết?",
            &["The 30th of the last month", "The 1st of the first month", "New Year's Eve", "All of the above"],
            1,
            "Tết officially begins on the first day of the first lunar month.",
        ),
    ]
}

fn build_bonus_pool() -> Vec<Question> {
    vec![
        question(
            "Which HTTP status code means \"Not Found\"?",
            &["200", "301", "404", "500"],
            2,
            "404 is returned when the resource does not exist.",
        ),
        question(
            "Which git command creates a new commit that undoes an earlier one?",
            &["git reset", "git revert", "git stash", "git checkout"],
            1,
            "git revert records the inverse change as a new commit.",
        ),
        question(
            "What does the \"S\" in SOLID stand for?",
            &["Single responsibility", "Strong typing", "Static dispatch", "Separation of data"],
            0,
            "A module should have one reason to change.",
        ),
    ]
}

pub fn base_questions() -> &'static [Question] {
    static POOL: OnceLock<Vec<Question>> = OnceLock::new();
    POOL.get_or_init(build_base_pool)
}

/// Extra questions for roles matching the bonus tag; empty for everyone else.
pub fn bonus_questions(role: &str) -> &'static [Question] {
    static POOL: OnceLock<Vec<Question>> = OnceLock::new();
    if match_role_key(role, [BONUS_ROLE_TAG]).is_some() {
        POOL.get_or_init(build_bonus_pool)
    } else {
        &[]
    }
}
