use rand::Rng;
use rand::seq::IndexedRandom;

use quiz_core::model::{QuestionDraft, Subject};

use super::unique_options;

const COUNTING_EMOJIS: [&str; 16] = [
    "🍎", "🍊", "🍋", "🍇", "🍓", "🍌", "🥕", "🌽", "⭐", "🌸", "🐶", "🐱", "🐸", "⚽", "🎈", "🚗",
];

const ADDITION_STORIES: [&str; 4] = [
    "Sam has {a} apples. He gets {b} more. How many apples does Sam have?",
    "There are {a} birds in a tree. {b} more birds fly in. How many birds are there now?",
    "A bus has {a} passengers. {b} more people get on. How many passengers are on the bus?",
    "Tom read {a} pages yesterday and {b} pages today. How many pages did he read in total?",
];

const SUBTRACTION_STORIES: [&str; 4] = [
    "There were {a} cookies. {b} were eaten. How many are left?",
    "A store had {a} toys. {b} were sold. How many toys remain?",
    "Emma has {a} crayons. She gives away {b}. How many does she have now?",
    "The library had {a} books. {b} were borrowed. How many books are left?",
];

const MULTIPLICATION_STORIES: [&str; 3] = [
    "There are {a} bags with {b} apples each. How many apples in total?",
    "A classroom has {a} rows of desks with {b} desks in each row. How many desks are there?",
    "A baker makes {a} trays of cookies with {b} cookies on each tray. How many cookies total?",
];

const DIVISION_STORIES: [&str; 3] = [
    "If {a} cookies are shared equally among {b} friends, how many does each friend get?",
    "{a} students need to be divided into {b} equal groups. How many students in each group?",
    "A rope is {a} meters long. It is cut into pieces of {b} meters. How many pieces?",
];

/// Fixed order-of-operations drills: expression, value, worked explanation.
const EXPRESSIONS: [(&str, u32, &str); 12] = [
    ("2 + 3 × 4", 14, "Multiply first: 3 × 4 = 12, then add: 2 + 12 = 14"),
    ("5 × 2 + 3", 13, "Multiply first: 5 × 2 = 10, then add: 10 + 3 = 13"),
    ("(2 + 3) × 4", 20, "Parentheses first: 2 + 3 = 5, then multiply: 5 × 4 = 20"),
    ("10 - 2 × 3", 4, "Multiply first: 2 × 3 = 6, then subtract: 10 - 6 = 4"),
    ("6 + 8 ÷ 2", 10, "Divide first: 8 ÷ 2 = 4, then add: 6 + 4 = 10"),
    ("12 ÷ 4 + 5", 8, "Divide first: 12 ÷ 4 = 3, then add: 3 + 5 = 8"),
    ("(6 + 6) ÷ 3", 4, "Parentheses first: 6 + 6 = 12, then divide: 12 ÷ 3 = 4"),
    ("3 × 4 - 2 × 5", 2, "Multiply: 3 × 4 = 12, 2 × 5 = 10, then subtract: 12 - 10 = 2"),
    ("20 ÷ (2 + 3)", 4, "Parentheses first: 2 + 3 = 5, then divide: 20 ÷ 5 = 4"),
    ("(4 + 2) × (3 + 1)", 24, "Parentheses: 6 × 4 = 24"),
    ("24 ÷ 4 + 2 × 3", 12, "24 ÷ 4 = 6, 2 × 3 = 6, then 6 + 6 = 12"),
    ("18 ÷ 3 ÷ 2", 3, "Left to right: 6 ÷ 2 = 3"),
];

pub(super) fn questions_for_level<R: Rng + ?Sized>(level: u32, rng: &mut R) -> Vec<QuestionDraft> {
    match level {
        0..=2 => counting(level, 5, rng),
        3..=5 => counting(level, 10, rng),
        6..=8 => emoji_addition(level, 5, rng),
        9..=10 => emoji_addition(level, 10, rng),
        11..=15 => addition(level, rng),
        16..=20 => subtraction(level, rng),
        21..=25 => multiplication(level, rng),
        26..=30 => division(level, rng),
        31..=35 => order_of_operations(level, rng),
        _ => mixed_arithmetic(level, rng),
    }
}

fn numeric<R: Rng + ?Sized>(
    level: u32,
    prompt: String,
    answer: u32,
    variance: u32,
    explanation: String,
    rng: &mut R,
) -> QuestionDraft {
    let options = unique_options(answer, variance, rng);
    let answer = answer.to_string();
    let correct_index = options.iter().position(|o| *o == answer).unwrap_or(0);
    QuestionDraft {
        subject: Subject::Math,
        level,
        prompt,
        options,
        correct_index,
        explanation: Some(explanation),
    }
}

fn story(template: &str, a: u32, b: u32) -> String {
    template
        .replace("{a}", &a.to_string())
        .replace("{b}", &b.to_string())
}

fn counting<R: Rng + ?Sized>(level: u32, max_count: u32, rng: &mut R) -> Vec<QuestionDraft> {
    let mut out = Vec::new();
    for count in 1..=max_count {
        let emojis: Vec<&str> = COUNTING_EMOJIS.choose_multiple(rng, 8).copied().collect();
        for emoji in emojis {
            let row = vec![emoji; count as usize].join(" ");
            out.push(numeric(
                level,
                format!("How many {emoji} are there?\n\n{row}"),
                count,
                2,
                format!("There are {count} {emoji}"),
                rng,
            ));
        }
    }
    out
}

fn emoji_addition<R: Rng + ?Sized>(level: u32, max_num: u32, rng: &mut R) -> Vec<QuestionDraft> {
    let mut out = Vec::new();
    for a in 1..=max_num {
        for b in 1..=max_num {
            let emoji = COUNTING_EMOJIS.choose(rng).copied().unwrap_or("⭐");
            let left = emoji.repeat(a as usize);
            let right = emoji.repeat(b as usize);
            let sum = a + b;
            out.push(numeric(
                level,
                format!("{left} + {right} = ?"),
                sum,
                3,
                format!("{a} + {b} = {sum}"),
                rng,
            ));
        }
    }
    out
}

fn addition<R: Rng + ?Sized>(level: u32, rng: &mut R) -> Vec<QuestionDraft> {
    let difficulty = level.saturating_sub(10);
    let max_first = 10 + difficulty * 10;
    let max_second = 5 + difficulty * 5;
    let mut out = Vec::new();

    'pairs: for a in 10..=max_first {
        for b in 1..=max_second {
            if out.len() >= 50 {
                break 'pairs;
            }
            let sum = a + b;
            out.push(numeric(
                level,
                format!("What is {a} + {b}?"),
                sum,
                5,
                format!("{a} + {b} = {sum}"),
                rng,
            ));
        }
    }

    if level >= 13 {
        'triples: for a in 5..=20 {
            for b in 5..=15 {
                for c in 1..=10 {
                    if out.len() >= 100 {
                        break 'triples;
                    }
                    let sum = a + b + c;
                    out.push(numeric(
                        level,
                        format!("What is {a} + {b} + {c}?"),
                        sum,
                        5,
                        format!("{a} + {b} + {c} = {sum}"),
                        rng,
                    ));
                }
            }
        }
    }

    for template in ADDITION_STORIES {
        for a in 5..=20 {
            for b in 3..=15 {
                if out.len() >= 150 {
                    return out;
                }
                let sum = a + b;
                out.push(numeric(
                    level,
                    story(template, a, b),
                    sum,
                    4,
                    format!("{a} + {b} = {sum}"),
                    rng,
                ));
            }
        }
    }
    out
}

fn subtraction<R: Rng + ?Sized>(level: u32, rng: &mut R) -> Vec<QuestionDraft> {
    let difficulty = level.saturating_sub(15);
    let max_num = 20 + difficulty * 15;
    let mut out = Vec::new();

    'pairs: for a in 10..=max_num {
        for b in 1..a.min(30) {
            if out.len() >= 50 {
                break 'pairs;
            }
            let diff = a - b;
            out.push(numeric(
                level,
                format!("What is {a} - {b}?"),
                diff,
                5,
                format!("{a} - {b} = {diff}"),
                rng,
            ));
        }
    }

    for template in SUBTRACTION_STORIES {
        for a in 15..=50 {
            for b in 3..=(a - 1).min(20) {
                if out.len() >= 100 {
                    return out;
                }
                let diff = a - b;
                out.push(numeric(
                    level,
                    story(template, a, b),
                    diff,
                    5,
                    format!("{a} - {b} = {diff}"),
                    rng,
                ));
            }
        }
    }
    out
}

fn multiplication<R: Rng + ?Sized>(level: u32, rng: &mut R) -> Vec<QuestionDraft> {
    let difficulty = level.saturating_sub(20);
    let mut out = Vec::new();

    for a in 2..=12 {
        for b in 2..=12 {
            let product = a * b;
            out.push(numeric(
                level,
                format!("What is {a} × {b}?"),
                product,
                (product / 4).max(6),
                format!("{a} × {b} = {product}"),
                rng,
            ));
        }
    }

    if difficulty >= 3 {
        for a in [15, 20, 25] {
            for b in 2..=10 {
                let product = a * b;
                out.push(numeric(
                    level,
                    format!("What is {a} × {b}?"),
                    product,
                    15,
                    format!("{a} × {b} = {product}"),
                    rng,
                ));
            }
        }
    }

    for template in MULTIPLICATION_STORIES {
        for a in 3..=12 {
            for b in 2..=10 {
                if out.len() >= 200 {
                    return out;
                }
                let product = a * b;
                out.push(numeric(
                    level,
                    story(template, a, b),
                    product,
                    8,
                    format!("{a} × {b} = {product}"),
                    rng,
                ));
            }
        }
    }
    out
}

fn division<R: Rng + ?Sized>(level: u32, rng: &mut R) -> Vec<QuestionDraft> {
    let mut out = Vec::new();

    for divisor in 2..=12 {
        for quotient in 1..=12 {
            let dividend = divisor * quotient;
            out.push(numeric(
                level,
                format!("What is {dividend} ÷ {divisor}?"),
                quotient,
                4,
                format!("{dividend} ÷ {divisor} = {quotient}"),
                rng,
            ));
        }
    }

    for template in DIVISION_STORIES {
        for quotient in 2..=10 {
            for divisor in 2..=10 {
                if out.len() >= 200 {
                    return out;
                }
                let dividend = quotient * divisor;
                out.push(numeric(
                    level,
                    story(template, dividend, divisor),
                    quotient,
                    3,
                    format!("{dividend} ÷ {divisor} = {quotient}"),
                    rng,
                ));
            }
        }
    }
    out
}

fn order_of_operations<R: Rng + ?Sized>(level: u32, rng: &mut R) -> Vec<QuestionDraft> {
    let mut out = Vec::new();

    for (text, answer, explanation) in EXPRESSIONS {
        out.push(numeric(
            level,
            format!("What is {text}?"),
            answer,
            8,
            explanation.to_owned(),
            rng,
        ));
    }

    'dynamic: for a in 2..=8 {
        for b in 2..=6 {
            for c in 1..=5 {
                if out.len() >= 150 {
                    break 'dynamic;
                }
                let product = b * c;
                let first = a + product;
                out.push(numeric(
                    level,
                    format!("What is {a} + {b} × {c}?"),
                    first,
                    6,
                    format!("Multiply first: {b} × {c} = {product}, then add: {a} + {product} = {first}"),
                    rng,
                ));

                let sum = a + b;
                let second = sum * c;
                out.push(numeric(
                    level,
                    format!("What is ({a} + {b}) × {c}?"),
                    second,
                    8,
                    format!("Parentheses first: {a} + {b} = {sum}, then multiply: {sum} × {c} = {second}"),
                    rng,
                ));
            }
        }
    }
    out
}

/// Two-step expressions whose operands grow with the level.
fn mixed_arithmetic<R: Rng + ?Sized>(level: u32, rng: &mut R) -> Vec<QuestionDraft> {
    let scale = level.saturating_sub(35).min(30);
    let mut out = Vec::new();

    'steps: for a in 10..=(20 + scale) {
        for b in 2..=9 {
            for c in 1..=9 {
                if out.len() >= 150 {
                    break 'steps;
                }
                let product = a * b;
                let first = product - c;
                out.push(numeric(
                    level,
                    format!("What is {a} × {b} - {c}?"),
                    first,
                    (first / 10).max(5),
                    format!("Multiply first: {a} × {b} = {product}, then subtract: {product} - {c} = {first}"),
                    rng,
                ));

                let diff = a - b;
                let second = diff * c;
                out.push(numeric(
                    level,
                    format!("What is ({a} - {b}) × {c}?"),
                    second,
                    (second / 10).max(5),
                    format!("Parentheses first: {a} - {b} = {diff}, then multiply: {diff} × {c} = {second}"),
                    rng,
                ));
            }
        }
    }
    out
}
