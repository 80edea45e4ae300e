use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use quiz_core::model::{QuestionDraft, Subject};

/// Prompt, options, index of the correct option, explanation.
type Row = (&'static str, [&'static str; 4], usize, &'static str);

const GRAMMAR_PRE_K: [Row; 8] = [
    ("Which letter is uppercase?", ["a", "A", "b", "c"], 1, "A is the uppercase letter"),
    ("Which letter is lowercase?", ["A", "B", "c", "D"], 2, "c is the lowercase letter"),
    ("Which starts a sentence?", ["dog", "The", "and", "cat"], 1, "Sentences start with capital letters"),
    ("What goes at the end of a sentence?", [".", "a", "the", "go"], 0, "A period ends a sentence"),
    ("What goes at the end of a question?", [".", "?", "!", ","], 1, "Questions end with ?"),
    ("What shows excitement?", [".", "?", "!", ","], 2, "! shows excitement"),
    ("Which is a naming word?", ["run", "cat", "big", "fast"], 1, "'Cat' names a thing"),
    ("Which is an action word?", ["cat", "run", "big", "the"], 1, "'Run' is an action"),
];

const GRAMMAR_ELEMENTARY: [Row; 8] = [
    ("Which is a noun?", ["happy", "quickly", "table", "run"], 2, "A noun names a person, place, or thing"),
    ("Which is a proper noun?", ["dog", "park", "Texas", "book"], 2, "Proper nouns are capitalized"),
    ("Plural of 'box'?", ["boxs", "boxes", "boxies", "box's"], 1, "Add 'es' after x"),
    ("Plural of 'baby'?", ["babys", "babyes", "babies", "baby's"], 2, "Change y to ies"),
    ("Plural of 'child'?", ["childs", "childes", "children", "child's"], 2, "Irregular plural"),
    ("Past tense of 'run'?", ["runned", "runed", "ran", "runs"], 2, "Irregular past tense"),
    ("'She ___ to school.'", ["go", "goes", "going", "gone"], 1, "She takes 'goes'"),
    ("'They ___ happy.'", ["is", "am", "are", "be"], 2, "They takes 'are'"),
];

const GRAMMAR_MIDDLE: [Row; 6] = [
    ("Which is correct?", ["Their going to the store.", "They're going to the store.", "There going to the store.", "Thier going to the store."], 1, "'They're' is the contraction of 'they are'."),
    ("Choose the correct sentence:", ["Your the best player!", "You're the best player!", "Youre the best player!", "Your' the best player!"], 1, "'You're' is the contraction of 'you are'."),
    ("Select the correct form:", ["The dog wagged it's tail.", "The dog wagged its tail.", "The dog wagged its' tail.", "The dog wagged it is tail."], 1, "'Its' (no apostrophe) shows possession."),
    ("Which is correct?", ["The team are playing well.", "The team is playing well.", "The team be playing well.", "The team were playing well."], 1, "Collective nouns like 'team' take singular verbs in American English."),
    ("Select the correct sentence:", ["Everyone have their own opinion.", "Everyone has their own opinion.", "Everyone has his own opinion.", "Everyone have his own opinion."], 1, "'Everyone' is singular and takes 'has'."),
    ("Which sentence is correct?", ["Whom is calling?", "Who is calling?", "Whose is calling?", "Who's is calling?"], 1, "'Who' is used for subjects; 'whom' for objects."),
];

const GRAMMAR_HIGH_SCHOOL: [Row; 6] = [
    ("Which is correct?", ["I could of done better.", "I could have done better.", "I could off done better.", "I could've of done better."], 1, "'Could have' (could've) is correct, not 'could of'."),
    ("Select the correct sentence:", ["The effect was immediate.", "The affect was immediate.", "The affection was immediate.", "The effection was immediate."], 0, "'Effect' is usually a noun; 'affect' is usually a verb."),
    ("Which is grammatically correct?", ["Lay down and rest.", "Lie down and rest.", "Laid down and rest.", "Lied down and rest."], 1, "'Lie' means to recline; 'lay' requires an object."),
    ("Choose the correct form:", ["I accept your apology.", "I except your apology.", "I expect your apology.", "I excerpt your apology."], 0, "'Accept' means to receive; 'except' means to exclude."),
    ("Select the correct sentence:", ["Between you and I, this is wrong.", "Between you and me, this is wrong.", "Between I and you, this is wrong.", "Between me and you, this is wrong."], 1, "After prepositions, use object pronouns: 'you and me'."),
    ("Which sentence is correct?", ["The principle of the school spoke.", "The principal of the school spoke.", "The principel of the school spoke.", "The princpal of the school spoke."], 1, "'Principal' is a person; 'principle' is a rule or belief."),
];

const GRAMMAR_ADVANCED: [Row; 6] = [
    ("Which is correct?", ["If I was rich, I would travel.", "If I were rich, I would travel.", "If I am rich, I would travel.", "If I be rich, I would travel."], 1, "Subjunctive mood uses 'were' for hypotheticals."),
    ("Choose the correct form:", ["Less people came today.", "Fewer people came today.", "Lesser people came today.", "Few people came today."], 1, "'Fewer' for countable nouns; 'less' for uncountable."),
    ("Select the correct sentence:", ["Who's book is this?", "Whose book is this?", "Whos book is this?", "Whom's book is this?"], 1, "'Whose' shows possession; 'who's' means 'who is'."),
    ("Which demonstrates correct parallelism?", ["She likes hiking, to swim, and biking.", "She likes hiking, swimming, and biking.", "She likes to hike, swimming, and to bike.", "She likes hike, swim, and bike."], 1, "Parallel structure: use the same grammatical form."),
    ("Which sentence is correct?", ["The reason is because he was late.", "The reason is that he was late.", "The reason is since he was late.", "The reason is for he was late."], 1, "'The reason is that' is correct; 'because' is redundant."),
    ("Which is correct?", ["The committee have reached their decision.", "The committee has reached its decision.", "The committee have reached its decision.", "The committee has reached their decision."], 1, "In American English, collective nouns are singular."),
];

const PICTURE_WORDS: [(&str, &str); 16] = [
    ("Apple", "🍎"), ("Ball", "⚽"), ("Cat", "🐱"), ("Dog", "🐶"),
    ("Egg", "🥚"), ("Fish", "🐟"), ("Hat", "🎩"), ("Kite", "🪁"),
    ("Lion", "🦁"), ("Moon", "🌙"), ("Pig", "🐷"), ("Queen", "👑"),
    ("Sun", "☀️"), ("Tree", "🌳"), ("Whale", "🐋"), ("Zebra", "🦓"),
];

/// Word, picture, three misspellings.
const PICTURE_SPELLINGS: [(&str, &str, [&str; 3]); 10] = [
    ("Apple", "🍎", ["Appel", "Aple", "Aplle"]),
    ("Banana", "🍌", ["Bannana", "Bananna", "Banan"]),
    ("Elephant", "🐘", ["Elefant", "Elephent", "Eliphant"]),
    ("Giraffe", "🦒", ["Giraf", "Giraff", "Jiraf"]),
    ("Monkey", "🐵", ["Munkey", "Monky", "Monkee"]),
    ("Penguin", "🐧", ["Pengin", "Pengwin", "Penguine"]),
    ("Rabbit", "🐰", ["Rabit", "Rabitt", "Rabbitt"]),
    ("Umbrella", "☂️", ["Umbrela", "Umberella", "Umbrellla"]),
    ("Butterfly", "🦋", ["Buterfly", "Butterflye", "Buterflie"]),
    ("Dolphin", "🐬", ["Dolfin", "Dolphine", "Dolpin"]),
];

/// Word, meaning, three misspellings.
const DEFINED_SPELLINGS: [(&str, &str, [&str; 3]); 10] = [
    ("because", "for the reason that", ["becuase", "becouse", "becase"]),
    ("believe", "to accept something as true", ["beleive", "belive", "beleave"]),
    ("different", "not the same", ["diffrent", "diferent", "differant"]),
    ("friend", "a person you like and trust", ["freind", "frend", "freand"]),
    ("beautiful", "very pleasing to look at", ["beutiful", "beautifull", "beautyful"]),
    ("necessary", "needed or required", ["neccessary", "necesary", "neccesary"]),
    ("receive", "to get or be given something", ["recieve", "recive", "receeve"]),
    ("separate", "apart or not joined", ["seperate", "seprate", "separete"]),
    ("tomorrow", "the day after today", ["tommorow", "tommorrow", "tomorow"]),
    ("Wednesday", "the day after Tuesday", ["Wensday", "Wednsday", "Wendesday"]),
];

const TRICKY_SPELLINGS: [(&str, [&str; 3]); 10] = [
    ("accommodate", ["acommodate", "accomodate", "accommadate"]),
    ("calendar", ["calender", "calandar", "calander"]),
    ("cemetery", ["cemetary", "cematery", "cemetry"]),
    ("committee", ["comittee", "commitee", "committe"]),
    ("conscience", ["concience", "consience", "conscence"]),
    ("disappear", ["dissapear", "disapear", "dissappear"]),
    ("embarrass", ["embarass", "embarras", "emberrass"]),
    ("exaggerate", ["exagerate", "exaggarate", "exadgerate"]),
    ("millennium", ["millenium", "milennium", "millenniun"]),
    ("occurrence", ["occurence", "ocurrence", "occurrance"]),
];

const ALPHABET: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

fn shuffled_draft<R: Rng + ?Sized>(
    subject: Subject,
    level: u32,
    prompt: String,
    correct: &str,
    wrong: &[&str],
    explanation: String,
    rng: &mut R,
) -> QuestionDraft {
    let mut options: Vec<String> = std::iter::once(correct)
        .chain(wrong.iter().copied())
        .map(str::to_owned)
        .collect();
    options.shuffle(rng);
    let correct_index = options.iter().position(|o| o == correct).unwrap_or(0);
    QuestionDraft {
        subject,
        level,
        prompt,
        options,
        correct_index,
        explanation: Some(explanation),
    }
}

pub(super) fn grammar_for_level<R: Rng + ?Sized>(level: u32, rng: &mut R) -> Vec<QuestionDraft> {
    let rows: &[Row] = match level {
        0..=5 => &GRAMMAR_PRE_K,
        6..=15 => &GRAMMAR_ELEMENTARY,
        16..=30 => &GRAMMAR_MIDDLE,
        31..=45 => &GRAMMAR_HIGH_SCHOOL,
        _ => &GRAMMAR_ADVANCED,
    };

    rows.iter()
        .map(|(prompt, options, correct, explanation)| {
            let wrong: Vec<&str> = options
                .iter()
                .enumerate()
                .filter(|(i, _)| i != correct)
                .map(|(_, o)| *o)
                .collect();
            shuffled_draft(
                Subject::Grammar,
                level,
                (*prompt).to_owned(),
                options[*correct],
                &wrong,
                (*explanation).to_owned(),
                rng,
            )
        })
        .collect()
}

pub(super) fn spelling_for_level<R: Rng + ?Sized>(level: u32, rng: &mut R) -> Vec<QuestionDraft> {
    match level {
        0..=10 => first_letters(level, rng),
        11..=25 => PICTURE_SPELLINGS
            .iter()
            .map(|(word, picture, wrong)| {
                shuffled_draft(
                    Subject::Spelling,
                    level,
                    format!("{picture}\nHow do you spell this?"),
                    word,
                    wrong,
                    format!("The correct spelling is \"{word}\""),
                    rng,
                )
            })
            .collect(),
        26..=45 => DEFINED_SPELLINGS
            .iter()
            .map(|(word, meaning, wrong)| {
                shuffled_draft(
                    Subject::Spelling,
                    level,
                    format!("How do you spell the word that means:\n\"{meaning}\""),
                    word,
                    wrong,
                    format!("The correct spelling is \"{word}\""),
                    rng,
                )
            })
            .collect(),
        _ => TRICKY_SPELLINGS
            .iter()
            .map(|(word, wrong)| {
                shuffled_draft(
                    Subject::Spelling,
                    level,
                    "Which is the correct spelling?".to_owned(),
                    word,
                    wrong,
                    format!("The correct spelling is \"{word}\""),
                    rng,
                )
            })
            .collect(),
    }
}

fn first_letters<R: Rng + ?Sized>(level: u32, rng: &mut R) -> Vec<QuestionDraft> {
    let mut out = Vec::with_capacity(PICTURE_WORDS.len());
    for (word, picture) in PICTURE_WORDS {
        let Some(first) = word.chars().next().map(|c| c.to_ascii_uppercase()) else {
            continue;
        };
        let others: Vec<char> = ALPHABET.iter().copied().filter(|c| *c != first).collect();
        let wrong: Vec<String> = others
            .choose_multiple(rng, 3)
            .map(char::to_string)
            .collect();
        let wrong: Vec<&str> = wrong.iter().map(String::as_str).collect();
        let first = first.to_string();
        out.push(shuffled_draft(
            Subject::Spelling,
            level,
            format!("{picture}\nWhat letter does \"{word}\" start with?"),
            &first,
            &wrong,
            format!("\"{word}\" starts with the letter {first}"),
            rng,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn shuffling_keeps_the_correct_answer() {
        let mut rng = StdRng::seed_from_u64(11);
        for draft in grammar_for_level(3, &mut rng) {
            let expected = GRAMMAR_PRE_K
                .iter()
                .find(|row| row.0 == draft.prompt)
                .map(|row| row.1[row.2])
                .unwrap();
            assert_eq!(draft.options[draft.correct_index], expected);
        }
    }

    #[test]
    fn spelling_bands_switch_formats() {
        let mut rng = StdRng::seed_from_u64(2);
        let early = spelling_for_level(4, &mut rng);
        assert!(early[0].prompt.contains("start with"));
        let tricky = spelling_for_level(60, &mut rng);
        assert_eq!(tricky[0].prompt, "Which is the correct spelling?");
        assert_eq!(tricky.len(), TRICKY_SPELLINGS.len());
    }

    #[test]
    fn first_letter_options_are_distinct() {
        let mut rng = StdRng::seed_from_u64(9);
        for draft in first_letters(1, &mut rng) {
            let mut options = draft.options.clone();
            options.sort();
            options.dedup();
            assert_eq!(options.len(), 4);
        }
    }
}
