//! Pronounceable pseudo-words and names for generated payloads

use rand::seq::SliceRandom;
use rand::Rng;

const ONSETS: &[&str] = &[
    "b", "br", "c", "ch", "d", "dr", "f", "g", "gl", "h", "j", "k", "l", "m", "n", "p", "pl",
    "qu", "r", "s", "sh", "st", "t", "th", "tr", "v", "w", "z",
];

const VOWELS: &[&str] = &["a", "e", "i", "o", "u", "ai", "ea", "io", "ou"];

const CODAS: &[&str] = &["", "", "", "n", "r", "s", "l", "m", "x", "nd", "rt"];

/// A lowercase word of `min..=max` syllables
pub fn word<R: Rng + ?Sized>(rng: &mut R, min: usize, max: usize) -> String {
    let syllables = rng.gen_range(min.max(1)..=max.max(min).max(1));
    let mut out = String::new();

    for _ in 0..syllables {
        out.push_str(pick(rng, ONSETS));
        out.push_str(pick(rng, VOWELS));
        out.push_str(pick(rng, CODAS));
    }
    out
}

/// A capitalised word suitable as a first or last name
pub fn name<R: Rng + ?Sized>(rng: &mut R) -> String {
    capitalise(&word(rng, 1, 3))
}

pub fn full_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{} {}", name(rng), name(rng))
}

/// `count` words separated by spaces, first one capitalised
pub fn sentence<R: Rng + ?Sized>(rng: &mut R, count: usize) -> String {
    let words: Vec<String> = (0..count.max(1)).map(|_| word(rng, 1, 3)).collect();
    capitalise(&words.join(" "))
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, pool: &[&'a str]) -> &'a str {
    pool.choose(rng).copied().unwrap_or_default()
}

fn capitalise(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
