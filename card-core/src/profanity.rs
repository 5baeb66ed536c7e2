//! Profanity filter for free-text card fields.
//!
//! Words are compared after lowercasing and undoing common character
//! substitutions (`4 → a`, `$ → s`, ...). Masked spellings such as `f***`
//! match a listed word with the same first letter and length.

/// Words rejected on cards.
const BLOCKED: &[&str] = &[
    "arse", "arsehole", "ass", "asshole", "bastard", "bitch", "bollocks", "bullshit", "crap",
    "cunt", "damn", "dick", "dickhead", "douche", "fag", "fuck", "fucker", "fucking", "motherfucker",
    "nigga", "nigger", "piss", "prick", "pussy", "retard", "shit", "shitty", "slut", "twat",
    "wanker", "whore",
];

/// Characters treated as a masked letter.
const MASK_CHARS: &[char] = &['*', '#', '_'];

/// Whether the text contains a blocked word.
#[must_use]
pub fn is_profane(text: &str) -> bool {
    tokens(text).any(|token| is_blocked_token(&token))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || MASK_CHARS.contains(&c) || matches!(c, '@' | '$' | '!')
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !is_word_char(c))
        .filter(|t| !t.is_empty())
        .map(normalize)
}

fn normalize(token: &str) -> String {
    token
        .chars()
        .map(|c| match c {
            '0' => 'o',
            '1' | '!' => 'i',
            '3' => 'e',
            '4' | '@' => 'a',
            '5' | '$' => 's',
            '7' => 't',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

fn is_blocked_token(token: &str) -> bool {
    let masked = token.chars().any(|c| MASK_CHARS.contains(&c));
    if !masked {
        return BLOCKED.contains(&token);
    }
    // Masked words need a visible first letter to be attributable.
    let Some(first) = token.chars().next().filter(char::is_ascii_alphabetic) else {
        return false;
    };
    let len = token.chars().count();
    BLOCKED.iter().any(|word| {
        word.starts_with(first)
            && word.chars().count() == len
            && word
                .chars()
                .zip(token.chars())
                .all(|(w, t)| MASK_CHARS.contains(&t) || w == t)
    })
}
