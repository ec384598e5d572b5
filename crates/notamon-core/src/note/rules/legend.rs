//! Observation-code legend printed on the notes.
//!
//! The observation column packs single-character codes with inconsistent
//! spacing and punctuation ("D", "D#", "F/H", "DF"). Decoding recovers each
//! known code even when several are glued together.

use crate::models::note::ObservationCodes;

use super::patterns::OBSERVATION_SEPARATORS;

/// Known observation codes and their meaning.
pub const LEGEND: [(char, &str); 14] = [
    ('A', "Posição futuro"),
    ('T', "Liquidação pelo Bruto"),
    ('C', "Clubes e fundos de Ações"),
    ('I', "POP"),
    ('#', "Negócio direto"),
    ('8', "Liquidação Institucional"),
    ('D', "Day Trade"),
    ('F', "Cobertura"),
    ('B', "Debêntures"),
    ('P', "Carteira Própria"),
    ('H', "Home Broker"),
    ('X', "Box"),
    ('Y', "Desmanche de Box"),
    ('L', "Precatório"),
];

/// Meaning of a single code.
pub fn meaning(code: char) -> Option<&'static str> {
    LEGEND.iter().find(|(c, _)| *c == code).map(|(_, m)| *m)
}

pub fn is_code(code: char) -> bool {
    meaning(code).is_some()
}

/// Whether a whole token is exactly one known code.
pub fn is_observation_token(token: &str) -> bool {
    let normalized = token.replace('\u{a0}', " ").trim().to_uppercase();
    let mut chars = normalized.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => is_code(c),
        _ => false,
    }
}

/// Split observation text on whitespace, `|` and `/` into uppercase tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = text.replace('\u{a0}', " ").to_uppercase();
    OBSERVATION_SEPARATORS
        .split(normalized.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Decode every known code found in observation text.
pub fn decode_codes(text: &str) -> ObservationCodes {
    let mut codes = ObservationCodes::new();

    for token in tokenize(text) {
        let stripped: String = token
            .chars()
            .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '#')
            .collect();

        let mut chars = stripped.chars();
        match (chars.next(), chars.next()) {
            (None, _) => continue,
            (Some(c), None) if is_code(c) => {
                codes.insert(c);
                continue;
            }
            _ => {}
        }

        if stripped.contains('#') {
            codes.insert('#');
        }

        // Short tokens are usually several codes glued together ("DF", "D#").
        if stripped.chars().count() <= 3 {
            for c in stripped.chars().filter(|c| is_code(*c)) {
                codes.insert(c);
            }
        }
    }

    codes
}

/// Human-readable meanings of the codes, sorted by code, joined with `"; "`.
pub fn describe(codes: &ObservationCodes) -> String {
    codes
        .iter()
        .map(|c| meaning(c).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("; ")
}
