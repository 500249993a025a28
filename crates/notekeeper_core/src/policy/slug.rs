//! Slug derivation and validation rules.
//!
//! # Responsibility
//! - Derive a URL-safe slug from a note title.
//! - Validate explicit slugs and global slug uniqueness.
//!
//! # Invariants
//! - `derive` is pure and idempotent: `derive(&derive(t)) == derive(t)`.
//! - Derived slugs only contain `[a-z0-9-]`, never start or end with `-`,
//!   never contain `--`, and are at most `SLUG_MAX_CHARS` long.
//! - Collisions are reported, never resolved by suffixing.
//! - Uniqueness is case-sensitive.

use crate::model::note::{NoteForm, NoteId, SLUG_MAX_CHARS};
use crate::repo::note_repo::NoteStore;
use crate::repo::RepoResult;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Suffix appended to the conflicting slug in field-level messages.
pub const DUPLICATE_SLUG_WARNING: &str = " - this value already exists, please choose another";

static EXPLICIT_SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid slug regex"));

const SEPARATOR: char = '-';

/// Another note already holds the candidate slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateSlugError {
    pub slug: String,
}

impl Display for DuplicateSlugError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{DUPLICATE_SLUG_WARNING}", self.slug)
    }
}

impl Error for DuplicateSlugError {}

/// The candidate slug is not a valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlugFormatError {
    /// Nothing usable was supplied or derived.
    Empty,
    TooLong { chars: usize },
    InvalidCharacters(String),
}

impl Display for SlugFormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "slug cannot be empty"),
            Self::TooLong { chars } => write!(
                f,
                "slug has {chars} characters; at most {SLUG_MAX_CHARS} are allowed"
            ),
            Self::InvalidCharacters(slug) => write!(
                f,
                "`{slug}` may only contain latin letters, digits, hyphens and underscores"
            ),
        }
    }
}

impl Error for SlugFormatError {}

/// Derives a slug from a title.
///
/// Lowercases, transliterates Cyrillic and folds Latin diacritics to ASCII,
/// reads `&` as `and`, and collapses every other run of non-alphanumeric
/// characters into one `-`.
pub fn derive(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_separator = false;

    for ch in title.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            push_piece(&mut slug, &mut pending_separator, ch.encode_utf8(&mut [0; 4]));
        } else if ch == '&' {
            pending_separator = true;
            push_piece(&mut slug, &mut pending_separator, "and");
            pending_separator = true;
        } else if is_combining_mark(ch) {
            continue;
        } else if let Some(latin) = transliterate(ch) {
            push_piece(&mut slug, &mut pending_separator, latin);
        } else {
            pending_separator = true;
        }
    }

    if slug.len() > SLUG_MAX_CHARS {
        // Only ASCII reaches `slug`, so byte truncation is char-safe.
        slug.truncate(SLUG_MAX_CHARS);
        let trimmed = slug.trim_end_matches(SEPARATOR).len();
        slug.truncate(trimmed);
    }
    slug
}

fn push_piece(slug: &mut String, pending_separator: &mut bool, piece: &str) {
    if piece.is_empty() {
        return;
    }
    if *pending_separator && !slug.is_empty() {
        slug.push(SEPARATOR);
    }
    *pending_separator = false;
    slug.push_str(piece);
}

fn is_combining_mark(ch: char) -> bool {
    matches!(ch, '\u{0300}'..='\u{036f}')
}

/// Maps one lowercase letter to its Latin spelling.
///
/// Hard and soft signs map to the empty string: they vanish without
/// splitting the word.
fn transliterate(ch: char) -> Option<&'static str> {
    let latin = match ch {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "j",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        'і' => "i",
        'ї' => "yi",
        'є' => "ye",
        'ґ' => "g",
        'ў' => "u",
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'ď' | 'đ' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' | 'ě' => "e",
        'ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'ı' => "i",
        'ł' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => "o",
        'œ' => "oe",
        'ř' => "r",
        'ß' => "ss",
        'ś' | 'š' | 'ş' => "s",
        'ť' => "t",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(latin)
}

/// Checks that an explicit slug is a valid token.
pub fn validate_format(slug: &str) -> Result<(), SlugFormatError> {
    if slug.is_empty() {
        return Err(SlugFormatError::Empty);
    }
    let chars = slug.chars().count();
    if chars > SLUG_MAX_CHARS {
        return Err(SlugFormatError::TooLong { chars });
    }
    if !EXPLICIT_SLUG_RE.is_match(slug) {
        return Err(SlugFormatError::InvalidCharacters(slug.to_string()));
    }
    Ok(())
}

/// Picks the slug a form submission asks for.
///
/// Uses the explicit slug when one was entered, otherwise derives one from
/// the title. Either way the result must be a valid token.
pub fn candidate(form: &NoteForm) -> Result<String, SlugFormatError> {
    let slug = match form.explicit_slug() {
        Some(explicit) => explicit.to_string(),
        None => derive(&form.title),
    };
    validate_format(&slug)?;
    Ok(slug)
}

/// Checks that no note other than `excluding` holds `candidate`.
///
/// The outer result carries store failures; the inner one the policy
/// verdict.
pub fn validate_unique<S: NoteStore>(
    candidate: &str,
    excluding: Option<NoteId>,
    store: &S,
) -> RepoResult<Result<(), DuplicateSlugError>> {
    let holder = store.get_by_slug(candidate)?;
    Ok(match holder {
        Some(note) if Some(note.id) != excluding => Err(DuplicateSlugError {
            slug: candidate.to_string(),
        }),
        _ => Ok(()),
    })
}
