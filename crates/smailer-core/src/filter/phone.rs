//! Phone number normalization and matching.

/// Shortest number that may match another by suffix.
///
/// Long enough that a local number matches its international form
/// (`5551234` / `+1 555 1234`) without short codes colliding.
pub const MIN_SUFFIX_MATCH_LEN: usize = 7;

/// Strips formatting from a phone number.
///
/// Keeps ASCII letters (upper-cased, for alphanumeric senders), digits and
/// the `*` wildcard/mask character.
#[must_use]
pub fn normalize_phone(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '*')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Whether a list entry matches a phone number.
///
/// Both sides are normalized first. A side containing `*` is treated as a
/// glob over the other side (entries use it as a wildcard, masked numbers as
/// hidden digits). Otherwise the numbers match when equal or when the longer
/// one ends with the shorter one and the shorter one has at least
/// [`MIN_SUFFIX_MATCH_LEN`] characters.
#[must_use]
pub fn phone_matches(entry: &str, number: &str) -> bool {
    let entry = normalize_phone(entry);
    let number = normalize_phone(number);
    if entry.is_empty() || number.is_empty() {
        return false;
    }
    if entry == number {
        return true;
    }
    if entry.contains('*') {
        return glob_matches(&entry, &number);
    }
    if number.contains('*') {
        return glob_matches(&number, &entry);
    }

    let (short, long) = if entry.len() <= number.len() {
        (&entry, &number)
    } else {
        (&number, &entry)
    };
    short.len() >= MIN_SUFFIX_MATCH_LEN && long.ends_with(short.as_str())
}

/// Whether any entry of a phone list matches the number.
pub fn any_phone_matches<'a>(entries: impl IntoIterator<Item = &'a String>, number: &str) -> bool {
    entries.into_iter().any(|entry| phone_matches(entry, number))
}

/// `*` matches any run of characters, everything else matches itself.
fn glob_matches(pattern: &str, value: &str) -> bool {
    let pattern = pattern.as_bytes();
    let value = value.as_bytes();
    let (mut p, mut v) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while v < value.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            backtrack = Some((p, v));
            p += 1;
        } else if p < pattern.len() && pattern[p] == value[v] {
            p += 1;
            v += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            v = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == b'*')
}
